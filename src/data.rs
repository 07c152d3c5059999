//! Agent records loaded over HTTP.

use gloo_net::http::Request;
use log::info;
use thiserror::Error;

use crate::components::social_graph::AgentRecord;

pub const AGENTS_URL: &str = "/data/agents_data.json";

#[derive(Debug, Error)]
pub enum FetchError {
	#[error("network error: {0}")]
	Network(#[from] gloo_net::Error),
	#[error("HTTP {status}: {status_text}")]
	Status { status: u16, status_text: String },
	#[error("malformed agent data: {0}")]
	Parse(#[from] serde_json::Error),
	#[error("no agent data")]
	NoData,
}

pub async fn fetch_agents(url: &str) -> Result<Vec<AgentRecord>, FetchError> {
	let resp = Request::get(url).send().await?;
	if !resp.ok() {
		return Err(FetchError::Status {
			status: resp.status(),
			status_text: resp.status_text(),
		});
	}
	let agents = parse_agents(&resp.text().await?)?;
	info!("Loaded {} agent records from {url}", agents.len());
	Ok(agents)
}

/// Parse the agent list; a `null` body means the source has nothing to show.
pub fn parse_agents(body: &str) -> Result<Vec<AgentRecord>, FetchError> {
	serde_json::from_str::<Option<Vec<AgentRecord>>>(body)?.ok_or(FetchError::NoData)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_records_with_optional_fields() {
		let agents = parse_agents(
			r#"[
				{
					"_id": "a1",
					"agent_name": "Ada",
					"topic": "compilers",
					"avatar": "https://example.org/a.png",
					"friends": [{"friend_id": "b2", "strength": 0.7}],
					"jobs_in_progress": 3,
					"rating": 4.8
				},
				{"id": "b2", "name": "Bo", "friends": [{"friend_identity": "a1", "strength": 0.2}]}
			]"#,
		)
		.unwrap();

		assert_eq!(agents.len(), 2);
		assert_eq!(agents[0].name, "Ada");
		assert_eq!(agents[0].friends[0].peer_id, "b2");
		assert_eq!(agents[0].workload.jobs_in_progress, Some(3));
		assert_eq!(agents[0].workload.jobs_completed, None);
		assert_eq!(agents[0].workload.rating, Some(4.8));
		assert_eq!(agents[1].id, "b2");
		assert_eq!(agents[1].friends[0].peer_id, "a1");
		assert!(agents[1].topic.is_empty());
	}

	#[test]
	fn odd_workload_values_read_as_absent() {
		let agents = parse_agents(
			r#"[
				{"_id": "a", "jobs_in_progress": 2.0, "jobs_completed": -3, "rating": "great"},
				{"_id": "b", "jobs_in_progress": 1.5, "jobs_completed": null, "rating": 4}
			]"#,
		)
		.unwrap();

		assert_eq!(agents.len(), 2);
		assert_eq!(agents[0].workload.jobs_in_progress, Some(2));
		assert_eq!(agents[0].workload.jobs_completed, None);
		assert_eq!(agents[0].workload.rating, None);
		assert_eq!(agents[1].workload.jobs_in_progress, None);
		assert_eq!(agents[1].workload.jobs_completed, None);
		assert_eq!(agents[1].workload.rating, Some(4.0));
	}

	#[test]
	fn null_and_garbage_are_errors() {
		assert!(matches!(parse_agents("null"), Err(FetchError::NoData)));
		assert!(matches!(parse_agents("{\"nope\": 1}"), Err(FetchError::Parse(_))));
		assert!(parse_agents("[]").unwrap().is_empty());
	}
}
