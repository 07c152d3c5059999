use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One agent as delivered by the data source.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct AgentRecord {
	#[serde(rename = "_id", alias = "id")]
	pub id: String,
	#[serde(rename = "agent_name", alias = "name", default)]
	pub name: String,
	#[serde(default)]
	pub topic: String,
	#[serde(default)]
	pub avatar: String,
	#[serde(default)]
	pub friends: Vec<Friendship>,
	#[serde(flatten)]
	pub workload: Workload,
}

/// A directed relationship claim from one agent to a peer.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Friendship {
	#[serde(rename = "friend_id", alias = "friend_identity")]
	pub peer_id: String,
	pub strength: f64,
}

/// Optional workload counters; defaulted where they are displayed. A value of
/// the wrong shape reads as absent instead of failing the whole record set.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
pub struct Workload {
	#[serde(default, deserialize_with = "lenient_count")]
	pub jobs_in_progress: Option<u32>,
	#[serde(default, deserialize_with = "lenient_count")]
	pub jobs_completed: Option<u32>,
	#[serde(default, deserialize_with = "lenient_number")]
	pub rating: Option<f64>,
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
	let value = Option::<Value>::deserialize(deserializer)?;
	Ok(value.as_ref().and_then(Value::as_f64).filter(|n| n.is_finite()))
}

/// Whole, non-negative counts only; `2.0` is accepted as 2.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
	Ok(lenient_number(deserializer)?
		.filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX))
		.map(|n| n as u32))
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: String,
	pub name: String,
	pub description: String,
	pub avatar: String,
	pub workload: Workload,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Set while the node is dragged; overrides force integration.
	pub pinned: Option<(f64, f64)>,
	pub degree: usize,
}

impl Node {
	pub fn from_record(record: &AgentRecord) -> Self {
		Self {
			id: record.id.clone(),
			name: record.name.clone(),
			description: record.topic.clone(),
			avatar: record.avatar.clone(),
			workload: record.workload,
			x: 0.0,
			y: 0.0,
			vx: 0.0,
			vy: 0.0,
			pinned: None,
			degree: 0,
		}
	}
}

/// Undirected weighted relationship; endpoints are indices into the node list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
	pub source: usize,
	pub target: usize,
	pub strength: f64,
}

impl Edge {
	pub fn touches(&self, idx: usize) -> bool {
		self.source == idx || self.target == idx
	}

	pub fn other(&self, idx: usize) -> Option<usize> {
		if self.source == idx {
			Some(self.target)
		} else if self.target == idx {
			Some(self.source)
		} else {
			None
		}
	}
}

/// Deduplicated node and edge set for one mounted visualization.
#[derive(Clone, Debug, Default)]
pub struct SocialGraph {
	pub nodes: Vec<Node>,
	pub edges: Vec<Edge>,
	incident: Vec<Vec<usize>>,
}

impl SocialGraph {
	pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
		let mut incident = vec![Vec::new(); nodes.len()];
		for (e, edge) in edges.iter().enumerate() {
			incident[edge.source].push(e);
			incident[edge.target].push(e);
		}
		Self {
			nodes,
			edges,
			incident,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Indices of the edges incident to `idx`.
	pub fn incident_edges(&self, idx: usize) -> &[usize] {
		self.incident.get(idx).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
		self.incident_edges(idx)
			.iter()
			.filter_map(move |&e| self.edges[e].other(idx))
	}

}

#[cfg(test)]
impl SocialGraph {
	pub fn node_index(&self, id: &str) -> Option<usize> {
		self.nodes.iter().position(|node| node.id == id)
	}

	pub fn degree(&self, id: &str) -> Option<usize> {
		self.node_index(id).map(|idx| self.nodes[idx].degree)
	}

	pub fn edge_between(&self, a: &str, b: &str) -> Option<&Edge> {
		let (a, b) = (self.node_index(a)?, self.node_index(b)?);
		self.incident_edges(a)
			.iter()
			.map(|&e| &self.edges[e])
			.find(|edge| edge.other(a) == Some(b))
	}
}
