//! Raw agent records to a deduplicated, undirected, weighted graph.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::types::{AgentRecord, Edge, Node, SocialGraph};

/// Build the working graph from fetched records.
///
/// Node order follows input order. For every unordered pair of agents the
/// first relationship encountered (in either direction) is kept with its
/// strength; later claims about the same pair are dropped. Relationships to
/// unknown agents, self-relationships and strengths outside `(0, 1]` are
/// discarded (strengths above 1 are clamped).
pub fn build_graph(records: &[AgentRecord]) -> SocialGraph {
	let mut nodes = Vec::with_capacity(records.len());
	let mut index = HashMap::with_capacity(records.len());
	let mut owners = Vec::with_capacity(records.len());

	for record in records {
		if index.contains_key(record.id.as_str()) {
			debug!("Skipping duplicate agent record {}", record.id);
			continue;
		}
		index.insert(record.id.as_str(), nodes.len());
		nodes.push(Node::from_record(record));
		owners.push(record);
	}

	let mut seen = HashSet::new();
	let mut edges = Vec::new();
	let mut dropped = 0usize;

	for (source, record) in owners.iter().enumerate() {
		for friend in &record.friends {
			let Some(&target) = index.get(friend.peer_id.as_str()) else {
				dropped += 1;
				continue;
			};
			let Some(strength) = normalize_strength(friend.strength) else {
				dropped += 1;
				continue;
			};
			if source == target {
				dropped += 1;
				continue;
			}
			if !seen.insert((source.min(target), source.max(target))) {
				continue;
			}
			nodes[source].degree += 1;
			nodes[target].degree += 1;
			edges.push(Edge {
				source,
				target,
				strength,
			});
		}
	}

	if dropped > 0 {
		debug!("Dropped {dropped} malformed relationship(s)");
	}

	SocialGraph::new(nodes, edges)
}

fn normalize_strength(strength: f64) -> Option<f64> {
	(strength.is_finite() && strength > 0.0).then(|| strength.min(1.0))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::social_graph::types::Friendship;

	fn agent(id: &str, friends: &[(&str, f64)]) -> AgentRecord {
		AgentRecord {
			id: id.into(),
			name: id.to_uppercase(),
			friends: friends
				.iter()
				.map(|&(peer, strength)| Friendship {
					peer_id: peer.into(),
					strength,
				})
				.collect(),
			..Default::default()
		}
	}

	#[test]
	fn first_direction_wins() {
		let graph = build_graph(&[
			agent("a", &[("b", 0.5)]),
			agent("b", &[("a", 0.9)]),
			agent("c", &[]),
		]);

		let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["a", "b", "c"]);
		assert_eq!(graph.edges.len(), 1);
		assert_eq!(graph.edge_between("b", "a").map(|e| e.strength), Some(0.5));
		assert_eq!(graph.degree("a"), Some(1));
		assert_eq!(graph.degree("b"), Some(1));
		assert_eq!(graph.degree("c"), Some(0));
	}

	#[test]
	fn reverse_direction_first_keeps_its_strength() {
		let graph = build_graph(&[
			agent("b", &[("a", 0.9)]),
			agent("a", &[("b", 0.5), ("b", 0.2)]),
		]);
		assert_eq!(graph.edges.len(), 1);
		assert_eq!(graph.edge_between("a", "b").map(|e| e.strength), Some(0.9));
	}

	#[test]
	fn degree_counts_kept_edges() {
		let graph = build_graph(&[
			agent("hub", &[("x", 0.3), ("y", 0.4), ("z", 1.0)]),
			agent("x", &[("hub", 0.3), ("y", 0.6)]),
			agent("y", &[]),
			agent("z", &[("hub", 0.1)]),
			agent("loner", &[]),
		]);
		for (i, node) in graph.nodes.iter().enumerate() {
			let incident = graph.edges.iter().filter(|e| e.touches(i)).count();
			assert_eq!(node.degree, incident, "degree of {}", node.id);
		}
		assert_eq!(graph.degree("hub"), Some(3));
		assert_eq!(graph.degree("y"), Some(2));
		assert_eq!(graph.degree("loner"), Some(0));
		assert_eq!(graph.neighbors(0).count(), 3);
	}

	#[test]
	fn malformed_relationships_are_dropped() {
		let graph = build_graph(&[
			agent("a", &[("ghost", 0.5), ("a", 0.5), ("b", f64::NAN), ("b", 0.0)]),
			agent("b", &[("a", 2.5)]),
		]);
		assert_eq!(graph.edges.len(), 1);
		assert_eq!(graph.edges[0].strength, 1.0);
		assert_eq!(graph.degree("a"), Some(1));
	}

	#[test]
	fn duplicate_agents_keep_the_first_record() {
		let mut second = agent("a", &[("b", 0.7)]);
		second.name = "other".into();
		let graph = build_graph(&[agent("a", &[]), agent("b", &[]), second]);
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.nodes[0].name, "A");
		assert!(graph.edges.is_empty());
	}

	#[test]
	fn empty_input_is_an_empty_graph() {
		let graph = build_graph(&[]);
		assert!(graph.is_empty());
		assert!(graph.edges.is_empty());
	}
}
