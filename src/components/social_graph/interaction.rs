//! Pointer, wheel and touch input turned into pins, selection, hover and the
//! view transform.

use std::collections::HashSet;

use super::render::{EdgeArc, edge_width, node_radius};
use super::simulation::Simulation;
use super::types::SocialGraph;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 5.0;
pub const FADED_OPACITY: f64 = 0.1;
/// Pointer travel (screen px) below which a press on a node counts as a click.
const CLICK_DISTANCE: f64 = 3.0;
/// Extra screen px around a stroke that still counts as hovering it.
const EDGE_HIT_SLOP: f64 = 3.0;

/// Pan/zoom applied to the whole drawing group.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Scale by `factor` keeping the graph point under (sx, sy) fixed.
	pub fn zoom_about(&mut self, factor: f64, sx: f64, sy: f64) {
		if !factor.is_finite() || factor <= 0.0 || !sx.is_finite() || !sy.is_finite() {
			return;
		}
		let new_k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = new_k;
	}
}

/// A pointer sample: canvas-local coordinates plus page coordinates for overlays.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerInput {
	pub x: f64,
	pub y: f64,
	pub page_x: f64,
	pub page_y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
	Idle,
	Hovered,
	Dragging,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
	#[default]
	NoneSelected,
	Selected(usize),
}

#[derive(Clone, Copy, Debug, Default)]
enum Gesture {
	#[default]
	Idle,
	Dragging {
		node: usize,
		origin: (f64, f64),
		moved: bool,
	},
	Panning {
		origin: (f64, f64),
		start: ViewTransform,
	},
}

#[derive(Debug, Default)]
pub struct InteractionController {
	transform: ViewTransform,
	gesture: Gesture,
	hovered: Option<usize>,
	hovered_edge: Option<usize>,
	selection: Selection,
	/// The selected node and its neighbours.
	highlight: HashSet<usize>,
	pointer: PointerInput,
}

impl InteractionController {
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	#[cfg(test)]
	pub fn selection(&self) -> Selection {
		self.selection
	}

	pub fn hovered(&self) -> Option<usize> {
		self.hovered
	}

	pub fn hovered_edge(&self) -> Option<usize> {
		self.hovered_edge
	}

	pub fn dragging(&self) -> Option<usize> {
		match self.gesture {
			Gesture::Dragging { node, .. } => Some(node),
			_ => None,
		}
	}

	/// Last pointer sample seen by the controller.
	pub fn pointer(&self) -> PointerInput {
		self.pointer
	}

	pub fn node_state(&self, idx: usize) -> NodeState {
		if self.dragging() == Some(idx) {
			NodeState::Dragging
		} else if self.hovered == Some(idx) {
			NodeState::Hovered
		} else {
			NodeState::Idle
		}
	}

	pub fn node_opacity(&self, idx: usize) -> f64 {
		match self.selection {
			Selection::NoneSelected => 1.0,
			Selection::Selected(_) if self.highlight.contains(&idx) => 1.0,
			Selection::Selected(_) => FADED_OPACITY,
		}
	}

	/// Group opacity for an edge; its strength-based stroke opacity is separate.
	pub fn edge_opacity(&self, graph: &SocialGraph, edge: usize) -> f64 {
		match (self.selection, graph.edges.get(edge)) {
			(Selection::NoneSelected, _) | (_, None) => 1.0,
			(Selection::Selected(n), Some(e)) if e.touches(n) => e.strength,
			(Selection::Selected(_), Some(_)) => FADED_OPACITY,
		}
	}

	pub fn pointer_down(&mut self, sim: &mut Simulation, p: PointerInput) -> bool {
		self.pointer = p;
		self.end_gesture(sim);
		let (gx, gy) = self.transform.screen_to_graph(p.x, p.y);
		match self.node_at(sim.graph(), gx, gy) {
			Some(node) => {
				self.hovered = None;
				self.hovered_edge = None;
				sim.start_drag(node, gx, gy);
				self.gesture = Gesture::Dragging {
					node,
					origin: (p.x, p.y),
					moved: false,
				};
			}
			None => {
				self.gesture = Gesture::Panning {
					origin: (p.x, p.y),
					start: self.transform,
				};
			}
		}
		true
	}

	pub fn pointer_move(&mut self, sim: &mut Simulation, p: PointerInput) -> bool {
		self.pointer = p;
		match self.gesture {
			Gesture::Dragging {
				node,
				origin,
				ref mut moved,
			} => {
				if !*moved && (p.x - origin.0).hypot(p.y - origin.1) > CLICK_DISTANCE {
					*moved = true;
				}
				let (gx, gy) = self.transform.screen_to_graph(p.x, p.y);
				sim.drag_to(node, gx, gy);
				true
			}
			Gesture::Panning { origin, start } => {
				self.transform.x = start.x + (p.x - origin.0);
				self.transform.y = start.y + (p.y - origin.1);
				true
			}
			Gesture::Idle => self.update_hover(sim.graph(), p),
		}
	}

	pub fn pointer_up(&mut self, sim: &mut Simulation, p: PointerInput) -> bool {
		self.pointer = p;
		let clicked = match self.gesture {
			Gesture::Dragging {
				node, moved: false, ..
			} => Some(node),
			_ => None,
		};
		self.end_gesture(sim);
		if let Some(node) = clicked {
			self.click(sim.graph(), node);
		}
		self.update_hover(sim.graph(), p);
		true
	}

	pub fn pointer_leave(&mut self, sim: &mut Simulation) -> bool {
		let changed = !matches!(self.gesture, Gesture::Idle)
			|| self.hovered.is_some()
			|| self.hovered_edge.is_some();
		self.end_gesture(sim);
		self.hovered = None;
		self.hovered_edge = None;
		changed
	}

	/// Toggle or move the selection to `idx`.
	pub fn click(&mut self, graph: &SocialGraph, idx: usize) {
		if idx >= graph.nodes.len() {
			return;
		}
		let previous = self.selection;
		self.selection = Selection::NoneSelected;
		self.highlight.clear();
		if previous == Selection::Selected(idx) {
			return;
		}
		self.selection = Selection::Selected(idx);
		self.highlight.insert(idx);
		self.highlight.extend(graph.neighbors(idx));
	}

	/// Wheel zoom around the pointer; `delta_mode` follows the DOM constants.
	pub fn wheel(&mut self, delta_y: f64, delta_mode: u32, p: PointerInput) -> bool {
		let per_unit = match delta_mode {
			0 => 0.002,
			1 => 0.05,
			_ => 1.0,
		};
		let before = self.transform;
		self.transform.zoom_about(2f64.powf(-delta_y * per_unit), p.x, p.y);
		self.transform != before
	}

	/// Two-finger zoom by the ratio of finger spans around their midpoint.
	pub fn pinch(&mut self, ratio: f64, center_x: f64, center_y: f64) -> bool {
		let before = self.transform;
		self.transform.zoom_about(ratio, center_x, center_y);
		self.transform != before
	}

	fn end_gesture(&mut self, sim: &mut Simulation) {
		if let Gesture::Dragging { node, .. } = std::mem::take(&mut self.gesture) {
			sim.release(node);
		}
	}

	fn update_hover(&mut self, graph: &SocialGraph, p: PointerInput) -> bool {
		let (gx, gy) = self.transform.screen_to_graph(p.x, p.y);
		let node = self.node_at(graph, gx, gy);
		let edge = match node {
			Some(_) => None,
			None => self.edge_at(graph, gx, gy),
		};
		let changed = node != self.hovered || edge != self.hovered_edge;
		self.hovered = node;
		self.hovered_edge = edge;
		changed
	}

	/// Topmost node under a graph-space point; later nodes draw on top.
	fn node_at(&self, graph: &SocialGraph, gx: f64, gy: f64) -> Option<usize> {
		graph.nodes.iter().enumerate().rev().find_map(|(i, node)| {
			let radius = node_radius(node.degree, self.hovered == Some(i));
			((node.x - gx).hypot(node.y - gy) <= radius).then_some(i)
		})
	}

	fn edge_at(&self, graph: &SocialGraph, gx: f64, gy: f64) -> Option<usize> {
		let slop = EDGE_HIT_SLOP / self.transform.k;
		graph
			.edges
			.iter()
			.enumerate()
			.filter_map(|(i, edge)| {
				let (s, t) = (&graph.nodes[edge.source], &graph.nodes[edge.target]);
				let distance = EdgeArc::between(s.x, s.y, t.x, t.y)?.distance_to(gx, gy)?;
				(distance <= edge_width(edge.strength) / 2.0 + slop).then_some((i, distance))
			})
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(i, _)| i)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::social_graph::config::SimulationConfig;
	use crate::components::social_graph::preprocess::build_graph;
	use crate::components::social_graph::types::{AgentRecord, Friendship};

	fn agent(id: &str, friends: &[(&str, f64)]) -> AgentRecord {
		AgentRecord {
			id: id.into(),
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

	/// a - b - c, d isolated; nodes placed far apart on a line.
	fn fixture() -> Simulation {
		let records = vec![
			agent("a", &[("b", 0.8)]),
			agent("b", &[("c", 0.4)]),
			agent("c", &[]),
			agent("d", &[]),
		];
		let mut sim = Simulation::new(build_graph(&records), SimulationConfig::default(), 800.0, 600.0);
		for (i, x) in [100.0, 300.0, 500.0, 700.0].into_iter().enumerate() {
			sim.drag_to(i, x, 300.0);
			sim.release(i);
		}
		sim
	}

	fn at(x: f64, y: f64) -> PointerInput {
		PointerInput {
			x,
			y,
			page_x: x + 8.0,
			page_y: y + 64.0,
		}
	}

	fn opacities(ctl: &InteractionController, sim: &Simulation) -> (Vec<f64>, Vec<f64>) {
		let graph = sim.graph();
		(
			(0..graph.nodes.len()).map(|i| ctl.node_opacity(i)).collect(),
			(0..graph.edges.len()).map(|e| ctl.edge_opacity(graph, e)).collect(),
		)
	}

	#[test]
	fn click_fades_everything_outside_the_neighbourhood() {
		let sim = fixture();
		let mut ctl = InteractionController::default();
		ctl.click(sim.graph(), 1);

		let (nodes, edges) = opacities(&ctl, &sim);
		assert_eq!(nodes, [1.0, 1.0, 1.0, FADED_OPACITY]);
		assert_eq!(edges, [0.8, 0.4]);

		ctl.click(sim.graph(), 0);
		let (nodes, edges) = opacities(&ctl, &sim);
		assert_eq!(nodes, [1.0, 1.0, FADED_OPACITY, FADED_OPACITY]);
		assert_eq!(edges, [0.8, FADED_OPACITY]);
	}

	#[test]
	fn clicking_twice_restores_full_opacity() {
		let sim = fixture();
		let mut ctl = InteractionController::default();
		let untouched = opacities(&ctl, &sim);
		ctl.click(sim.graph(), 2);
		ctl.click(sim.graph(), 2);
		assert_eq!(ctl.selection(), Selection::NoneSelected);
		assert_eq!(opacities(&ctl, &sim), untouched);
	}

	#[test]
	fn switching_selection_matches_direct_selection() {
		let sim = fixture();
		let mut via = InteractionController::default();
		via.click(sim.graph(), 0);
		via.click(sim.graph(), 2);
		let mut direct = InteractionController::default();
		direct.click(sim.graph(), 2);

		assert_eq!(via.selection(), Selection::Selected(2));
		assert_eq!(opacities(&via, &sim), opacities(&direct, &sim));
	}

	#[test]
	fn press_and_release_in_place_is_a_click() {
		let mut sim = fixture();
		let mut ctl = InteractionController::default();
		ctl.pointer_down(&mut sim, at(300.0, 300.0));
		assert_eq!(ctl.node_state(1), NodeState::Dragging);
		assert_eq!(sim.graph().nodes[1].pinned, Some((300.0, 300.0)));

		ctl.pointer_up(&mut sim, at(301.0, 300.0));
		assert_eq!(ctl.selection(), Selection::Selected(1));
		assert_eq!(sim.graph().nodes[1].pinned, None);
		assert_eq!(ctl.node_state(1), NodeState::Hovered);
	}

	#[test]
	fn drag_pins_to_pointer_and_does_not_select() {
		let mut sim = fixture();
		let mut ctl = InteractionController::default();
		ctl.pointer_down(&mut sim, at(100.0, 300.0));
		ctl.pointer_move(&mut sim, at(150.0, 250.0));
		sim.tick();
		assert_eq!((sim.graph().nodes[0].x, sim.graph().nodes[0].y), (150.0, 250.0));

		ctl.pointer_up(&mut sim, at(150.0, 250.0));
		assert_eq!(ctl.selection(), Selection::NoneSelected);
		assert_eq!(ctl.dragging(), None);
		assert_eq!(sim.graph().nodes[0].pinned, None);
	}

	#[test]
	fn drag_pin_accounts_for_zoom() {
		let mut sim = fixture();
		let mut ctl = InteractionController::default();
		ctl.wheel(-500.0, 0, at(0.0, 0.0));
		let k = ctl.transform().k;
		assert!((k - 2.0).abs() < 1e-9);

		ctl.pointer_down(&mut sim, at(1400.0, 600.0));
		assert_eq!(ctl.dragging(), Some(3));
		ctl.pointer_move(&mut sim, at(1000.0, 1000.0));
		assert_eq!(sim.graph().nodes[3].pinned, Some((500.0, 500.0)));
	}

	#[test]
	fn hover_is_exclusive_with_drag() {
		let mut sim = fixture();
		let mut ctl = InteractionController::default();
		assert!(ctl.pointer_move(&mut sim, at(500.0, 302.0)));
		assert_eq!(ctl.hovered(), Some(2));
		assert_eq!(ctl.node_state(2), NodeState::Hovered);

		ctl.pointer_down(&mut sim, at(500.0, 302.0));
		assert_eq!(ctl.hovered(), None);
		ctl.pointer_move(&mut sim, at(700.0, 300.0));
		assert_eq!(ctl.hovered(), None);

		ctl.pointer_leave(&mut sim);
		assert_eq!(ctl.dragging(), None);
		assert_eq!(sim.graph().nodes[2].pinned, None);
	}

	#[test]
	fn faded_node_can_still_be_hovered() {
		let mut sim = fixture();
		let mut ctl = InteractionController::default();
		ctl.click(sim.graph(), 0);
		assert_eq!(ctl.node_opacity(3), FADED_OPACITY);
		ctl.pointer_move(&mut sim, at(700.0, 300.0));
		assert_eq!(ctl.hovered(), Some(3));
	}

	#[test]
	fn background_press_pans_without_touching_nodes() {
		let mut sim = fixture();
		let before: Vec<_> = sim.graph().nodes.iter().map(|n| (n.x, n.y)).collect();
		let mut ctl = InteractionController::default();
		ctl.pointer_down(&mut sim, at(400.0, 50.0));
		ctl.pointer_move(&mut sim, at(430.0, 10.0));
		ctl.pointer_up(&mut sim, at(430.0, 10.0));

		assert_eq!(ctl.transform(), ViewTransform { x: 30.0, y: -40.0, k: 1.0 });
		let after: Vec<_> = sim.graph().nodes.iter().map(|n| (n.x, n.y)).collect();
		assert_eq!(before, after);
		assert_eq!(ctl.selection(), Selection::NoneSelected);
	}

	#[test]
	fn zoom_stays_within_bounds() {
		let mut ctl = InteractionController::default();
		let gestures = [
			(-2_000.0, 0),
			(-90.0, 1),
			(3.0, 2),
			(50_000.0, 0),
			(-1.0, 2),
			(f64::NAN, 0),
		];
		for (delta, mode) in gestures.into_iter().cycle().take(60) {
			ctl.wheel(delta, mode, at(123.0, 45.0));
			let k = ctl.transform().k;
			assert!((MIN_ZOOM..=MAX_ZOOM).contains(&k), "{k}");
		}
		for ratio in [10.0, 0.01, f64::INFINITY, 0.0, -3.0, 1.7] {
			ctl.pinch(ratio, 10.0, 10.0);
			let k = ctl.transform().k;
			assert!((MIN_ZOOM..=MAX_ZOOM).contains(&k), "{k}");
		}
	}

	#[test]
	fn edge_hover_is_found_on_the_arc() {
		let mut sim = fixture();
		let mut ctl = InteractionController::default();
		let s = &sim.graph().nodes[0];
		let t = &sim.graph().nodes[1];
		let arc = EdgeArc::between(s.x, s.y, t.x, t.y).unwrap();
		let mid = (arc.start_angle + arc.end_angle) / 2.0;
		let (px, py) = (arc.cx + arc.radius * mid.cos(), arc.cy + arc.radius * mid.sin());

		ctl.pointer_move(&mut sim, at(px, py));
		assert_eq!(ctl.hovered(), None);
		assert_eq!(ctl.hovered_edge(), Some(0));

		ctl.pointer_move(&mut sim, at(300.0, 590.0));
		assert_eq!(ctl.hovered_edge(), None);
	}
}
