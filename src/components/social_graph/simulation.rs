//! Alpha-scheduled force integrator: link springs, many-body repulsion,
//! centering and collision, with drag pins overriding integration.

use std::f64::consts::PI;

use log::warn;

use super::config::SimulationConfig;
use super::quadtree::QuadNode;
use super::types::{Node, SocialGraph};

const INITIAL_RADIUS: f64 = 10.0;

pub struct Simulation {
	graph: SocialGraph,
	config: SimulationConfig,
	alpha: f64,
	alpha_target: f64,
	center: (f64, f64),
	/// Share of each link's correction applied to its source endpoint.
	link_bias: Vec<f64>,
	points: Vec<(f64, f64)>,
}

impl Simulation {
	pub fn new(mut graph: SocialGraph, config: SimulationConfig, width: f64, height: f64) -> Self {
		let center = (width / 2.0, height / 2.0);
		place_phyllotaxis(&mut graph.nodes, center);

		let link_bias = graph
			.edges
			.iter()
			.map(|edge| {
				let (s, t) = (
					graph.nodes[edge.source].degree.max(1) as f64,
					graph.nodes[edge.target].degree.max(1) as f64,
				);
				s / (s + t)
			})
			.collect();

		Self {
			graph,
			config: config.sanitized(),
			alpha: 1.0,
			alpha_target: 0.0,
			center,
			link_bias,
			points: Vec::new(),
		}
	}

	pub fn graph(&self) -> &SocialGraph {
		&self.graph
	}

	#[cfg(test)]
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn is_settled(&self) -> bool {
		self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min
	}

	pub fn reheat(&mut self, alpha: f64) {
		self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
	}

	/// Pin `idx` under the pointer and keep the layout warm until release.
	pub fn start_drag(&mut self, idx: usize, x: f64, y: f64) {
		self.alpha_target = self.config.drag_alpha_target;
		self.drag_to(idx, x, y);
	}

	pub fn drag_to(&mut self, idx: usize, x: f64, y: f64) {
		if !(x.is_finite() && y.is_finite()) {
			return;
		}
		if let Some(node) = self.graph.nodes.get_mut(idx) {
			node.pinned = Some((x, y));
			node.x = x;
			node.y = y;
			node.vx = 0.0;
			node.vy = 0.0;
		}
	}

	pub fn release(&mut self, idx: usize) {
		if let Some(node) = self.graph.nodes.get_mut(idx) {
			node.pinned = None;
		}
		self.alpha_target = 0.0;
		self.reheat(self.config.release_alpha);
	}

	/// Advance one step and return the alpha it ran at.
	pub fn tick(&mut self) -> f64 {
		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
		let alpha = self.alpha;
		let config = self.config;
		let SocialGraph { nodes, edges, .. } = &mut self.graph;

		for (edge, &bias) in edges.iter().zip(&self.link_bias) {
			let (source, target) = (&nodes[edge.source], &nodes[edge.target]);
			let mut dx = target.x + target.vx - source.x - source.vx;
			let mut dy = target.y + target.vy - source.y - source.vy;
			if dx == 0.0 {
				dx = jiggle(edge.source * 31 + edge.target);
			}
			if dy == 0.0 {
				dy = jiggle(edge.target * 17 + edge.source);
			}
			let l = (dx * dx + dy * dy).sqrt();
			let k = (l - config.link_distance) / l * alpha * edge.strength * config.link_strength_scale;
			let (fx, fy) = (dx * k, dy * k);

			let target = &mut nodes[edge.target];
			target.vx -= fx * bias;
			target.vy -= fy * bias;
			let source = &mut nodes[edge.source];
			source.vx += fx * (1.0 - bias);
			source.vy += fy * (1.0 - bias);
		}

		self.points.clear();
		self.points.extend(nodes.iter().map(|n| (n.x, n.y)));
		if let Some(tree) = QuadNode::build(&self.points) {
			for (i, node) in nodes.iter_mut().enumerate() {
				let (fx, fy) = repulsion(&tree, i, &self.points, &config, alpha);
				node.vx += fx;
				node.vy += fy;
			}
		}

		apply_centering(nodes, self.center, config.center_strength);

		for _ in 0..config.collision_iterations {
			apply_collision(nodes, &mut self.points, &config);
		}

		integrate(nodes, config.velocity_decay, self.center);
		alpha
	}
}

/// Deterministic spiral around the viewport center, so a reload lays out the same way.
fn place_phyllotaxis(nodes: &mut [Node], (cx, cy): (f64, f64)) {
	let angle_step = PI * (3.0 - 5.0_f64.sqrt());
	for (i, node) in nodes.iter_mut().enumerate() {
		let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
		let angle = i as f64 * angle_step;
		node.x = cx + radius * angle.cos();
		node.y = cy + radius * angle.sin();
		node.vx = 0.0;
		node.vy = 0.0;
	}
}

fn jiggle(seed: usize) -> f64 {
	let v = ((seed as f64 + 1.0) * 0.618_034).fract() - 0.5;
	if v == 0.0 { 1e-6 } else { v * 1e-6 }
}

fn repulsion(
	cell: &QuadNode,
	i: usize,
	points: &[(f64, f64)],
	config: &SimulationConfig,
	alpha: f64,
) -> (f64, f64) {
	let (x, y) = points[i];
	let dmin_sq = config.distance_min * config.distance_min;

	if cell.is_leaf() {
		let (mut fx, mut fy) = (0.0, 0.0);
		for &j in &cell.indices {
			if j == i {
				continue;
			}
			let (mut dx, mut dy) = (points[j].0 - x, points[j].1 - y);
			if dx == 0.0 {
				dx = jiggle(i * 7 + j);
			}
			if dy == 0.0 {
				dy = jiggle(j * 13 + i);
			}
			let mut l = dx * dx + dy * dy;
			if l < dmin_sq {
				l = (dmin_sq * l).sqrt();
			}
			let k = config.charge * alpha / l;
			fx += dx * k;
			fy += dy * k;
		}
		return (fx, fy);
	}

	let (dx, dy) = (cell.com_x - x, cell.com_y - y);
	let l = dx * dx + dy * dy;
	let side = cell.bounds.side_length();
	let far = !cell.bounds.contains(x, y) && l > 0.0 && side * side < config.theta * config.theta * l;
	if far {
		let l = if l < dmin_sq { (dmin_sq * l).sqrt() } else { l };
		let k = config.charge * cell.count as f64 * alpha / l;
		return (dx * k, dy * k);
	}

	cell.children
		.iter()
		.flatten()
		.map(|child| repulsion(child, i, points, config, alpha))
		.fold((0.0, 0.0), |(ax, ay), (fx, fy)| (ax + fx, ay + fy))
}

fn apply_centering(nodes: &mut [Node], (cx, cy): (f64, f64), strength: f64) {
	if nodes.is_empty() {
		return;
	}
	let n = nodes.len() as f64;
	let (sx, sy) = nodes
		.iter()
		.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
	let (shift_x, shift_y) = ((sx / n - cx) * strength, (sy / n - cy) * strength);
	for node in nodes {
		node.x -= shift_x;
		node.y -= shift_y;
	}
}

fn apply_collision(nodes: &mut [Node], predicted: &mut Vec<(f64, f64)>, config: &SimulationConfig) {
	let reach = config.collision_radius * 2.0;
	if reach <= 0.0 || config.collision_strength <= 0.0 {
		return;
	}
	predicted.clear();
	predicted.extend(nodes.iter().map(|n| (n.x + n.vx, n.y + n.vy)));
	let Some(tree) = QuadNode::build(predicted) else {
		return;
	};

	let mut candidates = Vec::new();
	for i in 0..nodes.len() {
		let (xi, yi) = predicted[i];
		candidates.clear();
		tree.visit_near(xi, yi, reach, &mut |j| {
			if j > i {
				candidates.push(j);
			}
		});

		for &j in &candidates {
			let other = &nodes[j];
			let mut dx = xi - other.x - other.vx;
			let mut dy = yi - other.y - other.vy;
			let mut l = dx * dx + dy * dy;
			if l >= reach * reach {
				continue;
			}
			if dx == 0.0 {
				dx = jiggle(i * 5 + j);
				l += dx * dx;
			}
			if dy == 0.0 {
				dy = jiggle(j * 3 + i);
				l += dy * dy;
			}
			let d = l.sqrt();
			let k = (reach - d) / d * config.collision_strength;
			// equal radii: each side takes half the correction
			let (px, py) = (dx * k * 0.5, dy * k * 0.5);
			nodes[i].vx += px;
			nodes[i].vy += py;
			nodes[j].vx -= px;
			nodes[j].vy -= py;
		}
	}
}

fn integrate(nodes: &mut [Node], velocity_decay: f64, center: (f64, f64)) {
	let keep = 1.0 - velocity_decay;
	for node in nodes {
		if let Some((px, py)) = node.pinned {
			node.x = px;
			node.y = py;
			node.vx = 0.0;
			node.vy = 0.0;
			continue;
		}

		let (prev_x, prev_y) = (node.x, node.y);
		node.vx *= keep;
		node.vy *= keep;
		node.x += node.vx;
		node.y += node.vy;
		if !(node.x.is_finite() && node.y.is_finite()) {
			warn!("Non-finite position for {}, reverting", node.id);
			(node.x, node.y) = if prev_x.is_finite() && prev_y.is_finite() {
				(prev_x, prev_y)
			} else {
				center
			};
			node.vx = 0.0;
			node.vy = 0.0;
		}
	}
}
