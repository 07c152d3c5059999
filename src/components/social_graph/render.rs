use std::f64::consts::{PI, TAU};

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::interaction::{InteractionController, NodeState, ViewTransform};
use super::simulation::Simulation;

pub const BASE_RADIUS: f64 = 5.0;
pub const HOVER_RADIUS: f64 = 7.0;
const NODE_FILL: &str = "#2ff79b";
const HOVER_FILL: &str = "#ff6666";
const LABEL_FILL: &str = "#555";
const WEAK_EDGE: [f64; 3] = [47.0, 127.0, 247.0];
const STRONG_EDGE: [f64; 3] = [255.0, 0.0, 138.0];

/// Circle radius for a node; isolated nodes still get the degree-1 size.
pub fn node_radius(degree: usize, hovered: bool) -> f64 {
	let scale = if hovered { HOVER_RADIUS } else { BASE_RADIUS };
	(degree.max(1) as f64).sqrt() * scale
}

pub fn edge_width(strength: f64) -> f64 {
	strength * 4.0
}

/// Blue for weak ties through to magenta for strong ones.
pub fn edge_color(strength: f64) -> String {
	let t = strength.clamp(0.0, 1.0);
	let [r, g, b]: [u8; 3] =
		std::array::from_fn(|i| (WEAK_EDGE[i] + (STRONG_EDGE[i] - WEAK_EDGE[i]) * t).round() as u8);
	format!("rgb({r}, {g}, {b})")
}

/// Clockwise circular arc from source to target with radius equal to the chord.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeArc {
	pub cx: f64,
	pub cy: f64,
	pub radius: f64,
	pub start_angle: f64,
	pub end_angle: f64,
}

impl EdgeArc {
	pub fn between(x1: f64, y1: f64, x2: f64, y2: f64) -> Option<Self> {
		let (dx, dy) = (x2 - x1, y2 - y1);
		let chord = dx.hypot(dy);
		if !chord.is_finite() || chord < 1e-6 {
			return None;
		}
		let (tx, ty) = (dx / chord, dy / chord);
		// center sits on the perpendicular bisector, sqrt(3)/2 of the chord away
		let h = chord * 3f64.sqrt() / 2.0;
		let (cx, cy) = ((x1 + x2) / 2.0 - ty * h, (y1 + y2) / 2.0 + tx * h);
		let start_angle = (y1 - cy).atan2(x1 - cx);
		let sweep = ((y2 - cy).atan2(x2 - cx) - start_angle).rem_euclid(TAU);
		Some(Self {
			cx,
			cy,
			radius: chord,
			start_angle,
			end_angle: start_angle + sweep,
		})
	}

	/// Distance from a point to the arc, if the point lies within its angular span.
	pub fn distance_to(&self, x: f64, y: f64) -> Option<f64> {
		let offset = ((y - self.cy).atan2(x - self.cx) - self.start_angle).rem_euclid(TAU);
		(offset <= self.end_angle - self.start_angle)
			.then(|| ((x - self.cx).hypot(y - self.cy) - self.radius).abs())
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
	Edge {
		arc: EdgeArc,
		width: f64,
		color: String,
		/// Strength-based stroke opacity times the selection fade.
		opacity: f64,
	},
	Node {
		x: f64,
		y: f64,
		radius: f64,
		fill: &'static str,
		opacity: f64,
		state: NodeState,
	},
	Label {
		x: f64,
		y: f64,
		text: String,
	},
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
	pub width: f64,
	pub height: f64,
	pub transform: ViewTransform,
	pub commands: Vec<DrawCommand>,
}

/// Anything frames can be pushed to.
pub trait DrawSurface {
	fn present(&mut self, frame: &Frame);
	/// Wipe everything this surface drew; safe to call repeatedly.
	fn detach(&mut self);
}

/// Turns simulation and interaction state into draw commands.
#[derive(Debug, Default)]
pub struct RenderBinder {
	frame: Frame,
}

impl RenderBinder {
	pub fn compose(
		&mut self,
		sim: &Simulation,
		interaction: &InteractionController,
		width: f64,
		height: f64,
	) -> &Frame {
		let graph = sim.graph();
		let frame = &mut self.frame;
		frame.width = width;
		frame.height = height;
		frame.transform = interaction.transform();
		frame.commands.clear();

		for (i, edge) in graph.edges.iter().enumerate() {
			let (s, t) = (&graph.nodes[edge.source], &graph.nodes[edge.target]);
			let Some(arc) = EdgeArc::between(s.x, s.y, t.x, t.y) else {
				continue;
			};
			frame.commands.push(DrawCommand::Edge {
				arc,
				width: edge_width(edge.strength),
				color: edge_color(edge.strength),
				opacity: edge.strength * interaction.edge_opacity(graph, i),
			});
		}

		for (i, node) in graph.nodes.iter().enumerate() {
			let state = interaction.node_state(i);
			let hovered = state == NodeState::Hovered;
			frame.commands.push(DrawCommand::Node {
				x: node.x,
				y: node.y,
				radius: node_radius(node.degree, hovered),
				fill: if hovered { HOVER_FILL } else { NODE_FILL },
				opacity: interaction.node_opacity(i),
				state,
			});
			frame.commands.push(DrawCommand::Label {
				x: node.x,
				y: node.y,
				text: node.name.clone(),
			});
		}

		&self.frame
	}
}

pub struct CanvasSurface {
	ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
	pub fn new(ctx: CanvasRenderingContext2d) -> Self {
		Self { ctx }
	}

	fn clear(&self, width: f64, height: f64) {
		let _ = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
		self.ctx.set_global_alpha(1.0);
		self.ctx.clear_rect(0.0, 0.0, width, height);
	}

	fn draw_node(&self, x: f64, y: f64, radius: f64, fill: &str, opacity: f64, state: NodeState, k: f64) {
		let ctx = &self.ctx;
		ctx.set_global_alpha(opacity);

		if state == NodeState::Hovered {
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, radius * 2.2) {
				let _ = gradient.add_color_stop(0.0, "rgba(255, 102, 102, 0.35)");
				let _ = gradient.add_color_stop(1.0, "rgba(255, 102, 102, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, radius * 2.2, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(fill);
		ctx.fill();

		if state == NodeState::Dragging {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(3.0 / k),
				&JsValue::from_f64(2.0 / k),
			));
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(LABEL_FILL);
			ctx.set_line_width(1.0 / k);
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}
		ctx.set_global_alpha(1.0);
	}
}

impl DrawSurface for CanvasSurface {
	fn present(&mut self, frame: &Frame) {
		let ctx = &self.ctx;
		self.clear(frame.width, frame.height);
		ctx.save();
		let _ = ctx.translate(frame.transform.x, frame.transform.y);
		let _ = ctx.scale(frame.transform.k, frame.transform.k);
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		ctx.set_font("12px sans-serif");

		for command in &frame.commands {
			match command {
				DrawCommand::Edge {
					arc,
					width,
					color,
					opacity,
				} => {
					ctx.set_global_alpha(*opacity);
					ctx.set_stroke_style_str(color);
					ctx.set_line_width(*width);
					ctx.begin_path();
					let _ = ctx.arc(arc.cx, arc.cy, arc.radius, arc.start_angle, arc.end_angle);
					ctx.stroke();
				}
				DrawCommand::Node {
					x,
					y,
					radius,
					fill,
					opacity,
					state,
				} => self.draw_node(*x, *y, *radius, fill, *opacity, *state, frame.transform.k),
				DrawCommand::Label { x, y, text } => {
					ctx.set_global_alpha(1.0);
					ctx.set_fill_style_str(LABEL_FILL);
					let _ = ctx.fill_text(text, *x, *y);
				}
			}
		}
		ctx.restore();
	}

	fn detach(&mut self) {
		if let Some(canvas) = self.ctx.canvas() {
			self.clear(canvas.width() as f64, canvas.height() as f64);
		}
	}
}
