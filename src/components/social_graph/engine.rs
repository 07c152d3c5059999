//! One mounted visualization: graph, simulation, interaction state, draw
//! surface, overlays and the frame loop, with a single teardown path.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};

use super::config::SimulationConfig;
use super::interaction::{InteractionController, PointerInput};
use super::overlay::{DetailCard, OverlayBackend, OverlayContent, OverlaySlot, Overlays};
use super::preprocess::build_graph;
use super::render::{DrawSurface, RenderBinder};
use super::scheduler::FrameScheduler;
use super::simulation::Simulation;
use super::types::AgentRecord;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

struct Scene<S, O: OverlayBackend> {
	simulation: Simulation,
	interaction: InteractionController,
	binder: RenderBinder,
	surface: S,
	overlays: Overlays<O>,
	viewport: Viewport,
	needs_redraw: bool,
	settled: bool,
}

impl<S: DrawSurface, O: OverlayBackend> Scene<S, O> {
	/// One scheduled frame: tick while the layout is warm, otherwise only
	/// redraw when interaction changed something.
	fn frame(&mut self) {
		if self.simulation.is_settled() {
			if self.needs_redraw {
				self.redraw();
			}
			return;
		}
		let alpha = self.simulation.tick();
		self.on_tick(alpha);
	}

	fn on_tick(&mut self, alpha: f64) {
		self.redraw();
		let settled = self.simulation.is_settled();
		if settled && !self.settled {
			debug!("Layout settled at alpha {alpha:.4}");
		}
		self.settled = settled;
	}

	fn redraw(&mut self) {
		let frame = self.binder.compose(
			&self.simulation,
			&self.interaction,
			self.viewport.width,
			self.viewport.height,
		);
		self.surface.present(frame);
		self.needs_redraw = false;
	}

	fn after_input(&mut self, changed: bool) {
		if !changed {
			return;
		}
		self.needs_redraw = true;

		let graph = self.simulation.graph();
		let pointer = self.interaction.pointer();
		let page = (pointer.page_x, pointer.page_y);
		let tooltip = self
			.interaction
			.hovered_edge()
			.and_then(|e| graph.edges.get(e))
			.map(|edge| OverlayContent::Strength(edge.strength));
		let card = self
			.interaction
			.hovered()
			.and_then(|i| graph.nodes.get(i))
			.map(|node| OverlayContent::Agent(DetailCard::for_node(node)));
		self.overlays.sync(OverlaySlot::Tooltip, tooltip, page);
		self.overlays.sync(OverlaySlot::DetailCard, card, page);
	}
}

pub struct GraphEngine<S, O, F>
where
	S: DrawSurface + 'static,
	O: OverlayBackend + 'static,
	F: FrameScheduler,
{
	scene: Rc<RefCell<Scene<S, O>>>,
	scheduler: F,
	mounted: bool,
}

impl<S, O, F> GraphEngine<S, O, F>
where
	S: DrawSurface + 'static,
	O: OverlayBackend + 'static,
	F: FrameScheduler,
{
	/// Build the graph from `records` and start the frame loop. An empty
	/// record list mounts an inert engine: one blank frame, no overlays, no loop.
	pub fn mount(
		records: &[AgentRecord],
		viewport: Viewport,
		config: SimulationConfig,
		surface: S,
		overlays: O,
		mut scheduler: F,
	) -> Self {
		let graph = build_graph(records);
		info!(
			"Mounting social graph: {} agents, {} relationships",
			graph.nodes.len(),
			graph.edges.len()
		);
		let inert = graph.is_empty();

		let mut overlays = Overlays::new(overlays);
		if !inert {
			overlays.attach();
		}
		let scene = Rc::new(RefCell::new(Scene {
			simulation: Simulation::new(graph, config, viewport.width, viewport.height),
			interaction: InteractionController::default(),
			binder: RenderBinder::default(),
			surface,
			overlays,
			viewport,
			needs_redraw: true,
			settled: false,
		}));
		scene.borrow_mut().redraw();

		if !inert {
			let weak = Rc::downgrade(&scene);
			scheduler.start(Box::new(move || {
				let Some(scene) = weak.upgrade() else {
					return;
				};
				if let Ok(mut scene) = scene.try_borrow_mut() {
					scene.frame();
				}
			}));
		}

		Self {
			scene,
			scheduler,
			mounted: true,
		}
	}

	pub fn pointer_down(&self, p: PointerInput) {
		self.with_input(|simulation, interaction| interaction.pointer_down(simulation, p));
	}

	pub fn pointer_move(&self, p: PointerInput) {
		self.with_input(|simulation, interaction| interaction.pointer_move(simulation, p));
	}

	pub fn pointer_up(&self, p: PointerInput) {
		self.with_input(|simulation, interaction| interaction.pointer_up(simulation, p));
	}

	pub fn pointer_leave(&self) {
		self.with_input(|simulation, interaction| interaction.pointer_leave(simulation));
	}

	pub fn wheel(&self, delta_y: f64, delta_mode: u32, p: PointerInput) {
		self.with_input(|_, interaction| interaction.wheel(delta_y, delta_mode, p));
	}

	pub fn pinch(&self, ratio: f64, center_x: f64, center_y: f64) {
		self.with_input(|_, interaction| interaction.pinch(ratio, center_x, center_y));
	}

	/// Stop the loop and remove everything the engine created. Idempotent.
	/// If the scene is borrowed mid-frame only the loop stops; the next call
	/// (at the latest the one on drop) finishes the job.
	pub fn teardown(&mut self) {
		if !self.mounted {
			return;
		}
		if self.scheduler.is_active() {
			self.scheduler.stop();
		}
		let Ok(mut scene) = self.scene.try_borrow_mut() else {
			warn!("Social graph busy mid-frame; overlays detach on the next teardown");
			return;
		};
		scene.overlays.detach_all();
		scene.surface.detach();
		drop(scene);
		self.mounted = false;
		debug!("Social graph torn down");
	}

	fn with_input(&self, f: impl FnOnce(&mut Simulation, &mut InteractionController) -> bool) {
		if !self.mounted {
			return;
		}
		let Ok(mut scene) = self.scene.try_borrow_mut() else {
			return;
		};
		let scene = &mut *scene;
		let changed = f(&mut scene.simulation, &mut scene.interaction);
		scene.after_input(changed);
	}
}

impl<S, O, F> Drop for GraphEngine<S, O, F>
where
	S: DrawSurface + 'static,
	O: OverlayBackend + 'static,
	F: FrameScheduler,
{
	fn drop(&mut self) {
		self.teardown();
	}
}
