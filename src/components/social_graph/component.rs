use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, Touch, TouchEvent, WheelEvent, Window,
};

use super::config::SimulationConfig;
use super::engine::{GraphEngine, Viewport};
use super::interaction::PointerInput;
use super::overlay::DomOverlays;
use super::render::CanvasSurface;
use super::scheduler::AnimationFrameScheduler;
use super::types::AgentRecord;

type CanvasEngine = GraphEngine<CanvasSurface, DomOverlays, AnimationFrameScheduler>;

fn window_size(window: &Window) -> Option<(f64, f64)> {
	let w = window.inner_width().ok()?.as_f64()?;
	let h = window.inner_height().ok()?.as_f64()?;
	Some((w, h))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

/// Pointer sample relative to the canvas, from client and page coordinates.
fn pointer_at(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	client: (i32, i32),
	page: (i32, i32),
) -> Option<PointerInput> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some(PointerInput {
		x: client.0 as f64 - rect.left(),
		y: client.1 as f64 - rect.top(),
		page_x: page.0 as f64,
		page_y: page.1 as f64,
	})
}

fn touch_pointer(canvas_ref: NodeRef<leptos::html::Canvas>, touch: &Touch) -> Option<PointerInput> {
	pointer_at(
		canvas_ref,
		(touch.client_x(), touch.client_y()),
		(touch.page_x(), touch.page_y()),
	)
}

/// Span and canvas-relative midpoint of the first two touches.
fn pinch_span(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &TouchEvent) -> Option<(f64, f64, f64)> {
	let touches = ev.touches();
	let a = touch_pointer(canvas_ref, &touches.get(0)?)?;
	let b = touch_pointer(canvas_ref, &touches.get(1)?)?;
	Some((
		(b.x - a.x).hypot(b.y - a.y),
		(a.x + b.x) / 2.0,
		(a.y + b.y) / 2.0,
	))
}

#[component]
pub fn SocialGraphCanvas(
	/// `None` while the records are still loading.
	#[prop(into)]
	agents: Signal<Option<Vec<AgentRecord>>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(optional)] config: SimulationConfig,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let engine: Rc<RefCell<Option<CanvasEngine>>> = Rc::new(RefCell::new(None));
	let config = config.sanitized();

	let engine_mount = engine.clone();
	Effect::new(move |_| {
		let agents = agents.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		// a previous engine never outlives its replacement's mount
		if let Some(mut previous) = engine_mount.borrow_mut().take() {
			previous.teardown();
		}
		let Some(agents) = agents else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let fallback = || {
			canvas
				.parent_element()
				.map(|p| (p.client_width() as f64, p.client_height() as f64))
				.filter(|&(w, h)| w > 0.0 && h > 0.0)
				.unwrap_or((800.0, 600.0))
		};
		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or_else(fallback)
		} else {
			let (pw, ph) = fallback();
			(width.unwrap_or(pw), height.unwrap_or(ph))
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = context_2d(&canvas) else {
			log::warn!("Canvas has no 2D context; social graph not mounted");
			return;
		};
		*engine_mount.borrow_mut() = Some(GraphEngine::mount(
			&agents,
			Viewport {
				width: w,
				height: h,
			},
			config,
			CanvasSurface::new(ctx),
			DomOverlays::default(),
			AnimationFrameScheduler::default(),
		));
	});

	let engine_cleanup = StoredValue::new_local(engine.clone());
	on_cleanup(move || {
		let _ = engine_cleanup.try_with_value(|engine| {
			if let Some(mut engine) = engine.try_borrow_mut().ok().and_then(|mut e| e.take()) {
				engine.teardown();
			}
		});
	});

	// Runs `f` against the mounted engine, if any.
	let with_engine = {
		let engine = engine.clone();
		move |f: &dyn Fn(&CanvasEngine)| {
			if let Ok(engine) = engine.try_borrow() {
				if let Some(engine) = engine.as_ref() {
					f(engine);
				}
			}
		}
	};
	let mouse = move |ev: &MouseEvent| {
		pointer_at(
			canvas_ref,
			(ev.client_x(), ev.client_y()),
			(ev.page_x(), ev.page_y()),
		)
	};

	let on_mousedown = {
		let with_engine = with_engine.clone();
		move |ev: MouseEvent| {
			if let Some(p) = mouse(&ev) {
				with_engine(&|e| e.pointer_down(p));
			}
		}
	};
	let on_mousemove = {
		let with_engine = with_engine.clone();
		move |ev: MouseEvent| {
			if let Some(p) = mouse(&ev) {
				with_engine(&|e| e.pointer_move(p));
			}
		}
	};
	let on_mouseup = {
		let with_engine = with_engine.clone();
		move |ev: MouseEvent| {
			if let Some(p) = mouse(&ev) {
				with_engine(&|e| e.pointer_up(p));
			}
		}
	};
	let on_mouseleave = {
		let with_engine = with_engine.clone();
		move |_: MouseEvent| with_engine(&|e| e.pointer_leave())
	};
	let on_wheel = {
		let with_engine = with_engine.clone();
		move |ev: WheelEvent| {
			ev.prevent_default();
			if let Some(p) = mouse(&ev) {
				with_engine(&|e| e.wheel(ev.delta_y(), ev.delta_mode(), p));
			}
		}
	};

	let pinch: Rc<Cell<Option<f64>>> = Rc::new(Cell::new(None));
	let last_touch: Rc<Cell<Option<PointerInput>>> = Rc::new(Cell::new(None));
	let on_touchstart = {
		let (with_engine, pinch, last_touch) = (with_engine.clone(), pinch.clone(), last_touch.clone());
		move |ev: TouchEvent| {
			ev.prevent_default();
			if ev.touches().length() >= 2 {
				with_engine(&|e| e.pointer_leave());
				pinch.set(pinch_span(canvas_ref, &ev).map(|(span, ..)| span));
				return;
			}
			let Some(p) = ev.touches().get(0).and_then(|t| touch_pointer(canvas_ref, &t)) else {
				return;
			};
			last_touch.set(Some(p));
			with_engine(&|e| e.pointer_down(p));
		}
	};
	let on_touchmove = {
		let (with_engine, pinch, last_touch) = (with_engine.clone(), pinch.clone(), last_touch.clone());
		move |ev: TouchEvent| {
			ev.prevent_default();
			if let Some(previous) = pinch.get() {
				let Some((span, cx, cy)) = pinch_span(canvas_ref, &ev) else {
					return;
				};
				if previous > 0.0 {
					with_engine(&|e| e.pinch(span / previous, cx, cy));
				}
				pinch.set(Some(span));
				return;
			}
			let Some(p) = ev.touches().get(0).and_then(|t| touch_pointer(canvas_ref, &t)) else {
				return;
			};
			last_touch.set(Some(p));
			with_engine(&|e| e.pointer_move(p));
		}
	};
	let on_touchend = {
		let (with_engine, pinch, last_touch) = (with_engine.clone(), pinch.clone(), last_touch.clone());
		move |ev: TouchEvent| {
			if ev.touches().length() > 0 {
				return;
			}
			if pinch.take().is_some() {
				last_touch.set(None);
				return;
			}
			match last_touch.take() {
				Some(p) => with_engine(&|e| e.pointer_up(p)),
				None => with_engine(&|e| e.pointer_leave()),
			}
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="social-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend.clone()
			on:touchcancel=on_touchend
			style="display: block; cursor: grab; touch-action: none;"
		/>
	}
}
