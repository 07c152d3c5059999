use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Drives the engine once per display frame until stopped.
pub trait FrameScheduler {
	fn start(&mut self, on_frame: Box<dyn FnMut()>);
	/// Cancel any pending frame; no callback runs afterwards. Idempotent.
	fn stop(&mut self);
	fn is_active(&self) -> bool;
}

/// `requestAnimationFrame` loop.
#[derive(Default)]
pub struct AnimationFrameScheduler {
	callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
	handle: Rc<Cell<Option<i32>>>,
	active: Rc<Cell<bool>>,
}

impl AnimationFrameScheduler {
	fn request(callback: &Closure<dyn FnMut()>) -> Option<i32> {
		web_sys::window()?
			.request_animation_frame(callback.as_ref().unchecked_ref())
			.ok()
	}
}

impl FrameScheduler for AnimationFrameScheduler {
	fn start(&mut self, mut on_frame: Box<dyn FnMut()>) {
		self.stop();
		self.active.set(true);

		let (callback, handle, active) = (self.callback.clone(), self.handle.clone(), self.active.clone());
		*self.callback.borrow_mut() = Some(Closure::new(move || {
			handle.set(None);
			if !active.get() {
				return;
			}
			on_frame();
			if !active.get() {
				return;
			}
			if let Some(ref cb) = *callback.borrow() {
				handle.set(Self::request(cb));
			}
		}));

		if let Some(ref cb) = *self.callback.borrow() {
			self.handle.set(Self::request(cb));
		}
	}

	fn stop(&mut self) {
		self.active.set(false);
		if let (Some(id), Some(window)) = (self.handle.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		// drops the closure and with it the cycle through `callback`
		if let Ok(mut slot) = self.callback.try_borrow_mut() {
			slot.take();
		}
	}

	fn is_active(&self) -> bool {
		self.active.get()
	}
}

#[cfg(test)]
pub(super) mod tests {
	use super::*;

	/// Scheduler fired by hand from tests.
	#[derive(Clone, Default)]
	pub struct ManualScheduler {
		on_frame: Rc<RefCell<Option<Box<dyn FnMut()>>>>,
		active: Rc<Cell<bool>>,
		pub starts: Rc<Cell<usize>>,
	}

	impl ManualScheduler {
		/// Run one frame; false when nothing is scheduled.
		pub fn fire(&self) -> bool {
			if !self.active.get() {
				return false;
			}
			let Some(mut frame) = self.on_frame.borrow_mut().take() else {
				return false;
			};
			frame();
			if self.active.get() {
				self.on_frame.borrow_mut().get_or_insert(frame);
			}
			true
		}
	}

	impl FrameScheduler for ManualScheduler {
		fn start(&mut self, on_frame: Box<dyn FnMut()>) {
			self.starts.set(self.starts.get() + 1);
			self.active.set(true);
			*self.on_frame.borrow_mut() = Some(on_frame);
		}

		fn stop(&mut self) {
			self.active.set(false);
			self.on_frame.borrow_mut().take();
		}

		fn is_active(&self) -> bool {
			self.active.get()
		}
	}

	#[test]
	fn manual_scheduler_stops_for_good() {
		let count = Rc::new(Cell::new(0));
		let mut scheduler = ManualScheduler::default();
		let seen = count.clone();
		scheduler.start(Box::new(move || seen.set(seen.get() + 1)));
		assert!(scheduler.fire());
		assert!(scheduler.fire());
		scheduler.stop();
		scheduler.stop();
		assert!(!scheduler.fire());
		assert_eq!(count.get(), 2);
		assert!(!scheduler.is_active());
	}
}
