//! Scoped handles for browser callbacks.
//!
//! Both guards release their callback when stopped or dropped, so a closed
//! canvas never leaves a frame request or window listener behind.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use web_sys::Window;

type FrameSlot = RefCell<Option<Closure<dyn FnMut()>>>;

/// A `requestAnimationFrame` loop that runs until [`AnimationLoop::stop`].
pub struct AnimationLoop {
	frame: Rc<FrameSlot>,
	pending: Rc<Cell<Option<i32>>>,
}

impl AnimationLoop {
	pub fn start(window: &Window, mut on_frame: impl FnMut() + 'static) -> Option<Self> {
		let frame: Rc<FrameSlot> = Rc::new(RefCell::new(None));
		let pending = Rc::new(Cell::new(None));
		let (slot, pending_inner): (Weak<FrameSlot>, _) = (Rc::downgrade(&frame), pending.clone());

		*frame.borrow_mut() = Some(Closure::new(move || {
			pending_inner.set(None);
			on_frame();
			let Some(slot) = slot.upgrade() else {
				return;
			};
			if let Some(ref cb) = *slot.borrow() {
				let next = web_sys::window()
					.and_then(|w| w.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
				pending_inner.set(next);
			}
		}));

		let first = frame
			.borrow()
			.as_ref()
			.and_then(|cb| window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		if first.is_none() {
			log::warn!("requestAnimationFrame unavailable; render loop not started");
			return None;
		}
		pending.set(first);
		log::debug!("render loop started");
		Some(Self { frame, pending })
	}

	pub fn is_running(&self) -> bool {
		self.frame.borrow().is_some()
	}

	/// Cancels the queued frame and releases the callback. Idempotent.
	pub fn stop(&self) {
		if let Some(id) = self.pending.take() {
			if let Some(window) = web_sys::window() {
				let _ = window.cancel_animation_frame(id);
			}
		}
		if self.frame.borrow_mut().take().is_some() {
			log::debug!("render loop stopped");
		}
	}
}

impl Drop for AnimationLoop {
	fn drop(&mut self) {
		self.stop();
	}
}

/// A window event listener removed on drop.
pub struct WindowListener {
	window: Window,
	event: &'static str,
	callback: Closure<dyn FnMut()>,
}

impl WindowListener {
	pub fn add(window: &Window, event: &'static str, handler: impl FnMut() + 'static) -> Self {
		let callback = Closure::<dyn FnMut()>::new(handler);
		let _ = window.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref());
		Self {
			window: window.clone(),
			event,
			callback,
		}
	}
}

impl Drop for WindowListener {
	fn drop(&mut self) {
		let _ = self
			.window
			.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
	}
}
