use std::cell::RefCell;
use std::rc::Rc;

use runtime::{FrameClock, FrameRequest, ScheduleError};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::Window;

/// Slot holding the per-frame callback. Filled once the driver it calls into
/// exists.
pub type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// `requestAnimationFrame`-backed clock.
pub struct RafClock {
    window: Window,
    callback: FrameCallback,
}

impl RafClock {
    pub fn new(window: Window, callback: FrameCallback) -> Self {
        Self { window, callback }
    }
}

impl FrameClock for RafClock {
    fn request_frame(&mut self) -> Result<FrameRequest, ScheduleError> {
        let slot = self.callback.borrow();
        let cb = slot
            .as_ref()
            .ok_or_else(|| ScheduleError("frame callback not installed".to_string()))?;
        self.window
            .request_animation_frame(cb.as_ref().unchecked_ref())
            .map(FrameRequest)
            .map_err(|err| ScheduleError(format!("{err:?}")))
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let _ = self.window.cancel_animation_frame(request.0);
    }
}
