use std::cell::RefCell;
use std::rc::Rc;

use console_error_panic_hook::set_once;
use flow::{AnimationDriver, FlowConfig, FlowError};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

mod canvas;
mod leaflet;
mod raf;

use canvas::CanvasOverlay;
use leaflet::JsViewport;
use raf::{FrameCallback, RafClock};

type WebDriver = AnimationDriver<JsViewport, CanvasOverlay, RafClock>;

fn to_js(err: FlowError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen(start)]
pub fn init() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Wind-trail layer over a Leaflet map.
///
/// ```js
/// const overlay = new WindTrailOverlay(map, map.getContainer());
/// overlay.start();
/// // on unmount:
/// overlay.stop();
/// overlay.free();
/// ```
#[wasm_bindgen]
pub struct WindTrailOverlay {
    driver: Rc<RefCell<WebDriver>>,
    // Keeps the frame closure alive as long as the overlay.
    _callback: FrameCallback,
}

#[wasm_bindgen]
impl WindTrailOverlay {
    /// `config_json` overrides any subset of the defaults returned by
    /// `defaultConfig()`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        map: JsValue,
        container: HtmlElement,
        config_json: Option<String>,
    ) -> Result<WindTrailOverlay, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let mut config = match config_json.as_deref() {
            Some(text) => FlowConfig::from_json_str(text).map_err(to_js)?,
            None => FlowConfig::default(),
        };
        if config.seed.is_none() {
            config.seed = Some((js_sys::Math::random() * (1u64 << 53) as f64) as u64);
        }

        let viewport = JsViewport::new(map, container.clone()).map_err(to_js)?;
        let surface = CanvasOverlay::new(document, container);
        let callback: FrameCallback = Rc::new(RefCell::new(None));
        let clock = RafClock::new(window, callback.clone());

        let driver = AnimationDriver::new(config, viewport, surface, clock).map_err(to_js)?;
        let driver = Rc::new(RefCell::new(driver));

        // Weak: the driver owns the clock, which owns this closure.
        let weak = Rc::downgrade(&driver);
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            let Some(driver) = weak.upgrade() else {
                return;
            };
            if let Ok(mut d) = driver.try_borrow_mut() {
                d.on_frame();
            }
        }) as Box<dyn FnMut()>));

        Ok(WindTrailOverlay {
            driver,
            _callback: callback,
        })
    }

    pub fn start(&self) -> Result<(), JsValue> {
        self.driver.borrow_mut().start().map_err(to_js)
    }

    pub fn stop(&self) {
        self.driver.borrow_mut().stop();
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.driver.borrow().is_running()
    }

    /// Counters and gauges as JSON, for debugging overlays.
    pub fn stats(&self) -> Result<String, JsValue> {
        let snapshot = self.driver.borrow().metrics().snapshot();
        serde_json::to_string(&snapshot).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl Drop for WindTrailOverlay {
    fn drop(&mut self) {
        if let Ok(mut d) = self.driver.try_borrow_mut() {
            d.stop();
        }
    }
}

#[wasm_bindgen(js_name = defaultConfig)]
pub fn default_config() -> Result<String, JsValue> {
    FlowConfig::default().to_json_pretty().map_err(to_js)
}
