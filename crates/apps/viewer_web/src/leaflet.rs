//! Viewport backed by a Leaflet `L.Map` handle.
//!
//! Only the public map API is touched (`getBounds`, `LatLngBounds.pad`,
//! `latLngToContainerPoint`), looked up through `Reflect` so no bindings to
//! the map library are needed.

use std::cell::Cell;

use foundation::{GeoBounds, GeoPoint, PixelSize, ScreenPoint};
use viewport::{Projection, ViewportProvider};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlElement;

use flow::FlowError;

fn get(obj: &JsValue, key: &str) -> Result<JsValue, JsValue> {
    js_sys::Reflect::get(obj, &JsValue::from_str(key))
}

fn method(obj: &JsValue, name: &str) -> Result<js_sys::Function, JsValue> {
    get(obj, name)?
        .dyn_into::<js_sys::Function>()
        .map_err(|_| JsValue::from_str(&format!("{name} is not a function")))
}

fn call0(obj: &JsValue, name: &str) -> Result<JsValue, JsValue> {
    method(obj, name)?.call0(obj)
}

fn call1(obj: &JsValue, name: &str, arg: &JsValue) -> Result<JsValue, JsValue> {
    method(obj, name)?.call1(obj, arg)
}

fn number(v: &JsValue) -> Result<f64, JsValue> {
    v.as_f64()
        .ok_or_else(|| JsValue::from_str("expected a number"))
}

#[derive(Debug)]
pub struct JsViewport {
    map: JsValue,
    container: HtmlElement,
    // Last bounds the map reported; reused when a query throws mid-teardown.
    last_bounds: Cell<Option<GeoBounds>>,
}

impl JsViewport {
    pub fn new(map: JsValue, container: HtmlElement) -> Result<Self, FlowError> {
        if map.is_null() || map.is_undefined() {
            return Err(FlowError::ViewportNotReady);
        }
        Ok(Self {
            map,
            container,
            last_bounds: Cell::new(None),
        })
    }

    pub fn container(&self) -> &HtmlElement {
        &self.container
    }

    fn query_padded_bounds(&self, pad_ratio: f64) -> Result<GeoBounds, JsValue> {
        let bounds = call0(&self.map, "getBounds")?;
        let padded = call1(&bounds, "pad", &JsValue::from_f64(pad_ratio))?;
        let north = number(&call0(&padded, "getNorth")?)?;
        let south = number(&call0(&padded, "getSouth")?)?;
        let east = number(&call0(&padded, "getEast")?)?;
        let west = number(&call0(&padded, "getWest")?)?;
        Ok(GeoBounds::new(
            GeoPoint::new(north, east),
            GeoPoint::new(south, west),
        ))
    }

    fn query_container_point(&self, geo: GeoPoint) -> Result<ScreenPoint, JsValue> {
        let latlng = js_sys::Array::of2(
            &JsValue::from_f64(geo.lat_deg),
            &JsValue::from_f64(geo.lon_deg),
        );
        let p = call1(&self.map, "latLngToContainerPoint", &latlng)?;
        Ok(ScreenPoint::new(
            number(&get(&p, "x")?)?,
            number(&get(&p, "y")?)?,
        ))
    }
}

impl Projection for JsViewport {
    fn project(&self, geo: GeoPoint) -> ScreenPoint {
        // Canvas path commands ignore non-finite coordinates.
        self.query_container_point(geo)
            .unwrap_or(ScreenPoint::new(f64::NAN, f64::NAN))
    }
}

impl ViewportProvider for JsViewport {
    fn padded_bounds(&self, pad_ratio: f64) -> GeoBounds {
        match self.query_padded_bounds(pad_ratio) {
            Ok(b) => {
                self.last_bounds.set(Some(b));
                b
            }
            Err(err) => {
                web_sys::console::warn_1(&JsValue::from_str(&format!(
                    "wind overlay: getBounds failed: {:?}",
                    err
                )));
                self.last_bounds
                    .get()
                    .unwrap_or_else(|| GeoBounds::new(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.0)))
            }
        }
    }

    fn container_size(&self) -> Option<PixelSize> {
        if !self.container.is_connected() {
            return None;
        }
        let w = self.container.client_width();
        let h = self.container.client_height();
        if w <= 0 || h <= 0 {
            return None;
        }
        Some(PixelSize::new(w as u32, h as u32))
    }
}
