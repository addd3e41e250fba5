use flow::{DrawContext, FlowError, OverlaySurface, StrokeStyle};
use foundation::{PixelSize, ScreenPoint};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement};

/// Above tiles (200) and vector overlays (400), below markers (600).
const OVERLAY_Z_INDEX: u32 = 550;

fn ctx_set_stroke_style(ctx: &CanvasRenderingContext2d, value: &JsValue) {
    let _ = js_sys::Reflect::set(ctx.as_ref(), &JsValue::from_str("strokeStyle"), value);
}

fn js_err(err: JsValue) -> FlowError {
    FlowError::SurfaceUnavailable(format!("{err:?}"))
}

#[derive(Debug)]
pub struct Canvas2d {
    ctx: CanvasRenderingContext2d,
}

impl DrawContext for Canvas2d {
    fn clear(&mut self, size: PixelSize) {
        self.ctx
            .clear_rect(0.0, 0.0, size.width as f64, size.height as f64);
    }

    fn stroke_polyline(&mut self, points: &[ScreenPoint], style: &StrokeStyle) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        let g = &style.gradient;
        let gradient = self
            .ctx
            .create_linear_gradient(g.from.x, g.from.y, g.to.x, g.to.y);
        for stop in &g.stops {
            let _ = gradient.add_color_stop(stop.offset as f32, &stop.color.css());
        }

        self.ctx.begin_path();
        self.ctx.move_to(first.x, first.y);
        for p in rest {
            self.ctx.line_to(p.x, p.y);
        }
        ctx_set_stroke_style(&self.ctx, gradient.as_ref());
        self.ctx.set_line_width(style.line_width);
        self.ctx.set_line_cap(style.line_cap.as_str());
        self.ctx.stroke();
    }
}

/// Transparent `<canvas>` stacked over the map container.
#[derive(Debug)]
pub struct CanvasOverlay {
    document: Document,
    container: HtmlElement,
    canvas: Option<HtmlCanvasElement>,
    ctx: Option<Canvas2d>,
}

impl CanvasOverlay {
    pub fn new(document: Document, container: HtmlElement) -> Self {
        Self {
            document,
            container,
            canvas: None,
            ctx: None,
        }
    }

    fn create_canvas(&self) -> Result<HtmlCanvasElement, FlowError> {
        let canvas = self
            .document
            .create_element("canvas")
            .map_err(js_err)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| FlowError::SurfaceUnavailable("not a canvas element".to_string()))?;
        canvas
            .set_attribute(
                "style",
                &format!(
                    "position:absolute;top:0;left:0;width:100%;height:100%;\
                     pointer-events:none;z-index:{OVERLAY_Z_INDEX};"
                ),
            )
            .map_err(js_err)?;
        canvas
            .set_attribute("aria-hidden", "true")
            .map_err(js_err)?;
        Ok(canvas)
    }
}

impl OverlaySurface for CanvasOverlay {
    fn acquire(&mut self) -> Result<(), FlowError> {
        if self.canvas.is_some() {
            return Ok(());
        }
        let canvas = self.create_canvas()?;
        self.container.append_child(&canvas).map_err(js_err)?;

        // A missing context is not fatal: frames are skipped until one exists.
        self.ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
            .map(|ctx| Canvas2d { ctx });
        self.canvas = Some(canvas);
        Ok(())
    }

    fn release(&mut self) {
        self.ctx = None;
        if let Some(canvas) = self.canvas.take() {
            canvas.remove();
        }
    }

    fn pixel_size(&self) -> PixelSize {
        self.canvas
            .as_ref()
            .map(|c| PixelSize::new(c.width(), c.height()))
            .unwrap_or_default()
    }

    fn resize(&mut self, size: PixelSize) {
        if let Some(canvas) = &self.canvas {
            canvas.set_width(size.width);
            canvas.set_height(size.height);
        }
    }

    fn context(&mut self) -> Option<&mut dyn DrawContext> {
        match self.ctx.as_mut() {
            Some(ctx) => Some(ctx),
            None => None,
        }
    }
}
