use foundation::{PixelSize, ScreenPoint};

use crate::error::FlowError;
use crate::render::{DrawContext, StrokeStyle};

/// Raster layer owned by the overlay, stacked above the map.
///
/// The driver acquires it on start and releases it on stop; between the two
/// it is the only writer.
pub trait OverlaySurface {
    /// Attaches the surface to the host view.
    fn acquire(&mut self) -> Result<(), FlowError>;
    /// Detaches the surface and frees host resources. Must be idempotent.
    fn release(&mut self);
    /// Backing store size in pixels.
    fn pixel_size(&self) -> PixelSize;
    /// Resizes the backing store; contents are discarded.
    fn resize(&mut self, size: PixelSize);
    /// Drawing context for this frame, or `None` when the host cannot provide
    /// one (detached, lost context).
    fn context(&mut self) -> Option<&mut dyn DrawContext>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(PixelSize),
    Stroke {
        points: Vec<ScreenPoint>,
        style: StrokeStyle,
    },
}

/// Display list of the current frame. A `clear` wipes it, like a canvas.
#[derive(Debug, Default)]
pub struct RecordingContext {
    commands: Vec<DrawCommand>,
    strokes_total: u64,
}

impl RecordingContext {
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn strokes(&self) -> impl Iterator<Item = (&[ScreenPoint], &StrokeStyle)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Stroke { points, style } => Some((points.as_slice(), style)),
            DrawCommand::Clear(_) => None,
        })
    }

    pub fn strokes_total(&self) -> u64 {
        self.strokes_total
    }
}

impl DrawContext for RecordingContext {
    fn clear(&mut self, size: PixelSize) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(size));
    }

    fn stroke_polyline(&mut self, points: &[ScreenPoint], style: &StrokeStyle) {
        self.strokes_total += 1;
        self.commands.push(DrawCommand::Stroke {
            points: points.to_vec(),
            style: *style,
        });
    }
}

/// Headless surface that records draw calls; used by the native tool and
/// tests.
#[derive(Debug)]
pub struct RecordingSurface {
    size: PixelSize,
    attached: bool,
    context_available: bool,
    acquire_count: u32,
    release_count: u32,
    ctx: RecordingContext,
}

impl RecordingSurface {
    pub fn new(size: PixelSize) -> Self {
        Self {
            size,
            attached: false,
            context_available: true,
            acquire_count: 0,
            release_count: 0,
            ctx: RecordingContext::default(),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Simulates a lost or unavailable 2D context.
    pub fn set_context_available(&mut self, available: bool) {
        self.context_available = available;
    }

    pub fn recording(&self) -> &RecordingContext {
        &self.ctx
    }

    pub fn acquire_count(&self) -> u32 {
        self.acquire_count
    }

    pub fn release_count(&self) -> u32 {
        self.release_count
    }
}

impl OverlaySurface for RecordingSurface {
    fn acquire(&mut self) -> Result<(), FlowError> {
        if !self.attached {
            self.attached = true;
            self.acquire_count += 1;
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.attached {
            self.attached = false;
            self.release_count += 1;
            self.ctx.commands.clear();
        }
    }

    fn pixel_size(&self) -> PixelSize {
        self.size
    }

    fn resize(&mut self, size: PixelSize) {
        self.size = size;
        self.ctx.commands.clear();
    }

    fn context(&mut self) -> Option<&mut dyn DrawContext> {
        if self.attached && self.context_available {
            Some(&mut self.ctx)
        } else {
            None
        }
    }
}
