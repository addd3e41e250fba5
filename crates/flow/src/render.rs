//! Trail stroking.
//!
//! Trails are stored as geography and re-projected on every draw. The map can
//! pan or zoom between two frames; projecting from geographic truth each time
//! is what keeps the strokes glued to the terrain.

use foundation::{PixelSize, ScreenPoint};
use viewport::Projection;

use crate::config::{FlowConfig, Rgba, TrailStyle};
use crate::particle::Agent;

/// Fewer points than this cannot form a visible comet; skipped silently.
pub const MIN_TRAIL_POINTS: usize = 3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

impl LineCap {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Rgba,
}

/// Two-stop linear gradient between screen points.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LinearGradient {
    pub from: ScreenPoint,
    pub to: ScreenPoint,
    pub stops: [ColorStop; 2],
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StrokeStyle {
    pub gradient: LinearGradient,
    pub line_width: f64,
    pub line_cap: LineCap,
}

/// Immediate-mode 2D drawing target for one frame.
pub trait DrawContext {
    /// Clears the whole surface to transparent.
    fn clear(&mut self, size: PixelSize);
    /// Strokes one open polyline through `points`.
    fn stroke_polyline(&mut self, points: &[ScreenPoint], style: &StrokeStyle);
}

/// Life-fraction opacity curve: linear fade in, plateau, linear fade out.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FadeEnvelope {
    pub fade_in: f64,
    pub fade_out: f64,
    pub base_alpha: f64,
}

impl FadeEnvelope {
    pub fn from_config(config: &FlowConfig) -> Self {
        Self {
            fade_in: config.fade_in,
            fade_out: config.fade_out,
            base_alpha: config.base_alpha,
        }
    }

    pub fn alpha(&self, life_fraction: f64) -> f64 {
        let f = life_fraction;
        if !f.is_finite() {
            return 0.0;
        }
        let alpha = if f < self.fade_in {
            f / self.fade_in * self.base_alpha
        } else if f > self.fade_out {
            (1.0 - f) / (1.0 - self.fade_out) * self.base_alpha
        } else {
            self.base_alpha
        };
        alpha.clamp(0.0, self.base_alpha)
    }
}

impl Default for FadeEnvelope {
    fn default() -> Self {
        Self::from_config(&FlowConfig::default())
    }
}

/// Alpha for `f = age / max_age` under the default envelope.
pub fn life_alpha(life_fraction: f64) -> f64 {
    FadeEnvelope::default().alpha(life_fraction)
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TrailDraw {
    Drawn { alpha: f64 },
    Skipped,
}

#[derive(Debug, Clone)]
pub struct TrailRenderer {
    style: TrailStyle,
    envelope: FadeEnvelope,
    line_cap: LineCap,
    // Reused allocation only; rewritten from scratch by every `draw`.
    scratch: Vec<ScreenPoint>,
}

impl TrailRenderer {
    pub fn new(config: &FlowConfig) -> Self {
        Self {
            style: config.style,
            envelope: FadeEnvelope::from_config(config),
            line_cap: LineCap::Round,
            scratch: Vec::with_capacity(config.trail_capacity),
        }
    }

    pub fn envelope(&self) -> FadeEnvelope {
        self.envelope
    }

    /// Projects `agent`'s trail through `projection` and strokes it as a comet
    /// (transparent tail, brightest head).
    pub fn draw<P>(&mut self, ctx: &mut dyn DrawContext, agent: &Agent, projection: &P) -> TrailDraw
    where
        P: Projection + ?Sized,
    {
        if agent.trail.len() < MIN_TRAIL_POINTS {
            return TrailDraw::Skipped;
        }

        self.scratch.clear();
        self.scratch
            .extend(agent.trail.iter().map(|g| projection.project(*g)));

        let (Some(&from), Some(&to)) = (self.scratch.first(), self.scratch.last()) else {
            return TrailDraw::Skipped;
        };

        let alpha = self.envelope.alpha(agent.life_fraction());
        let style = StrokeStyle {
            gradient: LinearGradient {
                from,
                to,
                stops: [
                    ColorStop {
                        offset: 0.0,
                        color: self.style.tail_color.with_alpha(0.0),
                    },
                    ColorStop {
                        offset: 1.0,
                        color: self.style.head_color.with_alpha(alpha),
                    },
                ],
            },
            line_width: self.style.line_width,
            line_cap: self.line_cap,
        };
        ctx.stroke_polyline(&self.scratch, &style);
        TrailDraw::Drawn { alpha }
    }
}
