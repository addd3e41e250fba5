//! Geo-anchored wind trails.
//!
//! A fixed population of agents drifts with a constant wind in geographic
//! coordinates; each frame their recent positions are re-projected through
//! the host map and stroked as fading comets on an overlay surface.

pub mod config;
pub mod driver;
pub mod error;
pub mod lifecycle;
pub mod particle;
pub mod render;
pub mod surface;

pub use config::{FlowConfig, Rgba, TrailStyle, WindVector};
pub use driver::{AnimationDriver, DriverState, SkipReason, TickOutcome};
pub use error::FlowError;
pub use lifecycle::{Advance, Lifecycle, RecycleCause};
pub use particle::{Agent, ParticleStore, Trail};
pub use render::{
    ColorStop, DrawContext, FadeEnvelope, LineCap, LinearGradient, StrokeStyle, TrailDraw,
    TrailRenderer, life_alpha,
};
pub use surface::{DrawCommand, OverlaySurface, RecordingContext, RecordingSurface};
