//! Map viewport seam.
//!
//! The overlay never owns pan/zoom state. It queries a [`ViewportProvider`]
//! once per frame for the padded geographic bounds and projects geography
//! through it. Implementations wrap whatever slippy-map engine hosts the
//! overlay; [`MercatorViewport`] is a self-contained one for native hosts and
//! tests.

pub mod mercator;

pub use mercator::*;

use foundation::{GeoBounds, GeoPoint, PixelSize, ScreenPoint};

/// Current-frame mapping from geography to overlay pixels.
///
/// Results are only valid until the host view changes; callers must not keep
/// them across frames.
pub trait Projection {
    fn project(&self, geo: GeoPoint) -> ScreenPoint;
}

impl<F> Projection for F
where
    F: Fn(GeoPoint) -> ScreenPoint,
{
    fn project(&self, geo: GeoPoint) -> ScreenPoint {
        self(geo)
    }
}

pub trait ViewportProvider: Projection {
    /// Visible geographic rectangle, each edge pushed out by
    /// `pad_ratio` times the span of its axis.
    fn padded_bounds(&self, pad_ratio: f64) -> GeoBounds;

    /// Current pixel size of the map container, or `None` while the container
    /// is detached or not laid out.
    fn container_size(&self) -> Option<PixelSize>;
}
