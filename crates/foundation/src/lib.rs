pub mod geo;
pub mod math;
pub mod screen;

// Foundation crate: small, well-tested primitives only.
pub use geo::*;
pub use screen::*;
