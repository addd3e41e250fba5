//! Spherical Web Mercator helpers (EPSG:3857).

/// WGS84 semi-major axis (meters); also the Web Mercator sphere radius.
pub const WGS84_A: f64 = 6_378_137.0;

/// Latitude where the square Web Mercator world ends.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.05112878;

/// Circumference of the Mercator world along the equator (meters).
pub const MERCATOR_WORLD_WIDTH_M: f64 = 2.0 * std::f64::consts::PI * WGS84_A;

pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

pub fn wrap_lon_deg(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

pub fn is_mercator_lat_valid(lat_deg: f64) -> bool {
    lat_deg.is_finite() && (-MERCATOR_MAX_LAT_DEG..=MERCATOR_MAX_LAT_DEG).contains(&lat_deg)
}

pub fn mercator_x_m(lon_deg: f64) -> f64 {
    WGS84_A * lon_deg.to_radians()
}

pub fn mercator_y_m(lat_deg: f64) -> f64 {
    let lat = clamp(lat_deg, -MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG).to_radians();
    WGS84_A * (0.5 * (std::f64::consts::FRAC_PI_2 + lat)).tan().ln()
}

pub fn inverse_mercator_lon_deg(x_m: f64) -> f64 {
    (x_m / WGS84_A).to_degrees()
}

pub fn inverse_mercator_lat_deg(y_m: f64) -> f64 {
    let lat = 2.0 * (y_m / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2;
    lat.to_degrees()
}

/// Wraps a Mercator x offset into `[-world/2, +world/2]`.
pub fn wrap_dx_m(dx: f64) -> f64 {
    let ww = MERCATOR_WORLD_WIDTH_M;
    (dx + 0.5 * ww).rem_euclid(ww) - 0.5 * ww
}
