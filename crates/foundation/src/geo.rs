/// Geographic coordinate in degrees (WGS84 lat/lon).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl GeoPoint {
    pub const fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }

    /// Component-wise offset in degrees.
    pub fn offset(self, d_lat_deg: f64, d_lon_deg: f64) -> Self {
        Self::new(self.lat_deg + d_lat_deg, self.lon_deg + d_lon_deg)
    }

    pub fn is_finite(&self) -> bool {
        self.lat_deg.is_finite() && self.lon_deg.is_finite()
    }
}

/// Geographic rectangle, edges in degrees.
///
/// The rectangle does not wrap across the antimeridian: `west <= east` for any
/// bounds built through [`GeoBounds::new`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    /// Builds bounds from any two opposite corners.
    pub fn new(a: GeoPoint, b: GeoPoint) -> Self {
        Self {
            north: a.lat_deg.max(b.lat_deg),
            south: a.lat_deg.min(b.lat_deg),
            east: a.lon_deg.max(b.lon_deg),
            west: a.lon_deg.min(b.lon_deg),
        }
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            0.5 * (self.north + self.south),
            0.5 * (self.east + self.west),
        )
    }

    /// Expands every edge outward by `ratio` times the span of its axis.
    ///
    /// Matches the slippy-map `pad(bufferRatio)` convention: a ratio of 0.4
    /// turns a span of 1.0 into 1.8.
    pub fn pad(&self, ratio: f64) -> Self {
        let dlat = self.lat_span().abs() * ratio;
        let dlon = self.lon_span().abs() * ratio;
        Self {
            north: self.north + dlat,
            south: self.south - dlat,
            east: self.east + dlon,
            west: self.west - dlon,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: GeoPoint) -> bool {
        p.lat_deg >= self.south
            && p.lat_deg <= self.north
            && p.lon_deg >= self.west
            && p.lon_deg <= self.east
    }

    /// Point at fractional position `(u, v)` inside the rectangle, where
    /// `(0, 0)` is the south-west corner and `(1, 1)` the north-east corner.
    pub fn lerp(&self, u: f64, v: f64) -> GeoPoint {
        GeoPoint::new(
            self.south + v * self.lat_span(),
            self.west + u * self.lon_span(),
        )
    }
}
