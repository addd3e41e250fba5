use foundation::math::{
    MERCATOR_MAX_LAT_DEG, MERCATOR_WORLD_WIDTH_M, clamp, inverse_mercator_lat_deg,
    inverse_mercator_lon_deg, mercator_x_m, mercator_y_m, wrap_dx_m, wrap_lon_deg,
};
use foundation::{GeoBounds, GeoPoint, PixelSize, ScreenPoint};

use crate::{Projection, ViewportProvider};

/// Edge length of one slippy-map tile in pixels; zoom 0 shows the whole world
/// in a single tile.
pub const TILE_SIZE_PX: f64 = 256.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MercatorCamera {
    pub center: GeoPoint,
    /// Fractional slippy-map zoom level.
    pub zoom: f64,
}

impl MercatorCamera {
    pub fn new(center: GeoPoint, zoom: f64) -> Self {
        Self { center, zoom }
    }

    pub fn scale_px_per_m(&self) -> f64 {
        (TILE_SIZE_PX * 2f64.powf(self.zoom) / MERCATOR_WORLD_WIDTH_M).max(1e-12)
    }
}

/// Web Mercator map view: camera plus container size.
#[derive(Debug, Clone, PartialEq)]
pub struct MercatorViewport {
    camera: MercatorCamera,
    size: PixelSize,
    attached: bool,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl MercatorViewport {
    pub fn new(camera: MercatorCamera, size: PixelSize) -> Self {
        Self {
            camera,
            size,
            attached: true,
            min_zoom: 0.0,
            max_zoom: 22.0,
        }
    }

    pub fn camera(&self) -> MercatorCamera {
        self.camera
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn resize(&mut self, size: PixelSize) {
        self.size = size;
    }

    /// Simulates the container leaving the layout (`container_size` → `None`).
    pub fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    fn half_extent_px(&self) -> (f64, f64) {
        (0.5 * self.size.width as f64, 0.5 * self.size.height as f64)
    }

    fn center_m(&self) -> (f64, f64) {
        (
            mercator_x_m(self.camera.center.lon_deg),
            mercator_y_m(self.camera.center.lat_deg),
        )
    }

    /// Inverse of [`Projection::project`]. Longitude is left unwrapped so a
    /// rectangle built from two screen corners keeps `west <= east`.
    pub fn screen_to_geo(&self, p: ScreenPoint) -> GeoPoint {
        let scale = self.camera.scale_px_per_m();
        let (hw, hh) = self.half_extent_px();
        let (cx, cy) = self.center_m();
        let x_m = cx + (p.x - hw) / scale;
        let y_m = cy + (hh - p.y) / scale;
        GeoPoint::new(
            clamp(
                inverse_mercator_lat_deg(y_m),
                -MERCATOR_MAX_LAT_DEG,
                MERCATOR_MAX_LAT_DEG,
            ),
            inverse_mercator_lon_deg(x_m),
        )
    }

    /// Unpadded visible rectangle.
    pub fn visible_bounds(&self) -> GeoBounds {
        let w = self.size.width as f64;
        let h = self.size.height as f64;
        GeoBounds::new(
            self.screen_to_geo(ScreenPoint::new(0.0, 0.0)),
            self.screen_to_geo(ScreenPoint::new(w, h)),
        )
    }

    /// Drag the map by a pointer delta; content follows the cursor.
    pub fn pan_by_pixels(&mut self, delta_x_px: f64, delta_y_px: f64) {
        let scale = self.camera.scale_px_per_m();
        let (cx, cy) = self.center_m();
        let center_x = cx - delta_x_px / scale;
        // Screen-down is Mercator-south, so dragging down moves the center north.
        let center_y = cy + delta_y_px / scale;

        let half_h_m = 0.5 * self.size.height as f64 / scale;
        self.camera.center = GeoPoint::new(
            inverse_mercator_lat_deg(clamp_center_y_for_extent(center_y, half_h_m)),
            wrap_lon_deg(inverse_mercator_lon_deg(center_x)),
        );
    }

    /// Zoom by `delta_zoom` levels keeping the geography under `(x_px, y_px)`
    /// fixed on screen.
    pub fn zoom_at(&mut self, x_px: f64, y_px: f64, delta_zoom: f64) {
        let (hw, hh) = self.half_extent_px();
        let scale = self.camera.scale_px_per_m();
        let (cx, cy) = self.center_m();
        let p_x_m = cx + (x_px - hw) / scale;
        let p_y_m = cy + (hh - y_px) / scale;

        let zoom = clamp(self.camera.zoom + delta_zoom, self.min_zoom, self.max_zoom);
        let next = MercatorCamera { zoom, ..self.camera };
        let next_scale = next.scale_px_per_m();
        let next_center_x = p_x_m - (x_px - hw) / next_scale;
        let next_center_y = p_y_m - (hh - y_px) / next_scale;

        let half_h_m = hh / next_scale;
        self.camera = MercatorCamera {
            center: GeoPoint::new(
                inverse_mercator_lat_deg(clamp_center_y_for_extent(next_center_y, half_h_m)),
                wrap_lon_deg(inverse_mercator_lon_deg(next_center_x)),
            ),
            zoom,
        };
    }
}

/// Clamp center_y so the visible extent stays inside the Mercator square.
fn clamp_center_y_for_extent(center_y: f64, half_h_m: f64) -> f64 {
    let max_y = mercator_y_m(MERCATOR_MAX_LAT_DEG);
    let max_center = max_y - half_h_m;
    let min_center = -max_y + half_h_m;
    if min_center > max_center {
        0.0
    } else {
        clamp(center_y, min_center, max_center)
    }
}

impl Projection for MercatorViewport {
    fn project(&self, geo: GeoPoint) -> ScreenPoint {
        let scale = self.camera.scale_px_per_m();
        let (hw, hh) = self.half_extent_px();
        let (cx, cy) = self.center_m();
        let dx = wrap_dx_m(mercator_x_m(geo.lon_deg) - cx);
        let dy = mercator_y_m(geo.lat_deg) - cy;
        ScreenPoint::new(hw + dx * scale, hh - dy * scale)
    }
}

impl ViewportProvider for MercatorViewport {
    fn padded_bounds(&self, pad_ratio: f64) -> GeoBounds {
        self.visible_bounds().pad(pad_ratio)
    }

    fn container_size(&self) -> Option<PixelSize> {
        self.attached.then_some(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::{MercatorCamera, MercatorViewport};
    use crate::{Projection, ViewportProvider};
    use foundation::{GeoPoint, PixelSize, ScreenPoint};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn beijing() -> MercatorViewport {
        MercatorViewport::new(
            MercatorCamera::new(GeoPoint::new(39.915, 116.404), 16.0),
            PixelSize::new(800, 600),
        )
    }

    #[test]
    fn center_projects_to_middle_of_container() {
        let vp = beijing();
        let p = vp.project(GeoPoint::new(39.915, 116.404));
        assert_close(p.x, 400.0, 1e-6);
        assert_close(p.y, 300.0, 1e-6);
    }

    #[test]
    fn north_east_is_up_and_right() {
        let vp = beijing();
        let p = vp.project(GeoPoint::new(39.916, 116.405));
        assert!(p.x > 400.0);
        assert!(p.y < 300.0);
    }

    #[test]
    fn screen_to_geo_inverts_project() {
        let vp = beijing();
        let g = GeoPoint::new(39.9140, 116.4020);
        let back = vp.screen_to_geo(vp.project(g));
        assert_close(back.lat_deg, g.lat_deg, 1e-9);
        assert_close(back.lon_deg, g.lon_deg, 1e-9);
    }

    #[test]
    fn pan_moves_projected_geography_with_the_cursor() {
        let mut vp = beijing();
        let g = GeoPoint::new(39.9140, 116.4020);
        let before = vp.project(g);
        vp.pan_by_pixels(120.0, -45.0);
        let after = vp.project(g);
        assert_close(after.x - before.x, 120.0, 1e-6);
        assert_close(after.y - before.y, -45.0, 1e-6);
    }

    #[test]
    fn zoom_at_keeps_anchor_fixed() {
        let mut vp = beijing();
        let anchor = ScreenPoint::new(200.0, 150.0);
        let geo = vp.screen_to_geo(anchor);
        vp.zoom_at(anchor.x, anchor.y, 1.5);
        assert_close(vp.camera().zoom, 17.5, 1e-12);
        let p = vp.project(geo);
        assert_close(p.x, anchor.x, 1e-6);
        assert_close(p.y, anchor.y, 1e-6);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = beijing();
        vp.zoom_at(400.0, 300.0, 100.0);
        assert_eq!(vp.camera().zoom, vp.max_zoom);
    }

    #[test]
    fn padded_bounds_contain_visible_bounds() {
        let vp = beijing();
        let visible = vp.visible_bounds();
        let padded = vp.padded_bounds(0.4);
        assert!(visible.contains(GeoPoint::new(39.915, 116.404)));
        assert!(padded.north > visible.north && padded.south < visible.south);
        assert!(padded.east > visible.east && padded.west < visible.west);
        assert_close(padded.lon_span(), visible.lon_span() * 1.8, 1e-12);
    }

    #[test]
    fn container_size_tracks_attachment_and_resize() {
        let mut vp = beijing();
        assert_eq!(vp.container_size(), Some(PixelSize::new(800, 600)));
        vp.resize(PixelSize::new(400, 300));
        assert_eq!(vp.container_size(), Some(PixelSize::new(400, 300)));
        vp.set_attached(false);
        assert_eq!(vp.container_size(), None);
    }
}
