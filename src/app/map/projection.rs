use std::f64::consts::PI;

use eframe::egui::{Pos2, Rect, Vec2, pos2};

const TILE_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_78;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct GeoPoint {
    pub(in crate::app) lat: f64,
    pub(in crate::app) lon: f64,
}

impl GeoPoint {
    pub(in crate::app) const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub(in crate::app) fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.lat.abs() <= 90.0
            && self.lon.abs() <= 180.0
    }
}

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Web Mercator pixel coordinates of `point` at `zoom`.
pub(in crate::app) fn project(point: GeoPoint, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (point.lon + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

pub(in crate::app) fn unproject(x: f64, y: f64, zoom: f64) -> GeoPoint {
    let size = world_size(zoom);
    let lon = x / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * y / size;
    let lat = n.sinh().atan().to_degrees();
    GeoPoint::new(lat, lon)
}

/// Center and zoom of the map; zoom follows the slippy-map convention.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct MapCamera {
    pub(in crate::app) center: GeoPoint,
    pub(in crate::app) zoom: f64,
}

impl MapCamera {
    pub(in crate::app) fn to_screen(&self, rect: Rect, point: GeoPoint) -> Pos2 {
        let (cx, cy) = project(self.center, self.zoom);
        let (x, y) = project(point, self.zoom);
        let center = rect.center();
        pos2(center.x + (x - cx) as f32, center.y + (y - cy) as f32)
    }

    pub(in crate::app) fn to_geo(&self, rect: Rect, position: Pos2) -> GeoPoint {
        let (cx, cy) = project(self.center, self.zoom);
        let offset = position - rect.center();
        unproject(cx + offset.x as f64, cy + offset.y as f64, self.zoom)
    }

    pub(in crate::app) fn pan_by(&mut self, delta: Vec2) {
        let (cx, cy) = project(self.center, self.zoom);
        let size = world_size(self.zoom);
        let x = (cx - delta.x as f64).rem_euclid(size);
        let y = (cy - delta.y as f64).clamp(0.0, size);
        self.center = unproject(x, y, self.zoom);
    }

    /// Changes zoom keeping the location under `pointer` fixed on screen.
    pub(in crate::app) fn zoom_about(&mut self, rect: Rect, pointer: Pos2, zoom: f64) {
        let anchor = self.to_geo(rect, pointer);
        self.zoom = zoom;
        let drift = self.to_screen(rect, anchor) - pointer;
        self.pan_by(-drift);
    }

    /// Longitude/latitude step for grid lines roughly `pixels` apart.
    pub(in crate::app) fn graticule_step(&self, pixels: f64) -> f64 {
        let degrees = pixels / world_size(self.zoom) * 360.0;
        [0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 30.0]
            .into_iter()
            .find(|step| *step >= degrees)
            .unwrap_or(30.0)
    }
}
