use std::collections::BTreeMap;

use eframe::egui::{Color32, Pos2, Rect};

use crate::palette::{facility_color, status_color};
use crate::supply::{Facility, FacilityType, MovementStatus, VehicleMovement};

use super::super::engine::EngineError;
use super::super::render_utils::distance_to_segment;
use super::credential::validate_token;
use super::projection::{GeoPoint, MapCamera};

pub(in crate::app) const DEFAULT_CENTER: GeoPoint = GeoPoint::new(13.0827, 80.2707);
pub(in crate::app) const DEFAULT_ZOOM: f64 = 10.0;

pub(in crate::app) struct Marker {
    pub(in crate::app) facility_id: String,
    pub(in crate::app) name: String,
    pub(in crate::app) kind: FacilityType,
    pub(in crate::app) position: GeoPoint,
    pub(in crate::app) color: Color32,
}

pub(in crate::app) struct RouteLine {
    pub(in crate::app) movement_id: String,
    pub(in crate::app) from: GeoPoint,
    pub(in crate::app) to: GeoPoint,
    pub(in crate::app) status: MovementStatus,
    pub(in crate::app) color: Color32,
    pub(in crate::app) cargo: String,
}

/// In-process map renderer state: camera plus marker and route registries
/// keyed by facility and movement id.
pub(in crate::app) struct MapEngine {
    token: String,
    camera: MapCamera,
    markers: BTreeMap<String, Marker>,
    routes: BTreeMap<String, RouteLine>,
    marker_ids: Vec<String>,
    route_ids: Vec<String>,
}

impl MapEngine {
    pub(in crate::app) fn initialize(token: &str, camera: MapCamera) -> Result<Self, EngineError> {
        let token = validate_token(token)?;
        if !camera.center.is_valid() || !camera.zoom.is_finite() {
            return Err(EngineError::Initialization(format!(
                "camera position {:?} at zoom {} is not on the map",
                camera.center, camera.zoom
            )));
        }

        tracing::info!(
            lat = camera.center.lat,
            lon = camera.center.lon,
            zoom = camera.zoom,
            "map engine initialized"
        );
        Ok(Self {
            token,
            camera,
            markers: BTreeMap::new(),
            routes: BTreeMap::new(),
            marker_ids: Vec::new(),
            route_ids: Vec::new(),
        })
    }

    /// Token with everything but the last four characters hidden.
    pub(in crate::app) fn masked_token(&self) -> String {
        let visible = self
            .token
            .char_indices()
            .rev()
            .nth(3)
            .map_or(self.token.as_str(), |(index, _)| &self.token[index..]);
        format!("••••{visible}")
    }

    pub(in crate::app) fn camera(&self) -> &MapCamera {
        &self.camera
    }

    pub(in crate::app) fn camera_mut(&mut self) -> &mut MapCamera {
        &mut self.camera
    }

    /// Rebuilds every marker when the facility list changed. Returns whether it did.
    pub(in crate::app) fn sync_markers<'a>(&mut self, facilities: impl IntoIterator<Item = &'a Facility>) -> bool {
        let facilities = facilities.into_iter().collect::<Vec<_>>();
        let ids = facilities
            .iter()
            .map(|facility| facility.id.clone())
            .collect::<Vec<_>>();
        if ids == self.marker_ids {
            return false;
        }

        self.markers.clear();
        for facility in facilities {
            self.markers.insert(
                facility.id.clone(),
                Marker {
                    facility_id: facility.id.clone(),
                    name: facility.name.clone(),
                    kind: facility.kind.clone(),
                    position: GeoPoint::new(facility.latitude, facility.longitude),
                    color: facility_color(&facility.kind),
                },
            );
        }
        self.marker_ids = ids;
        tracing::debug!(markers = self.markers.len(), "map markers rebuilt");
        true
    }

    /// Re-resolves route lines against the current markers. Stale lines are
    /// removed before current ones are added; unresolved movements are skipped.
    pub(in crate::app) fn sync_routes(&mut self, movements: &[VehicleMovement], markers_changed: bool) -> bool {
        let ids = movements
            .iter()
            .map(|movement| movement.id.clone())
            .collect::<Vec<_>>();
        if !markers_changed && ids == self.route_ids {
            return false;
        }

        let mut resolved = BTreeMap::new();
        for movement in movements {
            let (Some(from), Some(to)) = (
                self.markers.get(&movement.source_facility_id),
                self.markers.get(&movement.destination_facility_id),
            ) else {
                tracing::debug!(movement = %movement.id, "route endpoint not on the map");
                continue;
            };
            resolved.insert(
                movement.id.clone(),
                RouteLine {
                    movement_id: movement.id.clone(),
                    from: from.position,
                    to: to.position,
                    status: movement.status,
                    color: status_color(movement.status),
                    cargo: movement.cargo.clone(),
                },
            );
        }

        self.routes.retain(|id, _| resolved.contains_key(id));
        self.routes.extend(resolved);
        self.route_ids = ids;
        true
    }

    pub(in crate::app) fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub(in crate::app) fn routes(&self) -> impl Iterator<Item = &RouteLine> {
        self.routes.values()
    }

    pub(in crate::app) fn marker(&self, facility_id: &str) -> Option<&Marker> {
        self.markers.get(facility_id)
    }

    pub(in crate::app) fn marker_screen_pos(&self, rect: Rect, facility_id: &str) -> Option<Pos2> {
        self.marker(facility_id)
            .map(|marker| self.camera.to_screen(rect, marker.position))
    }

    /// Closest marker within `reach` pixels of `position`.
    pub(in crate::app) fn marker_at(&self, rect: Rect, position: Pos2, reach: f32) -> Option<&Marker> {
        self.markers
            .values()
            .map(|marker| (marker, self.camera.to_screen(rect, marker.position).distance(position)))
            .filter(|(_, distance)| *distance <= reach)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(marker, _)| marker)
    }

    /// Closest route line within `reach` pixels of `position`.
    pub(in crate::app) fn route_at(&self, rect: Rect, position: Pos2, reach: f32) -> Option<&RouteLine> {
        self.routes
            .values()
            .map(|route| {
                let start = self.camera.to_screen(rect, route.from);
                let end = self.camera.to_screen(rect, route.to);
                (route, distance_to_segment(position, start, end))
            })
            .filter(|(_, distance)| *distance <= reach)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(route, _)| route)
    }
}
