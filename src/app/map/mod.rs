mod credential;
mod engine;
mod popup;
mod projection;

use eframe::egui::{
    self, Align2, Color32, FontId, Key, PointerButton, Pos2, Rect, Sense, Stroke, Ui, vec2,
};

use crate::palette::ACCENT_BRIGHT;
use crate::supply::VehicleMovement;
use crate::transform::GraphElements;

use super::ViewEvent;
use super::engine::{EngineEvent, EngineHandle};
use super::render_utils::{circle_visible, segment_visible, with_alpha};
use super::ui::notices::NoticeLevel;
use super::ui::zoom::ZoomControl;

pub(in crate::app) use credential::MapCredential;
use engine::{DEFAULT_CENTER, MapEngine};
use popup::FacilityPopup;
use projection::{GeoPoint, MapCamera};

const MARKER_RADIUS: f32 = 7.0;
const SELECTED_MARKER_RADIUS: f32 = 11.0;
const MARKER_REACH: f32 = 14.0;
const ROUTE_REACH: f32 = 5.0;
const MAP_BACKGROUND: Color32 = Color32::from_rgb(0x0d, 0x15, 0x22);
const GRATICULE: Color32 = Color32::from_rgba_premultiplied(40, 60, 80, 90);

/// Per-frame inputs the map view reads from the view model.
pub(in crate::app) struct MapFrame<'a> {
    /// Facilities that pass the map search, as transform-layer nodes.
    pub(in crate::app) elements: &'a GraphElements,
    pub(in crate::app) revision: u64,
    pub(in crate::app) movements: &'a [VehicleMovement],
    pub(in crate::app) selected: Option<&'a str>,
    pub(in crate::app) zoom: &'a ZoomControl,
    /// A text field held keyboard focus when the frame began.
    pub(in crate::app) keyboard_busy: bool,
}

/// The geographic view: token gate, map engine, markers, routes and the facility popup.
pub(in crate::app) struct MapView {
    credential: MapCredential,
    engine: EngineHandle<MapEngine>,
    started: bool,
    synced_revision: Option<u64>,
    popup: Option<FacilityPopup>,
    recenter_requested: bool,
}

impl MapView {
    pub(in crate::app) fn new(credential: MapCredential) -> Self {
        Self {
            credential,
            engine: EngineHandle::new("map"),
            started: false,
            synced_revision: None,
            popup: None,
            recenter_requested: false,
        }
    }

    pub(in crate::app) fn credential(&self) -> &MapCredential {
        &self.credential
    }

    pub(in crate::app) fn is_loading(&self) -> bool {
        self.engine.is_initializing()
    }

    /// Masked form of the token the running engine was built with.
    pub(in crate::app) fn masked_token(&self) -> Option<String> {
        self.engine.get().map(MapEngine::masked_token)
    }

    /// Forgets the current token; the prompt returns on the next frame.
    pub(in crate::app) fn change_token(&mut self) {
        self.credential.forget();
        self.teardown();
    }

    pub(in crate::app) fn teardown(&mut self) {
        self.engine.teardown();
        self.started = false;
        self.synced_revision = None;
        self.popup = None;
        self.recenter_requested = false;
    }

    /// Moves the camera back to the selected marker, or the default center, on the next frame.
    pub(in crate::app) fn request_recenter(&mut self) {
        self.recenter_requested = true;
    }

    fn start(&mut self, token: String, zoom: f32) {
        self.teardown();
        self.started = true;
        let camera = MapCamera {
            center: DEFAULT_CENTER,
            zoom: f64::from(zoom),
        };
        self.engine
            .initialize(move || MapEngine::initialize(&token, camera));
    }

    pub(in crate::app) fn show(&mut self, ui: &mut Ui, frame: MapFrame<'_>) -> Vec<ViewEvent> {
        let mut events = Vec::new();

        match self.engine.poll() {
            Some(EngineEvent::Ready) => events.push(ViewEvent::Notice {
                level: NoticeLevel::Info,
                title: "Map Loaded".to_owned(),
                body: "Facilities and routes are on the map.".to_owned(),
            }),
            Some(EngineEvent::Failed(error)) => {
                self.credential.reject(&error);
                self.started = false;
                events.push(ViewEvent::Notice {
                    level: NoticeLevel::Error,
                    title: "Map Error".to_owned(),
                    body: error.to_string(),
                });
            }
            None => {}
        }

        let Some(token) = self.credential.active().map(str::to_owned) else {
            if let Some(token) = self.credential.draw_prompt(ui) {
                self.start(token, frame.zoom.value());
            }
            return events;
        };
        if !self.started {
            self.start(token, frame.zoom.value());
        }

        let ctx = ui.ctx().clone();
        let now = ctx.input(|input| input.time);
        let Some(engine) = self.engine.get_mut() else {
            ui.vertical_centered(|ui| {
                ui.add_space(120.0);
                ui.spinner();
                ui.label("Loading map...");
            });
            ctx.request_repaint();
            return events;
        };

        if self.synced_revision != Some(frame.revision) {
            let changed = engine.sync_markers(frame.elements.nodes.iter().map(|node| &node.details));
            engine.sync_routes(frame.movements, changed);
            self.synced_revision = Some(frame.revision);
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        if (engine.camera().zoom as f32 - frame.zoom.value()).abs() > f32::EPSILON {
            engine.camera_mut().zoom = f64::from(frame.zoom.value());
        }

        // Follow selection made elsewhere (search, side panel).
        let popup_id = self.popup.as_ref().map(|popup| popup.facility_id().to_owned());
        if popup_id.as_deref() != frame.selected {
            self.popup = frame.selected.and_then(|id| {
                let marker = engine.marker(id)?;
                let position = marker.position;
                engine.camera_mut().center = position;
                Some(FacilityPopup::new(id.to_owned(), rect.center()))
            });
        }

        if std::mem::take(&mut self.recenter_requested) {
            let center = frame
                .selected
                .and_then(|id| engine.marker(id))
                .map_or(DEFAULT_CENTER, |marker| marker.position);
            engine.camera_mut().center = center;
        }

        // Outside clicks count on release.
        let (escape, clicked_at) = ctx.input(|input| {
            (
                !frame.keyboard_busy && input.key_pressed(Key::Escape),
                input
                    .pointer
                    .any_click()
                    .then(|| input.pointer.interact_pos())
                    .flatten(),
            )
        });
        let clicked_outside = match (&self.popup, clicked_at) {
            (Some(popup), Some(position)) => popup.is_outside(position),
            _ => false,
        };
        if self.popup.is_some() && (escape || clicked_outside) {
            self.popup = None;
            events.push(ViewEvent::Select(None));
        }

        if response.hovered() {
            let scroll = ctx.input(|input| input.smooth_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                let (min, max) = frame.zoom.bounds();
                let next = (engine.camera().zoom + f64::from(scroll) * 0.004)
                    .clamp(f64::from(min), f64::from(max));
                let pointer = response.hover_pos().unwrap_or_else(|| rect.center());
                engine.camera_mut().zoom_about(rect, pointer, next);
                events.push(ViewEvent::Zoom(next as f32));
            }
        }
        if response.dragged_by(PointerButton::Primary) || response.dragged_by(PointerButton::Middle) {
            engine.camera_mut().pan_by(response.drag_delta());
        }

        if response.clicked_by(PointerButton::Primary)
            && let Some(position) = response.interact_pointer_pos()
            && let Some(marker) = engine.marker_at(rect, position, MARKER_REACH)
        {
            let id = marker.facility_id.clone();
            let anchor = engine.camera().to_screen(rect, marker.position);
            tracing::debug!(facility = %id, "map marker clicked");
            self.popup = Some(FacilityPopup::new(id.clone(), anchor));
            events.push(ViewEvent::Select(Some(id)));
        }

        let hovered = if self.popup.is_none() {
            response
                .hover_pos()
                .and_then(|position| engine.marker_at(rect, position, MARKER_REACH))
                .map(|marker| marker.facility_id.clone())
        } else {
            None
        };
        if hovered.is_some() {
            ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        let selected = self.popup.as_ref().map(|popup| popup.facility_id().to_owned());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, MAP_BACKGROUND);
        draw_graticule(&painter, rect, engine.camera());
        draw_routes(&painter, rect, engine);
        draw_markers(&painter, rect, engine, selected.as_deref(), hovered.as_deref(), now);
        if selected.is_some() {
            ctx.request_repaint();
        }

        if let Some(position) = response.hover_pos() {
            let tooltip = match &hovered {
                Some(id) => engine
                    .marker(id)
                    .map(|marker| format!("{}  ({})", marker.name, marker.kind.label())),
                None if self.popup.is_none() => engine
                    .route_at(rect, position, ROUTE_REACH)
                    .map(|route| format!("{}  |  {}", route.cargo, route.status.label())),
                None => None,
            };
            if let Some(tooltip) = tooltip {
                painter.text(
                    position + vec2(14.0, -14.0),
                    Align2::LEFT_BOTTOM,
                    tooltip,
                    FontId::proportional(13.0),
                    Color32::from_gray(240),
                );
            }
        }

        let center = engine.camera().center;
        painter.text(
            rect.left_bottom() + vec2(10.0, -8.0),
            Align2::LEFT_BOTTOM,
            format!(
                "{:.4}, {:.4}  |  zoom {:.1}  |  {} markers, {} routes",
                center.lat,
                center.lon,
                engine.camera().zoom,
                engine.markers().count(),
                engine.routes().count()
            ),
            FontId::monospace(11.0),
            Color32::from_gray(170),
        );

        if let Some(popup) = self.popup.as_mut() {
            let anchor = engine.marker_screen_pos(rect, popup.facility_id());
            let facility = frame
                .elements
                .nodes
                .iter()
                .find(|node| node.id == popup.facility_id())
                .map(|node| &node.details);
            match (anchor, facility) {
                (Some(anchor), Some(facility)) => {
                    popup.follow(anchor);
                    let movement_count = frame
                        .movements
                        .iter()
                        .filter(|movement| {
                            movement.source_facility_id == facility.id
                                || movement.destination_facility_id == facility.id
                        })
                        .count();
                    if popup.show(&ctx, rect, facility, movement_count) {
                        self.popup = None;
                        events.push(ViewEvent::Select(None));
                    }
                }
                _ => self.popup = None,
            }
        }

        events
    }
}

fn draw_graticule(painter: &egui::Painter, rect: Rect, camera: &MapCamera) {
    let step = camera.graticule_step(120.0);
    let top_left = camera.to_geo(rect, rect.left_top());
    let bottom_right = camera.to_geo(rect, rect.right_bottom());
    let stroke = Stroke::new(1.0, GRATICULE);

    let mut lon = (top_left.lon / step).floor() * step;
    while lon <= bottom_right.lon {
        let x = camera.to_screen(rect, GeoPoint::new(top_left.lat, lon)).x;
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        lon += step;
    }
    let mut lat = (bottom_right.lat / step).floor() * step;
    while lat <= top_left.lat {
        let y = camera.to_screen(rect, GeoPoint::new(lat, top_left.lon)).y;
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        lat += step;
    }
}

fn draw_routes(painter: &egui::Painter, rect: Rect, engine: &MapEngine) {
    let camera = engine.camera();
    for route in engine.routes() {
        let start = camera.to_screen(rect, route.from);
        let end = camera.to_screen(rect, route.to);
        if !segment_visible(rect, start, end, 6.0) {
            continue;
        }
        painter.line_segment([start, end], Stroke::new(7.0, with_alpha(route.color, 45)));
        painter.line_segment([start, end], Stroke::new(2.5, route.color));
    }
}

fn draw_markers(
    painter: &egui::Painter,
    rect: Rect,
    engine: &MapEngine,
    selected: Option<&str>,
    hovered: Option<&str>,
    now: f64,
) {
    let camera = engine.camera();
    // Selected marker last so it sits on top.
    let ordered = engine
        .markers()
        .filter(|marker| Some(marker.facility_id.as_str()) != selected)
        .chain(selected.and_then(|id| engine.marker(id)));

    for marker in ordered {
        let position = camera.to_screen(rect, marker.position);
        if !circle_visible(rect, position, SELECTED_MARKER_RADIUS * 2.0) {
            continue;
        }
        let is_selected = Some(marker.facility_id.as_str()) == selected;
        let is_hovered = Some(marker.facility_id.as_str()) == hovered;

        if is_selected {
            let pulse = ((now * 3.0).sin() as f32 + 1.0) * 0.5;
            painter.circle_stroke(
                position,
                SELECTED_MARKER_RADIUS + 4.0 + pulse * 6.0,
                Stroke::new(2.0, with_alpha(ACCENT_BRIGHT, (80.0 + pulse * 140.0) as u8)),
            );
            painter.circle(
                position,
                SELECTED_MARKER_RADIUS,
                marker.color,
                Stroke::new(2.5, Color32::WHITE),
            );
            painter.text(
                position + vec2(0.0, SELECTED_MARKER_RADIUS + 6.0),
                Align2::CENTER_TOP,
                marker.name.as_str(),
                FontId::proportional(13.0),
                Color32::WHITE,
            );
        } else {
            let radius = if is_hovered { MARKER_RADIUS + 2.0 } else { MARKER_RADIUS };
            painter.circle(
                position,
                radius,
                marker.color,
                Stroke::new(1.5, Color32::from_rgba_unmultiplied(10, 14, 20, 220)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use eframe::egui::{Event, Modifiers, Vec2, vec2};
    use egui_kittest::{Harness, kittest::Queryable as _};

    use super::*;
    use crate::supply::load_dataset;
    use crate::transform::{drop_unresolved, to_elements};

    const SCREEN: Vec2 = vec2(800.0, 600.0);

    struct Fixture {
        view: MapView,
        elements: GraphElements,
        movements: Vec<VehicleMovement>,
        zoom: ZoomControl,
        selected: Option<String>,
        keyboard_busy: bool,
        events: Vec<ViewEvent>,
    }

    fn harness() -> Harness<'static, Fixture> {
        let dataset = load_dataset(None).unwrap();
        let fixture = Fixture {
            view: MapView::new(MapCredential::load(None, Some("pk.test-token"))),
            elements: drop_unresolved(&to_elements(&dataset.facilities, &dataset.movements)),
            movements: dataset.movements,
            zoom: ZoomControl::map(),
            selected: None,
            keyboard_busy: false,
            events: Vec::new(),
        };

        let mut harness = Harness::builder().with_size(SCREEN).build_state(
            |ctx, fixture: &mut Fixture| {
                egui::CentralPanel::default()
                    .frame(egui::Frame::NONE)
                    .show(ctx, |ui| {
                        let events = fixture.view.show(
                            ui,
                            MapFrame {
                                elements: &fixture.elements,
                                revision: 1,
                                movements: &fixture.movements,
                                selected: fixture.selected.as_deref(),
                                zoom: &fixture.zoom,
                                keyboard_busy: fixture.keyboard_busy,
                            },
                        );
                        for event in events {
                            if let ViewEvent::Select(selected) = &event {
                                fixture.selected = selected.clone();
                            }
                            fixture.events.push(event);
                        }
                    });
            },
            fixture,
        );

        for _ in 0..500 {
            harness.step();
            if harness.state().view.engine.get().is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(harness.state().view.engine.get().is_some(), "map engine never became ready");
        harness
    }

    fn select(harness: &mut Harness<'_, Fixture>, id: &str) {
        harness.state_mut().selected = Some(id.to_owned());
        harness.run_steps(2);
        let popup = harness.state().view.popup.as_ref().map(|popup| popup.facility_id().to_owned());
        assert_eq!(popup.as_deref(), Some(id));
        harness.state_mut().events.clear();
    }

    /// A map point with no marker under it and outside the open popup.
    fn empty_spot(fixture: &Fixture) -> Pos2 {
        let rect = Rect::from_min_size(Pos2::ZERO, SCREEN);
        let engine = fixture.view.engine.get().unwrap();
        let popup = fixture.view.popup.as_ref().unwrap();
        (1..40)
            .flat_map(|x| (1..30).map(move |y| Pos2::new(x as f32 * 20.0, y as f32 * 20.0)))
            .find(|&position| {
                popup.is_outside(position) && engine.marker_at(rect, position, MARKER_REACH * 2.0).is_none()
            })
            .unwrap()
    }

    fn pointer(harness: &mut Harness<'_, Fixture>, position: Pos2, pressed: bool) {
        let events = &mut harness.input_mut().events;
        events.push(Event::PointerMoved(position));
        events.push(Event::PointerButton {
            pos: position,
            button: PointerButton::Primary,
            pressed,
            modifiers: Modifiers::NONE,
        });
    }

    #[test]
    fn click_outside_popup_clears_selection_on_release() {
        let mut harness = harness();
        select(&mut harness, "mf1");

        let spot = empty_spot(harness.state());
        pointer(&mut harness, spot, true);
        harness.step();
        assert_eq!(harness.state().selected.as_deref(), Some("mf1"));

        pointer(&mut harness, spot, false);
        harness.step();
        assert_eq!(harness.state().selected, None);
        assert!(harness.state().view.popup.is_none());
        assert!(harness.state().events.contains(&ViewEvent::Select(None)));
    }

    #[test]
    fn escape_and_close_button_dismiss_popup() {
        let mut harness = harness();
        select(&mut harness, "mf1");
        harness.key_press(Key::Escape);
        harness.step();
        assert_eq!(harness.state().selected, None);
        assert_eq!(harness.state().events, vec![ViewEvent::Select(None)]);

        select(&mut harness, "dc1");
        harness.get_by_label("✕").click();
        harness.run_steps(2);
        assert_eq!(harness.state().selected, None);
        assert!(harness.state().view.popup.is_none());
    }

    #[test]
    fn escape_is_ignored_while_a_text_field_has_focus() {
        let mut harness = harness();
        select(&mut harness, "mf1");
        harness.state_mut().keyboard_busy = true;
        harness.key_press(Key::Escape);
        harness.step();
        assert_eq!(harness.state().selected.as_deref(), Some("mf1"));
        assert!(harness.state().events.is_empty());
    }

    #[test]
    fn recenter_returns_to_selection_or_default_center() {
        let mut harness = harness();
        let away = GeoPoint::new(20.0, 70.0);

        harness.state_mut().view.engine.get_mut().unwrap().camera_mut().center = away;
        harness.state_mut().view.request_recenter();
        harness.step();
        assert_eq!(harness.state().view.engine.get().unwrap().camera().center, DEFAULT_CENTER);

        select(&mut harness, "dc1");
        harness.state_mut().view.engine.get_mut().unwrap().camera_mut().center = away;
        harness.step();
        assert_eq!(harness.state().view.engine.get().unwrap().camera().center, away);

        harness.state_mut().view.request_recenter();
        harness.step();
        let fixture = harness.state();
        let engine = fixture.view.engine.get().unwrap();
        assert_eq!(engine.camera().center, engine.marker("dc1").unwrap().position);
    }
}
