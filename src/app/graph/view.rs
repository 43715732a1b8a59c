use std::collections::HashMap;

use eframe::egui::{
    self, Align2, Color32, FontId, Key, PointerButton, Pos2, Rect, Sense, Stroke, Ui, Vec2, vec2,
};

use crate::palette::{ACCENT_BRIGHT, SURFACE};
use crate::transform::GraphElements;

use super::super::engine::{EngineEvent, EngineHandle};
use super::super::render_utils::{
    blend_color, circle_visible, dim_color, draw_grid_background, paint_arrow, paint_shape,
    segment_visible, with_alpha,
};
use super::super::ui::details::facility_card;
use super::super::ui::notices::NoticeLevel;
use super::super::ui::placement::place_popup;
use super::super::ui::zoom::ZoomControl;
use super::super::ViewEvent;
use super::menu::{ContextMenu, MenuAction};
use super::{GraphEngine, LayoutKind};

const PANEL_SIZE: Vec2 = Vec2::new(300.0, 330.0);
const SELECT_ZOOM: f32 = 1.25;
const MENU_ZOOM_STEP: f32 = 0.6;

/// Per-frame inputs the graph view reads from the view model.
pub(in crate::app) struct GraphFrame<'a> {
    pub(in crate::app) elements: &'a GraphElements,
    pub(in crate::app) revision: u64,
    pub(in crate::app) selected: Option<&'a str>,
    pub(in crate::app) zoom: &'a ZoomControl,
    pub(in crate::app) layout: LayoutKind,
    pub(in crate::app) live_physics: bool,
}

/// The Bloom canvas: owns its graph engine, drag and context-menu state.
pub(in crate::app) struct GraphView {
    engine: EngineHandle<GraphEngine>,
    started: bool,
    dragging: Option<usize>,
    menu: Option<ContextMenu>,
    hover_suppressed: bool,
    rerun_requested: bool,
    recenter_requested: bool,
}

impl GraphView {
    pub(in crate::app) fn new() -> Self {
        Self {
            engine: EngineHandle::new("graph"),
            started: false,
            dragging: None,
            menu: None,
            hover_suppressed: false,
            rerun_requested: false,
            recenter_requested: false,
        }
    }

    pub(in crate::app) fn request_rerun(&mut self) {
        self.rerun_requested = true;
    }

    pub(in crate::app) fn request_recenter(&mut self) {
        self.recenter_requested = true;
    }

    fn start(&mut self, layout: LayoutKind, zoom: f32) {
        self.started = true;
        self.engine
            .initialize(move || Ok(GraphEngine::new(layout, zoom)));
    }

    /// Releases the engine; the next `show` constructs a fresh one.
    pub(in crate::app) fn teardown(&mut self) {
        self.engine.teardown();
        self.started = false;
        self.dragging = None;
        self.menu = None;
    }

    pub(in crate::app) fn show(&mut self, ui: &mut Ui, frame: GraphFrame<'_>) -> Vec<ViewEvent> {
        let mut events = Vec::new();
        if !self.started {
            self.start(frame.layout, frame.zoom.value());
        }

        match self.engine.poll() {
            Some(EngineEvent::Ready) => tracing::debug!("graph engine ready"),
            Some(EngineEvent::Failed(error)) => events.push(ViewEvent::Notice {
                level: NoticeLevel::Error,
                title: "Graph Error".to_owned(),
                body: error.to_string(),
            }),
            None => {}
        }

        if let Some(error) = self.engine.error().cloned() {
            ui.vertical_centered(|ui| {
                ui.add_space(120.0);
                ui.heading("The graph could not be prepared");
                ui.label(error.to_string());
                if ui.button("Retry").clicked() {
                    self.start(frame.layout, frame.zoom.value());
                }
            });
            return events;
        }

        let ctx = ui.ctx().clone();
        let (now, delta_seconds) =
            ctx.input(|input| (input.time, input.stable_dt.clamp(1.0 / 240.0, 1.0 / 20.0)));

        let Some(engine) = self.engine.get_mut() else {
            ui.vertical_centered(|ui| {
                ui.add_space(120.0);
                ui.spinner();
                ui.label("Preparing graph...");
            });
            ctx.request_repaint();
            return events;
        };

        if engine.revision() != Some(frame.revision) {
            engine.set_elements(frame.elements, frame.revision, now);
            self.dragging = None;
            self.menu = None;
        }
        engine.set_layout(frame.layout, now);
        if std::mem::take(&mut self.rerun_requested) {
            engine.rerun_layout(now);
        }
        engine.sync_selection(frame.selected);
        engine.apply_zoom(frame.zoom.value());
        if std::mem::take(&mut self.recenter_requested) {
            engine.recenter();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        // Escape and outside presses close the menu before the canvas sees the click.
        let (escape, pressed_at, pointer_moved) = ctx.input(|input| {
            (
                input.key_pressed(Key::Escape),
                input
                    .pointer
                    .any_pressed()
                    .then(|| input.pointer.interact_pos())
                    .flatten(),
                input.pointer.delta() != Vec2::ZERO,
            )
        });
        if escape {
            self.menu = None;
            self.hover_suppressed = true;
        } else if pointer_moved {
            self.hover_suppressed = false;
        }
        if let (Some(menu), Some(position)) = (&self.menu, pressed_at)
            && menu.is_outside(position)
        {
            self.menu = None;
        }

        if response.hovered() {
            let scroll = ctx.input(|input| input.smooth_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                let (min, max) = frame.zoom.bounds();
                let next = (engine.zoom() * (1.0 + scroll * 0.0018).clamp(0.85, 1.15)).clamp(min, max);
                let pointer = response.hover_pos().unwrap_or_else(|| rect.center());
                engine.zoom_about(rect, pointer, next);
                events.push(ViewEvent::Zoom(next));
            }
        }

        if response.drag_started_by(PointerButton::Primary) {
            let origin = ctx.input(|input| input.pointer.press_origin());
            self.dragging = origin
                .filter(|_| !engine.is_transitioning())
                .and_then(|origin| engine.node_at(rect, origin));
        }
        if response.dragged_by(PointerButton::Primary) {
            match self.dragging {
                Some(index) => engine.drag_node(index, response.drag_delta()),
                None => engine.pan_by(response.drag_delta()),
            }
        } else if response.dragged_by(PointerButton::Middle) {
            engine.pan_by(response.drag_delta());
        }
        if response.drag_stopped() {
            self.dragging = None;
        }

        if response.clicked_by(PointerButton::Primary)
            && let Some(position) = response.interact_pointer_pos()
        {
            let selected = engine.click(rect, position);
            if selected.is_some() && frame.zoom.value() < SELECT_ZOOM {
                events.push(ViewEvent::Zoom(SELECT_ZOOM));
            }
            events.push(ViewEvent::Select(selected));
        }

        if response.secondary_clicked()
            && let Some(position) = response.interact_pointer_pos()
        {
            self.menu = engine.node_at(rect, position).map(|index| {
                let node = &engine.scene().nodes[index];
                ContextMenu::new(node.id.clone(), node.label.clone(), position)
            });
        }

        let hovered = if self.hover_suppressed || self.menu.is_some() {
            None
        } else {
            response
                .hover_pos()
                .and_then(|position| engine.node_at(rect, position))
        };
        if hovered.is_some() {
            ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        if engine.tick(now, delta_seconds, frame.live_physics) || self.dragging.is_some() {
            ctx.request_repaint();
        }

        let painter = ui.painter_at(rect);
        draw_grid_background(
            &painter,
            rect,
            rect.center() + engine.pan(),
            60.0 * engine.zoom(),
        );
        if engine.scene().nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No facilities match the current search and filters.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
        }
        draw_edges(&painter, rect, engine);
        draw_nodes(&painter, rect, engine, hovered, now);

        if let Some(index) = hovered {
            let node = &engine.scene().nodes[index];
            let summary = format!(
                "{}  |  {}  |  {} movements",
                node.label,
                node.kind.label(),
                engine.scene().degree(index)
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                summary,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if let Some(anchor) = engine.panel_anchor(rect)
            && let Some(state) = engine.highlight()
        {
            let placement = place_popup(anchor, PANEL_SIZE, rect);
            let facility = &engine.scene().nodes[state.node].details;
            egui::Area::new(egui::Id::new("graph-details-panel"))
                .fixed_pos(placement.rect.min)
                .order(egui::Order::Foreground)
                .show(&ctx, |ui| {
                    egui::Frame::popup(ui.style()).fill(SURFACE).show(ui, |ui| {
                        ui.set_width(PANEL_SIZE.x - 16.0);
                        ui.horizontal(|ui| {
                            ui.strong("Facility");
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.small_button("✕").on_hover_text("Close").clicked() {
                                        events.push(ViewEvent::Select(None));
                                    }
                                },
                            );
                        });
                        egui::ScrollArea::vertical()
                            .max_height(PANEL_SIZE.y - 40.0)
                            .show(ui, |ui| facility_card(ui, facility));
                    });
                });
        }

        if let Some(menu) = self.menu.as_mut()
            && let Some(action) = menu.show(&ctx)
        {
            self.menu = None;
            match action {
                MenuAction::CenterAndZoom(id) => {
                    let (_, max) = frame.zoom.bounds();
                    events.push(ViewEvent::Select(Some(id.clone())));
                    events.push(ViewEvent::Zoom((frame.zoom.value() + MENU_ZOOM_STEP).min(max)));
                    engine.sync_selection(Some(&id));
                    engine.recenter();
                }
                MenuAction::ShowDetails(id) => events.push(ViewEvent::Select(Some(id))),
            }
        }

        events
    }
}

fn draw_edges(painter: &egui::Painter, rect: Rect, engine: &GraphEngine) {
    let scene = engine.scene();
    let zoom = engine.zoom();
    let radius = engine.screen_radius();
    let highlight = engine.highlight();

    // Parallel movements between one pair fan out side by side.
    let mut lanes: HashMap<(usize, usize), usize> = HashMap::new();
    for edge in &scene.edges {
        *lanes.entry((edge.from.min(edge.to), edge.from.max(edge.to))).or_default() += 1;
    }
    let mut used: HashMap<(usize, usize), usize> = HashMap::new();

    for (index, edge) in scene.edges.iter().enumerate() {
        let pair = (edge.from.min(edge.to), edge.from.max(edge.to));
        let lane_count = lanes.get(&pair).copied().unwrap_or(1);
        let lane = used.entry(pair).or_default();
        let offset = (*lane as f32 - (lane_count - 1) as f32 * 0.5) * 8.0;
        *lane += 1;

        let (Some(start), Some(end)) = (
            engine.node_screen_pos(rect, edge.from),
            engine.node_screen_pos(rect, edge.to),
        ) else {
            continue;
        };
        let direction = (end - start).normalized();
        let normal = vec2(-direction.y, direction.x) * offset;
        let (start, end) = (start + normal, end + normal);
        if !segment_visible(rect, start, end, 4.0) {
            continue;
        }

        let is_highlighted = highlight.is_some_and(|state| state.edges.contains(&index));
        let width = edge.weight as f32 * 0.6 * zoom.sqrt() * if is_highlighted { 1.6 } else { 1.0 };
        let color = match highlight {
            Some(_) if is_highlighted => edge.color,
            Some(_) => with_alpha(edge.color, 50),
            None => with_alpha(edge.color, 200),
        };
        paint_arrow(painter, start, end, radius + 2.0, Stroke::new(width, color));

        if is_highlighted || zoom >= 1.4 {
            painter.text(
                start + (end - start) * 0.5 + vec2(0.0, -6.0),
                Align2::CENTER_BOTTOM,
                edge.label.as_str(),
                FontId::proportional(11.0),
                with_alpha(Color32::from_gray(225), if is_highlighted { 255 } else { 170 }),
            );
        }
    }
}

fn draw_nodes(
    painter: &egui::Painter,
    rect: Rect,
    engine: &GraphEngine,
    hovered: Option<usize>,
    now: f64,
) {
    let scene = engine.scene();
    let radius = engine.screen_radius();
    let highlight = engine.highlight();
    let label_font = FontId::proportional((11.0 * engine.zoom().sqrt()).clamp(10.0, 16.0));

    for (index, node) in scene.nodes.iter().enumerate() {
        let Some(position) = engine.node_screen_pos(rect, index) else {
            continue;
        };
        if !circle_visible(rect, position, radius * 1.5) {
            continue;
        }

        let is_selected = highlight.is_some_and(|state| state.node == index);
        let in_highlight = highlight.is_none_or(|state| state.contains_node(index));
        let is_hovered = hovered == Some(index);

        let mut fill = node.color;
        if !in_highlight {
            fill = dim_color(fill, 0.35);
        }
        if is_hovered {
            fill = blend_color(fill, Color32::WHITE, 0.25);
        }

        if is_selected {
            let pulse = ((now * 3.0).sin() as f32 + 1.0) * 0.5;
            painter.circle_stroke(
                position,
                radius + 6.0 + pulse * 4.0,
                Stroke::new(2.0, with_alpha(ACCENT_BRIGHT, (90.0 + pulse * 120.0) as u8)),
            );
        }

        let outline = if is_selected {
            Stroke::new(3.0, ACCENT_BRIGHT)
        } else {
            Stroke::new(1.5, Color32::from_rgba_unmultiplied(10, 14, 20, 220))
        };
        paint_shape(painter, node.shape, position, radius, fill, outline);

        if node.pinned {
            painter.circle_filled(
                position + vec2(radius * 0.8, -radius * 0.8),
                3.0,
                Color32::from_gray(230),
            );
        }

        let show_label = engine.zoom() >= 0.7 || is_selected || is_hovered || (highlight.is_some() && in_highlight);
        if show_label {
            let alpha = if in_highlight { 240 } else { 110 };
            painter.text(
                Pos2::new(position.x, position.y + radius + 4.0),
                Align2::CENTER_TOP,
                node.label.as_str(),
                label_font.clone(),
                Color32::from_white_alpha(alpha),
            );
        }
    }
}
