mod layout;
mod menu;
mod scene;
mod view;

use eframe::egui::{Pos2, Rect, Vec2, vec2};

use crate::transform::GraphElements;

use super::highlight::{HighlightState, build_highlight_state_for_id};
use super::physics::step_physics;
use super::render_utils::{screen_to_world, world_to_screen};

pub(crate) use layout::LayoutKind;
use layout::LayoutTransition;
pub(in crate::app) use scene::GraphScene;
pub(in crate::app) use view::{GraphFrame, GraphView};

pub(in crate::app) const NODE_RADIUS: f32 = 18.0;
const PANEL_OFFSET: Vec2 = vec2(50.0, -50.0);
const PAN_EASE_RATE: f32 = 9.0;

/// In-process graph renderer state: scene, layout, camera and selection.
pub(in crate::app) struct GraphEngine {
    scene: GraphScene,
    layout: LayoutKind,
    transition: Option<LayoutTransition>,
    zoom: f32,
    pan: Vec2,
    pan_target: Option<Vec2>,
    revision: Option<u64>,
    selected_id: Option<String>,
    highlight: Option<HighlightState>,
}

impl GraphEngine {
    pub(in crate::app) fn new(layout: LayoutKind, zoom: f32) -> Self {
        Self {
            scene: GraphScene::default(),
            layout,
            transition: None,
            zoom,
            pan: Vec2::ZERO,
            pan_target: None,
            revision: None,
            selected_id: None,
            highlight: None,
        }
    }

    pub(in crate::app) fn scene(&self) -> &GraphScene {
        &self.scene
    }

    pub(in crate::app) fn zoom(&self) -> f32 {
        self.zoom
    }

    pub(in crate::app) fn pan(&self) -> Vec2 {
        self.pan
    }

    pub(in crate::app) fn revision(&self) -> Option<u64> {
        self.revision
    }

    pub(in crate::app) fn highlight(&self) -> Option<&HighlightState> {
        self.highlight.as_ref()
    }

    pub(in crate::app) fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Replaces the rendered element set and lays it out again.
    pub(in crate::app) fn set_elements(&mut self, elements: &GraphElements, revision: u64, now: f64) {
        let prior = std::mem::take(&mut self.scene);
        self.scene = GraphScene::from_elements(elements, Some(prior));
        self.revision = Some(revision);
        self.refresh_highlight();
        self.start_layout(now);
        tracing::debug!(
            nodes = self.scene.nodes.len(),
            edges = self.scene.edges.len(),
            revision,
            "graph elements applied"
        );
    }

    pub(in crate::app) fn set_layout(&mut self, layout: LayoutKind, now: f64) {
        if self.layout == layout {
            return;
        }
        tracing::info!(from = self.layout.name(), to = layout.name(), "switching graph layout");
        self.layout = layout;
        self.start_layout(now);
    }

    /// Re-runs the current layout from wherever the nodes are now.
    pub(in crate::app) fn rerun_layout(&mut self, now: f64) {
        for node in &mut self.scene.nodes {
            node.pinned = false;
        }
        self.start_layout(now);
    }

    fn start_layout(&mut self, now: f64) {
        self.transition = self.layout.targets(&self.scene).map(|targets| {
            for node in &mut self.scene.nodes {
                node.pinned = false;
            }
            LayoutTransition::new(self.scene.positions(), targets, now)
        });
        self.recenter();
    }

    /// Applies an externally controlled zoom level and re-centers.
    pub(in crate::app) fn apply_zoom(&mut self, zoom: f32) -> bool {
        if (zoom - self.zoom).abs() <= f32::EPSILON {
            return false;
        }
        self.zoom = zoom;
        self.recenter();
        true
    }

    /// Zooms while keeping the world point under `pointer` in place.
    pub(in crate::app) fn zoom_about(&mut self, rect: Rect, pointer: Pos2, zoom: f32) {
        let anchor = screen_to_world(rect, self.pan, self.zoom, pointer);
        self.zoom = zoom;
        self.pan = pointer - rect.center() - anchor * zoom;
        self.pan_target = None;
    }

    pub(in crate::app) fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
        self.pan_target = None;
    }

    fn focus_point(&self) -> Vec2 {
        if let Some(state) = &self.highlight {
            let target = self
                .transition
                .as_ref()
                .and_then(|transition| transition.target(state.node));
            if let Some(target) = target {
                return target;
            }
            return self.scene.nodes[state.node].world_pos;
        }
        if self.transition.is_some() {
            Vec2::ZERO
        } else {
            self.scene.centroid()
        }
    }

    /// Eases the camera toward the selected node, or the graph's middle.
    pub(in crate::app) fn recenter(&mut self) {
        self.pan_target = Some(-(self.focus_point() * self.zoom));
    }

    /// Follows the externally selected id. Returns whether it changed.
    pub(in crate::app) fn sync_selection(&mut self, selected_id: Option<&str>) -> bool {
        if self.selected_id.as_deref() == selected_id {
            return false;
        }
        self.selected_id = selected_id.map(str::to_owned);
        self.refresh_highlight();
        if self.highlight.is_some() {
            self.recenter();
        }
        true
    }

    fn refresh_highlight(&mut self) {
        self.highlight = self
            .selected_id
            .as_deref()
            .and_then(|id| build_highlight_state_for_id(&self.scene, id));
    }

    pub(in crate::app) fn screen_radius(&self) -> f32 {
        (NODE_RADIUS * self.zoom.powf(0.6)).clamp(6.0, 40.0)
    }

    pub(in crate::app) fn node_screen_pos(&self, rect: Rect, index: usize) -> Option<Pos2> {
        let node = self.scene.nodes.get(index)?;
        Some(world_to_screen(rect, self.pan, self.zoom, node.world_pos))
    }

    /// Where the details panel hangs off the selected node.
    pub(in crate::app) fn panel_anchor(&self, rect: Rect) -> Option<Pos2> {
        let state = self.highlight.as_ref()?;
        self.node_screen_pos(rect, state.node)
            .map(|position| position + PANEL_OFFSET)
    }

    /// Topmost node under `position`, preferring the closest center.
    pub(in crate::app) fn node_at(&self, rect: Rect, position: Pos2) -> Option<usize> {
        let reach = self.screen_radius() * 1.15;
        self.scene
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let distance = world_to_screen(rect, self.pan, self.zoom, node.world_pos).distance(position);
                (distance <= reach).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    /// Selection produced by a primary click: the node's id, or `None` on empty canvas.
    pub(in crate::app) fn click(&self, rect: Rect, position: Pos2) -> Option<String> {
        self.node_at(rect, position)
            .map(|index| self.scene.nodes[index].id.clone())
    }

    pub(in crate::app) fn drag_node(&mut self, index: usize, screen_delta: Vec2) {
        if let Some(node) = self.scene.nodes.get_mut(index) {
            node.world_pos += screen_delta / self.zoom;
            node.velocity = Vec2::ZERO;
            node.pinned = true;
        }
    }

    /// Advances transitions, physics and camera easing. Returns whether another frame is needed.
    pub(in crate::app) fn tick(&mut self, now: f64, delta_seconds: f32, live_physics: bool) -> bool {
        let mut animating = false;

        if let Some(transition) = &self.transition {
            if transition.apply(&mut self.scene, now) {
                self.transition = None;
            } else {
                animating = true;
            }
        } else if self.layout == LayoutKind::ForceDirected && live_physics {
            animating |= step_physics(&mut self.scene, delta_seconds);
        }

        if let Some(target) = self.pan_target {
            let t = 1.0 - (-delta_seconds * PAN_EASE_RATE).exp();
            self.pan += (target - self.pan) * t;
            if (target - self.pan).length() < 0.5 {
                self.pan = target;
                self.pan_target = None;
            } else {
                animating = true;
            }
        }

        animating
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;
    use crate::supply::MovementStatus;
    use crate::transform::tests::{movement, scenario_facilities};
    use crate::transform::to_elements;

    fn canvas() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(1000.0, 800.0))
    }

    fn settle(engine: &mut GraphEngine, from: f64) {
        for frame in 0..240 {
            engine.tick(from + frame as f64 / 60.0, 1.0 / 60.0, false);
        }
    }

    fn scenario_engine() -> GraphEngine {
        let elements = to_elements(
            &scenario_facilities(),
            &[movement("M1", "F1", "F2", MovementStatus::InTransit)],
        );
        let mut engine = GraphEngine::new(LayoutKind::Grid, 1.0);
        engine.set_elements(&elements, 1, 0.0);
        settle(&mut engine, 0.0);
        engine
    }

    #[test]
    fn click_selects_highlights_and_anchors_then_blank_clears() {
        let mut engine = scenario_engine();
        let rect = canvas();
        let Some(f1) = engine.node_screen_pos(rect, 0) else {
            panic!("F1 is rendered");
        };

        let selected = engine.click(rect, f1);
        assert_eq!(selected.as_deref(), Some("F1"));
        assert!(engine.sync_selection(selected.as_deref()));

        let Some(state) = engine.highlight() else {
            panic!("selection highlights F1");
        };
        assert_eq!(state.node, 0);
        assert!(state.edges.contains(&0));
        assert!(state.neighbors.contains(&1));
        assert_eq!(engine.panel_anchor(rect), Some(f1 + PANEL_OFFSET));

        let blank = engine.click(rect, pos2(5.0, 5.0));
        assert_eq!(blank, None);
        engine.sync_selection(blank.as_deref());
        assert!(engine.highlight().is_none());
        assert!(engine.panel_anchor(rect).is_none());
    }

    #[test]
    fn anchor_follows_node_while_recentering() {
        let mut engine = scenario_engine();
        let rect = canvas();
        engine.sync_selection(Some("F2"));
        settle(&mut engine, 10.0);

        let Some(f2) = engine.node_screen_pos(rect, 1) else {
            panic!("F2 is rendered");
        };
        assert!(f2.distance(rect.center()) < 1.0, "F2 at {f2:?}");
        assert_eq!(engine.panel_anchor(rect), Some(f2 + PANEL_OFFSET));
    }

    #[test]
    fn zoom_change_recenters_on_selection() {
        let mut engine = scenario_engine();
        let rect = canvas();
        engine.sync_selection(Some("F1"));
        assert!(engine.apply_zoom(2.2));
        assert!(!engine.apply_zoom(2.2));
        settle(&mut engine, 10.0);

        assert_eq!(engine.zoom(), 2.2);
        let Some(f1) = engine.node_screen_pos(rect, 0) else {
            panic!("F1 is rendered");
        };
        assert!(f1.distance(rect.center()) < 1.0);
    }

    #[test]
    fn layout_switch_animates_to_targets() {
        let mut engine = scenario_engine();
        engine.set_layout(LayoutKind::Circle, 20.0);
        assert!(engine.is_transitioning());
        settle(&mut engine, 20.0);
        assert!(!engine.is_transitioning());

        let Some(targets) = LayoutKind::Circle.targets(engine.scene()) else {
            panic!("circle has targets");
        };
        for (node, target) in engine.scene().nodes.iter().zip(&targets) {
            assert!((node.world_pos - *target).length() < 1e-3);
        }
    }

    #[test]
    fn dragged_nodes_are_pinned_until_relayout() {
        let mut engine = scenario_engine();
        engine.drag_node(0, vec2(40.0, 0.0));
        assert!(engine.scene().nodes[0].pinned);
        engine.rerun_layout(30.0);
        assert!(!engine.scene().nodes[0].pinned);
    }

    #[test]
    fn selection_of_filtered_out_node_has_no_highlight() {
        let mut engine = scenario_engine();
        engine.sync_selection(Some("F9"));
        assert!(engine.highlight().is_none());
        assert!(engine.panel_anchor(canvas()).is_none());
    }
}
