use eframe::egui::{self, Context, Pos2, Rect};

use crate::palette::SURFACE_RAISED;

use super::super::ui::placement::press_is_outside;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) enum MenuAction {
    CenterAndZoom(String),
    ShowDetails(String),
}

/// Right-click menu for one node. Lives only while open.
pub(in crate::app) struct ContextMenu {
    node_id: String,
    node_label: String,
    anchor: Pos2,
    last_rect: Option<Rect>,
}

impl ContextMenu {
    pub(in crate::app) fn new(node_id: String, node_label: String, anchor: Pos2) -> Self {
        Self {
            node_id,
            node_label,
            anchor,
            last_rect: None,
        }
    }

    pub(in crate::app) fn is_outside(&self, position: Pos2) -> bool {
        press_is_outside(self.last_rect, position)
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) -> Option<MenuAction> {
        let mut action = None;
        let response = egui::Area::new(egui::Id::new("graph-context-menu"))
            .fixed_pos(self.anchor)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::menu(ui.style()).fill(SURFACE_RAISED).show(ui, |ui| {
                    ui.set_min_width(200.0);
                    ui.weak(self.node_label.as_str());
                    ui.separator();
                    if ui.button("Center & zoom on this node").clicked() {
                        action = Some(MenuAction::CenterAndZoom(self.node_id.clone()));
                    }
                    if ui.button("Show details").clicked() {
                        action = Some(MenuAction::ShowDetails(self.node_id.clone()));
                    }
                });
            })
            .response;
        self.last_rect = Some(response.rect);
        action
    }
}
