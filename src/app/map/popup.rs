use eframe::egui::{self, Context, Pos2, Rect, Stroke, Vec2};

use crate::palette::SURFACE;
use crate::supply::Facility;

use super::super::ui::details::facility_card;
use super::super::ui::placement::{PopupSide, place_popup, press_is_outside};

const POPUP_SIZE: Vec2 = Vec2::new(320.0, 300.0);

/// Details card for the facility whose marker was clicked.
pub(in crate::app) struct FacilityPopup {
    facility_id: String,
    anchor: Pos2,
    last_rect: Option<Rect>,
}

impl FacilityPopup {
    pub(in crate::app) fn new(facility_id: String, anchor: Pos2) -> Self {
        Self {
            facility_id,
            anchor,
            last_rect: None,
        }
    }

    pub(in crate::app) fn facility_id(&self) -> &str {
        &self.facility_id
    }

    /// Keeps the popup attached to its marker while the map moves.
    pub(in crate::app) fn follow(&mut self, anchor: Pos2) {
        self.anchor = anchor;
    }

    pub(in crate::app) fn is_outside(&self, position: Pos2) -> bool {
        press_is_outside(self.last_rect, position)
    }

    /// Draws the popup inside `viewport`. Returns `true` when its close button was pressed.
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        viewport: Rect,
        facility: &Facility,
        movement_count: usize,
    ) -> bool {
        let placement = place_popup(self.anchor, POPUP_SIZE, viewport);
        let mut closed = false;
        let response = egui::Area::new(egui::Id::new("map-facility-popup"))
            .fixed_pos(placement.rect.min)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).fill(SURFACE).show(ui, |ui| {
                    ui.set_width(POPUP_SIZE.x - 16.0);
                    ui.horizontal(|ui| {
                        ui.strong("Facility Details");
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("✕").on_hover_text("Close").clicked() {
                                closed = true;
                            }
                        });
                    });
                    egui::ScrollArea::vertical()
                        .max_height(POPUP_SIZE.y - 56.0)
                        .show(ui, |ui| facility_card(ui, facility));
                    ui.separator();
                    ui.weak(format!("{movement_count} vehicle movements"));
                });
            })
            .response;
        self.last_rect = Some(response.rect);

        // Pointer from the marker to the near edge of the card.
        let edge_x = match placement.side {
            PopupSide::Right => response.rect.left(),
            PopupSide::Left => response.rect.right(),
        };
        let edge_y = self
            .anchor
            .y
            .clamp(response.rect.top() + 12.0, (response.rect.bottom() - 12.0).max(response.rect.top() + 12.0));
        ctx.layer_painter(egui::LayerId::new(egui::Order::Middle, egui::Id::new("map-popup-pointer")))
            .line_segment([self.anchor, Pos2::new(edge_x, edge_y)], Stroke::new(1.5, SURFACE));
        closed
    }
}
