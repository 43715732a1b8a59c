use eframe::egui::{self, Color32, RichText, Sense, Stroke, Ui, vec2};

use crate::palette::{facility_color, facility_shape, status_color};
use crate::supply::{FacilityType, MovementStatus};

use super::super::render_utils::paint_shape;

const INTERACTIONS: [(&str, &str); 7] = [
    ("Click", "select a facility"),
    ("Right-click", "node menu (Bloom)"),
    ("Drag", "pan, or move and pin a node"),
    ("Scroll", "zoom around the pointer"),
    ("+ / - / 0", "zoom in, out, reset"),
    ("Esc", "close popups and menus"),
    ("F11", "toggle fullscreen"),
];

/// Facility shapes and colors, route colors and the interaction cheat sheet.
pub(in crate::app) fn draw_legend(ui: &mut Ui) {
    ui.label(RichText::new("Facilities").strong());
    for kind in &FacilityType::KNOWN {
        ui.horizontal(|ui| {
            let (rect, _) = ui.allocate_exact_size(vec2(18.0, 18.0), Sense::hover());
            paint_shape(
                ui.painter(),
                facility_shape(kind),
                rect.center(),
                7.0,
                facility_color(kind),
                Stroke::new(1.0, Color32::from_gray(20)),
            );
            ui.label(kind.label());
        });
    }

    ui.add_space(6.0);
    ui.label(RichText::new("Movements").strong());
    for status in MovementStatus::ALL {
        ui.horizontal(|ui| {
            let (rect, _) = ui.allocate_exact_size(vec2(18.0, 18.0), Sense::hover());
            ui.painter().line_segment(
                [rect.left_center(), rect.right_center()],
                Stroke::new(3.0, status_color(status)),
            );
            ui.label(status.label());
        });
    }

    ui.add_space(6.0);
    egui::CollapsingHeader::new("Interactions")
        .default_open(false)
        .show(ui, |ui| {
            egui::Grid::new("legend-interactions")
                .num_columns(2)
                .show(ui, |ui| {
                    for (input, effect) in INTERACTIONS {
                        ui.monospace(input);
                        ui.label(effect);
                        ui.end_row();
                    }
                });
        });
}

#[cfg(test)]
mod tests {
    use egui_kittest::{Harness, kittest::Queryable as _};

    use super::*;

    #[test]
    fn legend_names_every_type_and_status() {
        let mut harness = Harness::new_ui(draw_legend);
        harness.fit_contents();
        for kind in &FacilityType::KNOWN {
            harness.get_by_label(kind.label());
        }
        for status in MovementStatus::ALL {
            harness.get_by_label(status.label());
        }
        harness.get_by_label("Interactions");
    }
}
