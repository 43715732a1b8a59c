use eframe::egui::{self, RichText, Ui};

use crate::palette::{facility_color, status_color};
use crate::supply::{FacilityType, MovementStatus};
use crate::transform::FacetFilter;

use super::super::graph::LayoutKind;
use super::super::ViewModel;
use super::legend::draw_legend;

/// Type and status checkboxes. Returns whether the filter changed.
pub(in crate::app) fn draw_filter_controls(ui: &mut Ui, facets: &mut FacetFilter) -> bool {
    let mut changed = false;

    ui.label(RichText::new("Facility types").strong());
    for kind in &FacilityType::KNOWN {
        let mut shown = facets.types.contains(kind);
        let text = RichText::new(kind.label()).color(facility_color(kind));
        if ui.checkbox(&mut shown, text).changed() {
            facets.toggle_type(kind);
            changed = true;
        }
    }

    ui.add_space(4.0);
    ui.label(RichText::new("Movement status").strong());
    for status in MovementStatus::ALL {
        let mut shown = facets.statuses.contains(&status);
        let text = RichText::new(status.label()).color(status_color(status));
        if ui.checkbox(&mut shown, text).changed() {
            facets.toggle_status(status);
            changed = true;
        }
    }

    if !facets.is_unrestricted() && ui.small_button("Show all").clicked() {
        *facets = FacetFilter::default();
        changed = true;
    }
    changed
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading("Layout");
                ui.horizontal_wrapped(|ui| {
                    for layout in LayoutKind::ALL {
                        let response = ui
                            .selectable_label(self.layout == layout, layout.label())
                            .on_hover_text(layout.name());
                        if response.clicked() {
                            self.layout = layout;
                        }
                    }
                });
                ui.horizontal(|ui| {
                    if ui.button("Re-run layout").clicked() {
                        self.graph.request_rerun();
                    }
                    ui.add_enabled(
                        self.layout == LayoutKind::ForceDirected,
                        egui::Checkbox::new(&mut self.live_physics, "Live physics"),
                    )
                    .on_disabled_hover_text("Only the force layout simulates continuously");
                });

                ui.separator();
                ui.heading("Filters");
                if draw_filter_controls(ui, &mut self.facets) {
                    tracing::debug!(
                        types = self.facets.types.len(),
                        statuses = self.facets.statuses.len(),
                        "facet filter changed"
                    );
                    self.elements_dirty = true;
                }

                ui.separator();
                ui.heading("Legend");
                draw_legend(ui);
            });
    }
}

#[cfg(test)]
mod tests {
    use egui_kittest::{Harness, kittest::Queryable as _};

    use super::*;

    #[derive(Default)]
    struct FilterState {
        facets: FacetFilter,
        changes: usize,
    }

    #[test]
    fn checkboxes_toggle_facets() {
        let mut harness = Harness::new_ui_state(
            |ui, state: &mut FilterState| {
                if draw_filter_controls(ui, &mut state.facets) {
                    state.changes += 1;
                }
            },
            FilterState::default(),
        );
        harness.fit_contents();
        assert!(harness.query_by_label("Show all").is_none());

        harness.get_by_label("Showroom").click();
        harness.run();
        assert!(!harness.state().facets.types.contains(&FacilityType::Showroom));
        assert_eq!(harness.state().changes, 1);

        harness.get_by_label("Completed").click();
        harness.run();
        assert!(!harness.state().facets.statuses.contains(&MovementStatus::Completed));

        harness.get_by_label("Show all").click();
        harness.run();
        assert!(harness.state().facets.is_unrestricted());
        assert_eq!(harness.state().changes, 3);
    }
}
