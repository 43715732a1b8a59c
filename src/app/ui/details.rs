use eframe::egui::{self, Color32, ProgressBar, RichText, Ui};

use crate::palette::{facility_color, status_color};
use crate::supply::Facility;
use crate::util::{format_count, format_percent};

use super::super::ViewModel;

/// Facility summary shared by the map popup, the graph panel and the side panel.
pub(crate) fn facility_card(ui: &mut Ui, facility: &Facility) {
    ui.label(RichText::new(facility.name.as_str()).strong().size(16.0));
    ui.horizontal(|ui| {
        let (dot, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
        ui.painter()
            .circle_filled(dot.center(), 5.0, facility_color(&facility.kind));
        ui.label(facility.kind.label());
        ui.weak(facility.id.as_str());
    });
    ui.add_space(4.0);

    let details = &facility.details;
    egui::Grid::new(("facility-card", facility.id.as_str()))
        .num_columns(2)
        .spacing([10.0, 4.0])
        .show(ui, |ui| {
            if let Some(address) = &details.address {
                ui.weak("Address");
                ui.label(address.as_str());
                ui.end_row();
            }
            if let Some(capacity) = details.capacity {
                ui.weak("Capacity");
                ui.label(format_count(capacity));
                ui.end_row();
            }
            if let Some(inventory) = details.inventory {
                ui.weak("Inventory");
                ui.label(format_count(inventory));
                ui.end_row();
            }
            if let Some(manager) = &details.manager {
                ui.weak("Manager");
                ui.label(manager.as_str());
                ui.end_row();
            }
            if let Some(established) = &details.established {
                ui.weak("Established");
                ui.label(established.as_str());
                ui.end_row();
            }
            if let Some(specialization) = &details.specialization {
                ui.weak("Specialization");
                ui.label(specialization.as_str());
                ui.end_row();
            }
            ui.weak("Coordinates");
            ui.label(format!("{:.4}, {:.4}", facility.latitude, facility.longitude));
            ui.end_row();
        });

    if let Some(utilization) = details.utilization() {
        ui.add_space(4.0);
        let fill = if utilization > 0.9 {
            Color32::from_rgb(0xff, 0x5d, 0x5d)
        } else {
            facility_color(&facility.kind)
        };
        ui.add(
            ProgressBar::new(utilization)
                .fill(fill)
                .text(format!("Utilization {}", format_percent(utilization))),
        );
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Facility Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Select a facility on the map, the graph or from search.");
            return;
        };
        let Some(facility) = self.dataset.facility(&selected_id) else {
            ui.label("The selected facility is not in the data set.");
            return;
        };

        facility_card(ui, facility);
        if ui.small_button("Clear selection").clicked() {
            self.set_selected(None);
            return;
        }

        ui.separator();
        let movements = self.dataset.movements_for(&selected_id);
        ui.label(RichText::new(format!("Vehicle movements ({})", movements.len())).strong());
        if movements.is_empty() {
            ui.label("No movements touch this facility.");
            return;
        }

        let mut next_selection = None;
        egui::ScrollArea::vertical()
            .id_salt("facility-movements")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for movement in movements {
                    let outbound = movement.source_facility_id == selected_id;
                    let other_id = if outbound {
                        &movement.destination_facility_id
                    } else {
                        &movement.source_facility_id
                    };
                    let other_name = self
                        .dataset
                        .facility(other_id)
                        .map_or(other_id.as_str(), |facility| facility.name.as_str());

                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(movement.status.label())
                                .color(status_color(movement.status))
                                .small(),
                        );
                        ui.label(if outbound { "to" } else { "from" });
                        let link = ui
                            .link(other_name)
                            .on_hover_text(format!("{} via {}", movement.cargo, movement.vehicle_type));
                        if link.clicked() && self.dataset.facility(other_id).is_some() {
                            next_selection = Some(other_id.clone());
                        }
                    });
                    ui.weak(format!(
                        "{}  |  departs {}{}",
                        movement.cargo,
                        movement.departure_time,
                        movement
                            .arrival_time
                            .as_deref()
                            .map(|arrival| format!(", arrives {arrival}"))
                            .unwrap_or_default()
                    ));
                    ui.add_space(4.0);
                }
            });

        if let Some(id) = next_selection {
            self.set_selected(Some(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use egui_kittest::{Harness, kittest::Queryable as _};

    use super::*;
    use crate::supply::{FacilityDetails, FacilityType};

    #[test]
    fn card_lists_present_details_and_utilization() {
        let facility = Facility {
            id: "mf1".to_owned(),
            name: "Chennai Assembly Plant".to_owned(),
            kind: FacilityType::Manufacturing,
            latitude: 13.0827,
            longitude: 80.2707,
            details: FacilityDetails {
                capacity: Some(1000),
                inventory: Some(250),
                manager: Some("R. Kumar".to_owned()),
                ..Default::default()
            },
        };

        let mut harness = Harness::new_ui(move |ui| facility_card(ui, &facility));
        harness.fit_contents();
        harness.get_by_label("Chennai Assembly Plant");
        harness.get_by_label("R. Kumar");
        harness.get_by_label("1,000");
        harness.get_by_label_contains("Utilization 25%");
        assert!(harness.query_by_label("Address").is_none());
    }
}
