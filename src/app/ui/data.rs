use std::collections::HashSet;

use eframe::egui::{self, RichText, Ui};

use crate::palette::{facility_color, status_color};
use crate::supply::VehicleMovement;
use crate::util::format_count;

use super::super::ViewModel;

impl ViewModel {
    /// Movements behind the edges the graph currently shows.
    fn visible_movements(&self) -> Vec<&VehicleMovement> {
        let shown = self
            .graph_elements
            .edges
            .iter()
            .filter_map(|edge| edge.id.strip_prefix("edge-"))
            .collect::<HashSet<_>>();
        self.dataset
            .movements
            .iter()
            .filter(|movement| shown.contains(movement.id.as_str()))
            .collect()
    }

    /// Tabular view of the records the graph shows, after search and filters.
    pub(in crate::app) fn draw_data_tables(&mut self, ui: &mut Ui) {
        let mut next_selection = None;
        let movements = self.visible_movements();

        egui::ScrollArea::vertical()
            .id_salt("data-tables")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading(format!("Facilities ({})", self.graph_elements.nodes.len()));
                egui::Grid::new("facility-table")
                    .num_columns(5)
                    .striped(true)
                    .spacing([16.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["Name", "Type", "Location", "Capacity", "Inventory"] {
                            ui.strong(header);
                        }
                        ui.end_row();

                        for node in &self.graph_elements.nodes {
                            let facility = &node.details;
                            let selected = self.selected.as_deref() == Some(facility.id.as_str());
                            if ui.selectable_label(selected, facility.name.as_str()).clicked() {
                                next_selection = Some(facility.id.clone());
                            }
                            ui.label(RichText::new(facility.kind.label()).color(facility_color(&facility.kind)));
                            ui.label(format!("{:.3}, {:.3}", facility.latitude, facility.longitude));
                            ui.label(facility.details.capacity.map(format_count).unwrap_or_default());
                            ui.label(facility.details.inventory.map(format_count).unwrap_or_default());
                            ui.end_row();
                        }
                    });

                ui.add_space(12.0);
                ui.heading(format!("Vehicle movements ({})", movements.len()));
                egui::Grid::new("movement-table")
                    .num_columns(6)
                    .striped(true)
                    .spacing([16.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["Id", "From", "To", "Vehicle", "Status", "Cargo"] {
                            ui.strong(header);
                        }
                        ui.end_row();

                        for movement in &movements {
                            let name_of = |id: &str| {
                                self.dataset
                                    .facility(id)
                                    .map_or_else(|| format!("{id} (missing)"), |facility| facility.name.clone())
                            };
                            ui.monospace(movement.id.as_str());
                            ui.label(name_of(&movement.source_facility_id));
                            ui.label(name_of(&movement.destination_facility_id));
                            ui.label(movement.vehicle_type.as_str());
                            ui.label(RichText::new(movement.status.label()).color(status_color(movement.status)));
                            ui.label(movement.cargo.as_str());
                            ui.end_row();
                        }
                    });
            });

        if let Some(id) = next_selection {
            self.set_selected(Some(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::map::MapCredential;
    use crate::app::{ActiveView, ViewModel};
    use crate::supply::load_dataset;

    #[test]
    fn movement_rows_follow_the_search() {
        let dataset = load_dataset(None).unwrap();
        let total = dataset.movement_count();
        let mut model = ViewModel::new(dataset, ActiveView::Bloom, MapCredential::load(None, None));
        assert_eq!(model.visible_movements().len(), total);

        model.search_input = "showroom".to_owned();
        model.submit_search();
        model.refresh_elements();
        let shown = model.visible_movements();
        assert!(shown.len() < total);
        assert!(shown.iter().all(|movement| {
            let ends = [&movement.source_facility_id, &movement.destination_facility_id];
            ends.iter()
                .all(|id| model.graph_elements.nodes.iter().any(|node| &&node.id == id))
        }));
    }
}
