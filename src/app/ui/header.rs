use eframe::egui::{self, Align, Key, Layout, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::palette::facility_color;
use crate::supply::Facility;
use crate::util::format_count;

use super::super::{ActiveView, ViewModel};
use super::zoom::draw_zoom_controls;

const MAX_SUGGESTIONS: usize = 6;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Best fuzzy matches of `input` against facility names and types, best first.
pub(in crate::app) fn suggest<'a>(facilities: &'a [Facility], input: &str, limit: usize) -> Vec<&'a Facility> {
    let input = input.trim();
    if input.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = facilities
        .iter()
        .filter_map(|facility| {
            let by_name = fuzzy_match_score(&matcher, &facility.name, input);
            let by_kind = fuzzy_match_score(&matcher, facility.kind.label(), input).map(|score| score / 2);
            by_name.max(by_kind).map(|score| (score, facility))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));
    scored.truncate(limit);
    scored.into_iter().map(|(_, facility)| facility).collect()
}

impl ViewModel {
    pub(in crate::app) fn draw_header(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("Supply Chain Visualizer");
            ui.separator();

            for (view, label) in [(ActiveView::Map, "Map View"), (ActiveView::Bloom, "Bloom")] {
                if ui.selectable_label(self.active_view == view, label).clicked() {
                    self.set_active_view(view);
                }
            }
            ui.separator();

            self.draw_search(ui);
            ui.separator();

            if let Some(action) = draw_zoom_controls(ui, self.active_zoom()) {
                self.apply_zoom_action(action);
            }
            ui.separator();

            if ui
                .button("⛶ Fullscreen")
                .on_hover_text("Toggle fullscreen (F11)")
                .clicked()
            {
                self.fullscreen.toggle(ui.ctx());
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(format!(
                    "{} facilities  |  {} movements",
                    format_count(self.dataset.facility_count() as u64),
                    format_count(self.dataset.movement_count() as u64)
                ));
                if self.active_view == ActiveView::Map && self.map.credential().active().is_some() {
                    let hint = self
                        .map
                        .masked_token()
                        .map_or_else(|| "Map is loading".to_owned(), |token| format!("Current token {token}"));
                    let button = ui
                        .add_enabled(!self.map.is_loading(), egui::Button::new("Change token").small())
                        .on_hover_text(hint);
                    if button.clicked() {
                        self.map.change_token();
                    }
                }
            });
        });
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        let response = ui.add(
            egui::TextEdit::singleline(&mut self.search_input)
                .hint_text("Search facilities...")
                .desired_width(240.0),
        );
        if response.changed() || response.gained_focus() {
            self.suggestions_open = !self.search_input.trim().is_empty();
        }

        let (enter, escape) = ui.input(|input| (input.key_pressed(Key::Enter), input.key_pressed(Key::Escape)));
        if response.lost_focus() && enter {
            self.submit_search();
        }
        if escape {
            self.suggestions_open = false;
        }

        if ui
            .add_enabled(!self.search_input.is_empty() || !self.query.is_empty(), egui::Button::new("✕"))
            .on_hover_text("Clear search")
            .clicked()
        {
            self.clear_search();
        }
        if !self.query.is_empty() {
            ui.label(RichText::new(format!("filter: \"{}\"", self.query)).weak());
        }

        if !self.suggestions_open {
            return;
        }
        let suggestions = suggest(&self.dataset.facilities, &self.search_input, MAX_SUGGESTIONS);
        if suggestions.is_empty() {
            return;
        }

        let mut chosen = None;
        egui::Area::new(egui::Id::new("search-suggestions"))
            .fixed_pos(response.rect.left_bottom() + egui::vec2(0.0, 4.0))
            .order(egui::Order::Foreground)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_min_width(response.rect.width());
                    for facility in suggestions {
                        let text = RichText::new(format!("{}  ·  {}", facility.name, facility.kind.label()))
                            .color(facility_color(&facility.kind));
                        if ui.selectable_label(false, text).clicked() {
                            chosen = Some(facility.id.clone());
                        }
                    }
                });
            });

        if let Some(id) = chosen {
            self.suggestions_open = false;
            self.set_selected(Some(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supply::FacilityType;
    use crate::transform::tests::facility;

    fn facilities() -> Vec<Facility> {
        vec![
            facility("mf1", "Chennai Assembly Plant", FacilityType::Manufacturing, 13.08, 80.27),
            facility("dc1", "Bangalore Distribution Hub", FacilityType::Distribution, 12.97, 77.59),
            facility("sr1", "Pune Showroom", FacilityType::Showroom, 18.52, 73.85),
            facility("sp1", "Chennai Steel Supplier", FacilityType::Supplier, 13.0, 80.2),
        ]
    }

    #[test]
    fn suggestions_rank_fuzzy_name_matches() {
        let facilities = facilities();
        let names = suggest(&facilities, "chen", MAX_SUGGESTIONS)
            .into_iter()
            .map(|facility| facility.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"mf1") && names.contains(&"sp1"));

        let by_kind = suggest(&facilities, "showroom", MAX_SUGGESTIONS);
        assert_eq!(by_kind.first().map(|facility| facility.id.as_str()), Some("sr1"));
    }

    #[test]
    fn blank_input_and_limit() {
        let facilities = facilities();
        assert!(suggest(&facilities, "   ", MAX_SUGGESTIONS).is_empty());
        assert!(suggest(&facilities, "a", 1).len() <= 1);
        assert!(suggest(&facilities, "zzzz", MAX_SUGGESTIONS).is_empty());
    }
}
