use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Key};

use crate::supply::{Dataset, load_dataset};
use crate::transform::{
    FacetFilter, GraphElements, drop_unresolved, filter_by_facets, filter_by_query, to_elements,
};

mod engine;
mod graph;
mod highlight;
mod map;
mod physics;
mod render_utils;
mod ui;

use graph::{GraphFrame, GraphView, LayoutKind};
use map::{MapCredential, MapFrame, MapView};
use ui::fullscreen::{FullscreenOutcome, FullscreenState};
use ui::legend::draw_legend;
use ui::notices::{NoticeLevel, Notices};
use ui::zoom::{ZoomAction, ZoomControl};

/// The two top-level views reachable from the header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ActiveView {
    #[default]
    Map,
    Bloom,
}

/// Startup settings taken from the command line.
#[derive(Clone, Debug, Default)]
pub struct LaunchOptions {
    pub data: Option<PathBuf>,
    pub view: ActiveView,
    pub map_token: Option<String>,
}

/// What a view reports back to the view model after a frame.
#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) enum ViewEvent {
    Select(Option<String>),
    Zoom(f32),
    Notice {
        level: NoticeLevel,
        title: String,
        body: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BloomTab {
    Graph,
    Data,
}

pub struct SupplyChainApp {
    options: LaunchOptions,
    state: AppState,
    credential: Option<MapCredential>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Dataset, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    dataset: Dataset,
    active_view: ActiveView,
    bloom_tab: BloomTab,
    map: MapView,
    graph: GraphView,
    search_input: String,
    query: String,
    suggestions_open: bool,
    selected: Option<String>,
    facets: FacetFilter,
    layout: LayoutKind,
    live_physics: bool,
    graph_zoom: ZoomControl,
    map_zoom: ZoomControl,
    all_elements: GraphElements,
    graph_elements: GraphElements,
    map_elements: GraphElements,
    elements_revision: u64,
    elements_dirty: bool,
    notices: Notices,
    fullscreen: FullscreenState,
}

impl SupplyChainApp {
    pub fn new(cc: &eframe::CreationContext<'_>, options: LaunchOptions) -> Self {
        let credential = MapCredential::load(cc.storage, options.map_token.as_deref());
        let state = Self::start_load(options.data.clone());
        Self {
            options,
            state,
            credential: Some(credential),
        }
    }

    fn spawn_load(path: Option<PathBuf>) -> Receiver<Result<Dataset, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_dataset(path.as_deref()).map_err(|error| format!("{error:#}"));
            if tx.send(result).is_err() {
                tracing::debug!("dataset loaded after the app stopped waiting");
            }
        });

        rx
    }

    fn start_load(path: Option<PathBuf>) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(path),
        }
    }

    fn ready(&mut self, dataset: Dataset) -> AppState {
        let credential = self
            .credential
            .take()
            .unwrap_or_else(|| MapCredential::load(None, self.options.map_token.as_deref()));
        AppState::Ready(Box::new(ViewModel::new(
            dataset,
            self.options.view,
            credential,
        )))
    }
}

impl eframe::App for SupplyChainApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut loaded = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => loaded = Some(result),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        loaded = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading supply chain data...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load supply chain data");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => model.show(ctx),
        }

        if retry {
            tracing::info!("retrying dataset load");
            self.state = Self::start_load(self.options.data.clone());
        }
        match loaded {
            Some(Ok(dataset)) => self.state = self.ready(dataset),
            Some(Err(error)) => {
                tracing::error!(%error, "dataset load failed");
                self.state = AppState::Error(error);
            }
            None => {}
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let credential = match &self.state {
            AppState::Ready(model) => Some(model.map.credential()),
            AppState::Loading { .. } | AppState::Error(_) => self.credential.as_ref(),
        };
        if let Some(credential) = credential {
            credential.save(storage);
        }
    }
}

impl ViewModel {
    fn new(dataset: Dataset, active_view: ActiveView, credential: MapCredential) -> Self {
        let all_elements = to_elements(&dataset.facilities, &dataset.movements);
        let mut model = Self {
            dataset,
            active_view,
            bloom_tab: BloomTab::Graph,
            map: MapView::new(credential),
            graph: GraphView::new(),
            search_input: String::new(),
            query: String::new(),
            suggestions_open: false,
            selected: None,
            facets: FacetFilter::default(),
            layout: LayoutKind::ForceDirected,
            live_physics: true,
            graph_zoom: ZoomControl::graph(),
            map_zoom: ZoomControl::map(),
            all_elements,
            graph_elements: GraphElements::default(),
            map_elements: GraphElements::default(),
            elements_revision: 0,
            elements_dirty: true,
            notices: Notices::default(),
            fullscreen: FullscreenState::default(),
        };
        model.refresh_elements();
        model
    }

    /// Re-derives both views' element sets from the query and facets.
    fn refresh_elements(&mut self) {
        let queried = filter_by_query(&self.all_elements, &self.query);
        self.map_elements = drop_unresolved(&queried);
        self.graph_elements = drop_unresolved(&filter_by_facets(&queried, &self.facets));
        self.elements_revision += 1;
        self.elements_dirty = false;
        tracing::debug!(
            query = %self.query,
            map_nodes = self.map_elements.nodes.len(),
            graph_nodes = self.graph_elements.nodes.len(),
            graph_edges = self.graph_elements.edges.len(),
            "view elements refreshed"
        );
    }

    fn show(&mut self, ctx: &Context) {
        if self.elements_dirty {
            self.refresh_elements();
        }
        let now = ctx.input(|input| input.time);
        let keyboard_busy = ctx.wants_keyboard_input();
        self.handle_shortcuts(ctx);
        match self.fullscreen.update(ctx) {
            Some(FullscreenOutcome::Applied(on)) => tracing::debug!(fullscreen = on, "fullscreen applied"),
            Some(FullscreenOutcome::Refused(desired)) => self.notices.push(
                NoticeLevel::Warning,
                "Fullscreen unavailable",
                format!(
                    "The window system did not {} fullscreen mode.",
                    if desired { "enter" } else { "leave" }
                ),
                now,
            ),
            None => {}
        }

        egui::TopBottomPanel::top("header")
            .resizable(false)
            .show(ctx, |ui| self.draw_header(ui));

        let events = match self.active_view {
            ActiveView::Map => self.show_map(ctx, keyboard_busy),
            ActiveView::Bloom => self.show_bloom(ctx),
        };
        self.apply_events(events, now);
        self.notices.show(ctx);
    }

    fn show_map(&mut self, ctx: &Context, keyboard_busy: bool) -> Vec<ViewEvent> {
        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                self.draw_details(ui);
                ui.separator();
                egui::CollapsingHeader::new("Legend").show(ui, draw_legend);
            });

        let mut events = Vec::new();
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                events = self.map.show(
                    ui,
                    MapFrame {
                        elements: &self.map_elements,
                        revision: self.elements_revision,
                        movements: &self.dataset.movements,
                        selected: self.selected.as_deref(),
                        zoom: &self.map_zoom,
                        keyboard_busy,
                    },
                );
            });
        events
    }

    fn show_bloom(&mut self, ctx: &Context) -> Vec<ViewEvent> {
        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        let mut events = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.bloom_tab, BloomTab::Graph, "Graph");
                ui.selectable_value(&mut self.bloom_tab, BloomTab::Data, "Data");
                ui.separator();
                ui.weak(format!(
                    "{} facilities, {} movements shown",
                    self.graph_elements.nodes.len(),
                    self.graph_elements.edges.len()
                ));
            });
            ui.separator();

            match self.bloom_tab {
                BloomTab::Graph => {
                    events = self.graph.show(
                        ui,
                        GraphFrame {
                            elements: &self.graph_elements,
                            revision: self.elements_revision,
                            selected: self.selected.as_deref(),
                            zoom: &self.graph_zoom,
                            layout: self.layout,
                            live_physics: self.live_physics,
                        },
                    );
                }
                BloomTab::Data => self.draw_data_tables(ui),
            }
        });
        events
    }

    fn apply_events(&mut self, events: Vec<ViewEvent>, now: f64) {
        for event in events {
            match event {
                ViewEvent::Select(selected) => self.set_selected(selected),
                ViewEvent::Zoom(value) => self.active_zoom_mut().set(value),
                ViewEvent::Notice { level, title, body } => self.notices.push(level, title, body, now),
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &Context) {
        if ctx.input(|input| input.key_pressed(Key::F11)) {
            self.fullscreen.toggle(ctx);
        }
        if ctx.wants_keyboard_input() {
            return;
        }

        let action = ctx.input(|input| {
            if input.key_pressed(Key::Plus) || input.key_pressed(Key::Equals) {
                Some(ZoomAction::In)
            } else if input.key_pressed(Key::Minus) {
                Some(ZoomAction::Out)
            } else if input.key_pressed(Key::Num0) {
                Some(ZoomAction::Reset)
            } else {
                None
            }
        });
        if let Some(action) = action {
            self.apply_zoom_action(action);
        }
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.selected == selected {
            return;
        }
        tracing::debug!(selected = ?selected, "selection changed");
        self.selected = selected;
    }

    pub(in crate::app) fn set_active_view(&mut self, view: ActiveView) {
        if self.active_view == view {
            return;
        }
        tracing::info!(view = ?view, "switching view");
        match self.active_view {
            ActiveView::Map => self.map.teardown(),
            ActiveView::Bloom => self.graph.teardown(),
        }
        self.active_view = view;
    }

    pub(in crate::app) fn active_zoom(&self) -> &ZoomControl {
        match self.active_view {
            ActiveView::Map => &self.map_zoom,
            ActiveView::Bloom => &self.graph_zoom,
        }
    }

    fn active_zoom_mut(&mut self) -> &mut ZoomControl {
        match self.active_view {
            ActiveView::Map => &mut self.map_zoom,
            ActiveView::Bloom => &mut self.graph_zoom,
        }
    }

    pub(in crate::app) fn apply_zoom_action(&mut self, action: ZoomAction) {
        action.apply(self.active_zoom_mut());
        if action == ZoomAction::Reset {
            match self.active_view {
                ActiveView::Map => self.map.request_recenter(),
                ActiveView::Bloom => self.graph.request_recenter(),
            }
        }
    }

    pub(in crate::app) fn submit_search(&mut self) {
        let query = self.search_input.trim().to_owned();
        self.suggestions_open = false;
        if query == self.query {
            return;
        }
        tracing::info!(query = %query, "search submitted");
        self.query = query;
        self.elements_dirty = true;
    }

    pub(in crate::app) fn clear_search(&mut self) {
        self.search_input.clear();
        self.suggestions_open = false;
        if !self.query.is_empty() {
            self.query.clear();
            self.elements_dirty = true;
        }
    }
}
