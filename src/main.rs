mod app;
mod palette;
mod supply;
mod transform;
mod util;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use app::{ActiveView, LaunchOptions, SupplyChainApp};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Dataset JSON file; the bundled data set is used when omitted.
    #[arg(long)]
    data: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ActiveView::Map)]
    view: ActiveView,

    /// Map access token for this session. Not persisted.
    #[arg(long, env = "MAP_ACCESS_TOKEN")]
    map_token: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    tracing::info!(data = ?args.data, view = ?args.view, "starting supply chain visualizer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1440.0, 920.0])
            .with_min_inner_size([960.0, 600.0]),
        ..Default::default()
    };
    let launch = LaunchOptions {
        data: args.data,
        view: args.view,
        map_token: args.map_token,
    };

    eframe::run_native(
        "Supply Chain Visualizer",
        options,
        Box::new(move |cc| Ok(Box::new(SupplyChainApp::new(cc, launch)))),
    )
}
