mod app;
mod chart;
mod color;
mod config;
mod data;
mod export;
mod state;
mod ui;

use std::path::Path;

use app::EdaExplorerApp;
use config::{ExplorerConfig, CONFIG_FILE};
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = ExplorerConfig::load_or_default(Path::new(CONFIG_FILE));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size(config.min_window_size),
        ..Default::default()
    };

    eframe::run_native(
        "EDA Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(EdaExplorerApp::new(config)))),
    )
}
