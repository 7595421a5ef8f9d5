mod action_bar;
mod analysis;
mod annotation;
mod app;
mod canvas;
mod compose;
mod mapping;
mod report;
mod session;
mod session_store;
mod theme;
mod toolbar;
mod ui_controls;
mod viewport;

use std::sync::Arc;

use eframe::egui;

use crate::analysis::{CommandModel, ModelConfig};

fn main() -> eframe::Result<()> {
    env_logger::init();

    // The hosted-model gateway is configured here, once, and injected into
    // the app; nothing below this point reads the environment.
    let config = ModelConfig {
        gateway: std::env::var("MEDIMARK_GATEWAY")
            .unwrap_or_else(|_| "medimark-gateway".to_string()),
        api_key: std::env::var("MEDIMARK_API_KEY").ok(),
    };
    let model = Arc::new(CommandModel::new(config));

    let viewport = egui::ViewportBuilder::default()
        .with_title("MediMark")
        .with_inner_size([1180.0, 800.0])
        .with_min_inner_size([760.0, 560.0]);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "MediMark",
        options,
        Box::new(move |cc| Box::new(app::MediMarkApp::new(cc, model))),
    )
}
