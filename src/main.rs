mod app;
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;

use app::DashboardApp;
use covid_dash::config::DashboardConfig;
use covid_dash::controller::InteractionController;
use covid_dash::data::loader::load_source;
use covid_dash::export::JsonExporter;
use covid_dash::state::DashboardState;

fn main() -> Result<()> {
    let config = DashboardConfig::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter()))
        .init();

    // The dataset is loaded exactly once; nothing runs on a failed load.
    let dataset = load_source(&config.data)
        .map(Arc::new)
        .with_context(|| format!("loading dataset {}", config.data))?;

    let controller = InteractionController::new(Arc::clone(&dataset));
    let weeks = config.initial_weeks();
    let country = config.initial_country(&dataset);

    if let Some(dir) = &config.export {
        let mut exporter = JsonExporter::new();
        controller.initial_render(&weeks, &country, &mut exporter);
        exporter
            .write_to(dir)
            .with_context(|| format!("exporting charts to {}", dir.display()))?;
        return Ok(());
    }

    let state = DashboardState::new(controller, weeks, country, config.frame_duration());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.width, config.height])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Covid 19 - Europe's overview in 2021",
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard window failed: {e}"))
}
