mod app;
mod color;
mod ui;

use app::DashboardApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let dashboards = rusty_dash::config::load_dashboards().unwrap_or_else(|e| {
        log::error!("Failed to load dashboard config, using built-in dashboards: {e:#}");
        rusty_dash::config::presets()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Dash",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(dashboards)))),
    )
}
