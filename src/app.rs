use eframe::egui;

use rusty_dash::config::DashboardConfig;
use rusty_dash::state::AppState;

use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    /// One state per dashboard; only the active one is drawn.
    pub dashboards: Vec<AppState>,
    pub active: usize,
}

impl DashboardApp {
    pub fn new(configs: Vec<DashboardConfig>) -> Self {
        let mut dashboards: Vec<AppState> = configs.into_iter().map(AppState::new).collect();
        if let Some(first) = dashboards.first_mut() {
            first.run();
        }
        Self {
            dashboards,
            active: 0,
        }
    }

    /// Switch dashboards; the newly shown one is run fresh.
    pub fn activate(&mut self, index: usize) {
        if index < self.dashboards.len() {
            self.active = index;
            self.dashboards[index].run();
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: dashboard switcher ----
        let mut switch_to = None;
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            switch_to = panels::top_bar(ui, &mut self.dashboards, self.active);
        });
        if let Some(index) = switch_to {
            self.activate(index);
        }

        let Some(state) = self.dashboards.get_mut(self.active) else {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.heading("No dashboards configured.");
            });
            return;
        };

        // ---- Left side panel: filters ----
        // Fatal load/schema errors halt the run before any filter is shown.
        if state.error.is_none() {
            egui::SidePanel::left("filter_panel")
                .default_width(240.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::side_panel(ui, state);
                });
        }

        // ---- Central panel: charts and table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    panels::header(ui, state);
                    let Some(view) = panels::run_result(ui, state) else {
                        return;
                    };
                    table::metrics_row(ui, &view.metrics);
                    for (i, chart) in view.charts.iter().enumerate() {
                        plot::chart(ui, chart, i);
                    }
                    ui.add_space(8.0);
                    ui.heading("Filtered Data");
                    table::data_table(ui, &view.table);
                });
        });
    }
}
