use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use rusty_dash::data::model::Value;
use rusty_dash::error::DashboardError;
use rusty_dash::pipeline::RunOutcome;
use rusty_dash::present::View;
use rusty_dash::state::AppState;

/// A click in the filter panel, applied once the panel is drawn.
enum FilterAction {
    All(String, bool),
    Value(String, Value, bool),
    None(String),
    Reset,
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    let mut actions = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if ui.small_button("Reset filters").clicked() {
                actions.push(FilterAction::Reset);
            }
            ui.separator();

            // ---- One multi-select per dimension (collapsible) ----
            for control in &state.controls {
                let selected = state
                    .selections
                    .get(&control.column)
                    .cloned()
                    .unwrap_or_default();

                let header_text = format!("{}  ({})", control.label, selected.summary());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(&control.column)
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        if ui.small_button("None").clicked() {
                            actions.push(FilterAction::None(control.column.clone()));
                        }

                        let mut all = selected.all;
                        if ui.checkbox(&mut all, RichText::new("All").italics()).changed() {
                            actions.push(FilterAction::All(control.column.clone(), all));
                        }

                        for val in &control.options {
                            let mut checked = selected.values.contains(val);
                            if ui.checkbox(&mut checked, val.to_string()).changed() {
                                actions.push(FilterAction::Value(
                                    control.column.clone(),
                                    val.clone(),
                                    checked,
                                ));
                            }
                        }
                    });
            }
        });

    // Every change re-runs the whole pipeline.
    for action in actions {
        match action {
            FilterAction::All(col, checked) => state.set_all(&col, checked),
            FilterAction::Value(col, val, checked) => state.set_value(&col, &val, checked),
            FilterAction::None(col) => state.select_none(&col),
            FilterAction::Reset => state.reset_filters(),
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.  Returns the dashboard to switch to, if any.
pub fn top_bar(ui: &mut Ui, dashboards: &mut [AppState], active: usize) -> Option<usize> {
    let mut switch_to = None;
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Dashboard", |ui: &mut Ui| {
            for (i, d) in dashboards.iter().enumerate() {
                if ui.selectable_label(i == active, &d.config.title).clicked() {
                    switch_to = Some(i);
                    ui.close_menu();
                }
            }
        });

        ui.separator();

        let Some(state) = dashboards.get_mut(active) else {
            return;
        };

        if ui.button("Reload").clicked() {
            state.run();
        }

        ui.separator();

        if state.dataset.is_some() {
            ui.label(format!(
                "{} rows loaded, {} visible",
                state.total_rows(),
                state.visible_rows()
            ));
        }

        ui.separator();
        ui.label(RichText::new(state.config.data_path.display().to_string()).weak());
    });
    switch_to
}

// ---------------------------------------------------------------------------
// Central panel – title, errors, warnings
// ---------------------------------------------------------------------------

pub fn header(ui: &mut Ui, state: &AppState) {
    ui.heading(&state.config.title);
    if let Some(subtitle) = &state.config.subtitle {
        ui.label(RichText::new(subtitle).size(16.0));
    }
    ui.separator();
}

/// Show a fatal error or the empty-result warning; otherwise hand back the view.
pub fn run_result<'a>(ui: &mut Ui, state: &'a AppState) -> Option<&'a View> {
    if let Some(err) = &state.error {
        let text = match err {
            DashboardError::FileNotFound(_) => "Dataset file not found in repository.".to_string(),
            other => other.to_string(),
        };
        ui.label(RichText::new(text).color(Color32::RED));
        if let DashboardError::Schema(schema) = err {
            ui.label("Available columns:");
            for col in &schema.available {
                ui.monospace(col);
            }
        }
        return None;
    }

    match &state.outcome {
        Some(RunOutcome::Rendered(view)) => Some(view),
        Some(RunOutcome::NoData(warning)) => {
            ui.label(RichText::new(warning.to_string()).color(Color32::from_rgb(200, 150, 0)));
            None
        }
        None => {
            ui.label("Loading…");
            None
        }
    }
}
