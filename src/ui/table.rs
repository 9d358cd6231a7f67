use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use rusty_dash::present::{Metric, TableView};

const ROW_HEIGHT: f32 = 18.0;
const TABLE_MAX_HEIGHT: f32 = 420.0;

/// Summary numbers side by side above the charts.
pub fn metrics_row(ui: &mut Ui, metrics: &[Metric]) {
    if metrics.is_empty() {
        return;
    }
    ui.horizontal(|ui: &mut Ui| {
        for metric in metrics {
            egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
                ui.vertical(|ui: &mut Ui| {
                    ui.label(RichText::new(&metric.label).weak());
                    ui.label(RichText::new(metric.display()).size(22.0).strong());
                });
            });
        }
    });
}

/// The filtered, unaggregated rows.  Rows are virtualised so large tables
/// stay responsive.
pub fn data_table(ui: &mut Ui, view: &TableView) {
    if view.columns.is_empty() {
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(TABLE_MAX_HEIGHT)
        .columns(Column::auto().at_least(60.0).clip(true), view.columns.len())
        .header(ROW_HEIGHT + 4.0, |mut header| {
            for col in &view.columns {
                header.col(|ui| {
                    ui.strong(col);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, view.rows.len(), |mut row| {
                let cells = &view.rows[row.index()];
                for cell in cells {
                    row.col(|ui| {
                        ui.label(cell);
                    });
                }
            });
        });
}
