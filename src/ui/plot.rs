use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points};

use rusty_dash::data::model::Value;
use rusty_dash::present::{ChartKind, ChartSpec, Series};

use crate::color::ColorMap;

const CHART_HEIGHT: f32 = 360.0;
/// Share of a category slot covered by its group of bars.
const GROUP_WIDTH: f64 = 0.8;
const MIN_RADIUS: f32 = 3.0;
const MAX_RADIUS: f32 = 18.0;

// ---------------------------------------------------------------------------
// Chart rendering (central panel)
// ---------------------------------------------------------------------------

/// Render one chart specification.
pub fn chart(ui: &mut Ui, spec: &ChartSpec, index: usize) {
    ui.add_space(8.0);
    ui.strong(&spec.title);

    let series = spec.series();
    let names: Vec<Value> = series.iter().filter_map(|s| s.name.clone()).collect();
    let colors = ColorMap::new(&names);

    match spec.kind {
        ChartKind::Bar => bar_chart(ui, spec, &series, &colors, index),
        ChartKind::Scatter => scatter_chart(ui, spec, &series, &colors, index),
    }
}

fn series_name(spec: &ChartSpec, series: &Series) -> String {
    series
        .name
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| spec.y_label().to_string())
}

fn series_color(colors: &ColorMap, series: &Series) -> Color32 {
    series
        .name
        .as_ref()
        .map(|v| colors.color_for(v))
        .unwrap_or(Color32::LIGHT_BLUE)
}

/// Bars per x category, one bar per series side by side.
fn bar_chart(ui: &mut Ui, spec: &ChartSpec, series: &[Series], colors: &ColorMap, index: usize) {
    let categories = spec.categories();
    let n_series = series.len().max(1);
    let bar_width = GROUP_WIDTH / n_series as f64;

    let charts: Vec<BarChart> = series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let offset = -GROUP_WIDTH / 2.0 + bar_width * (i as f64 + 0.5);
            let bars = s
                .points
                .iter()
                .filter_map(|p| {
                    let slot = categories.iter().position(|c| *c == p.x)?;
                    Some(
                        Bar::new(slot as f64 + offset, p.y)
                            .width(bar_width)
                            .name(format!("{} / {}", p.x, series_name(spec, s))),
                    )
                })
                .collect();
            BarChart::new(bars)
                .name(series_name(spec, s))
                .color(series_color(colors, s))
        })
        .collect();

    let labels: Vec<String> = categories.iter().map(|c| c.to_string()).collect();

    Plot::new(("bar_chart", index))
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label(spec.x_label())
        .y_axis_label(spec.y_label())
        .x_axis_formatter(move |mark, _range| {
            let slot = mark.value.round();
            if (mark.value - slot).abs() > 1e-6 || slot < 0.0 {
                return String::new();
            }
            labels.get(slot as usize).cloned().unwrap_or_default()
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });

    if let Some(title) = spec.legend_title() {
        ui.label(format!("Legend: {title}"));
    }
}

/// Markers at (x, y); radius scales with the size encoding.
fn scatter_chart(ui: &mut Ui, spec: &ChartSpec, series: &[Series], colors: &ColorMap, index: usize) {
    let max_size = spec.max_size().filter(|m| *m > 0.0);

    Plot::new(("scatter_chart", index))
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label(spec.x_label())
        .y_axis_label(spec.y_label())
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for s in series {
                let name = series_name(spec, s);
                let color = series_color(colors, s);
                for p in &s.points {
                    let Some(x) = p.x.as_f64() else {
                        continue;
                    };
                    let radius = match (p.size, max_size) {
                        (Some(size), Some(max)) => {
                            let share = (size / max).clamp(0.0, 1.0).sqrt() as f32;
                            MIN_RADIUS + share * (MAX_RADIUS - MIN_RADIUS)
                        }
                        _ => MIN_RADIUS * 2.0,
                    };
                    plot_ui.points(
                        Points::new(PlotPoints::new(vec![[x, p.y]]))
                            .radius(radius)
                            .color(color)
                            .name(&name),
                    );
                }
            }
        });

    if let Some(title) = spec.legend_title() {
        ui.label(format!("Legend: {title}"));
    }
}
