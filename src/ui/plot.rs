use std::ops::RangeInclusive;

use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, GridMark, Legend, Plot, PlotPoint, PlotPoints, Points, Polygon, Text,
};

use crate::chart::spec::{format_number, Bars, ChartData, ChartSpec, Heatmap, Scatter};
use crate::color::{heat_color, normalize, series_colors};

// ---------------------------------------------------------------------------
// Chart plot (central panel)
// ---------------------------------------------------------------------------

/// Render `chart` with egui_plot at the chart's own height.
pub fn chart_plot(ui: &mut Ui, chart: &ChartSpec) {
    ui.label(RichText::new(&chart.title).strong().size(16.0));

    // A fresh id per title resets zoom and bounds when the chart changes.
    let plot = Plot::new(("chart_plot", &chart.title))
        .height(chart.height as f32)
        .legend(Legend::default())
        .x_axis_label(chart.x_label.clone())
        .y_axis_label(chart.y_label.clone())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true);

    match &chart.data {
        ChartData::Scatter(scatter) => scatter_plot(ui, plot, scatter),
        ChartData::Bar(bars) => bar_plot(ui, plot, bars, 0.8),
        ChartData::Histogram(bars) => bar_plot(ui, plot, bars, 1.0),
        ChartData::Heatmap(heatmap) => heatmap_plot(ui, plot, heatmap),
    }
}

/// Axis formatter that prints `labels[i]` at integer position `i` and
/// nothing in between.
fn category_formatter(
    labels: Vec<String>,
) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let v = mark.value;
        if v < 0.0 || (v - v.round()).abs() > 1e-6 {
            return String::new();
        }
        labels.get(v.round() as usize).cloned().unwrap_or_default()
    }
}

fn scatter_plot(ui: &mut Ui, mut plot: Plot, scatter: &Scatter) {
    if let Some(categories) = &scatter.x_categories {
        plot = plot.x_axis_formatter(category_formatter(categories.clone()));
    }
    let colors = series_colors(scatter.series.len());

    plot.show(ui, |plot_ui| {
        for (series, color) in scatter.series.iter().zip(colors) {
            let points = PlotPoints::from(series.points.clone());
            let mut markers = Points::new(points).radius(3.0).color(color.to_color32());
            if let Some(name) = &series.name {
                markers = markers.name(name);
            }
            plot_ui.points(markers);
        }
    });
}

fn bar_plot(ui: &mut Ui, plot: Plot, bars: &Bars, width: f64) {
    let plot = plot.x_axis_formatter(category_formatter(bars.categories.clone()));
    let colors = series_colors(bars.series.len());

    let mut charts: Vec<BarChart> = Vec::with_capacity(bars.series.len());
    for (series, color) in bars.series.iter().zip(colors) {
        let items: Vec<Bar> = series
            .values
            .iter()
            .enumerate()
            .filter_map(|(i, value)| {
                let value = (*value)?;
                Some(
                    Bar::new(i as f64, value)
                        .width(width)
                        .name(&bars.categories[i]),
                )
            })
            .collect();
        let mut chart = BarChart::new(items).color(color.to_color32());
        if let Some(name) = &series.name {
            chart = chart.name(name);
        }
        let below: Vec<&BarChart> = charts.iter().collect();
        let chart = chart.stack_on(&below);
        charts.push(chart);
    }

    plot.show(ui, |plot_ui| {
        for chart in charts {
            plot_ui.bar_chart(chart);
        }
    });
}

fn heatmap_plot(ui: &mut Ui, plot: Plot, heatmap: &Heatmap) {
    let ny = heatmap.y_categories.len();
    // First Y category on top.
    let y_labels: Vec<String> = heatmap.y_categories.iter().rev().cloned().collect();
    let plot = plot
        .x_axis_formatter(category_formatter(heatmap.x_categories.clone()))
        .y_axis_formatter(category_formatter(y_labels))
        .show_grid(false)
        .data_aspect(1.0);
    let (lo, hi) = heatmap.range();

    plot.show(ui, |plot_ui| {
        for (i, column) in heatmap.cells.iter().enumerate() {
            for (j, &value) in column.iter().enumerate() {
                let x = i as f64;
                let y = (ny - 1 - j) as f64;
                let t = normalize(value, lo, hi);
                let fill = heat_color(t).to_color32();
                let square = vec![
                    [x - 0.5, y - 0.5],
                    [x + 0.5, y - 0.5],
                    [x + 0.5, y + 0.5],
                    [x - 0.5, y + 0.5],
                ];
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(square))
                        .fill_color(fill)
                        .stroke(Stroke::new(0.5, Color32::WHITE)),
                );
                let ink = if t > 0.5 { Color32::WHITE } else { Color32::BLACK };
                plot_ui.text(Text::new(
                    PlotPoint::new(x, y),
                    RichText::new(format_number(value)).color(ink),
                ));
            }
        }
    });
}
