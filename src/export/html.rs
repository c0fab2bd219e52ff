use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;

use crate::chart::spec::{format_number, Bars, ChartData, ChartKind, ChartSpec, Heatmap, Scatter};
use crate::color::{heat_color, normalize, series_colors};

use super::ExportError;

/// Cell values are printed inside heatmaps up to this many cells.
const MAX_LABELLED_CELLS: usize = 400;
/// Width kept for the heatmap colour bar, in pixels.
const COLOR_BAR_WIDTH: i32 = 110;
const FONT: &str = "sans-serif";

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

#[derive(Serialize)]
struct Embedded<'a> {
    kind: ChartKind,
    #[serde(flatten)]
    chart: &'a ChartSpec,
}

fn plot_error<E: std::error::Error>(e: E) -> ExportError {
    ExportError::Plot(e.to_string())
}

/// A complete HTML page: inline SVG drawing plus the chart spec as JSON.
pub fn render_html(chart: &ChartSpec, width: u32) -> Result<String, ExportError> {
    let svg = render_svg(chart, width)?;
    let json = serde_json::to_string_pretty(&Embedded {
        kind: chart.kind(),
        chart,
    })?
    // keep the JSON from closing the script element
    .replace("</", "<\\/");
    let title = chart
        .title
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");

    Ok(format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         <style>body {{ font-family: sans-serif; margin: 24px; }}</style>\n\
         </head>\n\
         <body>\n\
         {svg}\n\
         <script type=\"application/json\" id=\"chart-spec\">\n{json}\n</script>\n\
         </body>\n\
         </html>\n"
    ))
}

/// Draw `chart` as an SVG document `width` pixels wide.
pub fn render_svg(chart: &ChartSpec, width: u32) -> Result<String, ExportError> {
    let size = (width.max(400), chart.height.max(300));
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;
        let body = root
            .titled(&chart.title, (FONT, 20))
            .map_err(plot_error)?;

        match &chart.data {
            ChartData::Scatter(s) => draw_scatter(&body, chart, s)?,
            ChartData::Bar(b) => draw_bars(&body, chart, b, 8)?,
            ChartData::Histogram(b) => draw_bars(&body, chart, b, 0)?,
            ChartData::Heatmap(h) => draw_heatmap(&body, chart, h)?,
        }
        root.present().map_err(plot_error)?;
    }
    Ok(svg)
}

/// Label of the category at integer position `v`, empty in between.
fn category_at(categories: &[String], v: f64) -> String {
    if v < 0.0 || (v - v.round()).abs() > 1e-6 {
        return String::new();
    }
    categories.get(v.round() as usize).cloned().unwrap_or_default()
}

fn segment_label(categories: &[String], v: &SegmentValue<u32>) -> String {
    match v {
        SegmentValue::CenterOf(i) => categories.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

/// `[lo, hi]` of `values` widened by 5% on both ends.
fn padded_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let (lo, hi) = if !lo.is_finite() || !hi.is_finite() {
        (0.0, 1.0)
    } else if lo == hi {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo, hi)
    };
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

fn draw_scatter(area: &Area, chart: &ChartSpec, scatter: &Scatter) -> Result<(), ExportError> {
    let x_range = match &scatter.x_categories {
        Some(cats) => -0.5..(cats.len().max(1) as f64 - 0.5),
        None => padded_range(scatter.series.iter().flat_map(|s| s.points.iter().map(|p| p[0]))),
    };
    let y_range = padded_range(scatter.series.iter().flat_map(|s| s.points.iter().map(|p| p[1])));

    let mut ctx = ChartBuilder::on(area)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)
        .map_err(plot_error)?;

    let categories = scatter.x_categories.clone().unwrap_or_default();
    let category_label = |v: &f64| category_at(&categories, *v);
    let number_label = |v: &f64| format_number(*v);
    let mut mesh = ctx.configure_mesh();
    mesh.x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .y_label_formatter(&number_label);
    if scatter.x_categories.is_some() {
        mesh.x_labels(categories.len() + 1)
            .x_label_formatter(&category_label);
    }
    mesh.draw().map_err(plot_error)?;

    let colors = series_colors(scatter.series.len());
    for (series, color) in scatter.series.iter().zip(colors) {
        let color = color.to_rgb_color();
        let drawn = ctx
            .draw_series(
                series
                    .points
                    .iter()
                    .map(|p| Circle::new((p[0], p[1]), 4, color.mix(0.8).filled())),
            )
            .map_err(plot_error)?;
        if let Some(name) = &series.name {
            drawn
                .label(name.as_str())
                .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
        }
    }

    if chart.color.is_some() {
        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_error)?;
    }
    Ok(())
}

/// One stacked segment: series index, category index, bottom and top.
/// Positive values stack upward from zero and negative values downward.
fn stack_segments(bars: &Bars) -> Vec<(usize, usize, f64, f64)> {
    let mut pos_top = vec![0.0f64; bars.categories.len()];
    let mut neg_bottom = vec![0.0f64; bars.categories.len()];
    let mut segments = Vec::new();
    for (s, series) in bars.series.iter().enumerate() {
        for (i, value) in series.values.iter().enumerate() {
            let Some(v) = *value else { continue };
            if v >= 0.0 {
                segments.push((s, i, pos_top[i], pos_top[i] + v));
                pos_top[i] += v;
            } else {
                segments.push((s, i, neg_bottom[i] + v, neg_bottom[i]));
                neg_bottom[i] += v;
            }
        }
    }
    segments
}

fn draw_bars(area: &Area, chart: &ChartSpec, bars: &Bars, gap: u32) -> Result<(), ExportError> {
    let segments = stack_segments(bars);
    let lo = segments.iter().map(|s| s.2).fold(0.0, f64::min);
    let hi = segments.iter().map(|s| s.3).fold(0.0, f64::max);
    let y_range = if hi == lo { lo..(lo + 1.0) } else { lo..(hi + (hi - lo) * 0.05) };
    let n = bars.categories.len().max(1) as u32;

    let mut ctx = ChartBuilder::on(area)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..n).into_segmented(), y_range)
        .map_err(plot_error)?;

    let label = |v: &SegmentValue<u32>| segment_label(&bars.categories, v);
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(n as usize)
        .x_label_formatter(&label)
        .y_label_formatter(&|v: &f64| format_number(*v))
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()
        .map_err(plot_error)?;

    let colors = series_colors(bars.series.len());
    for (s, (series, color)) in bars.series.iter().zip(colors).enumerate() {
        let color = color.to_rgb_color();
        let drawn = ctx
            .draw_series(segments.iter().filter(|seg| seg.0 == s).map(|&(_, i, from, to)| {
                let i = i as u32;
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(i), from), (SegmentValue::Exact(i + 1), to)],
                    color.filled(),
                );
                bar.set_margin(0, 0, gap, gap);
                bar
            }))
            .map_err(plot_error)?;
        if let Some(name) = &series.name {
            drawn
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }

    if chart.color.is_some() {
        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_error)?;
    }
    Ok(())
}

fn draw_heatmap(area: &Area, chart: &ChartSpec, heat: &Heatmap) -> Result<(), ExportError> {
    let width = area.dim_in_pixel().0 as i32;
    let (grid, bar) = area.split_horizontally(width - COLOR_BAR_WIDTH);
    let nx = heat.x_categories.len().max(1) as u32;
    let ny = heat.y_categories.len().max(1) as u32;
    let (lo, hi) = heat.range();
    let labelled = heat.x_categories.len() * heat.y_categories.len() <= MAX_LABELLED_CELLS;

    let mut ctx = ChartBuilder::on(&grid)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d((0u32..nx).into_segmented(), (0u32..ny).into_segmented())
        .map_err(plot_error)?;

    // First Y category on top.
    let y_top_down: Vec<String> = heat.y_categories.iter().rev().cloned().collect();
    let x_label = |v: &SegmentValue<u32>| segment_label(&heat.x_categories, v);
    let y_label = |v: &SegmentValue<u32>| segment_label(&y_top_down, v);
    ctx.configure_mesh()
        .disable_mesh()
        .x_labels(nx as usize)
        .y_labels(ny as usize)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()
        .map_err(plot_error)?;

    let rows = heat.y_categories.len() as u32;
    let cells: Vec<(u32, u32, f64)> = heat
        .cells
        .iter()
        .enumerate()
        .flat_map(|(i, column)| {
            column
                .iter()
                .enumerate()
                .map(move |(j, &v)| (i as u32, rows - 1 - j as u32, v))
        })
        .collect();

    ctx.draw_series(cells.iter().map(|&(i, r, v)| {
        let fill = heat_color(normalize(v, lo, hi)).to_rgb_color();
        Rectangle::new(
            [
                (SegmentValue::Exact(i), SegmentValue::Exact(r)),
                (SegmentValue::Exact(i + 1), SegmentValue::Exact(r + 1)),
            ],
            fill.filled(),
        )
    }))
    .map_err(plot_error)?;

    if labelled {
        let centered = Pos::new(HPos::Center, VPos::Center);
        ctx.draw_series(cells.iter().map(|&(i, r, v)| {
            let ink = if normalize(v, lo, hi) > 0.5 { WHITE } else { BLACK };
            Text::new(
                format_number(v),
                (SegmentValue::CenterOf(i), SegmentValue::CenterOf(r)),
                (FONT, 12).into_font().color(&ink).pos(centered),
            )
        }))
        .map_err(plot_error)?;
    }

    draw_color_bar(&bar, lo, hi)
}

/// Vertical legend of the heat scale between `lo` and `hi`.
fn draw_color_bar(area: &Area, lo: f64, hi: f64) -> Result<(), ExportError> {
    let top = if hi > lo { hi } else { lo + 1.0 };
    let mut ctx = ChartBuilder::on(area)
        .margin_top(20)
        .margin_bottom(80)
        .margin_left(10)
        .set_label_area_size(LabelAreaPosition::Right, 60)
        .build_cartesian_2d(0.0..1.0, lo..top)
        .map_err(plot_error)?;

    ctx.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(5)
        .y_label_formatter(&|v: &f64| format_number(*v))
        .draw()
        .map_err(plot_error)?;

    let steps = 20;
    let step = (top - lo) / steps as f64;
    ctx.draw_series((0..steps).map(|k| {
        let from = lo + step * k as f64;
        let fill = heat_color(normalize(from + step / 2.0, lo, top)).to_rgb_color();
        Rectangle::new([(0.0, from), (1.0, from + step)], fill.filled())
    }))
    .map_err(plot_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::request::{Aggregation, ChartRequest, Relationship};
    use crate::chart::selector::select_chart;
    use crate::data::loader::read_csv;

    fn chart(rel: Relationship, x: &str, y: &str, agg: Aggregation) -> ChartSpec {
        let table = read_csv(
            "units,region,price,channel\n\
             1,North,2.5,web\n\
             2,South,3.0,store\n\
             3,North,4.0,web\n"
                .as_bytes(),
        )
        .unwrap();
        select_chart(&table, &ChartRequest::new(rel, x, y).with_aggregation(agg))
            .chart
            .unwrap()
    }

    #[test]
    fn page_is_self_contained() {
        let html = render_html(&chart(Relationship::Auto, "units", "price", Aggregation::Count), 900)
            .unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>price vs units (Scatter)</title>"));
        assert!(html.contains("<svg"));
        assert_eq!(html.matches("<circle").count(), 3);
        assert!(!html.contains("src=\"http"));
        assert!(html.contains("\"kind\": \"scatter\""));
    }

    #[test]
    fn bars_and_heatmap_draw_shapes() {
        let bars = render_svg(&chart(Relationship::Auto, "region", "price", Aggregation::Sum), 900)
            .unwrap();
        assert!(bars.matches("<rect").count() >= 2);
        assert!(bars.contains("North"));
        assert!(bars.contains("South"));

        let heat = render_svg(
            &chart(Relationship::ManyToMany, "region", "channel", Aggregation::Count),
            900,
        )
        .unwrap();
        assert!(heat.contains("store"));
        assert!(heat.contains("web"));
    }

    #[test]
    fn text_is_escaped() {
        let mut spec = chart(Relationship::Auto, "units", "price", Aggregation::Count);
        spec.title = "</script><b>".into();
        let html = render_html(&spec, 900).unwrap();
        assert!(!html.contains("</script><b>"));
        assert!(html.contains("<title>&lt;/script&gt;&lt;b&gt;</title>"));
    }

    #[test]
    fn stacks_split_positive_and_negative_values() {
        let bars = Bars {
            categories: vec!["a".into(), "b".into()],
            series: vec![
                crate::chart::spec::BarSeries {
                    name: Some("x".into()),
                    values: vec![Some(2.0), Some(-1.0)],
                },
                crate::chart::spec::BarSeries {
                    name: Some("y".into()),
                    values: vec![Some(3.0), None],
                },
            ],
        };
        assert_eq!(
            stack_segments(&bars),
            vec![(0, 0, 0.0, 2.0), (0, 1, -1.0, 0.0), (1, 0, 2.0, 5.0)]
        );
    }

    #[test]
    fn categories_label_integer_positions_only() {
        let cats = vec!["North".to_string(), "South".to_string()];
        assert_eq!(category_at(&cats, 1.0), "South");
        assert_eq!(category_at(&cats, 0.5), "");
        assert_eq!(category_at(&cats, -1.0), "");
        assert_eq!(segment_label(&cats, &SegmentValue::CenterOf(0)), "North");
        assert_eq!(segment_label(&cats, &SegmentValue::Exact(0)), "");
    }
}
