use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::data::model::{Column, Value};

use super::request::Aggregation;

// ---------------------------------------------------------------------------
// Chart specification handed to the renderers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Scatter,
    Bar,
    Histogram,
    Heatmap,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::Scatter => "scatter",
            ChartKind::Bar => "bar",
            ChartKind::Histogram => "histogram",
            ChartKind::Heatmap => "heatmap",
        };
        f.write_str(name)
    }
}

/// A fully parameterized chart: the on-screen plot and the HTML export
/// both draw from this alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Column the series are split by, if any.
    pub color: Option<String>,
    pub height: u32,
    pub data: ChartData,
}

impl ChartSpec {
    pub fn kind(&self) -> ChartKind {
        match self.data {
            ChartData::Scatter(_) => ChartKind::Scatter,
            ChartData::Bar(_) => ChartKind::Bar,
            ChartData::Histogram(_) => ChartKind::Histogram,
            ChartData::Heatmap(_) => ChartKind::Heatmap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ChartData {
    Scatter(Scatter),
    Bar(Bars),
    Histogram(Bars),
    Heatmap(Heatmap),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub name: Option<String>,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scatter {
    /// Set when X is categorical: point x coordinates index into this list.
    pub x_categories: Option<Vec<String>>,
    pub series: Vec<ScatterSeries>,
}

/// One stack layer of a bar chart, aligned with [`Bars::categories`].
/// `None` means no bar for that category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub name: Option<String>,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bars {
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
}

impl Bars {
    /// Height of the full stack for each category.
    pub fn totals(&self) -> Vec<f64> {
        (0..self.categories.len())
            .map(|i| self.series.iter().filter_map(|s| s.values[i]).sum())
            .collect()
    }
}

/// A pivot grid: `cells[i][j]` belongs to `x_categories[i]` and
/// `y_categories[j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub x_categories: Vec<String>,
    pub y_categories: Vec<String>,
    pub cells: Vec<Vec<f64>>,
}

impl Heatmap {
    /// Smallest and largest cell, `(0, 0)` for an empty grid.
    pub fn range(&self) -> (f64, f64) {
        let mut cells = self.cells.iter().flatten().copied();
        let Some(first) = cells.next() else {
            return (0.0, 0.0);
        };
        cells.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)))
    }
}

// ---------------------------------------------------------------------------
// Builders: table columns → chart data
// ---------------------------------------------------------------------------

fn sorted_distinct(col: &Column) -> Vec<&Value> {
    col.distinct_values().into_iter().collect()
}

fn position_of<'a>(categories: &[&'a Value]) -> BTreeMap<&'a Value, usize> {
    categories.iter().enumerate().map(|(i, v)| (*v, i)).collect()
}

/// Series keys of the colour column, or a single unnamed series.
fn color_keys(color: Option<&Column>) -> Vec<Option<&Value>> {
    match color {
        Some(c) => sorted_distinct(c).into_iter().map(Some).collect(),
        None => vec![None],
    }
}

/// Whether row `i` belongs to series `key`. Rows with a missing colour
/// value belong to no series.
fn in_series(color: Option<&Column>, key: Option<&Value>, i: usize) -> bool {
    match (color, key) {
        (Some(c), Some(k)) => &c.values[i] == k,
        _ => true,
    }
}

/// Points of every row where X and Y are present, one series per colour
/// value. Categorical X is placed at its index in the sorted categories.
pub fn scatter(x: &Column, y: &Column, color: Option<&Column>) -> Scatter {
    let x_categories = (!x.is_numeric()).then(|| sorted_distinct(x));
    let x_pos = x_categories.as_deref().map(position_of);

    let series = color_keys(color)
        .into_iter()
        .map(|key| {
            let points = (0..x.len())
                .filter(|&i| in_series(color, key, i))
                .filter_map(|i| {
                    let yv = y.values[i].as_f64()?;
                    let xv = match &x_pos {
                        Some(pos) => *pos.get(&x.values[i])? as f64,
                        None => x.values[i].as_f64()?,
                    };
                    Some([xv, yv])
                })
                .collect();
            ScatterSeries {
                name: key.map(|k| k.to_string()),
                points,
            }
        })
        .collect();

    Scatter {
        x_categories: x_categories.map(|cats| cats.iter().map(|v| v.to_string()).collect()),
        series,
    }
}

/// Row counts per X category, stacked by colour value.
pub fn category_counts(x: &Column, color: Option<&Column>) -> Bars {
    let categories = sorted_distinct(x);
    let pos = position_of(&categories);

    let series = color_keys(color)
        .into_iter()
        .map(|key| {
            let mut counts = vec![0usize; categories.len()];
            for i in (0..x.len()).filter(|&i| in_series(color, key, i)) {
                if let Some(&p) = pos.get(&x.values[i]) {
                    counts[p] += 1;
                }
            }
            BarSeries {
                name: key.map(|k| k.to_string()),
                values: counts
                    .into_iter()
                    .map(|n| (n > 0 || color.is_none()).then_some(n as f64))
                    .collect(),
            }
        })
        .collect();

    Bars {
        categories: categories.iter().map(|v| v.to_string()).collect(),
        series,
    }
}

/// One bar per X group holding `aggregation` of the group's Y values.
/// With `split_by_group` every group becomes its own series, which is how
/// a colour column equal to X shows up.
pub fn grouped_aggregate(
    x: &Column,
    y: &Column,
    aggregation: Aggregation,
    split_by_group: bool,
) -> Bars {
    let categories = sorted_distinct(x);
    let pos = position_of(&categories);

    let mut groups: Vec<Vec<f64>> = vec![Vec::new(); categories.len()];
    for (xv, yv) in x.values.iter().zip(&y.values) {
        if let (Some(&p), Some(v)) = (pos.get(xv), yv.as_f64()) {
            groups[p].push(v);
        }
    }
    let values: Vec<Option<f64>> = groups.iter().map(|g| aggregation.apply(g)).collect();

    let series = if split_by_group {
        categories
            .iter()
            .enumerate()
            .map(|(i, cat)| BarSeries {
                name: Some(cat.to_string()),
                values: (0..categories.len())
                    .map(|j| if i == j { values[i] } else { None })
                    .collect(),
            })
            .collect()
    } else {
        vec![BarSeries { name: None, values }]
    };

    Bars {
        categories: categories.iter().map(|v| v.to_string()).collect(),
        series,
    }
}

/// Distribution of X: counts per category, or per equal-width bin for a
/// numeric X (Sturges' rule).
pub fn histogram(x: &Column, color: Option<&Column>) -> Bars {
    if !x.is_numeric() {
        return category_counts(x, color);
    }

    let present: Vec<f64> = x.values.iter().filter_map(Value::as_f64).collect();
    let Some(edges) = bin_edges(&present) else {
        return Bars {
            categories: Vec::new(),
            series: Vec::new(),
        };
    };
    let n_bins = edges.len() - 1;
    let lo = edges[0];
    let width = edges[n_bins] - lo;

    let bin_of = |v: f64| -> usize {
        if width == 0.0 {
            0
        } else {
            (((v - lo) / width * n_bins as f64) as usize).min(n_bins - 1)
        }
    };

    let series = color_keys(color)
        .into_iter()
        .map(|key| {
            let mut counts = vec![0usize; n_bins];
            for i in (0..x.len()).filter(|&i| in_series(color, key, i)) {
                if let Some(v) = x.values[i].as_f64() {
                    counts[bin_of(v)] += 1;
                }
            }
            BarSeries {
                name: key.map(|k| k.to_string()),
                values: counts
                    .into_iter()
                    .map(|n| (n > 0 || color.is_none()).then_some(n as f64))
                    .collect(),
            }
        })
        .collect();

    let categories = (0..n_bins)
        .map(|b| {
            let close = if b + 1 == n_bins { "]" } else { ")" };
            format!(
                "[{}, {}{close}",
                format_number(edges[b]),
                format_number(edges[b + 1])
            )
        })
        .collect();

    Bars { categories, series }
}

/// Bin edges for `values`: `ceil(log2 n) + 1` equal-width bins over the
/// observed range. `None` when there are no values.
pub fn bin_edges(values: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return Some(vec![min, max]);
    }
    let n_bins = ((values.len() as f64).log2().ceil() as usize + 1).max(1);
    let step = (max - min) / n_bins as f64;
    let mut edges: Vec<f64> = (0..n_bins).map(|i| min + step * i as f64).collect();
    edges.push(max);
    Some(edges)
}

/// Short numeric label: integers without decimals, others to 3 places.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        let s = format!("{v:.3}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Pivot X × Y. `Count` tallies co-occurring pairs; `Sum` / `Mean`
/// aggregate the non-missing values of `values` per cell. Empty cells are
/// zero.
pub fn pivot(x: &Column, y: &Column, values: &Column, aggregation: Aggregation) -> Heatmap {
    let x_cats = sorted_distinct(x);
    let y_cats = sorted_distinct(y);
    let x_pos = position_of(&x_cats);
    let y_pos = position_of(&y_cats);

    let mut cells: Vec<Vec<Vec<f64>>> = vec![vec![Vec::new(); y_cats.len()]; x_cats.len()];
    let mut tally = vec![vec![0usize; y_cats.len()]; x_cats.len()];
    for i in 0..x.len() {
        let (Some(&xi), Some(&yi)) = (x_pos.get(&x.values[i]), y_pos.get(&y.values[i])) else {
            continue;
        };
        tally[xi][yi] += 1;
        if let Some(v) = values.values[i].as_f64() {
            cells[xi][yi].push(v);
        }
    }

    let cells = match aggregation {
        Aggregation::Count => tally
            .into_iter()
            .map(|row| row.into_iter().map(|n| n as f64).collect())
            .collect(),
        agg => cells
            .iter()
            .map(|row| row.iter().map(|c| agg.apply(c).unwrap_or(0.0)).collect())
            .collect(),
    };

    Heatmap {
        x_categories: x_cats.iter().map(|v| v.to_string()).collect(),
        y_categories: y_cats.iter().map(|v| v.to_string()).collect(),
        cells,
    }
}
