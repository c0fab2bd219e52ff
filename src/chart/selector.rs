use crate::data::model::{Column, DataTable};

use super::request::{Aggregation, ChartRequest, Relationship};
use super::spec::{self, ChartData, ChartSpec};

pub const SCATTER_WARNING: &str = "Scatter plots work best with numeric columns for both X and Y.";
pub const BAR_WARNING: &str = "Bar plots work best when Y is numeric.";
pub const HEATMAP_WARNING: &str =
    "Many-to-Many heatmap requires both X and Y to be categorical columns.";
pub const HEATMAP_VALUES_WARNING: &str =
    "Heatmap sum/mean aggregates the first column, which is not numeric.";

/// Result of chart selection: a chart, a warning, or both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartOutcome {
    pub chart: Option<ChartSpec>,
    pub warning: Option<String>,
}

impl ChartOutcome {
    fn chart(spec: ChartSpec) -> Self {
        ChartOutcome {
            chart: Some(spec),
            warning: None,
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        ChartOutcome {
            chart: None,
            warning: Some(message.into()),
        }
    }

    fn with_warning(mut self, message: Option<&str>) -> Self {
        self.warning = message.map(str::to_string);
        self
    }
}

/// Decide which chart `request` gets on `table` (already filtered).
///
/// | Relationship | types fit            | otherwise                                  |
/// |--------------|----------------------|--------------------------------------------|
/// | Auto         | X,Y numeric: scatter | Y numeric: bar, else histogram of X        |
/// | One-to-One   | scatter              | warn; scatter if Y is numeric              |
/// | One-to-Many  | bar                  | warn; count bars only                      |
/// | Many-to-Many | heatmap              | warn; no chart                             |
pub fn select_chart(table: &DataTable, request: &ChartRequest) -> ChartOutcome {
    let (Some(x), Some(y)) = (table.column(&request.x), table.column(&request.y)) else {
        return ChartOutcome::warning(format!(
            "Unknown column selected: '{}' / '{}'",
            request.x, request.y
        ));
    };
    let color = request.color.as_deref().and_then(|c| table.column(c));
    let both_numeric = x.is_numeric() && y.is_numeric();
    let (xn, yn) = (&request.x, &request.y);

    let outcome = match request.relationship {
        Relationship::Auto => {
            if both_numeric {
                ChartOutcome::chart(scatter(request, x, y, color, format!("{yn} vs {xn} (Scatter)")))
            } else if y.is_numeric() {
                let title = match request.aggregation {
                    Aggregation::Count => format!("{yn} by {xn} (Bar)"),
                    agg => format!("{yn} by {xn} ({})", agg.title()),
                };
                ChartOutcome::chart(bar(request, x, y, color, title))
            } else {
                ChartOutcome::chart(histogram(request, x, color))
            }
        }
        Relationship::OneToOne => {
            let warning = (!both_numeric).then_some(SCATTER_WARNING);
            if y.is_numeric() {
                let title = format!("One-to-One: {yn} vs {xn}");
                ChartOutcome::chart(scatter(request, x, y, color, title)).with_warning(warning)
            } else {
                ChartOutcome::default().with_warning(warning)
            }
        }
        Relationship::OneToMany => {
            let warning = (!y.is_numeric()).then_some(BAR_WARNING);
            if y.is_numeric() || request.aggregation == Aggregation::Count {
                let title = format!(
                    "One-to-Many: {yn} by {xn} ({})",
                    request.aggregation.title()
                );
                ChartOutcome::chart(bar(request, x, y, color, title)).with_warning(warning)
            } else {
                ChartOutcome::default().with_warning(warning)
            }
        }
        Relationship::ManyToMany => {
            if x.is_numeric() || y.is_numeric() {
                ChartOutcome::warning(HEATMAP_WARNING)
            } else {
                heatmap(table, request, x, y)
            }
        }
    };

    match &outcome.chart {
        Some(chart) => log::debug!(
            "{} → {} chart '{}'",
            request.relationship,
            chart.kind(),
            chart.title
        ),
        None => log::warn!(
            "No chart for {} {xn} × {yn}: {}",
            request.relationship,
            outcome.warning.as_deref().unwrap_or("no reason given")
        ),
    }
    outcome
}

fn base_spec(request: &ChartRequest, title: String, color: Option<&Column>, data: ChartData) -> ChartSpec {
    ChartSpec {
        title,
        x_label: request.x_label.clone(),
        y_label: request.y_label.clone(),
        color: color.map(|c| c.name.clone()),
        height: request.height,
        data,
    }
}

fn scatter(
    request: &ChartRequest,
    x: &Column,
    y: &Column,
    color: Option<&Column>,
    title: String,
) -> ChartSpec {
    let data = ChartData::Scatter(spec::scatter(x, y, color));
    base_spec(request, title, color, data)
}

/// Count bars straight from the rows, or one aggregated bar per X group.
fn bar(
    request: &ChartRequest,
    x: &Column,
    y: &Column,
    color: Option<&Column>,
    title: String,
) -> ChartSpec {
    match request.aggregation {
        Aggregation::Count => {
            let data = ChartData::Bar(spec::category_counts(x, color));
            base_spec(request, title, color, data)
        }
        agg => {
            // only X survives grouping, so only a colour equal to X applies
            let color = color.filter(|c| c.name == x.name);
            let data = ChartData::Bar(spec::grouped_aggregate(x, y, agg, color.is_some()));
            base_spec(request, title, color, data)
        }
    }
}

fn histogram(request: &ChartRequest, x: &Column, color: Option<&Column>) -> ChartSpec {
    let title = format!("Distribution of {} (Histogram)", request.x);
    let data = ChartData::Histogram(spec::histogram(x, color));
    let mut chart = base_spec(request, title, color, data);
    chart.y_label = "count".to_string();
    chart
}

fn heatmap(table: &DataTable, request: &ChartRequest, x: &Column, y: &Column) -> ChartOutcome {
    let values = match request.aggregation {
        Aggregation::Count => x,
        _ => match table.columns().first() {
            Some(first) if first.is_numeric() => first,
            _ => return ChartOutcome::warning(HEATMAP_VALUES_WARNING),
        },
    };
    let title = format!("Many-to-Many: {} vs {} (Heatmap)", request.x, request.y);
    let data = ChartData::Heatmap(spec::pivot(x, y, values, request.aggregation));
    ChartOutcome::chart(base_spec(request, title, None, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::spec::ChartKind;
    use crate::data::loader::read_csv;

    fn table() -> DataTable {
        read_csv(
            "units,region,price,channel\n\
             1,North,2.5,web\n\
             2,South,3.0,store\n\
             3,North,4.0,web\n\
             4,East,1.0,store\n"
                .as_bytes(),
        )
        .unwrap()
    }

    fn kind(outcome: &ChartOutcome) -> Option<ChartKind> {
        outcome.chart.as_ref().map(ChartSpec::kind)
    }

    #[test]
    fn auto_numeric_pair_is_scatter() {
        let out = select_chart(&table(), &ChartRequest::new(Relationship::Auto, "units", "price"));
        assert_eq!(kind(&out), Some(ChartKind::Scatter));
        assert_eq!(out.warning, None);
        assert_eq!(out.chart.unwrap().title, "price vs units (Scatter)");
    }

    #[test]
    fn auto_categorical_x_sum_is_one_bar_per_group() {
        let req = ChartRequest::new(Relationship::Auto, "region", "price")
            .with_aggregation(Aggregation::Sum);
        let out = select_chart(&table(), &req);
        assert_eq!(out.warning, None);
        let chart = out.chart.unwrap();
        assert_eq!(chart.title, "price by region (Sum)");
        let ChartData::Bar(bars) = chart.data else {
            panic!("expected bar chart");
        };
        assert_eq!(bars.categories, vec!["East", "North", "South"]);
        assert_eq!(bars.series.len(), 1);
        assert_eq!(bars.series[0].values, vec![Some(1.0), Some(6.5), Some(3.0)]);
    }

    #[test]
    fn auto_count_bars_tally_rows() {
        let out = select_chart(&table(), &ChartRequest::new(Relationship::Auto, "region", "price"));
        let chart = out.chart.unwrap();
        assert_eq!(chart.title, "price by region (Bar)");
        let ChartData::Bar(bars) = chart.data else {
            panic!("expected bar chart");
        };
        assert_eq!(bars.totals(), vec![1.0, 2.0, 1.0]);
    }

    #[test]
    fn auto_categorical_y_falls_back_to_histogram_without_warning() {
        let out = select_chart(&table(), &ChartRequest::new(Relationship::Auto, "region", "channel"));
        assert_eq!(kind(&out), Some(ChartKind::Histogram));
        assert_eq!(out.warning, None);
        assert_eq!(out.chart.unwrap().title, "Distribution of region (Histogram)");
    }

    #[test]
    fn one_to_one_warns_on_categorical_x_but_still_plots() {
        let out = select_chart(
            &table(),
            &ChartRequest::new(Relationship::OneToOne, "region", "price"),
        );
        assert_eq!(out.warning.as_deref(), Some(SCATTER_WARNING));
        assert_eq!(kind(&out), Some(ChartKind::Scatter));
    }

    #[test]
    fn one_to_one_with_categorical_y_has_no_chart() {
        let out = select_chart(
            &table(),
            &ChartRequest::new(Relationship::OneToOne, "units", "region"),
        );
        assert_eq!(out.warning.as_deref(), Some(SCATTER_WARNING));
        assert!(out.chart.is_none());
    }

    #[test]
    fn one_to_many_bars() {
        let req = ChartRequest::new(Relationship::OneToMany, "region", "units")
            .with_aggregation(Aggregation::Mean);
        let out = select_chart(&table(), &req);
        assert_eq!(out.warning, None);
        let chart = out.chart.unwrap();
        assert_eq!(chart.title, "One-to-Many: units by region (Mean)");
        assert_eq!(chart.kind(), ChartKind::Bar);
    }

    #[test]
    fn one_to_many_categorical_y() {
        let counted = select_chart(
            &table(),
            &ChartRequest::new(Relationship::OneToMany, "region", "channel"),
        );
        assert_eq!(counted.warning.as_deref(), Some(BAR_WARNING));
        assert_eq!(kind(&counted), Some(ChartKind::Bar));

        let summed = select_chart(
            &table(),
            &ChartRequest::new(Relationship::OneToMany, "region", "channel")
                .with_aggregation(Aggregation::Sum),
        );
        assert_eq!(summed.warning.as_deref(), Some(BAR_WARNING));
        assert!(summed.chart.is_none());
    }

    #[test]
    fn many_to_many_rejects_numeric_columns() {
        for (x, y) in [("units", "region"), ("region", "price")] {
            let out = select_chart(&table(), &ChartRequest::new(Relationship::ManyToMany, x, y));
            assert!(out.chart.is_none());
            assert_eq!(out.warning.as_deref(), Some(HEATMAP_WARNING));
        }
    }

    #[test]
    fn many_to_many_counts_pairs() {
        let out = select_chart(
            &table(),
            &ChartRequest::new(Relationship::ManyToMany, "region", "channel"),
        );
        assert_eq!(out.warning, None);
        let chart = out.chart.unwrap();
        assert_eq!(chart.title, "Many-to-Many: region vs channel (Heatmap)");
        let ChartData::Heatmap(heat) = chart.data else {
            panic!("expected heatmap");
        };
        assert_eq!(heat.x_categories, vec!["East", "North", "South"]);
        assert_eq!(heat.y_categories, vec!["store", "web"]);
        assert_eq!(
            heat.cells,
            vec![vec![1.0, 0.0], vec![0.0, 2.0], vec![1.0, 0.0]]
        );
    }

    #[test]
    fn many_to_many_sum_uses_first_column() {
        let req = ChartRequest::new(Relationship::ManyToMany, "region", "channel")
            .with_aggregation(Aggregation::Sum);
        let out = select_chart(&table(), &req);
        let ChartData::Heatmap(heat) = out.chart.unwrap().data else {
            panic!("expected heatmap");
        };
        // first column is "units"
        assert_eq!(
            heat.cells,
            vec![vec![4.0, 0.0], vec![0.0, 4.0], vec![2.0, 0.0]]
        );
    }

    #[test]
    fn many_to_many_sum_needs_numeric_first_column() {
        let table = read_csv("g,h\na,u\nb,v\n".as_bytes()).unwrap();
        let req = ChartRequest::new(Relationship::ManyToMany, "g", "h")
            .with_aggregation(Aggregation::Mean);
        let out = select_chart(&table, &req);
        assert!(out.chart.is_none());
        assert_eq!(out.warning.as_deref(), Some(HEATMAP_VALUES_WARNING));
    }

    #[test]
    fn colour_splits_series_and_is_dropped_after_grouping() {
        let scatter = select_chart(
            &table(),
            &ChartRequest::new(Relationship::Auto, "units", "price").with_color("channel"),
        )
        .chart
        .unwrap();
        assert_eq!(scatter.color.as_deref(), Some("channel"));
        let ChartData::Scatter(s) = scatter.data else {
            panic!("expected scatter");
        };
        assert_eq!(s.series.len(), 2);

        let grouped = select_chart(
            &table(),
            &ChartRequest::new(Relationship::Auto, "region", "price")
                .with_aggregation(Aggregation::Sum)
                .with_color("channel"),
        )
        .chart
        .unwrap();
        assert_eq!(grouped.color, None);
    }

    #[test]
    fn labels_and_height_pass_through() {
        let mut req = ChartRequest::new(Relationship::Auto, "units", "price");
        req.x_label = "Units sold".into();
        req.height = 720;
        let chart = select_chart(&table(), &req).chart.unwrap();
        assert_eq!(chart.x_label, "Units sold");
        assert_eq!(chart.y_label, "price");
        assert_eq!(chart.height, 720);
    }

    #[test]
    fn unknown_columns_warn() {
        let out = select_chart(&table(), &ChartRequest::new(Relationship::Auto, "nope", "price"));
        assert!(out.chart.is_none());
        assert!(out.warning.is_some());
    }
}
