use std::fmt;

use crate::data::model::ColumnProfile;

pub const DEFAULT_PLOT_HEIGHT: u32 = 500;

/// How the user expects X and Y to relate; drives the chart family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Relationship {
    #[default]
    Auto,
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl Relationship {
    pub const ALL: [Relationship; 4] = [
        Relationship::Auto,
        Relationship::OneToOne,
        Relationship::OneToMany,
        Relationship::ManyToMany,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Relationship::Auto => "Auto",
            Relationship::OneToOne => "One-to-One",
            Relationship::OneToMany => "One-to-Many",
            Relationship::ManyToMany => "Many-to-Many",
        }
    }

    /// Columns offered for X.
    pub fn x_domain(self, profiles: &[ColumnProfile]) -> Vec<String> {
        match self {
            Relationship::ManyToMany => names_where(profiles, ColumnProfile::is_groupable),
            _ => names_where(profiles, |_| true),
        }
    }

    /// Columns offered for Y.
    pub fn y_domain(self, profiles: &[ColumnProfile]) -> Vec<String> {
        match self {
            Relationship::Auto => names_where(profiles, |_| true),
            Relationship::OneToOne | Relationship::OneToMany => {
                names_where(profiles, ColumnProfile::is_numeric)
            }
            Relationship::ManyToMany => names_where(profiles, ColumnProfile::is_groupable),
        }
    }
}

fn names_where(profiles: &[ColumnProfile], keep: impl Fn(&ColumnProfile) -> bool) -> Vec<String> {
    profiles
        .iter()
        .filter(|p| keep(p))
        .map(|p| p.name.clone())
        .collect()
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How rows sharing a category collapse into one plotted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Aggregation {
    #[default]
    Count,
    Sum,
    Mean,
}

impl Aggregation {
    pub const ALL: [Aggregation; 3] = [Aggregation::Count, Aggregation::Sum, Aggregation::Mean];

    pub fn label(self) -> &'static str {
        match self {
            Aggregation::Count => "count",
            Aggregation::Sum => "sum",
            Aggregation::Mean => "mean",
        }
    }

    /// Capitalised name used in chart titles.
    pub fn title(self) -> &'static str {
        match self {
            Aggregation::Count => "Count",
            Aggregation::Sum => "Sum",
            Aggregation::Mean => "Mean",
        }
    }

    /// Collapse the non-missing values of one group. The mean of nothing is
    /// undefined; the sum of nothing is zero.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        match self {
            Aggregation::Count => Some(values.len() as f64),
            Aggregation::Sum => Some(values.iter().sum()),
            Aggregation::Mean if values.is_empty() => None,
            Aggregation::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything needed to derive one chart. Rebuilt from the current
/// selections on every evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub relationship: Relationship,
    pub x: String,
    pub y: String,
    pub color: Option<String>,
    pub aggregation: Aggregation,
    pub x_label: String,
    pub y_label: String,
    pub height: u32,
}

impl ChartRequest {
    /// A request with labels defaulting to the column names.
    pub fn new(relationship: Relationship, x: &str, y: &str) -> Self {
        ChartRequest {
            relationship,
            x: x.to_string(),
            y: y.to_string(),
            color: None,
            aggregation: Aggregation::Count,
            x_label: x.to_string(),
            y_label: y.to_string(),
            height: DEFAULT_PLOT_HEIGHT,
        }
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_color(mut self, column: &str) -> Self {
        self.color = Some(column.to_string());
        self
    }
}
