use std::collections::HashMap;

use super::model::{Column, DataTable, Value};

// ---------------------------------------------------------------------------
// Summary statistics for a single column
// ---------------------------------------------------------------------------

/// Descriptive statistics of the non-missing values of a numeric column.
/// Everything except `count` is `None` when there is nothing to describe;
/// `std` also needs at least two values.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    Numeric(NumericSummary),
    /// Value frequencies, most frequent first.
    Categorical(Vec<(String, usize)>),
}

impl Summary {
    /// Label / value pairs in display order.
    pub fn rows(&self) -> Vec<(String, String)> {
        match self {
            Summary::Numeric(s) => {
                let fmt = |v: Option<f64>| v.map(|v| format!("{v:.4}")).unwrap_or_else(|| "NaN".into());
                vec![
                    ("count".into(), s.count.to_string()),
                    ("mean".into(), fmt(s.mean)),
                    ("std".into(), fmt(s.std)),
                    ("min".into(), fmt(s.min)),
                    ("25%".into(), fmt(s.q25)),
                    ("50%".into(), fmt(s.median)),
                    ("75%".into(), fmt(s.q75)),
                    ("max".into(), fmt(s.max)),
                ]
            }
            Summary::Categorical(counts) => counts
                .iter()
                .map(|(value, n)| (value.clone(), n.to_string()))
                .collect(),
        }
    }
}

/// Summarise `column` of `table`; `None` if there is no such column.
pub fn summarize(table: &DataTable, column: &str) -> Option<Summary> {
    let col = table.column(column)?;
    Some(if col.is_numeric() {
        Summary::Numeric(describe(col))
    } else {
        Summary::Categorical(value_counts(col))
    })
}

fn describe(col: &Column) -> NumericSummary {
    let mut values: Vec<f64> = col.values.iter().filter_map(Value::as_f64).collect();
    values.sort_by(f64::total_cmp);
    let count = values.len();

    let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
    let std = match mean {
        Some(m) if count > 1 => {
            let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
            Some((ss / (count - 1) as f64).sqrt())
        }
        _ => None,
    };

    NumericSummary {
        count,
        mean,
        std,
        min: values.first().copied(),
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values.last().copied(),
    }
}

/// Linearly interpolated quantile of already sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Frequencies of non-missing values, descending; ties keep the order in
/// which values first appear.
fn value_counts(col: &Column) -> Vec<(String, usize)> {
    let mut order: Vec<&Value> = Vec::new();
    let mut counts: HashMap<&Value, usize> = HashMap::new();
    for v in col.values.iter().filter(|v| !v.is_null()) {
        let n = counts.entry(v).or_insert(0);
        if *n == 0 {
            order.push(v);
        }
        *n += 1;
    }
    let mut freq: Vec<(String, usize)> = order
        .into_iter()
        .map(|v| (v.to_string(), counts[v]))
        .collect();
    // stable sort keeps first-appearance order among equal counts
    freq.sort_by(|a, b| b.1.cmp(&a.1));
    freq
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;

    #[test]
    fn numeric_summary_of_small_upload() {
        let table = read_csv("a,b\n1,x\n2,y\n".as_bytes()).unwrap();
        let Some(Summary::Numeric(s)) = summarize(&table, "a") else {
            panic!("expected numeric summary");
        };
        assert_eq!(s.count, 2);
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.max, Some(2.0));
        assert_eq!(s.mean, Some(1.5));
        assert_eq!(s.median, Some(1.5));
        assert_eq!(s.q25, Some(1.25));
    }

    #[test]
    fn sample_standard_deviation_and_missing_values() {
        let table = read_csv("v\n2\n4\nNA\n4\n4\n5\n5\n7\n9\n".as_bytes()).unwrap();
        let Some(Summary::Numeric(s)) = summarize(&table, "v") else {
            panic!("expected numeric summary");
        };
        assert_eq!(s.count, 8);
        assert_eq!(s.mean, Some(5.0));
        let std = s.std.unwrap();
        assert!((std - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_value_has_no_std() {
        let table = read_csv("v\n3\n".as_bytes()).unwrap();
        let Some(Summary::Numeric(s)) = summarize(&table, "v") else {
            panic!("expected numeric summary");
        };
        assert_eq!(s.std, None);
        assert_eq!(s.min, Some(3.0));
    }

    #[test]
    fn categorical_counts_descend_with_stable_ties() {
        let table = read_csv("g\nb\na\nb\nc\na\nNA\nc\nb\n".as_bytes()).unwrap();
        assert_eq!(
            summarize(&table, "g"),
            Some(Summary::Categorical(vec![
                ("b".into(), 3),
                ("a".into(), 2),
                ("c".into(), 2),
            ]))
        );
    }

    #[test]
    fn unknown_column_has_no_summary() {
        let table = read_csv("a\n1\n".as_bytes()).unwrap();
        assert_eq!(summarize(&table, "zzz"), None);
    }

    #[test]
    fn rows_render_describe_labels() {
        let table = read_csv("a\n1\n".as_bytes()).unwrap();
        let rows = summarize(&table, "a").unwrap().rows();
        let labels: Vec<&str> = rows.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, ["count", "mean", "std", "min", "25%", "50%", "75%", "max"]);
        assert_eq!(rows[2].1, "NaN");
    }
}
