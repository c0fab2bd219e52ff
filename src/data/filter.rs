use std::collections::BTreeMap;

use thiserror::Error;

use super::model::{Column, DataTable, Value, MAX_CATEGORIES};

// ---------------------------------------------------------------------------
// Filter selection: one literal (or "All") per column
// ---------------------------------------------------------------------------

/// Selection for one column. Literals are the strings shown in the
/// selector, as produced by [`filter_options`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterChoice {
    #[default]
    All,
    Value(String),
}

impl FilterChoice {
    pub fn label(&self) -> &str {
        match self {
            FilterChoice::All => "All",
            FilterChoice::Value(v) => v,
        }
    }
}

/// Per-column selection state: column_name → choice.
/// Absent columns and `All` mean "no filter".
pub type FilterSelection = BTreeMap<String, FilterChoice>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("No data available for the selected filters. Please adjust your filters.")]
    NoMatchingRows,
}

/// A filterable column and the literals it can be set to.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOptions {
    pub column: String,
    pub options: Vec<String>,
}

/// A column is worth a selector when it is neither constant nor too wide.
pub fn is_filterable(distinct_count: usize) -> bool {
    1 < distinct_count && distinct_count < MAX_CATEGORIES
}

/// Selectors for every eligible column, in table order, each listing the
/// sorted distinct non-missing values.
pub fn filter_options(dataset: &DataTable) -> Vec<FilterOptions> {
    dataset
        .columns()
        .iter()
        .filter_map(|col| {
            let distinct = col.distinct_values();
            is_filterable(distinct.len()).then(|| FilterOptions {
                column: col.name.clone(),
                options: distinct.iter().map(|v| v.to_string()).collect(),
            })
        })
        .collect()
}

/// Initialise a [`FilterSelection`] with every selector on `All`.
pub fn init_filter_selection(dataset: &DataTable) -> FilterSelection {
    filter_options(dataset)
        .into_iter()
        .map(|opt| (opt.column, FilterChoice::All))
        .collect()
}

/// Return indices of rows that pass all active filters, in table order.
///
/// A row passes a column filter when:
/// * The choice is `All` or names an unknown column → passes (no constraint)
/// * The row's cell equals the selected literal → passes
/// * The cell is missing → fails
pub fn filtered_indices(dataset: &DataTable, selection: &FilterSelection) -> Vec<usize> {
    let predicates: Vec<(&Column, Literal)> = selection
        .iter()
        .filter_map(|(col, choice)| match choice {
            FilterChoice::All => None,
            FilterChoice::Value(lit) => {
                let column = dataset.column(col)?;
                Some((column, Literal::for_column(column, lit)))
            }
        })
        .collect();

    (0..dataset.len())
        .filter(|&row| {
            predicates
                .iter()
                .all(|(column, literal)| literal.matches(&column.values[row]))
        })
        .collect()
}

/// The filtered copy of `dataset`. An empty result is an error so callers
/// stop before computing statistics or charts.
pub fn apply_filters(
    dataset: &DataTable,
    selection: &FilterSelection,
) -> Result<DataTable, FilterError> {
    let indices = filtered_indices(dataset, selection);
    if indices.is_empty() {
        return Err(FilterError::NoMatchingRows);
    }
    Ok(dataset.take(&indices))
}

/// A selected literal, coerced to the column's kind when possible.
enum Literal<'a> {
    Number(f64),
    Text(&'a str),
}

impl<'a> Literal<'a> {
    fn for_column(column: &Column, literal: &'a str) -> Self {
        if column.is_numeric() {
            if let Ok(v) = literal.trim().parse::<f64>() {
                return Literal::Number(v);
            }
        }
        Literal::Text(literal)
    }

    fn matches(&self, cell: &Value) -> bool {
        match (self, cell) {
            (_, Value::Null) => false,
            (Literal::Number(lit), Value::Number(v)) => v == lit,
            (Literal::Text(lit), Value::Text(s)) => s.as_str() == *lit,
            (Literal::Text(lit), other) => other.to_string() == *lit,
            (Literal::Number(_), Value::Text(_)) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;

    fn sample() -> DataTable {
        read_csv(
            "region,units,note\n\
             North,1,a\n\
             South,2,b\n\
             North,2,\n\
             East,1,c\n\
             North,1,d\n"
                .as_bytes(),
        )
        .unwrap()
    }

    fn select(pairs: &[(&str, &str)]) -> FilterSelection {
        pairs
            .iter()
            .map(|(c, v)| (c.to_string(), FilterChoice::Value(v.to_string())))
            .collect()
    }

    #[test]
    fn no_selection_keeps_every_row() {
        let table = sample();
        assert_eq!(
            filtered_indices(&table, &init_filter_selection(&table)),
            vec![0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn selections_are_conjoined_and_order_preserving() {
        let table = sample();
        let sel = select(&[("region", "North"), ("units", "1")]);
        assert_eq!(filtered_indices(&table, &sel), vec![0, 4]);
    }

    #[test]
    fn numeric_literal_is_coerced() {
        let table = sample();
        assert_eq!(filtered_indices(&table, &select(&[("units", "2.0")])), vec![1, 2]);
    }

    #[test]
    fn uncoercible_literal_compares_as_text() {
        let table = sample();
        assert!(filtered_indices(&table, &select(&[("units", "two")])).is_empty());
    }

    #[test]
    fn missing_cells_never_match() {
        let table = sample();
        assert!(filtered_indices(&table, &select(&[("note", "")])).is_empty());
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let table = sample();
        assert_eq!(filtered_indices(&table, &select(&[("nope", "x")])).len(), 5);
    }

    #[test]
    fn filtering_is_an_idempotent_row_subset() {
        let table = sample();
        let sel = select(&[("region", "North")]);
        let once = apply_filters(&table, &sel).unwrap();
        assert_eq!(once.column_names(), table.column_names());
        assert_eq!(once, table.take(&[0, 2, 4]));
        let twice = apply_filters(&once, &sel).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn empty_result_is_signalled() {
        let table = sample();
        assert_eq!(
            apply_filters(&table, &select(&[("region", "West")])),
            Err(FilterError::NoMatchingRows)
        );
    }

    #[test]
    fn eligibility_is_strictly_between_one_and_one_hundred() {
        assert!(!is_filterable(0));
        assert!(!is_filterable(1));
        assert!(is_filterable(2));
        assert!(is_filterable(99));
        assert!(!is_filterable(100));
    }

    #[test]
    fn options_skip_constant_and_wide_columns() {
        let ids: Vec<String> = (0..120).map(|i| i.to_string()).collect();
        let constant: Vec<String> = (0..120).map(|_| "k".to_string()).collect();
        let groups: Vec<String> = (0..120).map(|i| ["b", "a"][i % 2].to_string()).collect();
        let table = DataTable::new(vec![
            Column::from_raw("id", &ids),
            Column::from_raw("constant", &constant),
            Column::from_raw("group", &groups),
        ])
        .unwrap();
        assert_eq!(
            filter_options(&table),
            vec![FilterOptions {
                column: "group".into(),
                options: vec!["a".into(), "b".into()],
            }]
        );
    }

    #[test]
    fn numeric_options_sort_numerically() {
        let table = read_csv("n\n10\n9\n9\n".as_bytes()).unwrap();
        assert_eq!(filter_options(&table)[0].options, vec!["9", "10"]);
    }
}
