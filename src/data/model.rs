use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

/// Columns with at least this many distinct values are too wide to be
/// offered as categories (filters, heatmap axes).
pub const MAX_CATEGORIES: usize = 100;

/// Cell texts that are read as missing values.
pub const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(raw: &str) -> bool {
    MISSING_MARKERS.contains(&raw)
}

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
/// Used as a `BTreeMap` / `BTreeSet` key downstream so `Value` must be `Ord`.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Number(_) => 1,
                Text(_) => 2,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Number(a), Number(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Number(f) => f.to_bits().hash(state),
            Value::Null => {}
        }
    }
}

/// Plain rendering: missing is empty, numbers use the shortest text that
/// parses back to the same `f64` (so `1.0` prints as `1`).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl Value {
    /// Parse one raw cell: missing marker, number, or free text.
    pub fn parse(raw: &str) -> Value {
        if is_missing(raw) {
            return Value::Null;
        }
        match raw.trim().parse::<f64>() {
            // "NAN" and friends parse in Rust but are not numbers to a reader
            Ok(v) if !v.is_nan() => Value::Number(v),
            _ => Value::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// One named column. Every non-missing value matches `kind`:
/// numbers in numeric columns, text in categorical ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Value>,
}

impl Column {
    /// Build a column from raw cell texts.
    ///
    /// The column is numeric when every non-missing cell parses as a number
    /// (an all-missing column counts as numeric). Otherwise it is categorical
    /// and each cell keeps its original text, so `"1.50"` stays `"1.50"`.
    pub fn from_raw(name: impl Into<String>, raw: &[String]) -> Self {
        let parsed: Vec<Value> = raw.iter().map(|s| Value::parse(s)).collect();
        if parsed.iter().all(|v| !matches!(v, Value::Text(_))) {
            return Column {
                name: name.into(),
                kind: ColumnKind::Numeric,
                values: parsed,
            };
        }
        let values = raw
            .iter()
            .zip(parsed)
            .map(|(text, v)| match v {
                Value::Null => Value::Null,
                _ => Value::Text(text.clone()),
            })
            .collect();
        Column {
            name: name.into(),
            kind: ColumnKind::Categorical,
            values,
        }
    }

    /// Build a column from already-typed values (Parquet, JSON). A column
    /// mixing numbers and text is categorical with numbers rendered as text.
    pub fn from_values(name: impl Into<String>, values: Vec<Value>) -> Self {
        if values.iter().all(|v| !matches!(v, Value::Text(_))) {
            return Column {
                name: name.into(),
                kind: ColumnKind::Numeric,
                values,
            };
        }
        let values = values
            .into_iter()
            .map(|v| match v {
                Value::Number(_) => Value::Text(v.to_string()),
                other => other,
            })
            .collect();
        Column {
            name: name.into(),
            kind: ColumnKind::Categorical,
            values,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }

    /// Sorted distinct non-missing values.
    pub fn distinct_values(&self) -> BTreeSet<&Value> {
        self.values.iter().filter(|v| !v.is_null()).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// What the UI needs to know about a column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub distinct_count: usize,
    /// Sorted distinct values, only for categorical columns narrow enough
    /// to list.
    pub categories: Option<Vec<Value>>,
}

impl ColumnProfile {
    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }

    /// Categorical with few enough values to serve as chart categories.
    pub fn is_groupable(&self) -> bool {
        self.categories.is_some()
    }
}

// ---------------------------------------------------------------------------
// DataTable – the complete loaded dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("column '{column}' has {found} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
}

/// An ordered collection of equally long named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    columns: Vec<Column>,
    n_rows: usize,
}

impl DataTable {
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let n_rows = columns.first().map(Column::len).unwrap_or(0);
        for (i, col) in columns.iter().enumerate() {
            if col.len() != n_rows {
                return Err(TableError::RaggedColumn {
                    column: col.name.clone(),
                    expected: n_rows,
                    found: col.len(),
                });
            }
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(TableError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(DataTable { columns, n_rows })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Cells of row `index` in column order.
    pub fn row(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.columns.iter().map(move |c| &c.values[index])
    }

    /// Copy of the table restricted to `indices`, in the given order.
    pub fn take(&self, indices: &[usize]) -> DataTable {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                kind: c.kind,
                values: indices.iter().map(|&i| c.values[i].clone()).collect(),
            })
            .collect();
        DataTable {
            columns,
            n_rows: indices.len(),
        }
    }

    pub fn profiles(&self) -> Vec<ColumnProfile> {
        self.columns
            .iter()
            .map(|c| {
                let distinct = c.distinct_values();
                let categories = (!c.is_numeric() && distinct.len() < MAX_CATEGORIES)
                    .then(|| distinct.iter().map(|v| (*v).clone()).collect());
                ColumnProfile {
                    name: c.name.clone(),
                    kind: c.kind,
                    distinct_count: distinct.len(),
                    categories,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_recognises_missing_numbers_and_text() {
        assert_eq!(Value::parse(""), Value::Null);
        assert_eq!(Value::parse("NA"), Value::Null);
        assert_eq!(Value::parse("2.5"), Value::Number(2.5));
        assert_eq!(Value::parse("-3"), Value::Number(-3.0));
        assert_eq!(Value::parse("NAN"), Value::Text("NAN".into()));
        assert_eq!(Value::parse("abc"), Value::Text("abc".into()));
        assert_eq!(Value::parse(" 7 "), Value::Number(7.0));
        assert_eq!(Value::parse(" x "), Value::Text(" x ".into()));
    }

    #[test]
    fn display_uses_shortest_number_form() {
        assert_eq!(Value::Number(1.0).to_string(), "1");
        assert_eq!(Value::Number(2.25).to_string(), "2.25");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn ordering_puts_null_before_numbers_before_text() {
        let mut values = vec![
            Value::Text("b".into()),
            Value::Number(3.0),
            Value::Null,
            Value::Number(-1.0),
            Value::Text("a".into()),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Number(-1.0),
                Value::Number(3.0),
                Value::Text("a".into()),
                Value::Text("b".into()),
            ]
        );
    }

    #[test]
    fn numeric_column_allows_missing_cells() {
        let col = Column::from_raw("n", &raw(&["1", "", "2.5"]));
        assert_eq!(col.kind, ColumnKind::Numeric);
        assert_eq!(
            col.values,
            vec![Value::Number(1.0), Value::Null, Value::Number(2.5)]
        );
    }

    #[test]
    fn mixed_column_keeps_original_text() {
        let col = Column::from_raw("m", &raw(&["1.50", "x", "NA"]));
        assert_eq!(col.kind, ColumnKind::Categorical);
        assert_eq!(
            col.values,
            vec![Value::Text("1.50".into()), Value::Text("x".into()), Value::Null]
        );
    }

    #[test]
    fn typed_mixed_column_becomes_text() {
        let col = Column::from_values("m", vec![Value::Number(1.0), Value::Text("x".into())]);
        assert_eq!(col.kind, ColumnKind::Categorical);
        assert_eq!(col.values[0], Value::Text("1".into()));
    }

    #[test]
    fn table_rejects_ragged_and_duplicate_columns() {
        let a = Column::from_raw("a", &raw(&["1", "2"]));
        let b = Column::from_raw("b", &raw(&["1"]));
        assert!(matches!(
            DataTable::new(vec![a.clone(), b]),
            Err(TableError::RaggedColumn { .. })
        ));
        assert_eq!(
            DataTable::new(vec![a.clone(), a]),
            Err(TableError::DuplicateColumn("a".into()))
        );
    }

    #[test]
    fn take_keeps_columns_and_requested_rows() {
        let table = DataTable::new(vec![
            Column::from_raw("a", &raw(&["1", "2", "3"])),
            Column::from_raw("b", &raw(&["x", "y", "z"])),
        ])
        .unwrap();
        let sub = table.take(&[0, 2]);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.column_names(), table.column_names());
        assert_eq!(sub.column("b").unwrap().kind, ColumnKind::Categorical);
        let row: Vec<String> = sub.row(1).map(|v| v.to_string()).collect();
        assert_eq!(row, vec!["3", "z"]);
    }

    #[test]
    fn profiles_list_categories_for_narrow_text_columns() {
        let wide: Vec<String> = (0..150).map(|i| format!("id{i}")).collect();
        let narrow: Vec<String> = (0..150).map(|i| format!("g{}", i % 3)).collect();
        let nums: Vec<String> = (0..150).map(|i| (i % 3).to_string()).collect();
        let table = DataTable::new(vec![
            Column::from_raw("wide", &wide),
            Column::from_raw("narrow", &narrow),
            Column::from_raw("nums", &nums),
        ])
        .unwrap();
        let profiles = table.profiles();
        assert_eq!(profiles[0].distinct_count, 150);
        assert!(profiles[0].categories.is_none());
        assert_eq!(
            profiles[1].categories.as_deref(),
            Some(
                &[
                    Value::Text("g0".into()),
                    Value::Text("g1".into()),
                    Value::Text("g2".into())
                ][..]
            )
        );
        assert!(profiles[2].categories.is_none());
        assert!(profiles[1].is_groupable());
        assert!(!profiles[0].is_groupable());
        assert!(profiles[2].is_numeric() && !profiles[2].is_groupable());
    }
}
