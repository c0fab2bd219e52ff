use std::path::Path;
use std::sync::Arc;

use crate::chart::request::{Aggregation, ChartRequest, Relationship};
use crate::chart::selector::{select_chart, ChartOutcome};
use crate::config::ExplorerConfig;
use crate::data::cache::DatasetCache;
use crate::data::filter::{
    apply_filters, filter_options, init_filter_selection, FilterChoice, FilterError,
    FilterOptions, FilterSelection,
};
use crate::data::model::{ColumnProfile, DataTable};
use crate::data::stats::{summarize, Summary};
use crate::export::{self, Download, ExportError};

// ---------------------------------------------------------------------------
// User selections
// ---------------------------------------------------------------------------

/// Everything the user has picked. The whole dashboard is a function of
/// the loaded table and this value.
#[derive(Debug, Clone, PartialEq)]
pub struct Selections {
    pub filters: FilterSelection,
    pub relationship: Relationship,
    pub x: Option<String>,
    pub y: Option<String>,
    pub summary_column: Option<String>,
    pub color: Option<String>,
    pub aggregation: Aggregation,
    pub x_label: String,
    pub y_label: String,
    pub height: u32,
}

impl Selections {
    fn new(config: &ExplorerConfig) -> Self {
        Self {
            filters: FilterSelection::new(),
            relationship: Relationship::Auto,
            x: None,
            y: None,
            summary_column: None,
            color: None,
            aggregation: Aggregation::Count,
            x_label: String::new(),
            y_label: String::new(),
            height: config.default_plot_height,
        }
    }

    /// The chart request, once both X and Y are chosen.
    pub fn chart_request(&self) -> Option<ChartRequest> {
        let (x, y) = (self.x.as_deref()?, self.y.as_deref()?);
        let mut request = ChartRequest::new(self.relationship, x, y).with_aggregation(self.aggregation);
        if let Some(color) = &self.color {
            request = request.with_color(color);
        }
        request.x_label = self.x_label.clone();
        request.y_label = self.y_label.clone();
        request.height = self.height;
        Some(request)
    }
}

// ---------------------------------------------------------------------------
// One evaluation of the dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ChartStatus {
    /// X or Y not chosen yet.
    NeedsColumns,
    Ready(ChartOutcome),
}

/// Filtered rows, summary and chart for one set of selections.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub filtered: DataTable,
    pub summary: Option<(String, Summary)>,
    pub chart: ChartStatus,
}

/// Filter, then summarise and chart the filtered rows. Stops at the
/// filter when nothing matches.
pub fn evaluate(table: &DataTable, selections: &Selections) -> Result<Report, FilterError> {
    let filtered = apply_filters(table, &selections.filters)?;

    let summary = selections
        .summary_column
        .as_deref()
        .and_then(|col| Some((col.to_string(), summarize(&filtered, col)?)));

    let chart = match selections.chart_request() {
        Some(request) => ChartStatus::Ready(select_chart(&filtered, &request)),
        None => ChartStatus::NeedsColumns,
    };

    Ok(Report {
        filtered,
        summary,
        chart,
    })
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ExplorerConfig,

    /// Parsed tables by file identity.
    cache: DatasetCache,

    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<Arc<DataTable>>,

    /// File name of the loaded dataset.
    pub source_name: Option<String>,

    /// Filter selectors offered for the loaded dataset.
    pub filter_options: Vec<FilterOptions>,

    /// Per-column overview of the loaded dataset.
    pub profiles: Vec<ColumnProfile>,

    pub selections: Selections,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Last evaluation and the selections it was computed from.
    memo: Option<(Selections, Result<Report, FilterError>)>,

    /// Number of evaluations run so far.
    pub evaluations: usize,
}

impl AppState {
    pub fn new(config: ExplorerConfig) -> Self {
        let selections = Selections::new(&config);
        Self {
            config,
            cache: DatasetCache::default(),
            dataset: None,
            source_name: None,
            filter_options: Vec::new(),
            profiles: Vec::new(),
            selections,
            status_message: None,
            memo: None,
            evaluations: 0,
        }
    }

    /// Load (or fetch from cache) the file at `path`. On failure the
    /// previous dataset stays and the error goes to the status line.
    pub fn open_path(&mut self, path: &Path) {
        match self.cache.load(path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} rows with columns {:?} ({} file(s) cached)",
                    dataset.len(),
                    dataset.column_names(),
                    self.cache.len()
                );
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.set_dataset(dataset, name);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error loading file: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and reset every selection.
    pub fn set_dataset(&mut self, dataset: Arc<DataTable>, name: String) {
        self.filter_options = filter_options(&dataset);
        self.profiles = dataset.profiles();
        self.selections = Selections::new(&self.config);
        self.selections.filters = init_filter_selection(&dataset);
        self.selections.summary_column = dataset.columns().first().map(|c| c.name.clone());
        self.dataset = Some(dataset);
        self.source_name = Some(name);
        self.status_message = None;
        self.memo = None;
    }

    /// Column names of the loaded dataset, in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.name.clone()).collect()
    }

    pub fn set_filter(&mut self, column: &str, choice: FilterChoice) {
        self.selections.filters.insert(column.to_string(), choice);
    }

    /// Switch relationship type, dropping X/Y picks the new type does not
    /// offer.
    pub fn set_relationship(&mut self, relationship: Relationship) {
        self.selections.relationship = relationship;
        let x_domain = relationship.x_domain(&self.profiles);
        let y_domain = relationship.y_domain(&self.profiles);
        if self.selections.x.as_ref().is_some_and(|x| !x_domain.contains(x)) {
            self.selections.x = None;
        }
        if self.selections.y.as_ref().is_some_and(|y| !y_domain.contains(y)) {
            self.selections.y = None;
        }
    }

    /// Choose X; its axis label follows the column name.
    pub fn set_x(&mut self, column: Option<String>) {
        self.selections.x_label = column.clone().unwrap_or_default();
        self.selections.x = column;
    }

    /// Choose Y; its axis label follows the column name.
    pub fn set_y(&mut self, column: Option<String>) {
        self.selections.y_label = column.clone().unwrap_or_default();
        self.selections.y = column;
    }

    /// Re-run the pipeline if the selections changed since the last run.
    pub fn refresh(&mut self) {
        let Some(dataset) = &self.dataset else {
            self.memo = None;
            return;
        };
        if let Some((seen, _)) = &self.memo {
            if *seen == self.selections {
                return;
            }
        }
        self.evaluations += 1;
        log::debug!("Evaluation #{}", self.evaluations);
        let result = evaluate(dataset, &self.selections);
        if let Err(e) = &result {
            log::warn!("{e}");
        }
        self.memo = Some((self.selections.clone(), result));
    }

    /// Result of the last [`refresh`](Self::refresh).
    pub fn report(&self) -> Option<&Result<Report, FilterError>> {
        self.memo.as_ref().map(|(_, result)| result)
    }

    /// Rows left after filtering, if a dataset is loaded.
    pub fn visible_rows(&self) -> Option<usize> {
        match self.report()? {
            Ok(report) => Some(report.filtered.len()),
            Err(_) => Some(0),
        }
    }

    /// CSV download of the filtered rows.
    pub fn csv_download(&self) -> Option<Result<Download, ExportError>> {
        let Ok(report) = self.report()? else {
            return None;
        };
        Some(export::filtered_csv(&report.filtered))
    }

    /// HTML download of the current chart.
    pub fn plot_download(&self) -> Option<Result<Download, ExportError>> {
        let Ok(report) = self.report()? else {
            return None;
        };
        let ChartStatus::Ready(outcome) = &report.chart else {
            return None;
        };
        let chart = outcome.chart.as_ref()?;
        Some(export::plot_html(chart, self.config.export_width))
    }
}
