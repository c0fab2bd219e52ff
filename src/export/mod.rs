/// Export layer: the two downloads the dashboard offers.
///
/// * filtered rows → `filtered_data.csv` (`text/csv`)
/// * current chart → `plot.html` (`text/html`), an SVG drawing made with
///   plotters plus the chart spec as JSON, with no external resources
use std::path::Path;

use thiserror::Error;

use crate::chart::spec::ChartSpec;
use crate::data::model::DataTable;

pub mod html;
pub mod table;

pub const CSV_FILE_NAME: &str = "filtered_data.csv";
pub const CSV_MIME: &str = "text/csv";
pub const HTML_FILE_NAME: &str = "plot.html";
pub const HTML_MIME: &str = "text/html";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("exported text is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("serialising chart: {0}")]
    Json(#[from] serde_json::Error),
    #[error("drawing chart: {0}")]
    Plot(String),
}

/// A ready-to-save document with its suggested file name and MIME type.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub body: String,
}

impl Download {
    pub fn save(&self, path: &Path) -> Result<(), ExportError> {
        std::fs::write(path, &self.body)?;
        log::info!("Saved {} ({} bytes) to {}", self.mime, self.body.len(), path.display());
        Ok(())
    }
}

/// The filtered table as CSV text.
pub fn filtered_csv(table: &DataTable) -> Result<Download, ExportError> {
    Ok(Download {
        file_name: CSV_FILE_NAME,
        mime: CSV_MIME,
        body: table::to_csv(table)?,
    })
}

/// The chart as a standalone HTML page `width` pixels wide.
pub fn plot_html(chart: &ChartSpec, width: u32) -> Result<Download, ExportError> {
    Ok(Download {
        file_name: HTML_FILE_NAME,
        mime: HTML_MIME,
        body: html::render_html(chart, width)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::request::{ChartRequest, Relationship};
    use crate::chart::selector::select_chart;
    use crate::data::loader::read_csv;

    #[test]
    fn downloads_carry_names_and_mime_types() {
        let table = read_csv("a,b\n1,2\n3,4\n".as_bytes()).unwrap();
        let csv = filtered_csv(&table).unwrap();
        assert_eq!((csv.file_name, csv.mime), ("filtered_data.csv", "text/csv"));

        let chart = select_chart(&table, &ChartRequest::new(Relationship::Auto, "a", "b"))
            .chart
            .unwrap();
        let page = plot_html(&chart, 800).unwrap();
        assert_eq!((page.file_name, page.mime), ("plot.html", "text/html"));
    }

    #[test]
    fn save_writes_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let download = Download {
            file_name: CSV_FILE_NAME,
            mime: CSV_MIME,
            body: "a\n1\n".into(),
        };
        download.save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\n1\n");
    }
}
