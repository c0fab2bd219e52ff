use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::chart::request::{Aggregation, Relationship};
use crate::data::model::DataTable;
use crate::state::{AppState, ChartStatus, Report};

use super::{panels, plot};

const WARNING_COLOR: Color32 = Color32::from_rgb(230, 160, 20);

/// Something the user asked for while the report was borrowed.
enum Action {
    SavePlot,
    SaveCsv,
}

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// The dashboard body: chart controls, summary, chart, preview and
/// downloads, all computed from the filtered rows.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Please upload a CSV file to begin exploring your data.  (File → Open…)");
        });
        return;
    }

    state.refresh();
    if let Some(Err(e)) = state.report() {
        ui.label(RichText::new(e.to_string()).color(WARNING_COLOR).size(15.0));
        return;
    }

    ui.heading("Universal EDA Explorer");
    help_section(ui);
    column_overview(ui, state);
    ui.separator();

    ui.heading("Custom Graph Generator");
    chart_controls(ui, state);
    advanced_options(ui, state);
    ui.separator();

    state.refresh();
    let action = match state.report() {
        Some(Ok(report)) => show_report(ui, state, report),
        Some(Err(e)) => {
            ui.label(RichText::new(e.to_string()).color(WARNING_COLOR));
            None
        }
        None => None,
    };

    match action {
        Some(Action::SavePlot) => {
            if let Some(download) = state.plot_download() {
                panels::save_file_dialog(state, download);
            }
        }
        Some(Action::SaveCsv) => {
            if let Some(download) = state.csv_download() {
                panels::save_file_dialog(state, download);
            }
        }
        None => {}
    }
}

fn help_section(ui: &mut Ui) {
    egui::CollapsingHeader::new("How to use this dashboard")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.label("1. Open a CSV file from the File menu.");
            ui.label("2. Narrow the rows with the filters in the left panel.");
            ui.label("3. Pick a relationship type, then the X and Y columns.");
            ui.label(
                "4. Auto picks a scatter plot when X and Y are both numeric, a bar chart of Y \
                 by X when only Y is numeric and a histogram of X when Y is not numeric.",
            );
            ui.label("5. Download the filtered rows as CSV or the chart as HTML.");
        });
}

fn column_overview(ui: &mut Ui, state: &AppState) {
    egui::CollapsingHeader::new(format!("Columns ({})", state.profiles.len()))
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("column_overview")
                .striped(true)
                .num_columns(4)
                .show(ui, |ui: &mut Ui| {
                    ui.strong("Column");
                    ui.strong("Type");
                    ui.strong("Distinct");
                    ui.strong("Values");
                    ui.end_row();
                    for profile in &state.profiles {
                        ui.label(&profile.name);
                        ui.label(profile.kind.to_string());
                        ui.label(profile.distinct_count.to_string());
                        let values = match &profile.categories {
                            Some(values) => {
                                let shown: Vec<String> =
                                    values.iter().take(8).map(|v| v.to_string()).collect();
                                let more = if values.len() > shown.len() { ", …" } else { "" };
                                format!("{}{more}", shown.join(", "))
                            }
                            None => String::new(),
                        };
                        ui.label(values);
                        ui.end_row();
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// A combo box over `options` with a leading placeholder entry that maps
/// to `None`. Returns the new pick when the user changed it.
fn column_combo(
    ui: &mut Ui,
    id: &str,
    label: &str,
    placeholder: &str,
    options: &[String],
    current: Option<&str>,
) -> Option<Option<String>> {
    let mut picked = None;
    ui.label(label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.unwrap_or(placeholder))
        .width(ui.available_width() - 8.0)
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_none(), placeholder).clicked() {
                picked = Some(None);
            }
            for opt in options {
                if ui
                    .selectable_label(current == Some(opt.as_str()), opt)
                    .clicked()
                {
                    picked = Some(Some(opt.clone()));
                }
            }
        });
    picked.filter(|p| p.as_deref() != current)
}

fn chart_controls(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Relationship type:");
        for rel in Relationship::ALL {
            if ui
                .radio(state.selections.relationship == rel, rel.label())
                .clicked()
            {
                state.set_relationship(rel);
            }
        }
    });

    let relationship = state.selections.relationship;
    let x_options = relationship.x_domain(&state.profiles);
    let y_options = relationship.y_domain(&state.profiles);
    let all_columns = state.column_names();

    ui.columns(3, |cols: &mut [Ui]| {
        if let Some(x) = column_combo(
            &mut cols[0],
            "x_column",
            "Select X-axis",
            "Select...",
            &x_options,
            state.selections.x.as_deref(),
        ) {
            state.set_x(x);
        }
        if let Some(y) = column_combo(
            &mut cols[1],
            "y_column",
            "Select Y-axis",
            "Select...",
            &y_options,
            state.selections.y.as_deref(),
        ) {
            state.set_y(y);
        }
        if let Some(col) = column_combo(
            &mut cols[2],
            "summary_column",
            "Summary statistics for",
            "None",
            &all_columns,
            state.selections.summary_column.as_deref(),
        ) {
            state.selections.summary_column = col;
        }
    });
}

fn advanced_options(ui: &mut Ui, state: &mut AppState) {
    let all_columns = state.column_names();
    let (min_height, max_height) = (state.config.min_plot_height, state.config.max_plot_height);

    egui::CollapsingHeader::new("Advanced Graph Options")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("advanced_options")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui: &mut Ui| {
                    ui.label("Color by");
                    let current = state.selections.color.clone();
                    egui::ComboBox::from_id_salt("color_by")
                        .selected_text(current.as_deref().unwrap_or("None"))
                        .show_ui(ui, |ui: &mut Ui| {
                            if ui.selectable_label(current.is_none(), "None").clicked() {
                                state.selections.color = None;
                            }
                            for col in &all_columns {
                                if ui
                                    .selectable_label(current.as_ref() == Some(col), col)
                                    .clicked()
                                {
                                    state.selections.color = Some(col.clone());
                                }
                            }
                        });
                    ui.end_row();

                    ui.label("Aggregation");
                    egui::ComboBox::from_id_salt("aggregation")
                        .selected_text(state.selections.aggregation.label())
                        .show_ui(ui, |ui: &mut Ui| {
                            for agg in Aggregation::ALL {
                                ui.selectable_value(
                                    &mut state.selections.aggregation,
                                    agg,
                                    agg.label(),
                                );
                            }
                        });
                    ui.end_row();

                    ui.label("X-axis label");
                    ui.text_edit_singleline(&mut state.selections.x_label);
                    ui.end_row();

                    ui.label("Y-axis label");
                    ui.text_edit_singleline(&mut state.selections.y_label);
                    ui.end_row();

                    ui.label("Plot height (px)");
                    ui.add(egui::Slider::new(
                        &mut state.selections.height,
                        min_height..=max_height,
                    ));
                    ui.end_row();
                });
        });
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

fn show_report(ui: &mut Ui, state: &AppState, report: &Report) -> Option<Action> {
    let mut action = None;

    if let Some((column, summary)) = &report.summary {
        ui.heading(format!("Summary Statistics for `{column}`"));
        egui::Grid::new("summary_stats")
            .striped(true)
            .num_columns(2)
            .show(ui, |ui: &mut Ui| {
                for (label, value) in summary.rows() {
                    ui.label(label);
                    ui.monospace(value);
                    ui.end_row();
                }
            });
        ui.separator();
    }

    match &report.chart {
        ChartStatus::NeedsColumns => {
            ui.label("Please select both X and Y columns to generate a graph.");
        }
        ChartStatus::Ready(outcome) => {
            if let Some(warning) = &outcome.warning {
                ui.label(RichText::new(warning).color(WARNING_COLOR));
            }
            if let Some(chart) = &outcome.chart {
                plot::chart_plot(ui, chart);
                if ui.button("Download Plot as HTML").clicked() {
                    action = Some(Action::SavePlot);
                }
            }
        }
    }
    ui.separator();

    egui::CollapsingHeader::new("Preview Data")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            preview_table(ui, &report.filtered, state.config.preview_rows);
        });

    if ui.button("Download Filtered Data as CSV").clicked() {
        action = Some(Action::SaveCsv);
    }
    action
}

/// First `limit` rows of `table`.
fn preview_table(ui: &mut Ui, table: &DataTable, limit: usize) {
    let n_rows = table.len().min(limit);
    let names = table.column_names();

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .columns(Column::auto().at_least(60.0), names.len())
            .header(20.0, |mut header| {
                for name in &names {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, n_rows, |mut row| {
                    let index = row.index();
                    for value in table.row(index) {
                        row.col(|ui| {
                            ui.label(value.to_string());
                        });
                    }
                });
            });
    });
}
