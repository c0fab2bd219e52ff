use std::path::Path;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::FilterChoice;
use crate::export::{Download, ExportError};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel: one selector per low-cardinality column.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Data");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }
    if state.filter_options.is_empty() {
        ui.label("No column has few enough distinct values to filter on.");
        return;
    }

    // Clone so the loop can mutate state.
    let options = state.filter_options.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for opt in &options {
                ui.strong(format!("Select {}", opt.column));
                let current = state
                    .selections
                    .filters
                    .get(&opt.column)
                    .cloned()
                    .unwrap_or_default();

                egui::ComboBox::from_id_salt(("filter", &opt.column))
                    .selected_text(current.label())
                    .width(ui.available_width() - 8.0)
                    .show_ui(ui, |ui: &mut Ui| {
                        if ui
                            .selectable_label(current == FilterChoice::All, "All")
                            .clicked()
                        {
                            state.set_filter(&opt.column, FilterChoice::All);
                        }
                        for value in &opt.options {
                            let choice = FilterChoice::Value(value.clone());
                            if ui.selectable_label(current == choice, value).clicked() {
                                state.set_filter(&opt.column, choice);
                            }
                        }
                    });
                ui.add_space(6.0);
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let name = state.source_name.as_deref().unwrap_or("dataset");
            let visible = state.visible_rows().unwrap_or(ds.len());
            ui.label(format!(
                "{name}: {} rows × {} columns, {visible} after filters",
                ds.len(),
                ds.columns().len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open a dataset")
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON records", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}

/// Ask where to save `download` and write it there.
pub fn save_file_dialog(state: &mut AppState, download: Result<Download, ExportError>) {
    let download = match download {
        Ok(download) => download,
        Err(e) => {
            log::error!("Export failed: {e}");
            state.status_message = Some(format!("Export failed: {e}"));
            return;
        }
    };

    let extension = Path::new(download.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let file = rfd::FileDialog::new()
        .set_title("Save download")
        .set_file_name(download.file_name)
        .add_filter(download.mime, &[extension])
        .save_file();

    if let Some(path) = file {
        match download.save(&path) {
            Ok(()) => state.status_message = None,
            Err(e) => {
                log::error!("Failed to save {}: {e}", path.display());
                state.status_message = Some(format!("Error saving file: {e}"));
            }
        }
    }
}
