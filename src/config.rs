use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chart::request::DEFAULT_PLOT_HEIGHT;

/// File looked up in the working directory at startup.
pub const CONFIG_FILE: &str = "eda-explorer.json";

/// Display preferences. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub window_size: [f32; 2],
    pub min_window_size: [f32; 2],
    pub default_plot_height: u32,
    pub min_plot_height: u32,
    pub max_plot_height: u32,
    /// Rows shown in the preview table.
    pub preview_rows: usize,
    /// Width of the exported HTML drawing, in pixels.
    pub export_width: u32,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            window_size: [1200.0, 800.0],
            min_window_size: [600.0, 400.0],
            default_plot_height: DEFAULT_PLOT_HEIGHT,
            min_plot_height: 300,
            max_plot_height: 1000,
            preview_rows: 20,
            export_width: 900,
        }
    }
}

impl ExplorerConfig {
    /// Read `path` if it exists. A missing file gives the defaults; a
    /// malformed one is logged and also gives the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str::<ExplorerConfig>(&text) {
            Ok(config) => {
                log::info!("Loaded settings from {}", path.display());
                config.sanitized()
            }
            Err(e) => {
                log::warn!("Ignoring {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Keep the plot height bounds ordered and the default inside them.
    fn sanitized(mut self) -> Self {
        if self.min_plot_height > self.max_plot_height {
            std::mem::swap(&mut self.min_plot_height, &mut self.max_plot_height);
        }
        self.default_plot_height = self
            .default_plot_height
            .clamp(self.min_plot_height, self.max_plot_height);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExplorerConfig::load_or_default(&dir.path().join(CONFIG_FILE));
        assert_eq!(config, ExplorerConfig::default());
        assert_eq!(config.default_plot_height, 500);
    }

    #[test]
    fn partial_file_overrides_some_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "preview_rows": 50, "export_width": 1200 }"#).unwrap();
        let config = ExplorerConfig::load_or_default(&path);
        assert_eq!(config.preview_rows, 50);
        assert_eq!(config.export_width, 1200);
        assert_eq!(config.max_plot_height, 1000);
    }

    #[test]
    fn malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(ExplorerConfig::load_or_default(&path), ExplorerConfig::default());
    }

    #[test]
    fn default_height_is_clamped_into_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "default_plot_height": 5000 }"#).unwrap();
        assert_eq!(ExplorerConfig::load_or_default(&path).default_plot_height, 1000);
    }
}
