use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, Result};

use super::loader;
use super::model::DataTable;

/// Identity of a file on disk: re-opening an unchanged file hits the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl SourceKey {
    pub fn for_path(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("reading metadata of {}", path.display()))?;
        Ok(SourceKey {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Parsed tables, loaded once per file identity for the life of the process.
#[derive(Default)]
pub struct DatasetCache {
    tables: HashMap<SourceKey, Arc<DataTable>>,
}

impl DatasetCache {
    /// Return the cached table for `path`, parsing it on first use or when
    /// the file changed since.
    pub fn load(&mut self, path: &Path) -> Result<Arc<DataTable>> {
        let key = SourceKey::for_path(path)?;
        if let Some(table) = self.tables.get(&key) {
            log::debug!("Cache hit for {}", path.display());
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(loader::load_file(path)?);
        self.tables.insert(key, Arc::clone(&table));
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}
