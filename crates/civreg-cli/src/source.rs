//! Record sources backed by JSON document dumps

use std::fs;
use std::path::{Path, PathBuf};

use civreg_core::{EventRecord, ExportError, RecordQuery, RecordSource};
use civreg_stats::{apply_query, TermSearch};
use serde::de::DeserializeOwned;
use tracing::info;

/// A JSON array of registry documents, one object per record
#[derive(Clone, Debug)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R> RecordSource<R> for JsonFileSource
where
    R: DeserializeOwned + EventRecord + TermSearch,
{
    fn fetch(&self, query: &RecordQuery) -> Result<Vec<R>, ExportError> {
        let source = fs::read_to_string(&self.path).map_err(|e| {
            ExportError::Resource(format!("Cannot read records {}: {e}", self.path.display()))
        })?;
        let records: Vec<R> = serde_json::from_str(&source).map_err(|e| {
            ExportError::Resource(format!("Invalid records file {}: {e}", self.path.display()))
        })?;
        let total = records.len();
        let selected = apply_query(records, query);
        info!(
            path = %self.path.display(),
            total,
            selected = selected.len(),
            "fetched records"
        );
        Ok(selected)
    }
}
