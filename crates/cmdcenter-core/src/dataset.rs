//! Task collections loaded from JSON files.
//!
//! Two shapes are accepted: a bare array of task records, or an export
//! object whose `tasks` key holds that array (other keys such as `projects`
//! and `agents` are ignored). Records are kept as raw JSON so malformed ones
//! can still be reported individually.

#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::task::Task;

/// Errors from loading a dataset file.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{origin}: expected an array of tasks or an object with a `tasks` array, found {found}")]
    Shape { origin: String, found: &'static str },
}

/// Raw task records in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub records: Vec<Value>,
}

impl Dataset {
    /// Records that decode into [`Task`], in file order.
    ///
    /// Undecodable records are skipped with a warning; run
    /// [`validate_relationships_json`](crate::validate::validate_relationships_json)
    /// over [`Dataset::records`] to report them.
    pub fn tasks(&self) -> Vec<Task> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(position, record)| match Task::deserialize(record) {
                Ok(task) => Some(task),
                Err(err) => {
                    warn!(position, error = %err, "skipping undecodable task record");
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Read and parse a dataset file.
///
/// # Errors
///
/// Returns [`DatasetError`] when the file cannot be read, is not JSON, or
/// has neither accepted shape.
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dataset(&content, &path.display().to_string())
}

/// Parse dataset JSON. `origin` names the source in error messages.
///
/// # Errors
///
/// Returns [`DatasetError`] when `content` is not JSON or has neither
/// accepted shape.
pub fn parse_dataset(content: &str, origin: &str) -> Result<Dataset, DatasetError> {
    let value: Value = serde_json::from_str(content).map_err(|source| DatasetError::Json {
        origin: origin.to_string(),
        source,
    })?;

    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut export) => match export.remove("tasks") {
            Some(Value::Array(records)) => records,
            Some(other) => {
                return Err(DatasetError::Shape {
                    origin: origin.to_string(),
                    found: kind_name(&other),
                });
            }
            None => {
                return Err(DatasetError::Shape {
                    origin: origin.to_string(),
                    found: "an object without `tasks`",
                });
            }
        },
        other => {
            return Err(DatasetError::Shape {
                origin: origin.to_string(),
                found: kind_name(&other),
            });
        }
    };

    debug!(origin, records = records.len(), "loaded dataset");
    Ok(Dataset { records })
}

const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
