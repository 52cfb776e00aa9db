//! Subcommand implementations.
//!
//! Each command loads a dataset file, runs one core operation, and renders
//! the result through [`crate::output`].
//!
//! Lookup failures exit with status 1 right after the rendered error, so
//! stderr holds exactly one report (a single JSON document in JSON mode).

pub mod blocked;
pub mod check_edge;
pub mod depth;
pub mod validate;

use std::path::Path;
use std::process;

use cmdcenter_core::dataset::{Dataset, DatasetError, load_dataset};
use cmdcenter_core::{Task, TaskLookup};

use crate::output::{CliError, OutputMode, render_error};

/// Load a dataset, rendering a structured error when it cannot be read.
pub fn open_dataset(path: &Path, output: OutputMode) -> anyhow::Result<Dataset> {
    match load_dataset(path) {
        Ok(dataset) => Ok(dataset),
        Err(err) => {
            let (suggestion, code) = match err {
                DatasetError::Io { .. } => ("check the path and permissions", "dataset_unreadable"),
                DatasetError::Json { .. } => ("fix the JSON syntax", "dataset_invalid_json"),
                DatasetError::Shape { .. } => (
                    "pass an array of tasks or an export object with a `tasks` array",
                    "dataset_bad_shape",
                ),
            };
            render_error(output, &CliError::with_details(err.to_string(), suggestion, code))?;
            process::exit(1);
        }
    }
}

/// Look up `id`, rendering a structured error when it is absent.
pub fn require_task<'a, L: TaskLookup + ?Sized>(
    tasks: &'a L,
    id: &str,
    output: OutputMode,
) -> anyhow::Result<&'a Task> {
    if let Some(task) = tasks.task(id) {
        return Ok(task);
    }
    render_error(
        output,
        &CliError::with_details(
            format!("task '{id}' not found"),
            "check the id against the dataset",
            "task_not_found",
        ),
    )?;
    process::exit(1);
}
