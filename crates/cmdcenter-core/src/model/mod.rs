//! Task records as the dashboard store hands them over.
//!
//! - [`task`]: the task record and its completion signals.
//! - [`relationships`]: parent/subtask/dependency links, tolerant of
//!   missing and wrongly-typed fields.
//! - [`index`]: id → task lookups used by every validator.

pub mod index;
pub mod relationships;
pub mod task;
