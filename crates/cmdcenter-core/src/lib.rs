//! cmdcenter-core library.
//!
//! Task model, relationship validation, and blocking-graph analysis for the
//! command center task tracker. Everything here is a pure function over an
//! in-memory task collection supplied by the caller; nothing is cached
//! between calls.
//!
//! # Conventions
//!
//! - **Findings**: validation returns report structs holding [`error::Issue`]
//!   values; it never fails with `Result`.
//! - **Errors**: I/O-facing loaders use `thiserror` enums or `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`debug!`, `trace!`, `warn!`).

#![forbid(unsafe_code)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod graph;
pub mod model;
pub mod validate;

pub use error::{Issue, IssueCode};
pub use model::index::{TaskIndex, TaskLookup};
pub use model::relationships::{DependencyKind, Field, Relationships};
pub use model::task::Task;
