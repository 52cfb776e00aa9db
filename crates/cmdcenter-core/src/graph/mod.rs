//! Graph-level views over a task collection.
//!
//! ## Submodules
//!
//! - [`blocking`]: the `blocks` graph as a petgraph `DiGraphMap`, plus the
//!   per-task block status.
//! - [`cycles`]: cycle detection for prospective edges and whole-graph
//!   cycle enumeration.
//! - [`hierarchy`]: parent-chain depth and ancestor walks.

pub mod blocking;
pub mod cycles;
pub mod hierarchy;
