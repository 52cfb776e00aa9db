//! Parent-chain walks.
//!
//! Depth counts parent hops: a root task has depth 0, a direct child of a
//! root has depth 1. Every id the walk steps onto counts as a hop, including
//! a parent that is missing from the collection (the walk stops there).

#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

use std::collections::HashSet;
use std::fmt;

use serde::{Serialize, Serializer};
use tracing::trace;

use crate::model::index::TaskLookup;

/// Result of a depth walk.
///
/// `Cyclic` orders after every finite depth, so it exceeds any maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HierarchyDepth {
    Finite(usize),
    /// The parent chain revisits an id.
    Cyclic,
}

impl HierarchyDepth {
    pub const fn exceeds(self, max: usize) -> bool {
        match self {
            Self::Finite(depth) => depth > max,
            Self::Cyclic => true,
        }
    }

    pub const fn finite(self) -> Option<usize> {
        match self {
            Self::Finite(depth) => Some(depth),
            Self::Cyclic => None,
        }
    }
}

impl fmt::Display for HierarchyDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(depth) => write!(f, "{depth}"),
            Self::Cyclic => f.write_str("cyclic"),
        }
    }
}

impl Serialize for HierarchyDepth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Finite(depth) => {
                serializer.serialize_u64(u64::try_from(*depth).unwrap_or(u64::MAX))
            }
            Self::Cyclic => serializer.serialize_str("cyclic"),
        }
    }
}

/// Number of parent hops above `task_id`.
///
/// The walk starts at `start_parent` when it is a non-empty id (used to
/// check a prospective parent before it is stored), else at the task's
/// stored parent. It stops at a parent that is unknown or has no
/// relationships. Revisiting an id yields [`HierarchyDepth::Cyclic`].
pub fn hierarchy_depth<L: TaskLookup + ?Sized>(
    task_id: &str,
    tasks: &L,
    start_parent: Option<&str>,
) -> HierarchyDepth {
    let walk = ParentWalk::run(task_id, tasks, start_parent);
    let depth = if walk.cyclic {
        HierarchyDepth::Cyclic
    } else {
        HierarchyDepth::Finite(walk.chain.len())
    };
    trace!(task_id, %depth, "hierarchy depth");
    depth
}

/// Ancestor ids of `task_id`, nearest first.
///
/// Stops before the first repeated id, so a cyclic chain yields each
/// ancestor once.
pub fn ancestors<L: TaskLookup + ?Sized>(task_id: &str, tasks: &L) -> Vec<String> {
    ParentWalk::run(task_id, tasks, None)
        .chain
        .into_iter()
        .map(str::to_string)
        .collect()
}

struct ParentWalk<'a> {
    chain: Vec<&'a str>,
    cyclic: bool,
}

impl<'a> ParentWalk<'a> {
    fn run<L: TaskLookup + ?Sized>(
        task_id: &'a str,
        tasks: &'a L,
        start_parent: Option<&'a str>,
    ) -> Self {
        let mut current = start_parent
            .filter(|id| !id.is_empty())
            .or_else(|| tasks.task(task_id).and_then(|task| task.parent_id()));
        let mut seen = HashSet::new();
        let mut chain = Vec::new();

        while let Some(id) = current {
            if !seen.insert(id) {
                return Self {
                    chain,
                    cyclic: true,
                };
            }
            chain.push(id);
            current = tasks
                .task(id)
                .and_then(|parent| parent.relationships.as_ref())
                .and_then(|rel| rel.parent_id());
        }

        Self {
            chain,
            cyclic: false,
        }
    }
}
