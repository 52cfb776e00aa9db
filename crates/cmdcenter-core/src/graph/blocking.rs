//! Blocking graph and block status.
//!
//! An edge `A → B` means "A blocks B": B cannot start until A completes.
//! The graph is built from each task's `relationships.dependencies.blocks`
//! list, or from a flat edge list when no task records are at hand.
//!
//! Nodes are borrowed ids. `DiGraphMap` keeps nodes and each node's
//! neighbors in insertion order, so traversals are deterministic for a given
//! input order. A side set of the same ids maps any `&str` back to the
//! stored node in constant time.

#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

use std::collections::HashSet;

use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::model::index::TaskLookup;
use crate::model::relationships::{DependencyKind, safe_relationships};
use crate::model::task::Task;

// ---------------------------------------------------------------------------
// BlockEdge
// ---------------------------------------------------------------------------

/// A single `source blocks target` edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockEdge {
    pub source: String,
    pub target: String,
}

impl BlockEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// BlockingGraph
// ---------------------------------------------------------------------------

/// Directed `blocks` graph over borrowed task ids.
#[derive(Debug, Clone, Default)]
pub struct BlockingGraph<'a> {
    graph: DiGraphMap<&'a str, ()>,
    ids: HashSet<&'a str>,
}

impl<'a> BlockingGraph<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraphMap::new(),
            ids: HashSet::new(),
        }
    }

    /// Build from task records.
    ///
    /// Every task with an id becomes a node. Only well-formed `blocks` lists
    /// contribute edges; duplicate ids in a list collapse into one edge.
    pub fn from_tasks<I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut graph = Self::new();
        for task in tasks {
            let Some(id) = task.id() else { continue };
            graph.add_node(id);
            let Some(rel) = task.relationships.as_ref() else {
                continue;
            };
            if let Some(blocks) = rel.present_list(DependencyKind::Blocks) {
                for target in blocks {
                    graph.add_edge(id, target);
                }
            }
        }
        trace!(
            nodes = graph.graph.node_count(),
            edges = graph.graph.edge_count(),
            "built blocking graph from tasks"
        );
        graph
    }

    /// Build from `(source, target)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut graph = Self::new();
        for (source, target) in pairs {
            graph.add_edge(source, target);
        }
        graph
    }

    /// Build from a flat edge list.
    pub fn from_edges(edges: &'a [BlockEdge]) -> Self {
        Self::from_pairs(
            edges
                .iter()
                .map(|edge| (edge.source.as_str(), edge.target.as_str())),
        )
    }

    pub fn add_node(&mut self, id: &'a str) {
        self.ids.insert(id);
        self.graph.add_node(id);
    }

    pub fn add_edge(&mut self, source: &'a str, target: &'a str) {
        self.ids.insert(source);
        self.ids.insert(target);
        self.graph.add_edge(source, target, ());
    }

    /// The stored node equal to `id`, so callers can pass any borrow.
    fn node(&self, id: &str) -> Option<&'a str> {
        self.ids.get(id).copied()
    }

    /// Ids `id` blocks, in insertion order. Empty for unknown ids.
    pub fn neighbors(&self, id: &str) -> impl Iterator<Item = &'a str> + '_ {
        self.node(id)
            .into_iter()
            .flat_map(|node| self.graph.neighbors(node))
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.graph.nodes()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// `true` if `to` is reachable from `from` (including `from == to`).
    ///
    /// Stack-based search; each node is expanded at most once.
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let Some(start) = self.node(from) else {
            return false;
        };

        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(
                self.graph
                    .neighbors(current)
                    .filter(|next| !visited.contains(next)),
            );
        }
        false
    }

    pub(crate) const fn inner(&self) -> &DiGraphMap<&'a str, ()> {
        &self.graph
    }
}

// ---------------------------------------------------------------------------
// Block status
// ---------------------------------------------------------------------------

/// Why a blocker still holds a task back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockerReason {
    #[serde(rename = "not found")]
    NotFound,
    #[serde(rename = "not completed")]
    NotCompleted,
}

impl BlockerReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::NotCompleted => "not completed",
        }
    }
}

impl std::fmt::Display for BlockerReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One incomplete entry of a task's `blockedBy` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocker {
    pub id: String,
    /// Set for blockers that exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub reason: BlockerReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

/// Result of [`block_status`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockStatus {
    pub blocked: bool,
    pub blockers: Vec<Blocker>,
    pub reason: Option<String>,
}

/// Which of `task`'s `blockedBy` entries are still incomplete.
///
/// A blocker is incomplete when it is missing from `tasks`, or when it has
/// neither `column == "done"` nor `status.state == "completed"`. Tasks without
/// relationships are never blocked.
pub fn block_status<L: TaskLookup + ?Sized>(task: &Task, tasks: &L) -> BlockStatus {
    let rel = safe_relationships(task);
    let blockers: Vec<Blocker> = rel
        .ids(DependencyKind::BlockedBy)
        .iter()
        .filter_map(|blocker_id| match tasks.task(blocker_id) {
            None => Some(Blocker {
                id: blocker_id.clone(),
                title: None,
                reason: BlockerReason::NotFound,
                column: None,
            }),
            Some(blocker) if !blocker.is_complete() => Some(Blocker {
                id: blocker_id.clone(),
                title: Some(match blocker.display_title() {
                    "" => blocker_id.clone(),
                    title => title.to_string(),
                }),
                reason: BlockerReason::NotCompleted,
                column: blocker.current_column().map(str::to_string),
            }),
            Some(_) => None,
        })
        .collect();

    let blocked = !blockers.is_empty();
    let reason = blocked.then(|| format!("Blocked by {} incomplete task(s)", blockers.len()));
    trace!(task_id = task.id(), blocked, blockers = blockers.len(), "block status");

    BlockStatus {
        blocked,
        blockers,
        reason,
    }
}
