//! Whole-collection checks: blocking cycles and orphaned subtasks.

#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

use serde::Serialize;
use tracing::debug;

use crate::error::{Issue, IssueCode};
use crate::graph::blocking::BlockingGraph;
use crate::graph::cycles::{find_cycles, render_cycle};
use crate::model::index::{TaskIndex, TaskLookup};
use crate::model::task::Task;

/// Findings for a task collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GraphReport {
    /// `true` iff `errors` is empty.
    pub valid: bool,
    pub errors: Vec<Issue>,
    /// Closed cycle paths, each starting and ending at its smallest id.
    pub cycles: Vec<Vec<String>>,
}

/// Check the `blocks` graph for cycles and every parent link for a
/// matching `subtasks` entry.
///
/// Cycles produce one summary error followed by one error per cycle. A
/// child is orphaned when its parent exists and has a well-formed
/// `subtasks` list that does not name it.
pub fn validate_task_graph(tasks: &[Task]) -> GraphReport {
    let index = TaskIndex::new(tasks);
    let graph = BlockingGraph::from_tasks(index.tasks());
    let cycles = find_cycles(&graph, index.ids());

    let mut errors = Vec::new();
    if !cycles.is_empty() {
        errors.push(Issue::new(
            IssueCode::DependencyCycle,
            format!("Found {} dependency cycle(s)", cycles.len()),
        ));
        errors.extend(
            cycles
                .iter()
                .map(|cycle| Issue::new(IssueCode::DependencyCycle, render_cycle(cycle))),
        );
    }

    for child in index.tasks() {
        let (Some(child_id), Some(parent_id)) = (child.id(), child.parent_id()) else {
            continue;
        };
        let Some(listed) = index
            .task(parent_id)
            .and_then(|parent| parent.relationships.as_ref())
            .and_then(|rel| rel.subtasks.as_present())
        else {
            continue;
        };
        if !listed.iter().any(|id| id == child_id) {
            errors.push(Issue::new(
                IssueCode::OrphanedSubtask,
                format!(
                    "Orphaned subtask: '{child_id}' has parent '{parent_id}' but parent doesn't include it in subtasks"
                ),
            ));
        }
    }

    debug!(
        tasks = index.task_count(),
        edges = graph.edge_count(),
        cycles = cycles.len(),
        errors = errors.len(),
        "validated task graph"
    );

    GraphReport {
        valid: errors.is_empty(),
        errors,
        cycles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(report: &GraphReport) -> Vec<&str> {
        report.errors.iter().map(|issue| issue.message.as_str()).collect()
    }

    #[test]
    fn empty_collection_is_valid() {
        let report = validate_task_graph(&[]);
        assert!(report.valid);
        assert!(report.cycles.is_empty());
    }

    #[test]
    fn dag_is_valid() {
        let tasks = vec![
            Task::new("a").with_blocks(["b", "c"]),
            Task::new("b").with_blocks(["c"]).with_blocked_by(["a"]),
            Task::new("c").with_blocked_by(["a", "b"]),
        ];
        let report = validate_task_graph(&tasks);
        assert!(report.valid);
        assert!(report.cycles.is_empty());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn three_cycle_is_reported() {
        let tasks = vec![
            Task::new("a").with_blocks(["b"]),
            Task::new("b").with_blocks(["c"]),
            Task::new("c").with_blocks(["a"]),
        ];
        let report = validate_task_graph(&tasks);

        assert!(!report.valid);
        assert_eq!(report.cycles, vec![vec!["a", "b", "c", "a"]]);
        assert_eq!(
            messages(&report),
            vec!["Found 1 dependency cycle(s)", "a → b → c → a"]
        );
        assert!(report.errors.iter().all(|e| e.code == IssueCode::DependencyCycle));
    }

    #[test]
    fn dangling_block_targets_are_leaves() {
        let tasks = vec![Task::new("a").with_blocks(["ghost"])];
        assert!(validate_task_graph(&tasks).valid);
    }

    #[test]
    fn orphaned_subtask_is_an_error() {
        let tasks = vec![
            Task::new("p").with_subtasks(["other"]),
            Task::new("c").with_parent("p"),
        ];
        let report = validate_task_graph(&tasks);
        assert!(!report.valid);
        assert_eq!(
            messages(&report),
            vec!["Orphaned subtask: 'c' has parent 'p' but parent doesn't include it in subtasks"]
        );
        assert_eq!(report.errors[0].code, IssueCode::OrphanedSubtask);
    }

    #[test]
    fn listed_child_and_unknown_parent_are_fine() {
        let tasks = vec![
            Task::new("p").with_subtasks(["c"]),
            Task::new("c").with_parent("p"),
            Task::new("d").with_parent("ghost"),
            Task::new("e").with_parent("legacy"),
            Task::legacy("legacy"),
        ];
        assert!(validate_task_graph(&tasks).valid);
    }
}
