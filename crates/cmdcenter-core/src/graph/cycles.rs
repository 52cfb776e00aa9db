//! Cycle detection for the blocking graph.
//!
//! # Overview
//!
//! Blocking links must form a DAG: a cycle leaves every task on it waiting
//! for another. Three entry points cover the ways callers ask:
//!
//! - [`detect_cycle`] walks the task records themselves and answers whether
//!   a task already sits on a cycle, or would after adding one prospective
//!   `blocks` edge.
//! - [`detect_cycle_simple`] answers the same question for a prospective
//!   edge over a flat edge list, without task records.
//! - [`find_cycles`] enumerates the cycles of a whole graph for the graph
//!   validator.
//!
//! All traversal state is local to one call.

#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

use std::collections::HashSet;

use tracing::trace;

use super::blocking::{BlockEdge, BlockingGraph};
use crate::model::index::TaskLookup;
use crate::model::relationships::DependencyKind;

/// Separator used when rendering a cycle path.
pub const CYCLE_ARROW: &str = " → ";

// ---------------------------------------------------------------------------
// Record walk
// ---------------------------------------------------------------------------

/// Whether `task_id` reaches itself over `blocks` links.
///
/// `candidate` is a prospective link `(id, kind)` on `task_id`. Only a
/// [`DependencyKind::Blocks`] candidate takes part: it is followed after the
/// task's stored `blocks` entries, once, when `task_id` is expanded. Unknown
/// ids and tasks without relationships or dependencies are leaves.
pub fn detect_cycle<L: TaskLookup + ?Sized>(
    task_id: &str,
    tasks: &L,
    candidate: Option<(&str, DependencyKind)>,
) -> bool {
    let extra = match candidate {
        Some((id, DependencyKind::Blocks)) => Some(id),
        _ => None,
    };
    let (found, visited) = walk_records(task_id, tasks, extra);
    trace!(task_id, candidate = ?candidate, visited, found, "detect_cycle");
    found
}

/// Depth-first walk over stored `blocks` lists with an explicit frame stack.
///
/// Returns whether a node on the current path was reached again, and how
/// many nodes were expanded.
fn walk_records<'q, L: TaskLookup + ?Sized>(
    root: &'q str,
    tasks: &'q L,
    extra: Option<&'q str>,
) -> (bool, usize) {
    // The candidate edge belongs to the root only and follows its stored
    // entries.
    let successors = move |node: &'q str| {
        let stored: &'q [String] = tasks
            .task(node)
            .and_then(|task| task.relationships.as_ref())
            .and_then(|rel| rel.present_list(DependencyKind::Blocks))
            .unwrap_or_default();
        stored
            .iter()
            .map(String::as_str)
            .chain(extra.filter(|_| node == root))
    };

    let mut visited: HashSet<&'q str> = HashSet::from([root]);
    let mut on_path: HashSet<&'q str> = HashSet::from([root]);
    let mut stack = vec![(root, successors(root))];

    while let Some((_, next_ids)) = stack.last_mut() {
        let Some(next) = next_ids.next() else {
            if let Some((done, _)) = stack.pop() {
                on_path.remove(done);
            }
            continue;
        };

        if on_path.contains(next) {
            return (true, visited.len());
        }
        if visited.insert(next) {
            on_path.insert(next);
            stack.push((next, successors(next)));
        }
    }
    (false, visited.len())
}

// ---------------------------------------------------------------------------
// Edge list
// ---------------------------------------------------------------------------

/// Whether adding `source blocks target` to `edges` closes a cycle, i.e.
/// whether `source` is reachable from `target` once the edge is in place.
pub fn detect_cycle_simple(source: &str, target: &str, edges: &[BlockEdge]) -> bool {
    let graph = BlockingGraph::from_pairs(
        edges
            .iter()
            .map(|edge| (edge.source.as_str(), edge.target.as_str()))
            .chain(std::iter::once((source, target))),
    );
    let found = graph.reaches(target, source);
    trace!(source, target, edges = edges.len(), found, "detect_cycle_simple");
    found
}

// ---------------------------------------------------------------------------
// Whole-graph enumeration
// ---------------------------------------------------------------------------

/// Enumerate cycles reachable from `roots`, visiting each node once.
///
/// Roots are tried in order; a root already reached from an earlier root is
/// skipped. Each cycle is closed (first id repeated at the end), rotated to
/// start at its smallest id, and reported once.
pub fn find_cycles<'a, I>(graph: &BlockingGraph<'a>, roots: I) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let inner = graph.inner();
    let mut processed: HashSet<&'a str> = HashSet::new();
    let mut on_path: HashSet<&'a str> = HashSet::new();
    let mut path: Vec<&'a str> = Vec::new();
    let mut cycles: Vec<Vec<String>> = Vec::new();

    for root in roots {
        if processed.contains(root) {
            continue;
        }
        processed.insert(root);
        on_path.insert(root);
        path.push(root);
        let mut stack = vec![(root, inner.neighbors(root))];

        while let Some((_, neighbors)) = stack.last_mut() {
            let Some(next) = neighbors.next() else {
                if let Some((done, _)) = stack.pop() {
                    on_path.remove(done);
                    path.pop();
                }
                continue;
            };

            if on_path.contains(next) {
                if let Some(start) = path.iter().position(|id| *id == next) {
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|id| (*id).to_string()).collect();
                    cycle.push(next.to_string());
                    let cycle = canonicalize_cycle(&cycle);
                    if !cycles.contains(&cycle) {
                        cycles.push(cycle);
                    }
                }
            } else if processed.insert(next) {
                on_path.insert(next);
                path.push(next);
                stack.push((next, inner.neighbors(next)));
            }
        }
    }

    trace!(
        nodes = graph.node_count(),
        cycles = cycles.len(),
        "enumerated blocking cycles"
    );
    cycles
}

/// Rotate a closed cycle so it starts (and ends) at its smallest id.
///
/// Input that is not a closed path of at least two entries is returned
/// unchanged.
pub fn canonicalize_cycle(cycle: &[String]) -> Vec<String> {
    let [.., last] = cycle else {
        return Vec::new();
    };
    if cycle.len() < 2 || cycle[0] != *last {
        return cycle.to_vec();
    }
    let open = &cycle[..cycle.len() - 1];
    let Some(start) = open
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(i, _)| i)
    else {
        return cycle.to_vec();
    };

    let mut rotated: Vec<String> = open[start..].iter().chain(&open[..start]).cloned().collect();
    rotated.push(open[start].clone());
    rotated
}

/// `a → b → c → a`
pub fn render_cycle(cycle: &[String]) -> String {
    cycle.join(CYCLE_ARROW)
}
