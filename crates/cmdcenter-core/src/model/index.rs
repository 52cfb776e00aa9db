//! Id → task lookups.
//!
//! Validators take any [`TaskLookup`] so callers can hand over whatever map
//! their store already keeps. [`TaskIndex`] is the borrowing index built
//! from a task slice; it remembers first-seen order so graph walks are
//! deterministic.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use tracing::warn;

use super::task::Task;

/// Read access to a task collection keyed by id.
pub trait TaskLookup {
    /// The task with `id`, if known.
    fn task(&self, id: &str) -> Option<&Task>;

    /// Number of tasks known to the lookup.
    fn task_count(&self) -> usize;

    /// An empty lookup disables existence checks in the validators.
    fn is_empty(&self) -> bool {
        self.task_count() == 0
    }

    fn contains(&self, id: &str) -> bool {
        self.task(id).is_some()
    }
}

impl<S: BuildHasher> TaskLookup for HashMap<String, Task, S> {
    fn task(&self, id: &str) -> Option<&Task> {
        self.get(id)
    }

    fn task_count(&self) -> usize {
        self.len()
    }
}

impl TaskLookup for BTreeMap<String, Task> {
    fn task(&self, id: &str) -> Option<&Task> {
        self.get(id)
    }

    fn task_count(&self) -> usize {
        self.len()
    }
}

impl<L: TaskLookup + ?Sized> TaskLookup for &L {
    fn task(&self, id: &str) -> Option<&Task> {
        (**self).task(id)
    }

    fn task_count(&self) -> usize {
        (**self).task_count()
    }
}

/// Borrowing index over a task collection.
///
/// Tasks without an id are skipped. When two records share an id the later
/// one wins, but the id keeps the position where it was first seen.
#[derive(Debug, Clone, Default)]
pub struct TaskIndex<'a> {
    by_id: HashMap<&'a str, &'a Task>,
    order: Vec<&'a str>,
    duplicates: Vec<&'a str>,
}

impl<'a> TaskIndex<'a> {
    pub fn new<I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut index = Self::default();
        for task in tasks {
            let Some(id) = task.id() else { continue };
            if index.by_id.insert(id, task).is_some() {
                warn!(task_id = id, "duplicate task id in collection; later record wins");
                index.duplicates.push(id);
            } else {
                index.order.push(id);
            }
        }
        index
    }

    /// Ids in first-seen order.
    pub fn ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.order.iter().copied()
    }

    /// Winning records in first-seen id order.
    pub fn tasks(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.order.iter().filter_map(|id| self.by_id.get(id).copied())
    }

    /// Ids that appeared more than once (one entry per extra occurrence).
    #[must_use]
    pub fn duplicate_ids(&self) -> &[&'a str] {
        &self.duplicates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl TaskLookup for TaskIndex<'_> {
    fn task(&self, id: &str) -> Option<&Task> {
        self.by_id.get(id).copied()
    }

    fn task_count(&self) -> usize {
        self.order.len()
    }
}
