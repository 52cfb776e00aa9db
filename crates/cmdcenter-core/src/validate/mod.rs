//! Relationship validation for a single task.
//!
//! # Overview
//!
//! [`RelationshipValidator::validate`] checks one task's `relationships`
//! record against the collection it lives in and returns a
//! [`RelationshipReport`]. Findings are split into errors (the record is
//! invalid) and warnings (the record is valid but the graph around it is
//! inconsistent). Validation never fails and never mutates its input.
//!
//! Three conditions stop validation early with a single error: a record
//! that is not an object (JSON entry point only), a missing or empty `id`,
//! and a missing `relationships` object. All other checks are independent
//! and additive.
//!
//! An empty lookup disables every existence check, so a lone task can be
//! validated for shape before the collection is loaded.
//!
//! See [`graph`] for whole-collection checks (cycles, orphaned subtasks).

#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

pub mod graph;

use std::collections::HashSet;

use serde::{Deserialize as _, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Issue, IssueCode};
use crate::graph::hierarchy::hierarchy_depth;
use crate::model::index::TaskLookup;
use crate::model::relationships::{DependencyKind, DependencyLists, Field, Relationships};
use crate::model::task::Task;

/// Parent-chain depth allowed when no configuration says otherwise.
pub const DEFAULT_MAX_HIERARCHY_DEPTH: usize = 5;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Findings for one task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RelationshipReport {
    /// `true` iff `errors` is empty.
    pub valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl RelationshipReport {
    fn rejected(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: vec![Issue::new(code, message)],
            warnings: Vec::new(),
        }
    }

    /// Codes of all errors, in report order.
    pub fn error_codes(&self) -> Vec<IssueCode> {
        self.errors.iter().map(|issue| issue.code).collect()
    }

    pub fn has_error(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|issue| issue.code == code)
    }

    pub fn has_warning(&self, code: IssueCode) -> bool {
        self.warnings.iter().any(|issue| issue.code == code)
    }
}

#[derive(Default)]
struct Findings {
    errors: Vec<Issue>,
    warnings: Vec<Issue>,
}

impl Findings {
    fn error(&mut self, code: IssueCode, message: impl Into<String>) {
        self.errors.push(Issue::new(code, message));
    }

    fn warn(&mut self, code: IssueCode, message: impl Into<String>) {
        self.warnings.push(Issue::new(code, message));
    }

    fn into_report(self) -> RelationshipReport {
        RelationshipReport {
            valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Per-task relationship validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipValidator {
    pub max_hierarchy_depth: usize,
}

impl Default for RelationshipValidator {
    fn default() -> Self {
        Self {
            max_hierarchy_depth: DEFAULT_MAX_HIERARCHY_DEPTH,
        }
    }
}

impl RelationshipValidator {
    pub const fn new(max_hierarchy_depth: usize) -> Self {
        Self {
            max_hierarchy_depth,
        }
    }

    /// Validate a decoded task against `tasks`.
    pub fn validate<L: TaskLookup + ?Sized>(&self, task: &Task, tasks: &L) -> RelationshipReport {
        let Some(task_id) = task.id() else {
            return RelationshipReport::rejected(IssueCode::MissingId, "Task must have an id");
        };
        let Some(rel) = task.relationships.as_ref() else {
            return RelationshipReport::rejected(
                IssueCode::MissingRelationships,
                "Task missing relationships object",
            );
        };

        let mut findings = Findings::default();
        self.check_parent(task_id, rel, tasks, &mut findings);
        check_subtasks(task_id, rel, tasks, &mut findings);
        if let Some(deps) = check_dependencies(task_id, rel, tasks, &mut findings) {
            check_bidirectional(task_id, deps, tasks, &mut findings);
            check_parent_conflicts(rel, deps, &mut findings);
        }

        let report = findings.into_report();
        debug!(
            task_id,
            valid = report.valid,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "validated relationships"
        );
        report
    }

    /// Validate a raw JSON record against `tasks`.
    ///
    /// Shape problems the typed model cannot represent (a non-object
    /// record, a non-string id, a non-object `relationships`) are reported
    /// here before decoding.
    pub fn validate_value<L: TaskLookup + ?Sized>(
        &self,
        value: &Value,
        tasks: &L,
    ) -> RelationshipReport {
        let Some(record) = value.as_object() else {
            return RelationshipReport::rejected(
                IssueCode::MalformedTask,
                "Task must be a valid object",
            );
        };
        if !record
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty())
        {
            return RelationshipReport::rejected(IssueCode::MissingId, "Task must have an id");
        }
        match record.get("relationships") {
            None | Some(Value::Null) => {
                return RelationshipReport::rejected(
                    IssueCode::MissingRelationships,
                    "Task missing relationships object",
                );
            }
            Some(Value::Object(_)) => {}
            Some(_) => {
                return RelationshipReport::rejected(
                    IssueCode::InvalidFieldType,
                    "relationships must be an object",
                );
            }
        }

        match Task::deserialize(value) {
            Ok(task) => self.validate(&task, tasks),
            Err(err) => RelationshipReport::rejected(
                IssueCode::MalformedTask,
                format!("Task record could not be decoded: {err}"),
            ),
        }
    }

    fn check_parent<L: TaskLookup + ?Sized>(
        &self,
        task_id: &str,
        rel: &Relationships,
        tasks: &L,
        findings: &mut Findings,
    ) {
        let parent = match &rel.parent {
            Field::Missing => {
                findings.error(IssueCode::MissingField, "Missing relationships.parent field");
                return;
            }
            Field::Malformed(_) => {
                findings.error(
                    IssueCode::InvalidFieldType,
                    "relationships.parent must be a string or null",
                );
                return;
            }
            Field::Present(None) => return,
            Field::Present(Some(parent)) => parent.as_str(),
        };

        if parent == task_id {
            findings.error(IssueCode::SelfReference, "Task cannot be its own parent");
        }
        if !tasks.is_empty() && !tasks.contains(parent) {
            findings.error(
                IssueCode::UnknownParent,
                format!("Parent task '{parent}' does not exist"),
            );
        }

        let depth = hierarchy_depth(task_id, tasks, Some(parent));
        if depth.exceeds(self.max_hierarchy_depth) {
            findings.error(
                IssueCode::HierarchyTooDeep,
                format!(
                    "Hierarchy depth ({depth}) exceeds maximum ({})",
                    self.max_hierarchy_depth
                ),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Field checks
// ---------------------------------------------------------------------------

fn check_subtasks<L: TaskLookup + ?Sized>(
    task_id: &str,
    rel: &Relationships,
    tasks: &L,
    findings: &mut Findings,
) {
    let subtasks = match &rel.subtasks {
        Field::Missing => {
            findings.error(IssueCode::MissingField, "Missing relationships.subtasks field");
            return;
        }
        Field::Malformed(_) => {
            findings.error(IssueCode::InvalidFieldType, "relationships.subtasks must be an array");
            return;
        }
        Field::Present(ids) => ids,
    };
    for (position, _) in subtasks.rejected() {
        findings.error(
            IssueCode::InvalidReference,
            format!("non-string id in relationships.subtasks at index {position}"),
        );
    }

    let mut seen = HashSet::new();
    for subtask_id in subtasks {
        if !seen.insert(subtask_id.as_str()) {
            findings.error(
                IssueCode::DuplicateReference,
                format!("Duplicate subtask ID: '{subtask_id}'"),
            );
        }
        if subtask_id == task_id {
            findings.error(IssueCode::SelfReference, "Task cannot be its own subtask");
        }
        if !tasks.is_empty() && !tasks.contains(subtask_id) {
            findings.warn(
                IssueCode::DanglingReference,
                format!("Subtask '{subtask_id}' does not exist"),
            );
        }
    }
}

/// Checks the five lists; returns the record when it is well-formed enough
/// for the cross-task checks.
fn check_dependencies<'r, L: TaskLookup + ?Sized>(
    task_id: &str,
    rel: &'r Relationships,
    tasks: &L,
    findings: &mut Findings,
) -> Option<&'r DependencyLists> {
    let deps = match &rel.dependencies {
        Field::Present(deps) => deps,
        Field::Missing => {
            findings.error(
                IssueCode::MissingField,
                "Missing or invalid relationships.dependencies object",
            );
            return None;
        }
        Field::Malformed(_) => {
            findings.error(
                IssueCode::InvalidFieldType,
                "Missing or invalid relationships.dependencies object",
            );
            return None;
        }
    };

    for kind in DependencyKind::ALL {
        let ids = match deps.list(kind) {
            Field::Missing => {
                findings.error(
                    IssueCode::MissingField,
                    format!("Missing dependencies.{kind} field"),
                );
                continue;
            }
            Field::Malformed(_) => {
                findings.error(
                    IssueCode::InvalidFieldType,
                    format!("dependencies.{kind} must be an array"),
                );
                continue;
            }
            Field::Present(ids) => ids,
        };
        for (position, _) in ids.rejected() {
            findings.error(
                IssueCode::InvalidReference,
                format!("non-string id in dependencies.{kind} at index {position}"),
            );
        }

        let mut seen = HashSet::new();
        for dep_id in ids {
            if !seen.insert(dep_id.as_str()) {
                findings.error(
                    IssueCode::DuplicateReference,
                    format!("Duplicate {kind} ID: '{dep_id}'"),
                );
            }
            if dep_id == task_id {
                findings.error(IssueCode::SelfReference, format!("Task cannot {kind} itself"));
            }
            if !tasks.is_empty() && !tasks.contains(dep_id) {
                findings.warn(
                    IssueCode::DanglingReference,
                    format!("{kind} target '{dep_id}' does not exist"),
                );
            }
        }
    }

    Some(deps)
}

/// `A.blocks ∋ B` should be mirrored by `B.blockedBy ∋ A`, and vice versa.
/// Only runs when both of this task's lists are present; only compares
/// against a counterpart list that is itself present.
fn check_bidirectional<L: TaskLookup + ?Sized>(
    task_id: &str,
    deps: &DependencyLists,
    tasks: &L,
    findings: &mut Findings,
) {
    let (Field::Present(blocks), Field::Present(blocked_by)) = (&deps.blocks, &deps.blocked_by)
    else {
        return;
    };

    let counterpart = |other_id: &str, kind: DependencyKind| {
        tasks
            .task(other_id)
            .and_then(|other| other.relationships.as_ref())
            .and_then(|other_rel| other_rel.present_list(kind))
            .map(|list| list.iter().any(|id| id == task_id))
    };

    for blocked_id in blocks {
        if counterpart(blocked_id, DependencyKind::BlockedBy) == Some(false) {
            findings.warn(
                IssueCode::BidirectionalMismatch,
                format!(
                    "Inconsistent: '{task_id}' blocks '{blocked_id}' but '{blocked_id}'.blockedBy doesn't include '{task_id}'"
                ),
            );
        }
    }
    for blocker_id in blocked_by {
        if counterpart(blocker_id, DependencyKind::Blocks) == Some(false) {
            findings.warn(
                IssueCode::BidirectionalMismatch,
                format!(
                    "Inconsistent: '{task_id}' is blockedBy '{blocker_id}' but '{blocker_id}'.blocks doesn't include '{task_id}'"
                ),
            );
        }
    }
}

/// A task must not block, or be blocked by, its own parent.
fn check_parent_conflicts(rel: &Relationships, deps: &DependencyLists, findings: &mut Findings) {
    let Some(parent) = rel.parent_id() else { return };
    if deps.ids(DependencyKind::Blocks).iter().any(|id| id == parent) {
        findings.error(
            IssueCode::ParentDependencyConflict,
            "Task cannot block its parent task",
        );
    }
    if deps.ids(DependencyKind::BlockedBy).iter().any(|id| id == parent) {
        findings.error(
            IssueCode::ParentDependencyConflict,
            "Parent-child relationship conflict with blockedBy",
        );
    }
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Validate `task` with an explicit maximum hierarchy depth.
pub fn validate_relationships<L: TaskLookup + ?Sized>(
    task: &Task,
    tasks: &L,
    max_hierarchy_depth: usize,
) -> RelationshipReport {
    RelationshipValidator::new(max_hierarchy_depth).validate(task, tasks)
}

/// Validate a raw JSON record with an explicit maximum hierarchy depth.
pub fn validate_relationships_json<L: TaskLookup + ?Sized>(
    value: &Value,
    tasks: &L,
    max_hierarchy_depth: usize,
) -> RelationshipReport {
    RelationshipValidator::new(max_hierarchy_depth).validate_value(value, tasks)
}
