use std::fmt;

use serde::{Serialize, Serializer};

/// Machine-readable codes for relationship findings.
///
/// The human message on an [`Issue`] is diagnostic only; the code is the
/// stable part that callers may branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCode {
    MalformedTask,
    MissingId,
    MissingRelationships,
    MissingField,
    InvalidFieldType,
    InvalidReference,
    SelfReference,
    DuplicateReference,
    UnknownParent,
    DanglingReference,
    HierarchyTooDeep,
    BidirectionalMismatch,
    ParentDependencyConflict,
    DependencyCycle,
    OrphanedSubtask,
}

impl IssueCode {
    /// Stable code identifier (`R####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MalformedTask => "R1001",
            Self::MissingId => "R1002",
            Self::MissingRelationships => "R1003",
            Self::MissingField => "R1004",
            Self::InvalidFieldType => "R1005",
            Self::InvalidReference => "R1006",
            Self::SelfReference => "R2001",
            Self::DuplicateReference => "R2002",
            Self::UnknownParent => "R2003",
            Self::DanglingReference => "R2004",
            Self::HierarchyTooDeep => "R2005",
            Self::BidirectionalMismatch => "R3001",
            Self::ParentDependencyConflict => "R3002",
            Self::DependencyCycle => "R4001",
            Self::OrphanedSubtask => "R4002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MalformedTask => "Task record is malformed",
            Self::MissingId => "Task has no id",
            Self::MissingRelationships => "Task has no relationships object",
            Self::MissingField => "Relationship field missing",
            Self::InvalidFieldType => "Relationship field has the wrong type",
            Self::InvalidReference => "Relationship list entry is not a string id",
            Self::SelfReference => "Task references itself",
            Self::DuplicateReference => "Duplicate id in relationship list",
            Self::UnknownParent => "Parent task does not exist",
            Self::DanglingReference => "Referenced task does not exist",
            Self::HierarchyTooDeep => "Hierarchy depth exceeds maximum",
            Self::BidirectionalMismatch => "Blocking link is one-sided",
            Self::ParentDependencyConflict => "Parent also appears as a dependency",
            Self::DependencyCycle => "Dependency cycle",
            Self::OrphanedSubtask => "Orphaned subtask",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::MalformedTask | Self::MissingId | Self::MissingRelationships => {
                Some("Re-create the task record from the default relationships template.")
            }
            Self::MissingField | Self::InvalidFieldType => {
                Some("Fill the field from the default relationships template.")
            }
            Self::InvalidReference => Some("Replace the entry with the referenced task's id."),
            Self::SelfReference | Self::DuplicateReference => {
                Some("Remove the offending id from the list.")
            }
            Self::UnknownParent => Some("Clear the parent or point it at an existing task."),
            Self::DanglingReference => None,
            Self::HierarchyTooDeep => Some("Attach the task higher up in the hierarchy."),
            Self::BidirectionalMismatch => {
                Some("Add the missing id to the other task's blocks/blockedBy list.")
            }
            Self::ParentDependencyConflict => {
                Some("Use either the parent link or a blocking link, not both.")
            }
            Self::DependencyCycle => {
                Some("Remove one blocking link from the cycle to keep the graph acyclic.")
            }
            Self::OrphanedSubtask => Some("Add the child to its parent's subtasks list."),
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for IssueCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// One validation finding: a code plus a human-readable message.
///
/// Whether an issue is an error or a warning is decided by which list of a
/// report it lands in, not by the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub code: IssueCode,
    pub message: String,
}

impl Issue {
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
