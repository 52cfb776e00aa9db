use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::relationships::{
    DependencyKind, DependencyLists, Field, Relationships, default_relationships,
};

/// Legacy board column that marks a task as finished.
pub const DONE_COLUMN: &str = "done";

/// Modern `status.state` value that marks a task as finished.
pub const COMPLETED_STATE: &str = "completed";

/// Structured status carried by modern task records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

/// Task status: the structured record, a bare board label, or anything else
/// the store happened to write.
///
/// Board-era records store `"status": "active"`; those labels carry no
/// `state` and never count as completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskStatus {
    Detailed(StatusDetail),
    Label(String),
    Other(Value),
}

impl TaskStatus {
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        match self {
            Self::Detailed(detail) => detail.state.as_deref(),
            Self::Label(_) | Self::Other(_) => None,
        }
    }

    #[must_use]
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Detailed(detail) => detail.column.as_deref(),
            Self::Label(_) | Self::Other(_) => None,
        }
    }
}

/// A task record as held by the dashboard store.
///
/// Only the fields the relationship engine reads are typed; everything else
/// (priority, tags, project, agent, due date, ...) is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_label",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    /// Board-era records use `name` instead of `title`.
    #[serde(
        default,
        deserialize_with = "lenient_label",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    /// Legacy completion signal.
    #[serde(
        default,
        deserialize_with = "lenient_label",
        skip_serializing_if = "Option::is_none"
    )]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Absent on records created before relationships existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Relationships>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Labels only feed diagnostics; a value of any other type reads as absent
/// instead of failing the whole record.
fn lenient_label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(label) => Some(label),
        _ => None,
    })
}

impl Task {
    /// A new task with the default relationships template.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            relationships: Some(default_relationships()),
            ..Self::default()
        }
    }

    /// A task without a relationships object, as written before links
    /// were introduced.
    pub fn legacy(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// The id, treating an empty string as absent.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Label for diagnostics: `title`, then `name`, then the id.
    #[must_use]
    pub fn display_title(&self) -> &str {
        let non_empty = |s: &&str| !s.is_empty();
        self.title
            .as_deref()
            .filter(non_empty)
            .or_else(|| self.name.as_deref().filter(non_empty))
            .or_else(|| self.id())
            .unwrap_or_default()
    }

    /// `column == "done"` or `status.state == "completed"`; either suffices.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.column.as_deref() == Some(DONE_COLUMN)
            || self.status.as_ref().and_then(TaskStatus::state) == Some(COMPLETED_STATE)
    }

    /// Current board column: the legacy `column`, else `status.column`.
    #[must_use]
    pub fn current_column(&self) -> Option<&str> {
        self.column
            .as_deref()
            .or_else(|| self.status.as_ref().and_then(TaskStatus::column))
    }

    /// Ids this task blocks. Empty when any part of the path is absent.
    #[must_use]
    pub fn blocks(&self) -> &[String] {
        self.relationships
            .as_ref()
            .map_or(&[], |rel| rel.ids(DependencyKind::Blocks))
    }

    /// Stored parent id, if any.
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.relationships.as_ref().and_then(Relationships::parent_id)
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.status = Some(TaskStatus::Detailed(StatusDetail {
            state: Some(state.into()),
            column: None,
        }));
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.relationships_mut().parent = Field::Present(Some(parent.into()));
        self
    }

    #[must_use]
    pub fn with_subtasks<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relationships_mut().subtasks =
            Field::Present(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Replace one dependency list.
    #[must_use]
    pub fn with_dependency<I, S>(mut self, kind: DependencyKind, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rel = self.relationships_mut();
        if !rel.dependencies.is_present() {
            rel.dependencies = Field::Present(DependencyLists::empty());
        }
        if let Field::Present(deps) = &mut rel.dependencies {
            *deps.list_mut(kind) = Field::Present(ids.into_iter().map(Into::into).collect());
        }
        self
    }

    #[must_use]
    pub fn with_blocks<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_dependency(DependencyKind::Blocks, ids)
    }

    #[must_use]
    pub fn with_blocked_by<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_dependency(DependencyKind::BlockedBy, ids)
    }

    fn relationships_mut(&mut self) -> &mut Relationships {
        self.relationships.get_or_insert_with(default_relationships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_board_record_with_label_status() {
        let task: Task = serde_json::from_value(json!({
            "id": "t9",
            "name": "Pipeline optimization",
            "status": "blocked",
            "priority": "high",
            "tags": ["pipeline"]
        }))
        .expect("decode");

        assert_eq!(task.id(), Some("t9"));
        assert_eq!(task.display_title(), "Pipeline optimization");
        assert_eq!(task.status, Some(TaskStatus::Label("blocked".into())));
        assert!(task.relationships.is_none());
        assert!(!task.is_complete());
        assert_eq!(task.extra["priority"], json!("high"));
    }

    #[test]
    fn decodes_structured_status() {
        let task: Task = serde_json::from_value(json!({
            "id": "t1",
            "title": "Ship",
            "status": { "state": "completed", "column": "review" }
        }))
        .expect("decode");

        assert!(task.is_complete());
        assert_eq!(task.current_column(), Some("review"));
    }

    #[test]
    fn unexpected_status_shape_still_decodes() {
        let task: Task =
            serde_json::from_value(json!({ "id": "t1", "status": 3 })).expect("decode");
        assert_eq!(task.status, Some(TaskStatus::Other(json!(3))));
        assert!(!task.is_complete());
    }

    #[test]
    fn non_string_labels_read_as_absent() {
        let task: Task = serde_json::from_value(json!({
            "id": "t1",
            "title": 7,
            "name": ["x"],
            "column": { "id": "done" },
            "relationships": { "dependencies": { "blocks": ["t2"] } }
        }))
        .expect("decode");

        assert_eq!(task.title, None);
        assert_eq!(task.name, None);
        assert_eq!(task.column, None);
        assert_eq!(task.display_title(), "t1");
        assert!(!task.is_complete());
        assert_eq!(task.blocks(), ["t2".to_string()]);
    }

    #[test]
    fn legacy_done_column_is_complete() {
        assert!(Task::new("t1").with_column("done").is_complete());
        assert!(!Task::new("t1").with_column("doing").is_complete());
        assert!(Task::new("t1").with_column("doing").with_state("completed").is_complete());
    }

    #[test]
    fn empty_id_reads_as_absent() {
        let task = Task {
            id: Some(String::new()),
            ..Task::default()
        };
        assert_eq!(task.id(), None);
        assert_eq!(task.display_title(), "");
    }

    #[test]
    fn title_wins_over_name() {
        let mut task = Task::new("t1").with_title("Title");
        task.name = Some("Name".into());
        assert_eq!(task.display_title(), "Title");
        task.title = Some(String::new());
        assert_eq!(task.display_title(), "Name");
        assert_eq!(Task::new("t2").display_title(), "t2");
    }

    #[test]
    fn builders_fill_relationships() {
        let task = Task::new("t1")
            .with_parent("t0")
            .with_subtasks(["t2", "t3"])
            .with_blocks(["t4"])
            .with_blocked_by(["t5"]);

        let rel = task.relationships.as_ref().expect("relationships");
        assert_eq!(rel.parent_id(), Some("t0"));
        assert_eq!(rel.subtask_ids().len(), 2);
        assert_eq!(task.blocks(), ["t4".to_string()]);
        assert_eq!(rel.ids(DependencyKind::BlockedBy), ["t5".to_string()]);
        assert_eq!(task.parent_id(), Some("t0"));
    }

    #[test]
    fn serializes_without_absent_fields() {
        let value = serde_json::to_value(Task::legacy("t1")).expect("serialize");
        assert_eq!(value, json!({ "id": "t1" }));
    }
}
