//! End-to-end scenarios over realistic task collections.
//!
//! Each test builds a small board the way the dashboard store would hand it
//! over (JSON records, mixed legacy and modern shapes) and runs the public
//! API against it.

use std::collections::HashMap;

use cmdcenter_core::dataset::parse_dataset;
use cmdcenter_core::graph::blocking::block_status;
use cmdcenter_core::graph::cycles::detect_cycle;
use cmdcenter_core::graph::hierarchy::{HierarchyDepth, hierarchy_depth};
use cmdcenter_core::model::relationships::{default_relationships, safe_relationships};
use cmdcenter_core::validate::graph::validate_task_graph;
use cmdcenter_core::validate::{
    DEFAULT_MAX_HIERARCHY_DEPTH, RelationshipValidator, validate_relationships,
    validate_relationships_json,
};
use cmdcenter_core::{IssueCode, Task, TaskIndex, TaskLookup};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn record(
    id: &str,
    parent: Option<&str>,
    subtasks: &[&str],
    blocks: &[&str],
    blocked_by: &[&str],
) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Task {id}"),
        "column": "todo",
        "relationships": {
            "parent": parent,
            "subtasks": subtasks,
            "dependencies": {
                "blocks": blocks,
                "blockedBy": blocked_by,
                "related": [],
                "duplicates": [],
                "supersedes": []
            }
        }
    })
}

fn decode(records: &[serde_json::Value]) -> Vec<Task> {
    records
        .iter()
        .map(|value| serde_json::from_value(value.clone()).expect("decode task"))
        .collect()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn consistent_board_validates_clean() {
    let tasks = decode(&[
        record("epic", None, &["api", "ui"], &[], &[]),
        record("api", Some("epic"), &[], &["ui"], &[]),
        record("ui", Some("epic"), &[], &[], &["api"]),
    ]);
    let index = TaskIndex::new(&tasks);
    let validator = RelationshipValidator::default();

    for task in &tasks {
        let report = validator.validate(task, &index);
        assert!(report.valid, "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }
    let graph = validate_task_graph(&tasks);
    assert!(graph.valid);
    assert!(graph.cycles.is_empty());
}

#[test]
fn three_task_cycle_is_one_cycle() {
    let tasks = decode(&[
        record("a", None, &[], &["b"], &["c"]),
        record("b", None, &[], &["c"], &["a"]),
        record("c", None, &[], &["a"], &["b"]),
    ]);
    let report = validate_task_graph(&tasks);

    assert!(!report.valid);
    assert_eq!(report.cycles.len(), 1);
    let cycle = &report.cycles[0];
    for id in ["a", "b", "c"] {
        assert!(cycle.iter().any(|member| member == id));
    }
    assert_eq!(cycle.first(), cycle.last());
    assert_eq!(report.errors[1].message, "a → b → c → a");
}

#[test]
fn non_string_blocks_entry_keeps_the_rest_of_the_list() {
    let mut a = record("a", None, &[], &["b"], &["b"]);
    a["relationships"]["dependencies"]["blocks"] = json!(["b", 7]);
    let records = vec![a, record("b", None, &[], &["a"], &["a"])];
    let dataset = parse_dataset(&json!(records).to_string(), "board.json").expect("parse");
    let tasks = dataset.tasks();
    assert_eq!(tasks.len(), 2);

    let index = TaskIndex::new(&tasks);
    let report = validate_relationships_json(&dataset.records[0], &index, 5);
    assert_eq!(report.error_codes(), vec![IssueCode::InvalidReference]);
    assert!(
        report
            .errors
            .iter()
            .all(|issue| !issue.message.contains("must be an array"))
    );

    assert!(detect_cycle("a", &index, None));
    let graph = validate_task_graph(&tasks);
    assert!(!graph.valid);
    assert_eq!(graph.cycles, vec![vec!["a", "b", "a"]]);
}

#[test]
fn cycle_member_with_numeric_title_is_still_checked() {
    let mut a = record("a", None, &[], &["b"], &["b"]);
    a["title"] = json!(7);
    let records = vec![a, record("b", None, &[], &["a"], &["a"])];
    let dataset = parse_dataset(&json!(records).to_string(), "board.json").expect("parse");
    let tasks = dataset.tasks();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].display_title(), "a");

    let graph = validate_task_graph(&tasks);
    assert!(!graph.valid);
    assert_eq!(graph.cycles, vec![vec!["a", "b", "a"]]);
}

#[test]
fn orphaned_child_is_reported() {
    let tasks = decode(&[
        record("epic", None, &[], &[], &[]),
        record("api", Some("epic"), &[], &[], &[]),
    ]);
    let report = validate_task_graph(&tasks);
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].code, IssueCode::OrphanedSubtask);
}

#[test]
fn depth_limit_is_inclusive() {
    let mut records = vec![record("t0", None, &["t1"], &[], &[])];
    for i in 1..=DEFAULT_MAX_HIERARCHY_DEPTH + 1 {
        let id = format!("t{i}");
        let parent = format!("t{}", i - 1);
        let child = format!("t{}", i + 1);
        records.push(record(&id, Some(parent.as_str()), &[child.as_str()], &[], &[]));
    }
    let tasks = decode(&records);
    let index = TaskIndex::new(&tasks);

    let at_max = &tasks[DEFAULT_MAX_HIERARCHY_DEPTH];
    let over_max = &tasks[DEFAULT_MAX_HIERARCHY_DEPTH + 1];
    assert_eq!(
        hierarchy_depth(at_max.id().expect("id"), &index, None),
        HierarchyDepth::Finite(DEFAULT_MAX_HIERARCHY_DEPTH)
    );
    assert!(validate_relationships(at_max, &index, DEFAULT_MAX_HIERARCHY_DEPTH).valid);
    let report = validate_relationships(over_max, &index, DEFAULT_MAX_HIERARCHY_DEPTH);
    assert_eq!(report.error_codes(), vec![IssueCode::HierarchyTooDeep]);
}

#[test]
fn one_sided_block_only_warns() {
    let tasks = decode(&[
        record("a", None, &[], &["b"], &[]),
        record("b", None, &[], &[], &[]),
    ]);
    let index = TaskIndex::new(&tasks);
    let report = validate_relationships(&tasks[0], &index, 5);
    assert!(report.valid);
    assert!(report.has_warning(IssueCode::BidirectionalMismatch));
}

#[test]
fn blocker_moving_to_done_unblocks() {
    let mut tasks = decode(&[
        record("ship", None, &[], &[], &["review"]),
        record("review", None, &[], &["ship"], &[]),
    ]);

    let status = block_status(&tasks[0], &TaskIndex::new(&tasks));
    assert!(status.blocked);
    assert_eq!(status.blockers[0].column.as_deref(), Some("todo"));
    assert_eq!(status.blockers[0].title.as_deref(), Some("Task review"));

    tasks[1].column = Some("done".into());
    let status = block_status(&tasks[0], &TaskIndex::new(&tasks));
    assert!(!status.blocked);
    assert_eq!(status.reason, None);
}

#[test]
fn legacy_board_record_reads_as_default() {
    let legacy: Task = serde_json::from_value(json!({
        "id": "t7",
        "name": "Docs refresh",
        "status": "active",
        "priority": "low"
    }))
    .expect("decode");
    assert_eq!(*safe_relationships(&legacy), default_relationships());

    let report = validate_relationships(&legacy, &TaskIndex::default(), 5);
    assert_eq!(report.error_codes(), vec![IssueCode::MissingRelationships]);
}

#[test]
fn empty_lookup_keeps_shape_errors_only() {
    let value = json!({
        "id": "t1",
        "relationships": {
            "parent": "nowhere",
            "subtasks": ["t1", "ghost", "ghost"],
            "dependencies": {
                "blocks": ["phantom"],
                "blockedBy": "t9",
                "related": [],
                "duplicates": [],
                "supersedes": []
            }
        }
    });

    let empty: HashMap<String, Task> = HashMap::new();
    let report = validate_relationships_json(&value, &empty, 5);
    assert!(report.warnings.is_empty());
    assert_eq!(
        report.error_codes(),
        vec![
            IssueCode::SelfReference,
            IssueCode::DuplicateReference,
            IssueCode::InvalidFieldType,
        ]
    );

    let populated: HashMap<String, Task> =
        HashMap::from([("t2".to_string(), Task::new("t2"))]);
    assert_eq!(populated.task_count(), 1);
    let report = validate_relationships_json(&value, &populated, 5);
    assert!(report.has_error(IssueCode::UnknownParent));
    assert!(report.has_warning(IssueCode::DanglingReference));
}

#[test]
fn export_file_round_trip_through_validators() {
    let dataset = parse_dataset(
        &json!({
            "projects": [{ "id": "p1", "name": "Core" }],
            "tasks": [
                record("a", None, &["b"], &[], &[]),
                record("b", Some("a"), &[], &[], &[]),
                { "id": "legacy", "name": "Old card", "status": "done" },
                "not a task"
            ]
        })
        .to_string(),
        "export.json",
    )
    .expect("parse");

    let tasks = dataset.tasks();
    assert_eq!(tasks.len(), 3);
    let index = TaskIndex::new(&tasks);

    let reports: Vec<_> = dataset
        .records
        .iter()
        .map(|value| validate_relationships_json(value, &index, 5))
        .collect();
    assert!(reports[0].valid);
    assert!(reports[1].valid);
    assert_eq!(reports[2].error_codes(), vec![IssueCode::MissingRelationships]);
    assert_eq!(reports[3].error_codes(), vec![IssueCode::MalformedTask]);

    assert!(validate_task_graph(&tasks).valid);
}
