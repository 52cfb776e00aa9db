//! `cmdc blocked`: which incomplete tasks hold a task back.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use cmdcenter_core::TaskIndex;
use cmdcenter_core::graph::blocking::{BlockStatus, block_status};
use serde::Serialize;

use super::{open_dataset, require_task};
use crate::output::{OutputMode, pretty_kv, pretty_section, render};

/// Arguments for `cmdc blocked`.
#[derive(Args, Debug)]
pub struct BlockedArgs {
    /// Task dataset (JSON array or export object).
    pub file: PathBuf,

    /// Task to inspect.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct BlockedOutput {
    id: String,
    title: String,
    #[serde(flatten)]
    status: BlockStatus,
}

/// Execute `cmdc blocked`.
pub fn run_blocked(args: &BlockedArgs, output: OutputMode) -> anyhow::Result<()> {
    let dataset = open_dataset(&args.file, output)?;
    let tasks = dataset.tasks();
    let index = TaskIndex::new(&tasks);
    let task = require_task(&index, &args.id, output)?;

    let payload = BlockedOutput {
        id: args.id.clone(),
        title: task.display_title().to_string(),
        status: block_status(task, &index),
    };
    let pretty = output.is_pretty();
    render(output, &payload, |report, w| render_blocked_human(report, pretty, w))
}

fn render_blocked_human(
    payload: &BlockedOutput,
    pretty: bool,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    if pretty {
        pretty_section(w, &format!("{} — {}", payload.id, payload.title))?;
        pretty_kv(w, "Blocked", if payload.status.blocked { "yes" } else { "no" })?;
        if let Some(reason) = &payload.status.reason {
            pretty_kv(w, "Reason", reason)?;
        }
    } else {
        let verdict = if payload.status.blocked { "blocked" } else { "unblocked" };
        writeln!(w, "{}: {verdict}", payload.id)?;
    }

    for blocker in &payload.status.blockers {
        let title = blocker.title.as_deref().unwrap_or("?");
        match &blocker.column {
            Some(column) => writeln!(
                w,
                "  - {} {title} ({}, in {column})",
                blocker.id, blocker.reason
            )?,
            None => writeln!(w, "  - {} {title} ({})", blocker.id, blocker.reason)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdcenter_core::graph::blocking::{Blocker, BlockerReason};

    #[test]
    fn text_lists_blockers_with_reasons() {
        let payload = BlockedOutput {
            id: "ship".into(),
            title: "Ship it".into(),
            status: BlockStatus {
                blocked: true,
                blockers: vec![
                    Blocker {
                        id: "review".into(),
                        title: Some("Review".into()),
                        reason: BlockerReason::NotCompleted,
                        column: Some("todo".into()),
                    },
                    Blocker {
                        id: "ghost".into(),
                        title: None,
                        reason: BlockerReason::NotFound,
                        column: None,
                    },
                ],
                reason: Some("Blocked by 2 incomplete task(s)".into()),
            },
        };
        let mut out = Vec::new();
        render_blocked_human(&payload, false, &mut out).expect("render");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "ship: blocked\n  - review Review (not completed, in todo)\n  - ghost ? (not found)\n"
        );
    }

    #[test]
    fn json_flattens_status() {
        let payload = BlockedOutput {
            id: "t1".into(),
            title: "t1".into(),
            status: BlockStatus::default(),
        };
        let value = serde_json::to_value(&payload).expect("json");
        assert_eq!(value["blocked"], false);
        assert!(value["blockers"].as_array().expect("array").is_empty());
        assert!(value["reason"].is_null());
    }
}
