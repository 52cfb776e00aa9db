//! `cmdc depth`: parent-chain depth and ancestors of a task.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use cmdcenter_core::TaskIndex;
use cmdcenter_core::graph::hierarchy::{HierarchyDepth, ancestors, hierarchy_depth};
use serde::Serialize;

use super::{open_dataset, require_task};
use crate::output::{OutputMode, pretty_kv, pretty_section, render};

/// Arguments for `cmdc depth`.
#[derive(Args, Debug)]
pub struct DepthArgs {
    /// Task dataset (JSON array or export object).
    pub file: PathBuf,

    /// Task to measure.
    pub id: String,

    /// Measure as if the task's parent were this id.
    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(Debug, Serialize)]
struct DepthOutput {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    depth: HierarchyDepth,
    max_hierarchy_depth: usize,
    exceeds_max: bool,
    /// Stored ancestors, nearest first.
    ancestors: Vec<String>,
}

/// Execute `cmdc depth`.
pub fn run_depth(
    args: &DepthArgs,
    output: OutputMode,
    max_hierarchy_depth: usize,
) -> anyhow::Result<()> {
    let dataset = open_dataset(&args.file, output)?;
    let tasks = dataset.tasks();
    let index = TaskIndex::new(&tasks);
    require_task(&index, &args.id, output)?;

    let depth = hierarchy_depth(&args.id, &index, args.parent.as_deref());
    let payload = DepthOutput {
        id: args.id.clone(),
        parent: args.parent.clone(),
        depth,
        max_hierarchy_depth,
        exceeds_max: depth.exceeds(max_hierarchy_depth),
        ancestors: ancestors(&args.id, &index),
    };
    let pretty = output.is_pretty();
    render(output, &payload, |report, w| render_depth_human(report, pretty, w))
}

fn render_depth_human(
    payload: &DepthOutput,
    pretty: bool,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    let verdict = if payload.exceeds_max { "too deep" } else { "ok" };
    if pretty {
        pretty_section(w, &payload.id)?;
        if let Some(parent) = &payload.parent {
            pretty_kv(w, "As child of", parent)?;
        }
        pretty_kv(
            w,
            "Depth",
            format!("{} (max {}, {verdict})", payload.depth, payload.max_hierarchy_depth),
        )?;
        if !payload.ancestors.is_empty() {
            pretty_kv(w, "Ancestors", payload.ancestors.join(" < "))?;
        }
    } else {
        writeln!(w, "{}: depth {} ({verdict})", payload.id, payload.depth)?;
    }
    Ok(())
}
