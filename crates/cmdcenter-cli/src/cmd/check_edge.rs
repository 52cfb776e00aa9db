//! `cmdc check-edge`: would a prospective dependency close a cycle?

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use cmdcenter_core::graph::blocking::BlockEdge;
use cmdcenter_core::graph::cycles::{detect_cycle, detect_cycle_simple};
use cmdcenter_core::{DependencyKind, Task, TaskIndex};
use serde::Serialize;
use tracing::debug;

use super::{open_dataset, require_task};
use crate::output::{OutputMode, pretty_kv, pretty_section, render};

/// Arguments for `cmdc check-edge`.
#[derive(Args, Debug)]
pub struct CheckEdgeArgs {
    /// Task dataset (JSON array or export object).
    pub file: PathBuf,

    /// Task that would gain the dependency.
    #[arg(long)]
    pub from: String,

    /// Task the dependency would point at.
    #[arg(long)]
    pub to: String,

    /// Dependency list the link would be added to.
    #[arg(long, default_value = "blocks")]
    pub kind: DependencyKind,
}

#[derive(Debug, Serialize)]
struct CheckEdgeOutput {
    from: String,
    to: String,
    kind: DependencyKind,
    /// The `blocks` edge the link implies, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    edge: Option<BlockEdge>,
    /// Exact answer over the flat edge list.
    creates_cycle: bool,
    /// Answer from walking task records; also true when the source already
    /// reaches an existing cycle.
    record_walk: bool,
}

/// Execute `cmdc check-edge`.
pub fn run_check_edge(args: &CheckEdgeArgs, output: OutputMode) -> anyhow::Result<()> {
    let dataset = open_dataset(&args.file, output)?;
    let tasks = dataset.tasks();
    let index = TaskIndex::new(&tasks);
    require_task(&index, &args.from, output)?;

    let edge = implied_edge(&args.from, &args.to, args.kind);
    let (creates_cycle, record_walk) = match &edge {
        Some(edge) => {
            let edges = blocking_edges(&tasks);
            (
                detect_cycle_simple(&edge.source, &edge.target, &edges),
                detect_cycle(
                    &edge.source,
                    &index,
                    Some((edge.target.as_str(), DependencyKind::Blocks)),
                ),
            )
        }
        None => (
            false,
            detect_cycle(&args.from, &index, Some((args.to.as_str(), args.kind))),
        ),
    };
    debug!(
        from = %args.from,
        to = %args.to,
        kind = args.kind.as_str(),
        creates_cycle,
        record_walk,
        "checked edge"
    );

    let payload = CheckEdgeOutput {
        from: args.from.clone(),
        to: args.to.clone(),
        kind: args.kind,
        edge,
        creates_cycle,
        record_walk,
    };
    let pretty = output.is_pretty();
    render(output, &payload, |report, w| render_check_edge_human(report, pretty, w))
}

/// `blockedBy` is the reverse of `blocks`; other kinds add no blocking edge.
fn implied_edge(from: &str, to: &str, kind: DependencyKind) -> Option<BlockEdge> {
    match kind {
        DependencyKind::Blocks => Some(BlockEdge::new(from, to)),
        DependencyKind::BlockedBy => Some(BlockEdge::new(to, from)),
        DependencyKind::Related | DependencyKind::Duplicates | DependencyKind::Supersedes => None,
    }
}

fn blocking_edges(tasks: &[Task]) -> Vec<BlockEdge> {
    tasks
        .iter()
        .filter_map(|task| task.id().map(|id| (id, task.blocks())))
        .flat_map(|(id, targets)| {
            targets
                .iter()
                .map(move |target| BlockEdge::new(id, target.as_str()))
        })
        .collect()
}

fn render_check_edge_human(
    payload: &CheckEdgeOutput,
    pretty: bool,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    if pretty {
        pretty_section(w, "Prospective dependency")?;
        pretty_kv(w, "From", &payload.from)?;
        pretty_kv(w, "To", &payload.to)?;
        pretty_kv(w, "Kind", payload.kind.as_str())?;
        if let Some(edge) = &payload.edge {
            pretty_kv(w, "Edge", format!("{} blocks {}", edge.source, edge.target))?;
        }
        writeln!(w)?;
    }

    if payload.creates_cycle {
        writeln!(
            w,
            "cycle: adding {} {} {} would create a dependency cycle",
            payload.from,
            payload.kind.as_str(),
            payload.to
        )?;
    } else if payload.record_walk {
        writeln!(
            w,
            "ok: no new cycle, but {} already reaches an existing cycle",
            payload.from
        )?;
    } else {
        writeln!(w, "ok: no cycle")?;
    }
    Ok(())
}
