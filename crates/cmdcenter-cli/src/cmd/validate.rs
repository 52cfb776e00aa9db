//! `cmdc validate`: check every task's relationships and the graph as a whole.

use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Args;
use cmdcenter_core::TaskIndex;
use cmdcenter_core::validate::RelationshipValidator;
use cmdcenter_core::validate::graph::{GraphReport, validate_task_graph};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::open_dataset;
use crate::output::{OutputMode, issue_line, pretty_kv, pretty_section, render};

/// Arguments for `cmdc validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Task dataset (JSON array or export object).
    pub file: PathBuf,

    /// Skip per-task checks and only run the cycle and orphan checks.
    #[arg(long)]
    pub graph_only: bool,
}

#[derive(Debug, Serialize)]
struct TaskFindings {
    /// Position of the record in the dataset.
    position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    valid: bool,
    errors: Vec<cmdcenter_core::Issue>,
    warnings: Vec<cmdcenter_core::Issue>,
}

#[derive(Debug, Serialize)]
struct ValidateOutput {
    valid: bool,
    records: usize,
    max_hierarchy_depth: usize,
    /// Records with at least one error or warning.
    tasks: Vec<TaskFindings>,
    graph: GraphReport,
}

impl ValidateOutput {
    fn error_count(&self) -> usize {
        self.tasks.iter().map(|t| t.errors.len()).sum::<usize>() + self.graph.errors.len()
    }

    fn warning_count(&self) -> usize {
        self.tasks.iter().map(|t| t.warnings.len()).sum()
    }
}

/// Execute `cmdc validate`. Exits with status 1 when anything is invalid.
pub fn run_validate(
    args: &ValidateArgs,
    output: OutputMode,
    max_hierarchy_depth: usize,
) -> anyhow::Result<()> {
    let dataset = open_dataset(&args.file, output)?;
    let tasks = dataset.tasks();
    let index = TaskIndex::new(&tasks);
    let validator = RelationshipValidator::new(max_hierarchy_depth);

    let findings: Vec<TaskFindings> = if args.graph_only {
        Vec::new()
    } else {
        dataset
            .records
            .iter()
            .enumerate()
            .map(|(position, record)| {
                let report = validator.validate_value(record, &index);
                TaskFindings {
                    position,
                    id: record.get("id").and_then(Value::as_str).map(str::to_string),
                    valid: report.valid,
                    errors: report.errors,
                    warnings: report.warnings,
                }
            })
            .filter(|f| !f.errors.is_empty() || !f.warnings.is_empty())
            .collect()
    };
    debug!(records = dataset.len(), flagged = findings.len(), "per-task validation done");

    let graph = validate_task_graph(&tasks);
    let payload = ValidateOutput {
        valid: graph.valid && findings.iter().all(|f| f.valid),
        records: dataset.len(),
        max_hierarchy_depth,
        tasks: findings,
        graph,
    };
    info!(
        valid = payload.valid,
        errors = payload.error_count(),
        warnings = payload.warning_count(),
        "validated {}",
        args.file.display()
    );

    let pretty = output.is_pretty();
    render(output, &payload, |report, w| render_validate_human(report, pretty, w))?;

    // Exit code 1 on any error for CI integration
    if !payload.valid {
        std::io::stdout().flush()?;
        process::exit(1);
    }
    Ok(())
}

fn render_validate_human(
    payload: &ValidateOutput,
    pretty: bool,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    if pretty {
        pretty_section(w, "Relationship validation")?;
        pretty_kv(w, "Records", payload.records.to_string())?;
        pretty_kv(w, "Max depth", payload.max_hierarchy_depth.to_string())?;
        pretty_kv(w, "Errors", payload.error_count().to_string())?;
        pretty_kv(w, "Warnings", payload.warning_count().to_string())?;
        writeln!(w)?;
    }

    for task in &payload.tasks {
        let label = task
            .id
            .clone()
            .unwrap_or_else(|| format!("#{}", task.position));
        let verdict = if task.valid { "warn" } else { "invalid" };
        writeln!(w, "{label}: {verdict}")?;
        for issue in &task.errors {
            issue_line(w, issue)?;
        }
        for issue in &task.warnings {
            issue_line(w, issue)?;
        }
    }

    if !payload.graph.errors.is_empty() {
        writeln!(w, "graph: invalid")?;
        for issue in &payload.graph.errors {
            issue_line(w, issue)?;
        }
    }

    if payload.valid {
        writeln!(
            w,
            "ok: {} task(s), {} warning(s)",
            payload.records,
            payload.warning_count()
        )?;
    } else {
        writeln!(
            w,
            "invalid: {} error(s), {} warning(s)",
            payload.error_count(),
            payload.warning_count()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdcenter_core::{Issue, IssueCode};

    fn payload(tasks: Vec<TaskFindings>, graph: GraphReport) -> ValidateOutput {
        ValidateOutput {
            valid: graph.valid && tasks.iter().all(|t| t.valid),
            records: 3,
            max_hierarchy_depth: 5,
            tasks,
            graph,
        }
    }

    fn render_text(payload: &ValidateOutput, pretty: bool) -> String {
        let mut out = Vec::new();
        render_validate_human(payload, pretty, &mut out).expect("render");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn validate_args_parse() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ValidateArgs,
        }

        let parsed = Wrapper::parse_from(["test", "board.json", "--graph-only"]);
        assert_eq!(parsed.args.file, PathBuf::from("board.json"));
        assert!(parsed.args.graph_only);
    }

    #[test]
    fn clean_board_reports_ok() {
        let graph = GraphReport {
            valid: true,
            ..GraphReport::default()
        };
        let text = render_text(&payload(Vec::new(), graph), false);
        assert_eq!(text, "ok: 3 task(s), 0 warning(s)\n");
    }

    #[test]
    fn findings_are_listed_per_task() {
        let tasks = vec![
            TaskFindings {
                position: 0,
                id: Some("t1".into()),
                valid: false,
                errors: vec![Issue::new(IssueCode::SelfReference, "Task cannot block itself")],
                warnings: Vec::new(),
            },
            TaskFindings {
                position: 2,
                id: None,
                valid: false,
                errors: vec![Issue::new(IssueCode::MalformedTask, "Task must be a valid object")],
                warnings: Vec::new(),
            },
        ];
        let graph = GraphReport {
            valid: true,
            ..GraphReport::default()
        };
        let text = render_text(&payload(tasks, graph), true);
        assert!(text.starts_with("Relationship validation\n"));
        assert!(text.contains("t1: invalid\n  [R2001] Task cannot block itself\n"));
        assert!(text.contains("#2: invalid\n  [R1001] Task must be a valid object\n"));
        assert!(text.ends_with("invalid: 2 error(s), 0 warning(s)\n"));
    }

    #[test]
    fn graph_errors_are_listed() {
        let graph = GraphReport {
            valid: false,
            errors: vec![
                Issue::new(IssueCode::DependencyCycle, "Found 1 dependency cycle(s)"),
                Issue::new(IssueCode::DependencyCycle, "a → b → a"),
            ],
            cycles: vec![vec!["a".into(), "b".into(), "a".into()]],
        };
        let text = render_text(&payload(Vec::new(), graph), false);
        assert!(text.contains("graph: invalid\n  [R4001] Found 1 dependency cycle(s)\n"));
        assert!(text.contains("  [R4001] a → b → a\n"));
    }
}
