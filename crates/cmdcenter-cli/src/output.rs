//! Output formatting for CLI commands.
//!
//! Every command produces a serializable payload and a human renderer.
//! [`render`] picks between them based on the resolved [`OutputMode`];
//! failures go through [`render_error`] so JSON consumers always get an
//! object on stderr.

use std::io::{self, Write};

use clap::ValueEnum;
use cmdcenter_core::config::resolve_output;
use cmdcenter_core::Issue;
use serde::Serialize;

const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator for pretty output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// Render one issue line: `  [R2001] message`.
pub fn issue_line(w: &mut dyn Write, issue: &Issue) -> io::Result<()> {
    writeln!(w, "  [{}] {}", issue.code, issue.message)
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, rules, key/value lines).
    Pretty,
    /// Token-efficient plain text for agents and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Map a normalized mode name back to the enum.
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "pretty" => Some(Self::Pretty),
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Returns `true` if JSON output was requested.
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Returns `true` if pretty output was requested.
    pub const fn is_pretty(self) -> bool {
        matches!(self, Self::Pretty)
    }
}

/// Resolve the output mode for this invocation.
///
/// Precedence: `--format`, then the `--json` alias, then `FORMAT`, then the
/// project config, then pretty on a terminal and text otherwise.
pub fn resolve_output_mode(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    config_output: Option<&str>,
) -> anyhow::Result<OutputMode> {
    let env_format = std::env::var("FORMAT").ok();
    resolve_output_mode_inner(format_flag, json_flag, env_format.as_deref(), config_output)
}

fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    config_output: Option<&str>,
) -> anyhow::Result<OutputMode> {
    let flag = format_flag
        .or_else(|| json_flag.then_some(OutputMode::Json))
        .map(OutputMode::as_str);
    let name = resolve_output(flag, format_env, config_output)?;
    OutputMode::from_name(name)
        .ok_or_else(|| anyhow::anyhow!("unsupported output mode '{name}'"))
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "dataset_unreadable", "task_not_found").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create an error with a suggestion and code.
    pub fn with_details(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            error_code: Some(error_code.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a payload to stdout: JSON as-is, otherwise through `human_fn`.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
    } else {
        human_fn(value, &mut out)?;
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(mode, error, &mut out)?;
    Ok(())
}

fn write_error(mode: OutputMode, error: &CliError, out: &mut dyn Write) -> io::Result<()> {
    if mode.is_json() {
        let wrapper = serde_json::json!({ "error": error });
        serde_json::to_writer_pretty(&mut *out, &wrapper)?;
        writeln!(out)?;
    } else {
        writeln!(out, "error: {}", error.message)?;
        if let Some(ref suggestion) = error.suggestion {
            writeln!(out, "  suggestion: {suggestion}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_flag_wins_over_json_env_and_config() {
        let mode = resolve_output_mode_inner(Some(OutputMode::Text), true, Some("pretty"), None)
            .expect("resolve");
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn json_flag_wins_over_env() {
        let mode = resolve_output_mode_inner(None, true, Some("pretty"), Some("text"))
            .expect("resolve");
        assert!(mode.is_json());
    }

    #[test]
    fn env_wins_over_config() {
        let mode =
            resolve_output_mode_inner(None, false, Some("json"), Some("pretty")).expect("resolve");
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn config_used_when_env_unknown() {
        let mode =
            resolve_output_mode_inner(None, false, Some("yaml"), Some("human")).expect("resolve");
        assert!(mode.is_pretty());
    }

    #[test]
    fn mode_names_round_trip() {
        for mode in [OutputMode::Pretty, OutputMode::Text, OutputMode::Json] {
            assert_eq!(OutputMode::from_name(mode.as_str()), Some(mode));
        }
        assert_eq!(OutputMode::from_name("yaml"), None);
    }

    #[test]
    fn pretty_kv_aligns_keys() {
        let mut out = Vec::new();
        pretty_kv(&mut out, "Task", "t1").expect("write");
        assert_eq!(String::from_utf8(out).expect("utf8"), "Task:        t1\n");
    }

    #[test]
    fn json_error_is_wrapped() {
        let err = CliError::with_details("boom", "try again", "dataset_unreadable");
        let mut out = Vec::new();
        write_error(OutputMode::Json, &err, &mut out).expect("write");
        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value["error"]["message"], "boom");
        assert_eq!(value["error"]["error_code"], "dataset_unreadable");
    }

    #[test]
    fn text_error_includes_suggestion() {
        let err = CliError::with_details(
            "task 't9' not found",
            "check the id against the dataset",
            "task_not_found",
        );
        let mut out = Vec::new();
        write_error(OutputMode::Text, &err, &mut out).expect("write");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "error: task 't9' not found\n  suggestion: check the id against the dataset\n"
        );
    }
}
