#![allow(clippy::must_use_candidate)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::validate::DEFAULT_MAX_HIERARCHY_DEPTH;

/// Directory holding per-project state, relative to the project root.
pub const CONFIG_DIR: &str = ".cmdcenter";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Preferred output mode (`pretty`, `text` or `json`).
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_max_hierarchy_depth")]
    pub max_hierarchy_depth: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_hierarchy_depth: default_max_hierarchy_depth(),
        }
    }
}

/// Path of the project config file under `project_root`.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.toml")
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_config_path(project_root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Normalize an output mode name; unknown names yield `None`.
pub fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "plain" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

/// Pick the output mode: CLI flag, then `FORMAT`, then the project config,
/// then pretty on a terminal and text when piped.
///
/// An unrecognized CLI value is an error; unrecognized env or config values
/// are skipped.
pub fn resolve_output(
    cli_format: Option<&str>,
    env_format: Option<&str>,
    config_output: Option<&str>,
) -> Result<&'static str> {
    if let Some(raw) = cli_format {
        return normalize_output_mode(raw).with_context(|| {
            format!("Unknown output format '{raw}' (expected pretty, text or json)")
        });
    }

    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return Ok(mode);
    }

    if let Some(mode) = config_output.and_then(normalize_output_mode) {
        return Ok(mode);
    }

    if std::io::stdout().is_terminal() {
        Ok("pretty")
    } else {
        Ok("text")
    }
}

const fn default_max_hierarchy_depth() -> usize {
    DEFAULT_MAX_HIERARCHY_DEPTH
}
