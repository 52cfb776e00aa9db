#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;

use clap::{Parser, Subcommand};
use cmdcenter_core::config::load_project_config;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::output::{OutputMode, resolve_output_mode};

#[derive(Parser)]
#[command(
    name = "cmdc",
    author,
    version,
    about = "cmdcenter: validate task relationship graphs",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output (alias for `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Output format. Overrides `FORMAT` and the project config.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Maximum parent-chain depth. Overrides the project config.
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        about = "Validate every task and the dependency graph",
        long_about = "Run per-task relationship checks and the graph-level cycle and orphan \
                      checks over a dataset. Exits with status 1 when any error is found.",
        after_help = "EXAMPLES:\n    cmdc validate board.json\n\n    cmdc validate export.json --json"
    )]
    Validate(cmd::validate::ValidateArgs),

    #[command(
        name = "check-edge",
        about = "Check whether adding a dependency would create a cycle",
        after_help = "EXAMPLES:\n    cmdc check-edge board.json --from t1 --to t2\n\n    cmdc check-edge board.json --from t1 --to t2 --kind blockedBy"
    )]
    CheckEdge(cmd::check_edge::CheckEdgeArgs),

    #[command(about = "Show which incomplete tasks block a task")]
    Blocked(cmd::blocked::BlockedArgs),

    #[command(about = "Show a task's hierarchy depth and ancestors")]
    Depth(cmd::depth::DepthArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CMDC_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "cmdcenter=debug,info"
        } else {
            "cmdcenter=info,warn"
        })
    });

    let format = env::var("CMDC_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let config = load_project_config(&project_root)?;
    let output = resolve_output_mode(cli.format, cli.json, config.output.as_deref())?;
    let max_depth = cli
        .max_depth
        .unwrap_or(config.validation.max_hierarchy_depth);
    debug!(output = output.as_str(), max_depth, "resolved settings");

    match cli.command {
        Commands::Validate(ref args) => cmd::validate::run_validate(args, output, max_depth),
        Commands::CheckEdge(ref args) => cmd::check_edge::run_check_edge(args, output),
        Commands::Blocked(ref args) => cmd::blocked::run_blocked(args, output),
        Commands::Depth(ref args) => cmd::depth::run_depth(args, output, max_depth),
    }
}
