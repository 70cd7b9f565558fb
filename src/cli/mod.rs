//! Command-line interface.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::check::CheckArgs;
use commands::config::ConfigArgs;
use commands::run::RunArgs;

#[derive(Parser, Debug)]
#[command(name = "fixloop")]
#[command(
    about = "Fixloop - iterate AI agents over compiler diagnostics until none remain",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Project directory (holds .fixloop/ and the code to check)
    #[arg(short, long, global = true, default_value = ".", env = "FIXLOOP_PROJECT")]
    pub project: PathBuf,

    /// Load configuration from this YAML file instead of .fixloop/
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the convergence loop until no diagnostics remain
    Run(RunArgs),

    /// Run the diagnostics check once and summarize it
    Check(CheckArgs),

    /// Inspect configuration
    Config(ConfigArgs),
}

/// Print an error and return the process exit code.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> i32 {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": chain,
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| err.to_string())
        );
    } else {
        eprintln!("{} {err:#}", console::style("error:").red().bold());
    }
    1
}
