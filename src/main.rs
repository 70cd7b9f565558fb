//! Fixloop CLI entry point.

use anyhow::Result;
use clap::Parser;

use fixloop::cli::{commands, handle_error, Cli, Commands};
use fixloop::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        std::process::exit(handle_error(&err, json));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = commands::load_config(&cli.project, cli.config.as_deref())?;

    let mut log_config = LogConfig::try_from(&config.logging)?;
    if cli.quiet {
        log_config.level = "warn".to_string();
    } else if cli.verbose {
        log_config.level = "debug".to_string();
    }
    // Held until exit so the file writer flushes.
    let _logger = LoggerImpl::init(&log_config)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args, config, cli.json).await,
        Commands::Check(args) => commands::check::execute(args, config, cli.json).await,
        Commands::Config(args) => commands::config::execute(&args, config, cli.json),
    }
}
