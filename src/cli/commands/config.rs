//! Implementation of the `fixloop config` commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Check the configuration and report problems
    Validate,
}

#[derive(Debug, Serialize)]
pub struct ShowOutput {
    pub config: Config,
}

impl CommandOutput for ShowOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config).unwrap_or_default()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub valid: bool,
    pub message: String,
}

impl CommandOutput for ValidateOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }
}

pub fn execute(args: &ConfigArgs, config: Config, json_mode: bool) -> Result<()> {
    match args.command {
        ConfigCommand::Show => {
            output(&ShowOutput { config }, json_mode);
            Ok(())
        }
        ConfigCommand::Validate => {
            // Loading already validated; re-check in case of direct construction.
            ConfigLoader::validate(&config).context("Configuration is invalid")?;
            output(
                &ValidateOutput {
                    valid: true,
                    message: "Configuration is valid".to_string(),
                },
                json_mode,
            );
            Ok(())
        }
    }
}
