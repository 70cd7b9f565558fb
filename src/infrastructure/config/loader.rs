use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::{CommandType, Config};

/// Project-local configuration directory
pub const CONFIG_DIR: &str = ".fixloop";

/// Environment variable prefix; `__` separates nested keys
pub const ENV_PREFIX: &str = "FIXLOOP_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_parallel_agents: {0}. Must be at least 1")]
    InvalidParallelism(usize),

    #[error("Invalid max_iterations: {0}. Must be at least 1")]
    InvalidMaxIterations(u32),

    #[error("Invalid agents_per_phase: {0}. Must be at least 1")]
    InvalidAgentsPerPhase(usize),

    #[error(
        "Invalid backoff configuration: base_delay_ms ({0}) must not exceed max_delay_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid timeout for {0}: must be greater than zero")]
    ZeroTimeout(CommandType),

    #[error("Invalid diagnostics.timeout_secs: must be greater than zero")]
    ZeroDiagnosticsTimeout,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("{0} program cannot be empty")]
    EmptyProgram(&'static str),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the project rooted at `root`
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .fixloop/config.yaml (project config)
    /// 3. .fixloop/local.yaml (project local overrides, optional)
    /// 4. Environment variables (FIXLOOP_* prefix, highest priority)
    pub fn load_from_dir(root: &Path) -> Result<Config> {
        let dir = root.join(CONFIG_DIR);
        let config: Config = Self::figment(&dir)
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(dir: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let orchestrator = &config.orchestrator;
        if orchestrator.max_parallel_agents == 0 {
            return Err(ConfigError::InvalidParallelism(
                orchestrator.max_parallel_agents,
            ));
        }
        if orchestrator.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations(orchestrator.max_iterations));
        }
        if orchestrator.agents_per_phase == 0 {
            return Err(ConfigError::InvalidAgentsPerPhase(
                orchestrator.agents_per_phase,
            ));
        }

        let recovery = &config.recovery;
        if recovery.base_delay_ms > recovery.max_delay_ms {
            return Err(ConfigError::InvalidBackoff(
                recovery.base_delay_ms,
                recovery.max_delay_ms,
            ));
        }

        for command_type in CommandType::ALL {
            if config.timeouts.timeout(command_type).is_zero() {
                return Err(ConfigError::ZeroTimeout(command_type));
            }
        }
        if config.diagnostics.timeout_secs == 0 {
            return Err(ConfigError::ZeroDiagnosticsTimeout);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        if config.assistant.binary_path.trim().is_empty() {
            return Err(ConfigError::EmptyProgram("Assistant"));
        }
        if config.diagnostics.program.trim().is_empty() {
            return Err(ConfigError::EmptyProgram("Diagnostics"));
        }

        Ok(())
    }
}
