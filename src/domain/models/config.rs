use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use super::command::CommandType;
use super::failure::FailureKind;

/// Main configuration structure for fixloop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Loop and phase settings
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Retry and backoff policy
    #[serde(default)]
    pub recovery: RecoveryConfig,

    /// Per-command-type timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// External AI assistant invocation
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// External static-analysis tool invocation
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Convergence loop and phase executor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OrchestratorConfig {
    /// Agents run concurrently within one batch
    #[serde(default = "default_max_parallel_agents")]
    pub max_parallel_agents: usize,

    /// Iteration cap before the loop gives up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Roster size of every phase
    #[serde(default = "default_agents_per_phase")]
    pub agents_per_phase: usize,

    /// Phase runtime after which a stall warning is emitted
    #[serde(default = "default_stall_warning_secs")]
    pub stall_warning_secs: u64,

    /// First iteration at which deep stagnation analysis runs
    #[serde(default = "default_stagnation_analysis_after")]
    pub stagnation_analysis_after: u32,

    /// Resolution assignments larger than this use the extended timeout class
    #[serde(default = "default_extended_threshold")]
    pub extended_threshold: usize,
}

const fn default_max_parallel_agents() -> usize {
    3
}

const fn default_max_iterations() -> u32 {
    10
}

const fn default_agents_per_phase() -> usize {
    25
}

const fn default_stall_warning_secs() -> u64 {
    900
}

const fn default_stagnation_analysis_after() -> u32 {
    3
}

const fn default_extended_threshold() -> usize {
    10
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_parallel_agents: default_max_parallel_agents(),
            max_iterations: default_max_iterations(),
            agents_per_phase: default_agents_per_phase(),
            stall_warning_secs: default_stall_warning_secs(),
            stagnation_analysis_after: default_stagnation_analysis_after(),
            extended_threshold: default_extended_threshold(),
        }
    }
}

impl OrchestratorConfig {
    pub const fn stall_warning(&self) -> Duration {
        Duration::from_secs(self.stall_warning_secs)
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecoveryConfig {
    /// Delay before the first retry in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for any single backoff delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Retry budget per command type; missing entries use built-in defaults
    #[serde(default = "default_retry_budgets")]
    pub retry_budgets: BTreeMap<CommandType, u32>,

    /// Failure kinds that are never retried
    #[serde(default = "default_non_retryable")]
    pub non_retryable: Vec<FailureKind>,
}

const fn default_base_delay_ms() -> u64 {
    1000
}

const fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_retry_budgets() -> BTreeMap<CommandType, u32> {
    CommandType::ALL
        .iter()
        .map(|ct| (*ct, ct.default_max_retries()))
        .collect()
}

fn default_non_retryable() -> Vec<FailureKind> {
    vec![FailureKind::Authentication, FailureKind::ToolNotFound]
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            retry_budgets: default_retry_budgets(),
            non_retryable: default_non_retryable(),
        }
    }
}

impl RecoveryConfig {
    /// Retry budget for a command type.
    pub fn max_retries(&self, command_type: CommandType) -> u32 {
        self.retry_budgets
            .get(&command_type)
            .copied()
            .unwrap_or_else(|| command_type.default_max_retries())
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// Per-invocation timeout in seconds per command type
    #[serde(default = "default_per_command")]
    pub per_command: BTreeMap<CommandType, u64>,

    /// Wait between the termination request and the forced kill
    #[serde(default = "default_termination_grace_secs")]
    pub termination_grace_secs: u64,
}

fn default_per_command() -> BTreeMap<CommandType, u64> {
    CommandType::ALL
        .iter()
        .map(|ct| (*ct, ct.default_timeout().as_secs()))
        .collect()
}

const fn default_termination_grace_secs() -> u64 {
    5
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            per_command: default_per_command(),
            termination_grace_secs: default_termination_grace_secs(),
        }
    }
}

impl TimeoutConfig {
    /// Timeout for a command type.
    pub fn timeout(&self, command_type: CommandType) -> Duration {
        self.per_command
            .get(&command_type)
            .map_or_else(|| command_type.default_timeout(), |secs| Duration::from_secs(*secs))
    }

    pub const fn termination_grace(&self) -> Duration {
        Duration::from_secs(self.termination_grace_secs)
    }
}

/// External AI assistant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AssistantConfig {
    /// Path to the assistant CLI binary
    #[serde(default = "default_assistant_binary")]
    pub binary_path: String,

    /// Additional CLI flags
    #[serde(default)]
    pub extra_flags: Vec<String>,

    /// Working directory for invocations
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
}

fn default_assistant_binary() -> String {
    "claude".to_string()
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            binary_path: default_assistant_binary(),
            extra_flags: vec![],
            working_dir: default_working_dir(),
        }
    }
}

/// Static-analysis tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DiagnosticsConfig {
    /// Program to run
    #[serde(default = "default_diagnostics_program")]
    pub program: String,

    /// Arguments passed to the program
    #[serde(default = "default_diagnostics_args")]
    pub args: Vec<String>,

    /// Project directory to check
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Timeout for one check
    #[serde(default = "default_diagnostics_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_diagnostics_program() -> String {
    "npx".to_string()
}

fn default_diagnostics_args() -> Vec<String> {
    ["tsc", "--noEmit", "--pretty", "false"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

const fn default_diagnostics_timeout_secs() -> u64 {
    300
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            program: default_diagnostics_program(),
            args: default_diagnostics_args(),
            working_dir: default_working_dir(),
            timeout_secs: default_diagnostics_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rotated log files (console only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Whether to log to the console (stderr)
    #[serde(default = "default_true")]
    pub enable_console: bool,

    /// Rotation policy: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

const fn default_true() -> bool {
    true
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            enable_console: default_true(),
            rotation: default_rotation(),
        }
    }
}
