//! Errors returned by port implementations.

use std::time::Duration;
use thiserror::Error;

/// Failures of a single assistant invocation.
///
/// Display strings are what the error classifier sees, so each variant's
/// message carries the keywords that identify its kind.
#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    #[error("Invocation timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },

    #[error("Command not found: {program}")]
    ToolNotFound { program: String },

    #[error("Failed to spawn assistant: {0}")]
    Spawn(String),

    #[error("Assistant exited with code {exit_code:?}: {message}")]
    Failed {
        exit_code: Option<i32>,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invocation cancelled")]
    Cancelled,
}

impl From<std::io::Error> for ExecutorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Failures of the static-analysis tool.
#[derive(Debug, Clone, Error)]
pub enum DiagnosticsError {
    #[error("Diagnostics tool not found: {0}")]
    ToolNotFound(String),

    #[error("Failed to spawn diagnostics tool: {0}")]
    Spawn(String),

    #[error("Diagnostics check timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Could not parse diagnostics output: {0}")]
    Parse(String),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
pub type DiagnosticsResult<T> = Result<T, DiagnosticsError>;
