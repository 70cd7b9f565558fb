//! Orchestration errors.

use thiserror::Error;

use crate::domain::ports::DiagnosticsError;

/// Errors raised by the phase executor.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("Phase {phase} validation failed: {terminal}/{total} agents reached a terminal state")]
    ValidationFailed {
        phase: u8,
        terminal: usize,
        total: usize,
    },

    #[error("Phase {phase} stopped by user")]
    Stopped { phase: u8 },

    #[error("Invalid phase number: {0}")]
    InvalidPhase(u8),
}

/// Terminal failures of the convergence loop.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("Failed to run diagnostics check: {0}")]
    Diagnostics(#[from] DiagnosticsError),

    #[error("Iteration {iteration} failed: {source}")]
    PhaseValidation {
        iteration: u32,
        #[source]
        source: PhaseError,
    },

    #[error(
        "Maximum iterations ({max_iterations}) exceeded with {remaining} diagnostics remaining; manual intervention required"
    )]
    MaxIterationsExceeded {
        max_iterations: u32,
        remaining: usize,
    },

    #[error("Stopped by user during iteration {iteration}")]
    Stopped { iteration: u32 },
}

pub type PhaseResult<T> = Result<T, PhaseError>;
