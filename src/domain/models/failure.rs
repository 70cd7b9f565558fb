//! Classified invocation failures.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure taxonomy for assistant invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Credentials missing or rejected; needs external action
    Authentication,
    /// Connectivity problems between the assistant and its backend
    Network,
    /// The invocation exceeded its deadline
    Timeout,
    /// The assistant or a tool it needs is not installed
    ToolNotFound,
    /// Anything else
    Unknown,
}

impl FailureKind {
    /// Whether a retry can plausibly succeed.
    pub const fn is_recoverable(self) -> bool {
        !matches!(self, Self::Authentication | Self::ToolNotFound)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Network => write!(f, "network"),
            Self::Timeout => write!(f, "timeout"),
            Self::ToolNotFound => write!(f, "tool_not_found"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of classifying a raw failure message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureClassification {
    pub kind: FailureKind,
    pub recoverable: bool,
    pub suggested_actions: Vec<String>,
}

/// A classified failure surfaced by the recovery controller.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind} failure after {attempts} attempt(s): {message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub recoverable: bool,
    /// Message of the last attempt
    pub message: String,
    /// Number of invocations made, including the first
    pub attempts: u32,
    pub suggested_actions: Vec<String>,
}

impl Failure {
    pub fn new(
        classification: FailureClassification,
        message: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            kind: classification.kind,
            recoverable: classification.recoverable,
            message: message.into(),
            attempts,
            suggested_actions: classification.suggested_actions,
        }
    }
}
