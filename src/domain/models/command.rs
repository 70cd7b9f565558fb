//! Command classes for assistant invocations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Timeout and retry class of an assistant invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    /// Short availability or sanity checks
    Quick,
    /// Read-only analysis (detection, root-cause, completion phases)
    Analysis,
    /// Agentic edits (resolution and validation phases)
    Agent,
    /// Long-running agentic edits over large assignments
    Extended,
}

impl CommandType {
    /// All command types.
    pub const ALL: [Self; 4] = [Self::Quick, Self::Analysis, Self::Agent, Self::Extended];

    /// Built-in retry budget used when configuration does not override it.
    pub const fn default_max_retries(self) -> u32 {
        match self {
            Self::Quick | Self::Agent | Self::Extended => 2,
            Self::Analysis => 3,
        }
    }

    /// Built-in per-invocation timeout.
    pub const fn default_timeout(self) -> Duration {
        match self {
            Self::Quick => Duration::from_secs(30),
            Self::Analysis => Duration::from_secs(300),
            Self::Agent => Duration::from_secs(600),
            Self::Extended => Duration::from_secs(1200),
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quick => write!(f, "quick"),
            Self::Analysis => write!(f, "analysis"),
            Self::Agent => write!(f, "agent"),
            Self::Extended => write!(f, "extended"),
        }
    }
}
