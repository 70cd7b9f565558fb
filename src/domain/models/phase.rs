//! The five fixed phases of an iteration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::agent::{Agent, AgentStatus};
use super::command::CommandType;

/// Phase identity. Phases always run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Detection,
    Analysis,
    Resolution,
    Validation,
    Completion,
}

impl PhaseKind {
    /// All phases in execution order.
    pub const ALL: [Self; 5] = [
        Self::Detection,
        Self::Analysis,
        Self::Resolution,
        Self::Validation,
        Self::Completion,
    ];

    /// 1-based phase number.
    pub const fn number(self) -> u8 {
        match self {
            Self::Detection => 1,
            Self::Analysis => 2,
            Self::Resolution => 3,
            Self::Validation => 4,
            Self::Completion => 5,
        }
    }

    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Detection),
            2 => Some(Self::Analysis),
            3 => Some(Self::Resolution),
            4 => Some(Self::Validation),
            5 => Some(Self::Completion),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Detection => "Detection",
            Self::Analysis => "Analysis",
            Self::Resolution => "Resolution",
            Self::Validation => "Validation",
            Self::Completion => "Completion",
        }
    }

    /// Timeout class used for this phase's agents.
    pub const fn command_type(self) -> CommandType {
        match self {
            Self::Detection | Self::Analysis | Self::Completion => CommandType::Analysis,
            Self::Resolution | Self::Validation => CommandType::Agent,
        }
    }

    /// Role names cycled across the phase roster.
    pub const fn roles(self) -> &'static [&'static str] {
        match self {
            Self::Detection => &[
                "Error Scanner",
                "Type Auditor",
                "Import Tracer",
                "Null Safety Inspector",
                "Priority Triager",
            ],
            Self::Analysis => &[
                "Root Cause Analyst",
                "Dependency Mapper",
                "Type Flow Analyst",
                "Pattern Investigator",
                "Impact Assessor",
            ],
            Self::Resolution => &[
                "Fix Engineer",
                "Type Refiner",
                "Import Fixer",
                "Null Guard Specialist",
                "Generic Constraint Fixer",
            ],
            Self::Validation => &[
                "Fix Validator",
                "Regression Checker",
                "Type Safety Reviewer",
                "Consistency Checker",
                "Build Verifier",
            ],
            Self::Completion => &[
                "Completion Auditor",
                "Summary Writer",
                "Quality Reviewer",
                "Documentation Checker",
                "Final Verifier",
            ],
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Phase status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One phase of one iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub number: u8,
    pub name: String,
    pub kind: PhaseKind,
    pub status: PhaseStatus,
    pub agents: Vec<Agent>,
    /// Work items handed to the phase
    pub error_count: usize,
    /// Items agents claimed to have fixed (self-reported)
    pub errors_fixed: usize,
    /// Batches executed so far
    pub batches: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Phase {
    pub fn new(kind: PhaseKind, agents: Vec<Agent>, error_count: usize) -> Self {
        Self {
            number: kind.number(),
            name: kind.name().to_string(),
            kind,
            status: PhaseStatus::Pending,
            agents,
            error_count,
            errors_fixed: 0,
            batches: 0,
            start_time: None,
            end_time: None,
        }
    }

    pub fn count_with_status(&self, status: AgentStatus) -> usize {
        self.agents.iter().filter(|a| a.status == status).count()
    }

    /// Agents in a terminal state.
    pub fn terminal_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_terminal()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_numbers_round_trip() {
        for kind in PhaseKind::ALL {
            assert_eq!(PhaseKind::from_number(kind.number()), Some(kind));
        }
        assert_eq!(PhaseKind::from_number(0), None);
        assert_eq!(PhaseKind::from_number(6), None);
    }

    #[test]
    fn test_command_types() {
        assert_eq!(PhaseKind::Detection.command_type(), CommandType::Analysis);
        assert_eq!(PhaseKind::Analysis.command_type(), CommandType::Analysis);
        assert_eq!(PhaseKind::Resolution.command_type(), CommandType::Agent);
        assert_eq!(PhaseKind::Validation.command_type(), CommandType::Agent);
    }

    #[test]
    fn test_every_phase_has_roles() {
        assert!(PhaseKind::ALL.iter().all(|k| !k.roles().is_empty()));
    }
}
