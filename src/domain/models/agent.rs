use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::work_item::WorkItem;

/// Agent status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl AgentStatus {
    /// Completed and failed agents are terminal.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One unit of delegated work within a phase.
///
/// An agent owns its slice of work items outright; no two agents in a phase
/// share an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Stable identifier, e.g. `p3-agent-051`
    pub id: String,

    /// Display name, e.g. `Fix Engineer #51`
    pub name: String,

    /// Role within the phase
    pub role: String,

    /// Phase this agent belongs to (1..=5)
    pub phase_number: u8,

    /// Position within the phase roster (0-based)
    pub agent_index: usize,

    /// Global roster slot (1-based, unique across phases)
    pub slot: usize,

    /// Current status
    pub status: AgentStatus,

    /// Progress percentage (0-100)
    pub progress: u8,

    /// Work items this agent is responsible for
    pub assigned_items: Vec<WorkItem>,

    /// Items the assistant claimed to have fixed
    pub fixed_items: Vec<WorkItem>,

    /// Captured assistant output
    pub output: Vec<String>,

    /// Failure description for failed agents
    pub error: Option<String>,

    /// Invocations made, including retries
    pub attempts: u32,

    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Agent {
    /// Create a pending agent with its assignment.
    pub fn new(
        phase_number: u8,
        agent_index: usize,
        slot: usize,
        role: impl Into<String>,
        assigned_items: Vec<WorkItem>,
    ) -> Self {
        let role = role.into();
        Self {
            id: format!("p{phase_number}-agent-{slot:03}"),
            name: format!("{role} #{slot}"),
            role,
            phase_number,
            agent_index,
            slot,
            status: AgentStatus::Pending,
            progress: 0,
            assigned_items,
            fixed_items: Vec::new(),
            output: Vec::new(),
            error: None,
            attempts: 0,
            start_time: None,
            end_time: None,
        }
    }

    /// Transition to running.
    pub fn start(&mut self) {
        self.status = AgentStatus::Running;
        self.progress = 0;
        self.start_time = Some(Utc::now());
    }

    /// Transition to completed with captured output.
    pub fn complete(&mut self, output: impl Into<String>) {
        self.output.push(output.into());
        self.status = AgentStatus::Completed;
        self.progress = 100;
        self.end_time = Some(Utc::now());
    }

    /// Transition to failed with a reason.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = AgentStatus::Failed;
        self.error = Some(error.into());
        self.end_time = Some(Utc::now());
    }

    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Wall-clock duration for terminal agents.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.end_time? - self.start_time?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::work_item::Severity;

    fn item() -> WorkItem {
        WorkItem::new("a.ts", 1, 1, "TS2322", "m", Severity::Error)
    }

    #[test]
    fn test_new_agent_naming() {
        let agent = Agent::new(3, 0, 51, "Fix Engineer", vec![item()]);
        assert_eq!(agent.id, "p3-agent-051");
        assert_eq!(agent.name, "Fix Engineer #51");
        assert_eq!(agent.status, AgentStatus::Pending);
        assert!(!agent.is_terminal());
    }

    #[test]
    fn test_lifecycle_complete() {
        let mut agent = Agent::new(1, 0, 1, "Error Scanner", vec![]);
        agent.start();
        assert_eq!(agent.status, AgentStatus::Running);
        agent.complete("done");
        assert_eq!(agent.status, AgentStatus::Completed);
        assert_eq!(agent.progress, 100);
        assert_eq!(agent.output, vec!["done".to_string()]);
        assert!(agent.duration().is_some());
    }

    #[test]
    fn test_lifecycle_fail() {
        let mut agent = Agent::new(1, 0, 1, "Error Scanner", vec![]);
        agent.start();
        agent.fail("boom");
        assert!(agent.is_terminal());
        assert_eq!(agent.error.as_deref(), Some("boom"));
    }
}
