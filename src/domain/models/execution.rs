//! Per-iteration execution state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use super::phase::Phase;
use super::work_item::WorkItem;

/// Lifecycle of an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// How the diagnostic set changed between two consecutive checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticDelta {
    /// Present before, gone now
    pub resolved: usize,
    /// Absent before, present now
    pub introduced: usize,
    /// Present in both
    pub persisting: usize,
}

impl DiagnosticDelta {
    /// Compare two diagnostic sets by fingerprint.
    pub fn between(previous: &[WorkItem], current: &[WorkItem]) -> Self {
        let before: HashSet<_> = previous.iter().map(WorkItem::fingerprint).collect();
        let after: HashSet<_> = current.iter().map(WorkItem::fingerprint).collect();

        Self {
            resolved: before.difference(&after).count(),
            introduced: after.difference(&before).count(),
            persisting: before.intersection(&after).count(),
        }
    }

    /// Net count unchanged while the underlying set moved.
    pub const fn is_churn(&self) -> bool {
        self.resolved > 0 && self.resolved == self.introduced
    }
}

/// State of one iteration. A fresh value is created every iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    /// 1-based iteration number
    pub iteration: u32,
    pub status: ExecutionStatus,
    pub current_phase: Option<u8>,
    pub completed_phases: Vec<u8>,
    pub phases: Vec<Phase>,
    /// Diagnostics found at the start of the iteration
    pub total_errors: usize,
    /// Diagnostics found by the fresh check after the phases
    pub errors_remaining: usize,
    /// Change relative to the previous iteration's starting set
    pub delta: Option<DiagnosticDelta>,
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Execution {
    pub fn new(iteration: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            iteration,
            status: ExecutionStatus::Pending,
            current_phase: None,
            completed_phases: Vec::new(),
            phases: Vec::with_capacity(5),
            total_errors: 0,
            errors_remaining: 0,
            delta: None,
            error: None,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    pub fn start(&mut self) {
        self.status = ExecutionStatus::Running;
    }

    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.current_phase = None;
        self.end_time = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = ExecutionStatus::Failed;
        self.error = Some(error.into());
        self.end_time = Some(Utc::now());
    }

    /// Record a finished phase.
    pub fn record_phase(&mut self, phase: Phase) {
        self.completed_phases.push(phase.number);
        self.phases.push(phase);
    }

    /// Sum of self-reported fixes across phases.
    pub fn errors_fixed_claimed(&self) -> usize {
        self.phases.iter().map(|p| p.errors_fixed).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::work_item::Severity;

    fn item(file: &str, code: &str) -> WorkItem {
        WorkItem::new(file, 1, 1, code, "msg", Severity::Error)
    }

    #[test]
    fn test_delta_between() {
        let previous = vec![item("a.ts", "TS2322"), item("b.ts", "TS2304")];
        let current = vec![item("b.ts", "TS2304"), item("c.ts", "TS2307")];
        let delta = DiagnosticDelta::between(&previous, &current);
        assert_eq!(
            delta,
            DiagnosticDelta {
                resolved: 1,
                introduced: 1,
                persisting: 1
            }
        );
        assert!(delta.is_churn());
    }

    #[test]
    fn test_delta_identical_sets() {
        let items = vec![item("a.ts", "TS2322")];
        let delta = DiagnosticDelta::between(&items, &items);
        assert_eq!(delta.persisting, 1);
        assert!(!delta.is_churn());
    }

    #[test]
    fn test_execution_lifecycle() {
        let mut execution = Execution::new(2);
        assert_eq!(execution.status, ExecutionStatus::Pending);
        execution.start();
        assert_eq!(execution.status, ExecutionStatus::Running);
        execution.fail("phase validation failed");
        assert!(execution.status.is_terminal());
        assert!(execution.end_time.is_some());
    }
}
