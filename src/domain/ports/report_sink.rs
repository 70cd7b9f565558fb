//! Report sink port - receives orchestration events.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::models::{CommandType, Execution, FailureKind, Phase, StagnationReport};

/// Emitted before each retry the recovery controller schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryNotice {
    pub command_type: CommandType,
    /// 1-based retry number
    pub attempt: u32,
    pub max_retries: u32,
    pub delay: Duration,
    pub kind: FailureKind,
}

/// Fire-and-forget observer of orchestration progress.
///
/// Methods are called from concurrently running agents, so implementations
/// must be cheap, non-blocking, and append-only. Every method has a no-op
/// default.
pub trait ReportSink: Send + Sync {
    fn on_phase_complete(&self, _phase: &Phase) {}

    fn on_iteration_complete(&self, _execution: &Execution) {}

    fn on_progress(&self, _message: &str) {}

    fn on_retry(&self, _notice: &RetryNotice) {}

    fn on_stagnation(&self, _report: &StagnationReport) {}
}

/// Progress callback of whatever UI or CLI drives the loop.
pub trait ProgressHost: Send + Sync {
    fn on_progress(&self, message: &str);
}

impl<F> ProgressHost for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_progress(&self, message: &str) {
        self(message);
    }
}
