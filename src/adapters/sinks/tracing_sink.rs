//! Report sink that writes every event to the log.

use tracing::{debug, info, warn};

use crate::domain::models::{AgentStatus, Execution, Phase, StagnationReport};
use crate::domain::ports::{ReportSink, RetryNotice};

/// Mirrors orchestration events into `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReportSink;

impl ReportSink for TracingReportSink {
    fn on_phase_complete(&self, phase: &Phase) {
        info!(
            phase = phase.number,
            name = %phase.name,
            status = %phase.status,
            agents = phase.agents.len(),
            completed = phase.count_with_status(AgentStatus::Completed),
            failed = phase.count_with_status(AgentStatus::Failed),
            batches = phase.batches,
            errors_fixed = phase.errors_fixed,
            "Phase complete"
        );
    }

    fn on_iteration_complete(&self, execution: &Execution) {
        info!(
            iteration = execution.iteration,
            execution_id = %execution.id,
            status = %execution.status,
            total_errors = execution.total_errors,
            errors_remaining = execution.errors_remaining,
            phases = execution.completed_phases.len(),
            "Iteration complete"
        );
    }

    fn on_progress(&self, message: &str) {
        debug!(message, "progress");
    }

    fn on_retry(&self, notice: &RetryNotice) {
        warn!(
            command_type = %notice.command_type,
            attempt = notice.attempt,
            max_retries = notice.max_retries,
            delay_ms = u64::try_from(notice.delay.as_millis()).unwrap_or(u64::MAX),
            kind = %notice.kind,
            "Retrying assistant invocation"
        );
    }

    fn on_stagnation(&self, report: &StagnationReport) {
        warn!(
            iteration = report.iteration,
            diagnostics = report.diagnostic_count,
            previous = report.previous_count,
            stuck = report.stuck_items.len(),
            "Stagnation analysis"
        );
        for hotspot in &report.hotspots {
            debug!(file = %hotspot.file, count = hotspot.count, "Hotspot");
        }
    }
}
