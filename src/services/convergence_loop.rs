//! Convergence loop.
//!
//! The top-level driver. Each iteration pulls a fresh diagnostic set, runs
//! the five phases over it, and re-checks. The loop ends when a check comes
//! back empty (`completed`) or on a terminal failure: diagnostics check
//! failure, phase validation failure, stop request, or the iteration cap.
//!
//! Stagnation is soft. A count that fails to decrease produces a warning and,
//! past a configured iteration, a [`StagnationReport`]; the loop continues.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::errors::{OrchestrationError, PhaseError};
use crate::domain::models::{
    Config, DiagnosticDelta, Execution, ExecutionStatus, PhaseKind, StagnationReport, WorkItem,
};
use crate::domain::ports::{CommandExecutor, DiagnosticsSource, ProgressHost, ReportSink};
use crate::services::agent_runner::AgentRunner;
use crate::services::error_classifier::ErrorClassifier;
use crate::services::phase_executor::{
    validate_phase_completion, PhaseExecutor, PhaseExecutorConfig,
};
use crate::services::recovery_controller::RecoveryController;
use crate::services::report_hub::ReportHub;
use crate::services::stagnation;
use crate::services::stop::{StopHandle, STOPPED_BY_USER};

// ---------------------------------------------------------------------------
// Settings and results
// ---------------------------------------------------------------------------

/// Loop-level limits.
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    /// Hard cap on iterations
    pub max_iterations: u32,
    /// First iteration at which a stalled count triggers deep analysis
    pub stagnation_analysis_after: u32,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            stagnation_analysis_after: 3,
        }
    }
}

/// Outcome of a loop run, partial when the run failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopReport {
    pub status: ExecutionStatus,
    /// One entry per iteration started, in order
    pub iterations: Vec<Execution>,
    /// Count from the very first diagnostics check
    pub initial_errors: Option<usize>,
    /// Count from the most recent diagnostics check
    pub remaining: Option<usize>,
    pub stagnation_reports: Vec<StagnationReport>,
    /// Result of the assistant preflight
    pub assistant_available: bool,
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl LoopReport {
    fn new() -> Self {
        Self {
            status: ExecutionStatus::Running,
            iterations: Vec::new(),
            initial_errors: None,
            remaining: None,
            stagnation_reports: Vec::new(),
            assistant_available: true,
            error: None,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    pub fn iterations_run(&self) -> usize {
        self.iterations.len()
    }

    /// Phases executed across all iterations.
    pub fn phases_executed(&self) -> usize {
        self.iterations.iter().map(|e| e.phases.len()).sum()
    }

    /// Self-reported fixes across all iterations. Advisory only.
    pub fn errors_fixed_claimed(&self) -> usize {
        self.iterations
            .iter()
            .map(Execution::errors_fixed_claimed)
            .sum()
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.end_time.map(|end| end - self.start_time)
    }
}

/// Terminal failure of a loop run, with the progress made before it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct LoopFailure {
    #[source]
    pub error: OrchestrationError,
    pub report: LoopReport,
}

// ---------------------------------------------------------------------------
// ConvergenceLoop
// ---------------------------------------------------------------------------

/// Iterates detect/analyze/resolve/validate/complete until the diagnostics
/// source reports nothing or a terminal condition is reached.
pub struct ConvergenceLoop {
    executor: Arc<dyn CommandExecutor>,
    diagnostics: Arc<dyn DiagnosticsSource>,
    phases: PhaseExecutor,
    reports: Arc<ReportHub>,
    stop: StopHandle,
    settings: LoopSettings,
}

impl ConvergenceLoop {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        diagnostics: Arc<dyn DiagnosticsSource>,
        phases: PhaseExecutor,
        reports: Arc<ReportHub>,
        stop: StopHandle,
        settings: LoopSettings,
    ) -> Self {
        Self {
            executor,
            diagnostics,
            phases,
            reports,
            stop,
            settings,
        }
    }

    /// Wire a loop and its collaborators from configuration.
    pub fn from_config(
        config: &Config,
        executor: Arc<dyn CommandExecutor>,
        diagnostics: Arc<dyn DiagnosticsSource>,
        sinks: Vec<Arc<dyn ReportSink>>,
        stop: StopHandle,
    ) -> Self {
        let reports = Arc::new(
            sinks
                .into_iter()
                .fold(ReportHub::new(), ReportHub::with_sink),
        );

        let recovery = Arc::new(RecoveryController::new(
            executor.clone(),
            Arc::new(ErrorClassifier::new()),
            config.recovery.clone(),
            config.timeouts.clone(),
            reports.clone(),
        ));
        let runner = Arc::new(AgentRunner::new(
            recovery,
            reports.clone(),
            stop.clone(),
            config.orchestrator.extended_threshold,
        ));
        let phases = PhaseExecutor::new(
            runner,
            reports.clone(),
            stop.clone(),
            PhaseExecutorConfig {
                max_parallel_agents: config.orchestrator.max_parallel_agents,
                agents_per_phase: config.orchestrator.agents_per_phase,
                stall_warning: config.orchestrator.stall_warning(),
            },
        );

        Self::new(
            executor,
            diagnostics,
            phases,
            reports,
            stop,
            LoopSettings {
                max_iterations: config.orchestrator.max_iterations,
                stagnation_analysis_after: config.orchestrator.stagnation_analysis_after,
            },
        )
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run to a terminal state, reporting progress to `host`.
    pub async fn run(&self, host: Arc<dyn ProgressHost>) -> Result<LoopReport, LoopFailure> {
        self.reports.attach_host(host);
        let outcome = self.drive().await;
        self.reports.detach_host();

        match &outcome {
            Ok(report) => info!(
                iterations = report.iterations_run(),
                phases = report.phases_executed(),
                "Convergence loop completed"
            ),
            Err(failure) => error!(
                iterations = failure.report.iterations_run(),
                remaining = ?failure.report.remaining,
                error = %failure.error,
                "Convergence loop failed"
            ),
        }
        outcome
    }

    async fn drive(&self) -> Result<LoopReport, LoopFailure> {
        let mut report = LoopReport::new();
        report.assistant_available = self.preflight().await;

        let max_iterations = self.settings.max_iterations;
        let mut iteration: u32 = 1;
        let mut previous: Option<Vec<WorkItem>> = None;

        loop {
            let mut execution = Execution::new(iteration);

            if self.stop.is_stopped() {
                execution.fail(STOPPED_BY_USER);
                return Err(self.finish_failed(
                    report,
                    execution,
                    OrchestrationError::Stopped { iteration },
                ));
            }

            execution.start();
            info!(iteration, max_iterations, "Iteration started");
            self.reports.progress(&format!(
                "Iteration {iteration}/{max_iterations}: checking diagnostics"
            ));

            let diagnostics = match self.diagnostics.check().await {
                Ok(items) => items,
                Err(e) => {
                    execution.fail(e.to_string());
                    return Err(self.finish_failed(report, execution, e.into()));
                }
            };

            execution.total_errors = diagnostics.len();
            report.initial_errors.get_or_insert(diagnostics.len());
            report.remaining = Some(diagnostics.len());

            if diagnostics.is_empty() {
                self.reports.progress("No diagnostics found; nothing left to fix");
                return Ok(self.finish_completed(report, execution));
            }

            self.reports.progress(&format!(
                "Iteration {iteration}: {} diagnostics to address",
                diagnostics.len()
            ));

            if let Some(previous_items) = previous.as_deref() {
                let delta = DiagnosticDelta::between(previous_items, &diagnostics);
                execution.delta = Some(delta);
                self.check_stagnation(
                    iteration,
                    &diagnostics,
                    previous_items,
                    delta,
                    &mut report,
                );
            }

            for kind in PhaseKind::ALL {
                execution.current_phase = Some(kind.number());

                let phase = match self.phases.execute_phase(kind.number(), &diagnostics).await {
                    Ok(phase) => phase,
                    Err(source) => {
                        execution.fail(source.to_string());
                        return Err(self.finish_failed(
                            report,
                            execution,
                            OrchestrationError::PhaseValidation { iteration, source },
                        ));
                    }
                };

                let valid = validate_phase_completion(&phase);
                let terminal = phase.terminal_count();
                let total = phase.agents.len();
                execution.record_phase(phase);

                if self.stop.is_stopped() {
                    execution.fail(STOPPED_BY_USER);
                    return Err(self.finish_failed(
                        report,
                        execution,
                        OrchestrationError::Stopped { iteration },
                    ));
                }

                if !valid {
                    let source = PhaseError::ValidationFailed {
                        phase: kind.number(),
                        terminal,
                        total,
                    };
                    execution.fail(source.to_string());
                    return Err(self.finish_failed(
                        report,
                        execution,
                        OrchestrationError::PhaseValidation { iteration, source },
                    ));
                }
            }
            execution.current_phase = None;

            // Ground truth: never derived from agent claims.
            let remaining = match self.diagnostics.check().await {
                Ok(items) => items,
                Err(e) => {
                    execution.fail(e.to_string());
                    return Err(self.finish_failed(report, execution, e.into()));
                }
            };
            execution.errors_remaining = remaining.len();
            report.remaining = Some(remaining.len());

            info!(
                iteration,
                before = diagnostics.len(),
                after = remaining.len(),
                claimed_fixed = execution.errors_fixed_claimed(),
                "Iteration finished"
            );
            self.reports.progress(&format!(
                "Iteration {iteration}: {} -> {} diagnostics ({} fixes claimed)",
                diagnostics.len(),
                remaining.len(),
                execution.errors_fixed_claimed()
            ));

            if remaining.is_empty() {
                self.reports.progress("All diagnostics resolved");
                return Ok(self.finish_completed(report, execution));
            }

            if iteration >= max_iterations {
                let error = OrchestrationError::MaxIterationsExceeded {
                    max_iterations,
                    remaining: remaining.len(),
                };
                execution.fail(error.to_string());
                return Err(self.finish_failed(report, execution, error));
            }

            execution.complete();
            self.reports.iteration_complete(&execution);
            report.iterations.push(execution);

            previous = Some(diagnostics);
            iteration += 1;
        }
    }

    /// Ask whether the assistant is reachable. Never fatal.
    async fn preflight(&self) -> bool {
        let available = self.executor.is_available().await;
        if !available {
            warn!(executor = self.executor.name(), "Assistant is not available");
            self.reports.progress(&format!(
                "⚠ {} is not available; agents are expected to fail",
                self.executor.name()
            ));
        }
        available
    }

    fn check_stagnation(
        &self,
        iteration: u32,
        current: &[WorkItem],
        previous: &[WorkItem],
        delta: DiagnosticDelta,
        report: &mut LoopReport,
    ) {
        let previous_count = previous.len();
        if current.len() < previous_count {
            return;
        }

        warn!(
            iteration,
            current = current.len(),
            previous = previous_count,
            resolved = delta.resolved,
            introduced = delta.introduced,
            "Diagnostic count is not decreasing"
        );
        let churn = if delta.is_churn() {
            " (fixes are introducing new diagnostics)"
        } else {
            ""
        };
        self.reports.progress(&format!(
            "⚠ Stagnation: {} diagnostics, previously {previous_count}; {} resolved, {} introduced{churn}",
            current.len(),
            delta.resolved,
            delta.introduced
        ));

        if iteration >= self.settings.stagnation_analysis_after {
            let analysis = stagnation::analyze(iteration, current, previous, previous_count);
            self.reports.progress(&stagnation::summarize(&analysis));
            for line in &analysis.guidance {
                self.reports.progress(&format!("  - {line}"));
            }
            self.reports.stagnation(&analysis);
            report.stagnation_reports.push(analysis);
        }
    }

    fn finish_completed(&self, mut report: LoopReport, mut execution: Execution) -> LoopReport {
        execution.errors_remaining = 0;
        execution.complete();
        self.reports.iteration_complete(&execution);
        report.iterations.push(execution);

        report.status = ExecutionStatus::Completed;
        report.remaining = Some(0);
        report.end_time = Some(Utc::now());
        report
    }

    fn finish_failed(
        &self,
        mut report: LoopReport,
        execution: Execution,
        error: OrchestrationError,
    ) -> LoopFailure {
        self.reports.iteration_complete(&execution);
        report.iterations.push(execution);

        self.reports.progress(&format!("✗ {error}"));
        report.status = ExecutionStatus::Failed;
        report.error = Some(error.to_string());
        report.end_time = Some(Utc::now());
        LoopFailure { error, report }
    }
}
