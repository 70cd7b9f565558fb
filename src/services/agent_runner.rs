//! Agent runner.
//!
//! Drives one agent from `pending` to a terminal state. Whatever happens
//! inside (classified failures, panics in an executor, a stop request), the
//! runner hands back an agent that is either `completed` or `failed`.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::models::{Agent, CommandType, PhaseKind};
use crate::services::prompts::{build_prompt, parse_fixed_items};
use crate::services::recovery_controller::RecoveryController;
use crate::services::report_hub::ReportHub;
use crate::services::stop::{StopHandle, STOPPED_BY_USER};

/// Executes agents through the recovery controller.
pub struct AgentRunner {
    recovery: Arc<RecoveryController>,
    reports: Arc<ReportHub>,
    stop: StopHandle,
    extended_threshold: usize,
}

impl AgentRunner {
    pub fn new(
        recovery: Arc<RecoveryController>,
        reports: Arc<ReportHub>,
        stop: StopHandle,
        extended_threshold: usize,
    ) -> Self {
        Self {
            recovery,
            reports,
            stop,
            extended_threshold,
        }
    }

    /// Timeout class for an agent's invocation.
    pub fn command_type_for(&self, kind: PhaseKind, agent: &Agent) -> CommandType {
        let base = kind.command_type();
        if kind == PhaseKind::Resolution && agent.assigned_items.len() > self.extended_threshold {
            CommandType::Extended
        } else {
            base
        }
    }

    /// Run an agent to a terminal state.
    pub async fn run(&self, mut agent: Agent) -> Agent {
        let Some(kind) = PhaseKind::from_number(agent.phase_number) else {
            agent.fail(format!("invalid phase number {}", agent.phase_number));
            return agent;
        };

        if self.stop.is_stopped() {
            agent.fail(STOPPED_BY_USER);
            return agent;
        }

        agent.start();
        let prompt = build_prompt(kind, &agent);
        let command_type = self.command_type_for(kind, &agent);

        debug!(
            agent_id = %agent.id,
            phase = kind.number(),
            items = agent.assigned_items.len(),
            %command_type,
            "Agent started"
        );

        let invocation =
            AssertUnwindSafe(self.recovery.execute(&prompt, command_type)).catch_unwind();

        let outcome = tokio::select! {
            result = invocation => Some(result),
            () = self.stop.stopped() => None,
        };

        match outcome {
            None => {
                agent.fail(STOPPED_BY_USER);
                info!(agent_id = %agent.id, "Agent stopped by user");
            }
            Some(Ok(Ok(recovered))) => {
                agent.attempts = recovered.attempts;
                if kind == PhaseKind::Resolution {
                    agent.fixed_items = parse_fixed_items(&recovered.output, &agent.assigned_items);
                }
                agent.complete(recovered.output);
                debug!(
                    agent_id = %agent.id,
                    attempts = agent.attempts,
                    fixed = agent.fixed_items.len(),
                    "Agent completed"
                );
                self.reports.progress(&format!("✓ {} completed", agent.name));
            }
            Some(Ok(Err(failure))) => {
                agent.attempts = failure.attempts;
                warn!(
                    agent_id = %agent.id,
                    kind = %failure.kind,
                    attempts = failure.attempts,
                    "Agent failed: {}",
                    failure.message
                );
                self.reports
                    .progress(&format!("✗ {} failed: {}", agent.name, failure.kind));
                agent.fail(failure.to_string());
            }
            Some(Err(_panic)) => {
                warn!(agent_id = %agent.id, "Agent invocation panicked");
                agent.fail("agent invocation panicked");
            }
        }

        agent
    }
}
