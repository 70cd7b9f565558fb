//! Phase executor.
//!
//! Builds the fixed agent roster for a phase, partitions the phase's work
//! items across it, and runs the agents in sequential batches of bounded
//! size. A batch is awaited in full before the next one starts.

use chrono::Utc;
use futures::future::join_all;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::domain::errors::{PhaseError, PhaseResult};
use crate::domain::models::{Agent, AgentStatus, Phase, PhaseKind, PhaseStatus, WorkItem};
use crate::services::agent_runner::AgentRunner;
use crate::services::report_hub::ReportHub;
use crate::services::stop::{StopHandle, STOPPED_BY_USER};

/// Configuration for the phase executor.
#[derive(Debug, Clone)]
pub struct PhaseExecutorConfig {
    /// Agents run concurrently within one batch.
    pub max_parallel_agents: usize,
    /// Roster size of every phase.
    pub agents_per_phase: usize,
    /// Phase runtime after which a stall warning is emitted.
    pub stall_warning: Duration,
}

impl Default for PhaseExecutorConfig {
    fn default() -> Self {
        Self {
            max_parallel_agents: 3,
            agents_per_phase: 25,
            stall_warning: Duration::from_secs(900),
        }
    }
}

/// Global roster slots owned by a phase.
///
/// Phase `k` owns `[n(k-1)+1, nk]` for `n` agents per phase, so slots never
/// overlap across phases.
pub fn roster_slots(kind: PhaseKind, agents_per_phase: usize) -> RangeInclusive<usize> {
    let number = usize::from(kind.number());
    agents_per_phase * (number - 1) + 1..=agents_per_phase * number
}

/// Split `items` into `agent_count` contiguous chunks of `ceil(len / agent_count)`.
///
/// Trailing chunks may be shorter or empty. Concatenating the chunks in order
/// yields `items` exactly.
pub fn distribute(items: &[WorkItem], agent_count: usize) -> Vec<Vec<WorkItem>> {
    if agent_count == 0 {
        return Vec::new();
    }

    let per_agent = items.len().div_ceil(agent_count);
    (0..agent_count)
        .map(|index| {
            let start = (index * per_agent).min(items.len());
            let end = ((index + 1) * per_agent).min(items.len());
            items[start..end].to_vec()
        })
        .collect()
}

/// Build the phase roster, one agent per assignment.
pub fn generate_roster(
    kind: PhaseKind,
    agents_per_phase: usize,
    assignments: Vec<Vec<WorkItem>>,
) -> Vec<Agent> {
    let first_slot = *roster_slots(kind, agents_per_phase).start();
    let roles = kind.roles();

    assignments
        .into_iter()
        .enumerate()
        .map(|(index, items)| {
            Agent::new(
                kind.number(),
                index,
                first_slot + index,
                roles[index % roles.len()],
                items,
            )
        })
        .collect()
}

/// Number of batches needed for `agent_count` agents.
pub const fn batch_count(agent_count: usize, max_parallel_agents: usize) -> usize {
    if max_parallel_agents == 0 {
        return 0;
    }
    agent_count.div_ceil(max_parallel_agents)
}

/// A phase is valid when no agent is left pending or running.
///
/// Failed agents count as finished: their failure is recorded, not fatal.
pub fn validate_phase_completion(phase: &Phase) -> bool {
    phase.terminal_count() == phase.agents.len()
}

/// Runs phases.
pub struct PhaseExecutor {
    runner: Arc<AgentRunner>,
    reports: Arc<ReportHub>,
    stop: StopHandle,
    config: PhaseExecutorConfig,
}

impl PhaseExecutor {
    pub fn new(
        runner: Arc<AgentRunner>,
        reports: Arc<ReportHub>,
        stop: StopHandle,
        config: PhaseExecutorConfig,
    ) -> Self {
        Self {
            runner,
            reports,
            stop,
            config,
        }
    }

    /// Execute one phase over `work_items`.
    ///
    /// Every agent runs even when `work_items` is empty; those agents perform
    /// a general review so the phase still produces a report.
    pub async fn execute_phase(
        &self,
        phase_number: u8,
        work_items: &[WorkItem],
    ) -> PhaseResult<Phase> {
        let kind =
            PhaseKind::from_number(phase_number).ok_or(PhaseError::InvalidPhase(phase_number))?;
        let agents_per_phase = self.config.agents_per_phase;
        let max_parallel = self.config.max_parallel_agents.max(1);

        let assignments = distribute(work_items, agents_per_phase);
        let roster = generate_roster(kind, agents_per_phase, assignments);
        let total_batches = batch_count(roster.len(), max_parallel);

        let mut phase = Phase::new(kind, Vec::new(), work_items.len());
        phase.status = PhaseStatus::Running;
        phase.start_time = Some(Utc::now());

        info!(
            phase = phase_number,
            name = kind.name(),
            agents = roster.len(),
            items = work_items.len(),
            batches = total_batches,
            "Phase started"
        );
        self.reports.progress(&format!(
            "Phase {phase_number}: {} - {} agents, {} diagnostics, {} batches",
            kind.name(),
            roster.len(),
            work_items.len(),
            total_batches
        ));

        let started = Instant::now();
        let mut stall_warnings = 0;
        let mut remaining = roster.into_iter();

        for batch_number in 1..=total_batches {
            let batch: Vec<Agent> = remaining.by_ref().take(max_parallel).collect();

            if self.stop.is_stopped() {
                for mut agent in batch {
                    agent.fail(STOPPED_BY_USER);
                    phase.agents.push(agent);
                }
                continue;
            }

            let finished = join_all(batch.into_iter().map(|agent| self.runner.run(agent))).await;
            phase.agents.extend(finished);
            phase.batches += 1;

            self.reports.progress(&format!(
                "Phase {phase_number}: batch {batch_number}/{total_batches} done ({}/{} agents finished)",
                phase.terminal_count(),
                phase.agents.len() + remaining.len()
            ));
            self.check_stall(kind, started.elapsed(), &mut stall_warnings);
        }

        // Anything still running at this point was interrupted.
        for agent in &mut phase.agents {
            if agent.status == AgentStatus::Running {
                agent.fail(STOPPED_BY_USER);
            }
        }

        phase.errors_fixed = phase.agents.iter().map(|a| a.fixed_items.len()).sum();
        phase.end_time = Some(Utc::now());
        phase.status = if validate_phase_completion(&phase) {
            PhaseStatus::Completed
        } else {
            PhaseStatus::Failed
        };

        let completed = phase.count_with_status(AgentStatus::Completed);
        let failed = phase.count_with_status(AgentStatus::Failed);
        info!(
            phase = phase_number,
            completed,
            failed,
            errors_fixed = phase.errors_fixed,
            "Phase finished"
        );
        self.reports.progress(&format!(
            "Phase {phase_number}: {} finished - {completed} completed, {failed} failed, {} fixes claimed",
            kind.name(),
            phase.errors_fixed
        ));
        self.reports.phase_complete(&phase);

        Ok(phase)
    }

    /// Emit one warning per elapsed stall window. Evaluated at batch boundaries.
    fn check_stall(&self, kind: PhaseKind, elapsed: Duration, warned: &mut u128) {
        let window = self.config.stall_warning.as_millis();
        if window == 0 {
            return;
        }

        let windows = elapsed.as_millis() / window;
        if windows > *warned {
            *warned = windows;
            warn!(
                phase = kind.number(),
                elapsed_secs = elapsed.as_secs(),
                "Phase is taking longer than expected"
            );
            self.reports.progress(&format!(
                "⚠ Phase {} ({}) has been running for {}s",
                kind.number(),
                kind.name(),
                elapsed.as_secs()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::executors::ScriptedExecutor;
    use crate::domain::models::{RecoveryConfig, Severity, TimeoutConfig};
    use crate::domain::ports::{CommandExecutor, ExecutorError};
    use crate::services::error_classifier::ErrorClassifier;
    use crate::services::recovery_controller::RecoveryController;

    fn items(n: u32) -> Vec<WorkItem> {
        (1..=n)
            .map(|i| WorkItem::new(format!("src/f{i}.ts"), i, 1, "TS2322", "bad", Severity::Error))
            .collect()
    }

    fn executor_for(
        executor: Arc<dyn CommandExecutor>,
        config: PhaseExecutorConfig,
        stop: StopHandle,
    ) -> PhaseExecutor {
        let hub = Arc::new(ReportHub::new());
        let recovery = Arc::new(RecoveryController::new(
            executor,
            Arc::new(ErrorClassifier::new()),
            RecoveryConfig {
                base_delay_ms: 1,
                max_delay_ms: 10,
                ..RecoveryConfig::default()
            },
            TimeoutConfig::default(),
            hub.clone(),
        ));
        let runner = Arc::new(AgentRunner::new(recovery, hub.clone(), stop.clone(), 10));
        PhaseExecutor::new(runner, hub, stop, config)
    }

    #[test]
    fn test_roster_slots() {
        assert_eq!(roster_slots(PhaseKind::Detection, 25), 1..=25);
        assert_eq!(roster_slots(PhaseKind::Resolution, 25), 51..=75);
        assert_eq!(roster_slots(PhaseKind::Completion, 25), 101..=125);
    }

    #[test]
    fn test_distribute_contiguous() {
        let work = items(10);
        let chunks = distribute(&work, 4);
        let sizes: Vec<_> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
        assert_eq!(chunks.concat(), work);
    }

    #[test]
    fn test_distribute_fewer_items_than_agents() {
        let chunks = distribute(&items(10), 25);
        assert_eq!(chunks.len(), 25);
        assert!(chunks[..10].iter().all(|c| c.len() == 1));
        assert!(chunks[10..].iter().all(Vec::is_empty));
    }

    #[test]
    fn test_distribute_empty() {
        let chunks = distribute(&[], 5);
        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(Vec::is_empty));
        assert!(distribute(&items(3), 0).is_empty());
    }

    #[test]
    fn test_generate_roster_names() {
        let roster = generate_roster(PhaseKind::Resolution, 25, distribute(&items(2), 25));
        assert_eq!(roster.len(), 25);
        assert_eq!(roster[0].id, "p3-agent-051");
        assert_eq!(roster[0].name, "Fix Engineer #51");
        assert_eq!(roster[5].role, "Fix Engineer");
        assert_eq!(roster[24].slot, 75);
    }

    #[test]
    fn test_batch_count() {
        assert_eq!(batch_count(25, 3), 9);
        assert_eq!(batch_count(3, 3), 1);
        assert_eq!(batch_count(0, 3), 0);
        assert_eq!(batch_count(5, 0), 0);
    }

    #[test]
    fn test_validate_phase_completion() {
        let mut phase = Phase::new(
            PhaseKind::Detection,
            generate_roster(PhaseKind::Detection, 3, distribute(&[], 3)),
            0,
        );
        assert!(!validate_phase_completion(&phase));

        phase.agents[0].complete("ok");
        phase.agents[1].fail("boom");
        assert!(!validate_phase_completion(&phase));

        phase.agents[2].start();
        assert!(!validate_phase_completion(&phase));

        phase.agents[2].complete("ok");
        assert!(validate_phase_completion(&phase));
    }

    #[tokio::test]
    async fn test_execute_phase_runs_every_agent() {
        let executor = Arc::new(ScriptedExecutor::always_ok("analysis"));
        let phases = executor_for(
            executor.clone(),
            PhaseExecutorConfig {
                max_parallel_agents: 3,
                agents_per_phase: 7,
                stall_warning: Duration::from_secs(900),
            },
            StopHandle::new(),
        );

        let phase = phases.execute_phase(2, &items(4)).await.unwrap();

        assert_eq!(phase.status, PhaseStatus::Completed);
        assert_eq!(phase.agents.len(), 7);
        assert_eq!(phase.batches, 3);
        assert_eq!(phase.error_count, 4);
        assert_eq!(executor.calls(), 7);
        assert!(validate_phase_completion(&phase));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_agents_do_not_block_phase() {
        let executor = Arc::new(ScriptedExecutor::always_err(ExecutorError::Failed {
            exit_code: Some(1),
            message: "Invalid API key".to_string(),
        }));
        let phases = executor_for(
            executor,
            PhaseExecutorConfig {
                agents_per_phase: 5,
                ..PhaseExecutorConfig::default()
            },
            StopHandle::new(),
        );

        let phase = phases.execute_phase(3, &items(5)).await.unwrap();

        assert_eq!(phase.status, PhaseStatus::Completed);
        assert_eq!(phase.count_with_status(AgentStatus::Failed), 5);
        assert_eq!(phase.errors_fixed, 0);
    }

    #[tokio::test]
    async fn test_stop_before_phase_fails_all_agents() {
        let stop = StopHandle::new();
        stop.stop();
        let executor = Arc::new(ScriptedExecutor::always_ok("x"));
        let phases = executor_for(
            executor.clone(),
            PhaseExecutorConfig {
                agents_per_phase: 4,
                ..PhaseExecutorConfig::default()
            },
            stop,
        );

        let phase = phases.execute_phase(1, &items(2)).await.unwrap();

        assert_eq!(executor.calls(), 0);
        assert_eq!(phase.batches, 0);
        assert!(phase
            .agents
            .iter()
            .all(|a| a.error.as_deref() == Some(STOPPED_BY_USER)));
    }

    #[tokio::test]
    async fn test_invalid_phase_number() {
        let phases = executor_for(
            Arc::new(ScriptedExecutor::always_ok("x")),
            PhaseExecutorConfig::default(),
            StopHandle::new(),
        );
        assert!(matches!(
            phases.execute_phase(6, &[]).await,
            Err(PhaseError::InvalidPhase(6))
        ));
    }
}
