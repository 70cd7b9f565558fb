//! Integration tests for the convergence loop over scripted adapters.

mod common;

use std::sync::Arc;

use common::{items, silent, small_config, Harness};
use fixloop::adapters::{RecordedEvent, ScriptedDiagnostics, ScriptedExecutor};
use fixloop::domain::ports::{DiagnosticsError, ExecutorError};
use fixloop::{AgentStatus, ExecutionStatus, OrchestrationError, PhaseStatus};

// ---------------------------------------------------------------------------
// Termination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_clean_project_completes_without_phases() {
    let h = Harness::new(
        &small_config(),
        ScriptedExecutor::always_ok("done"),
        ScriptedDiagnostics::new(vec![Vec::new()]),
    );

    let report = h.lp.run(silent()).await.unwrap();

    assert_eq!(report.status, ExecutionStatus::Completed);
    assert_eq!(report.iterations_run(), 1);
    assert_eq!(report.phases_executed(), 0);
    assert_eq!(report.initial_errors, Some(0));
    assert_eq!(h.executor.calls(), 0);
    assert!(h.sink.phases().is_empty());
    assert_eq!(h.sink.iterations().len(), 1);
}

#[tokio::test]
async fn test_all_phases_run_once_then_complete() {
    let config = small_config();
    let h = Harness::new(
        &config,
        ScriptedExecutor::always_ok("FIXED: src/app.ts:1:TS2322"),
        ScriptedDiagnostics::new(vec![items(10), Vec::new()]),
    );

    let report = h.lp.run(silent()).await.unwrap();

    assert_eq!(report.status, ExecutionStatus::Completed);
    assert_eq!(report.iterations_run(), 1);
    assert_eq!(report.initial_errors, Some(10));
    assert_eq!(report.remaining, Some(0));

    let iteration = &report.iterations[0];
    let numbers: Vec<u8> = iteration.phases.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    assert_eq!(iteration.completed_phases, vec![1, 2, 3, 4, 5]);
    assert!(iteration
        .phases
        .iter()
        .all(|p| p.status == PhaseStatus::Completed));

    // One check before the phases, one after.
    assert_eq!(h.diagnostics.checks(), 2);
    assert_eq!(h.sink.phases().len(), 5);

    let per_phase = config.orchestrator.agents_per_phase;
    assert_eq!(h.executor.calls() as usize, 5 * per_phase);
}

#[tokio::test]
async fn test_phase_reports_precede_iteration_report() {
    let h = Harness::new(
        &small_config(),
        ScriptedExecutor::always_ok("done"),
        ScriptedDiagnostics::new(vec![items(3), Vec::new()]),
    );
    h.lp.run(silent()).await.unwrap();

    let events = h.sink.events();
    let last_phase = events
        .iter()
        .rposition(|e| matches!(e, RecordedEvent::Phase(_)))
        .unwrap();
    let iteration = events
        .iter()
        .position(|e| matches!(e, RecordedEvent::Iteration(_)))
        .unwrap();
    assert!(last_phase < iteration);
}

#[tokio::test]
async fn test_remaining_comes_from_recheck_not_claims() {
    // Agents claim fixes but the tool still reports everything.
    let mut config = small_config();
    config.orchestrator.max_iterations = 1;
    let h = Harness::new(
        &config,
        ScriptedExecutor::always_ok("FIXED: src/app.ts:1:TS2322\nFIXED: src/app.ts:2:TS2322"),
        ScriptedDiagnostics::new(vec![items(4)]),
    );

    let failure = h.lp.run(silent()).await.unwrap_err();

    assert!(failure.report.errors_fixed_claimed() > 0);
    assert_eq!(failure.report.remaining, Some(4));
    assert!(matches!(
        failure.error,
        OrchestrationError::MaxIterationsExceeded {
            max_iterations: 1,
            remaining: 4
        }
    ));
}

#[tokio::test]
async fn test_iteration_cap_fails_last_iteration() {
    let mut config = small_config();
    config.orchestrator.max_iterations = 1;
    let h = Harness::new(
        &config,
        ScriptedExecutor::always_ok("done"),
        ScriptedDiagnostics::new(vec![items(3)]),
    );

    let failure = h.lp.run(silent()).await.unwrap_err();

    assert_eq!(failure.report.status, ExecutionStatus::Failed);
    let last = failure.report.iterations.last().unwrap();
    assert_eq!(last.status, ExecutionStatus::Failed);
    assert!(last
        .error
        .as_deref()
        .is_some_and(|e| e.contains("manual intervention required")));
    assert_eq!(last.errors_remaining, 3);

    let recorded: Vec<ExecutionStatus> = h.sink.iterations().iter().map(|e| e.status).collect();
    assert_eq!(recorded, vec![ExecutionStatus::Failed]);
}

#[tokio::test]
async fn test_iterations_before_cap_stay_completed() {
    let mut config = small_config();
    config.orchestrator.max_iterations = 2;
    let h = Harness::new(
        &config,
        ScriptedExecutor::always_ok("done"),
        ScriptedDiagnostics::new(vec![items(2)]),
    );

    h.lp.run(silent()).await.unwrap_err();

    let recorded: Vec<ExecutionStatus> = h.sink.iterations().iter().map(|e| e.status).collect();
    assert_eq!(
        recorded,
        vec![ExecutionStatus::Completed, ExecutionStatus::Failed]
    );
}

// ---------------------------------------------------------------------------
// Stagnation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_unchanged_diagnostics_trigger_analysis_from_third_iteration() {
    let mut config = small_config();
    config.orchestrator.max_iterations = 4;
    let h = Harness::new(
        &config,
        ScriptedExecutor::always_ok("done"),
        ScriptedDiagnostics::new(vec![items(5)]),
    );

    let failure = h.lp.run(silent()).await.unwrap_err();

    // Stagnation never ends the loop on its own.
    assert!(matches!(
        failure.error,
        OrchestrationError::MaxIterationsExceeded { .. }
    ));
    assert_eq!(failure.report.iterations_run(), 4);

    let analyses = h.sink.stagnation_reports();
    let iterations: Vec<u32> = analyses.iter().map(|r| r.iteration).collect();
    assert_eq!(iterations, vec![3, 4]);
    assert_eq!(failure.report.stagnation_reports.len(), 2);

    let first = &analyses[0];
    assert_eq!(first.diagnostic_count, 5);
    assert_eq!(first.previous_count, 5);
    assert_eq!(first.stuck_items.len(), 5);
    assert_eq!(first.hotspots[0].file, "src/app.ts");
    assert!(!first.guidance.is_empty());

    // The second iteration warns without analysing.
    assert!(h
        .sink
        .progress()
        .iter()
        .any(|m| m.starts_with("⚠ Stagnation")));
    let delta = failure.report.iterations[1].delta.unwrap();
    assert_eq!(delta.persisting, 5);
    assert_eq!(delta.resolved, 0);
}

#[tokio::test]
async fn test_decreasing_count_is_not_stagnation() {
    let mut config = small_config();
    config.orchestrator.max_iterations = 4;
    let h = Harness::new(
        &config,
        ScriptedExecutor::always_ok("done"),
        ScriptedDiagnostics::new(vec![
            items(6),
            items(5),
            items(5),
            items(4),
            items(4),
            items(3),
            items(3),
            Vec::new(),
        ]),
    );

    let report = h.lp.run(silent()).await.unwrap();

    assert_eq!(report.status, ExecutionStatus::Completed);
    assert_eq!(report.iterations_run(), 4);
    assert!(report.stagnation_reports.is_empty());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_diagnostics_failure_ends_loop() {
    let h = Harness::new(
        &small_config(),
        ScriptedExecutor::always_ok("done"),
        ScriptedDiagnostics::failing(DiagnosticsError::Timeout(
            std::time::Duration::from_secs(300),
        )),
    );

    let failure = h.lp.run(silent()).await.unwrap_err();

    assert!(matches!(failure.error, OrchestrationError::Diagnostics(_)));
    assert_eq!(failure.report.status, ExecutionStatus::Failed);
    assert!(failure.report.error.is_some());
    assert!(failure.report.end_time.is_some());
    assert_eq!(h.executor.calls(), 0);
}

#[tokio::test]
async fn test_failing_agents_still_complete_phases() {
    // Authentication failures are not retried; every agent fails fast but
    // reaches a terminal state, so validation passes.
    let h = Harness::new(
        &small_config(),
        ScriptedExecutor::always_err(ExecutorError::Failed {
            exit_code: Some(1),
            message: "401 Unauthorized".to_string(),
        }),
        ScriptedDiagnostics::new(vec![items(2), Vec::new()]),
    );

    let report = h.lp.run(silent()).await.unwrap();

    assert_eq!(report.status, ExecutionStatus::Completed);
    let phase = &report.iterations[0].phases[0];
    assert_eq!(phase.status, PhaseStatus::Completed);
    assert_eq!(phase.count_with_status(AgentStatus::Failed), phase.agents.len());
    // Not retried.
    assert!(phase.agents.iter().all(|a| a.attempts == 1));
}

#[tokio::test]
async fn test_unavailable_assistant_only_warns() {
    let h = Harness::new(
        &small_config(),
        ScriptedExecutor::always_ok("done").unavailable(),
        ScriptedDiagnostics::new(vec![items(1), Vec::new()]),
    );

    let report = h.lp.run(silent()).await.unwrap();

    assert!(!report.assistant_available);
    assert_eq!(report.status, ExecutionStatus::Completed);
    assert!(h
        .sink
        .progress()
        .iter()
        .any(|m| m.contains("not available")));
}

// ---------------------------------------------------------------------------
// Stop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_stop_requested_before_run() {
    let h = Harness::new(
        &small_config(),
        ScriptedExecutor::always_ok("done"),
        ScriptedDiagnostics::new(vec![items(3)]),
    );
    h.stop.stop();

    let failure = h.lp.run(silent()).await.unwrap_err();

    assert!(matches!(
        failure.error,
        OrchestrationError::Stopped { iteration: 1 }
    ));
    assert_eq!(h.diagnostics.checks(), 0);
    assert_eq!(failure.report.phases_executed(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_phase_fails_remaining_agents() {
    let mut config = small_config();
    config.orchestrator.agents_per_phase = 6;
    config.orchestrator.max_parallel_agents = 1;
    let h = Harness::new(
        &config,
        ScriptedExecutor::always_ok("done").with_latency(std::time::Duration::from_secs(10)),
        ScriptedDiagnostics::new(vec![items(6)]),
    );

    let stop = h.stop.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(25)).await;
        stop.stop();
    });

    let failure = h.lp.run(silent()).await.unwrap_err();

    assert!(matches!(failure.error, OrchestrationError::Stopped { .. }));
    let phases = &failure.report.iterations[0].phases;
    assert_eq!(phases.len(), 1);
    let phase = &phases[0];
    assert_eq!(phase.agents.len(), 6);
    assert_eq!(phase.terminal_count(), 6);
    assert!(phase
        .agents
        .iter()
        .any(|a| a.error.as_deref() == Some(fixloop::services::STOPPED_BY_USER)));
}

#[tokio::test]
async fn test_host_receives_progress() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::<String>::new()));
    let log = seen.clone();
    let h = Harness::new(
        &small_config(),
        ScriptedExecutor::always_ok("done"),
        ScriptedDiagnostics::new(vec![Vec::new()]),
    );

    h.lp.run(Arc::new(move |m: &str| log.lock().unwrap().push(m.to_string())))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen.iter().any(|m| m.starts_with("Iteration 1/3")));
}
