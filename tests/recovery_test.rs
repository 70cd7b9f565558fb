//! Retry behaviour of the recovery controller seen through an agent.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::items;
use fixloop::adapters::{RecordingReportSink, ScriptedExecutor};
use fixloop::domain::models::{Agent, CommandType, RecoveryConfig, TimeoutConfig};
use fixloop::domain::ports::ExecutorError;
use fixloop::services::{AgentRunner, ErrorClassifier, RecoveryController, ReportHub, StopHandle};
use fixloop::{AgentStatus, FailureKind};

fn controller(
    executor: Arc<ScriptedExecutor>,
    sink: Arc<RecordingReportSink>,
) -> Arc<RecoveryController> {
    let hub = Arc::new(ReportHub::new().with_sink(sink));
    Arc::new(RecoveryController::new(
        executor,
        Arc::new(ErrorClassifier::new()),
        RecoveryConfig::default(),
        TimeoutConfig::default(),
        hub,
    ))
}

#[tokio::test(start_paused = true)]
async fn test_timeouts_exhaust_budget_then_fail_agent() {
    let scripted = Arc::new(ScriptedExecutor::always_err(ExecutorError::Timeout {
        after: Duration::from_secs(600),
    }));
    let sink = Arc::new(RecordingReportSink::new());
    let recovery = controller(scripted.clone(), sink.clone());
    let budget = recovery.max_retries(CommandType::Agent);

    let runner = AgentRunner::new(
        recovery,
        Arc::new(ReportHub::new().with_sink(sink.clone())),
        StopHandle::new(),
        10,
    );
    // Phase 3 with a small assignment runs as an `agent` command.
    let agent = runner.run(Agent::new(3, 0, 1, "fixer", items(2))).await;

    assert_eq!(agent.status, AgentStatus::Failed);
    assert_eq!(agent.attempts, budget + 1);
    assert_eq!(scripted.calls(), budget + 1);

    let retries = sink.retries();
    assert_eq!(retries.len() as u32, budget);
    assert!(retries.iter().all(|r| r.kind == FailureKind::Timeout));
    assert!(retries.windows(2).all(|w| w[0].delay < w[1].delay));
    assert_eq!(
        retries.iter().map(|r| r.attempt).collect::<Vec<_>>(),
        (1..=budget).collect::<Vec<_>>()
    );
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_then_success() {
    let scripted = Arc::new(ScriptedExecutor::with_script(vec![
        Err(ExecutorError::Failed {
            exit_code: Some(1),
            message: "socket hang up".to_string(),
        }),
        Ok("FIXED: src/app.ts:1:TS2322".to_string()),
    ]));
    let sink = Arc::new(RecordingReportSink::new());
    let recovery = controller(scripted.clone(), sink.clone());

    let recovered = recovery
        .execute("prompt", CommandType::Agent)
        .await
        .unwrap();

    assert_eq!(recovered.attempts, 2);
    assert_eq!(sink.retries().len(), 1);
    assert_eq!(sink.retries()[0].kind, FailureKind::Network);
}

#[tokio::test]
async fn test_missing_tool_is_not_retried() {
    let scripted = Arc::new(ScriptedExecutor::always_err(ExecutorError::ToolNotFound {
        program: "claude".to_string(),
    }));
    let sink = Arc::new(RecordingReportSink::new());
    let recovery = controller(scripted.clone(), sink.clone());

    let failure = recovery
        .execute("prompt", CommandType::Quick)
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::ToolNotFound);
    assert_eq!(failure.attempts, 1);
    assert_eq!(scripted.calls(), 1);
    assert!(sink.retries().is_empty());
}
