//! Common test utilities for integration tests
//!
//! Builders for work items, small configurations, and a fully wired
//! convergence loop over scripted adapters.

#![allow(dead_code)]

use std::sync::Arc;

use fixloop::adapters::{RecordingReportSink, ScriptedDiagnostics, ScriptedExecutor};
use fixloop::domain::ports::{ProgressHost, ReportSink};
use fixloop::{Config, ConvergenceLoop, Severity, StopHandle, WorkItem};

/// `n` distinct errors in one file.
pub fn items(n: u32) -> Vec<WorkItem> {
    (1..=n)
        .map(|i| {
            WorkItem::new(
                "src/app.ts",
                i,
                5,
                "TS2322",
                format!("Type 'string' is not assignable to type 'number' ({i})"),
                Severity::Error,
            )
        })
        .collect()
}

/// Defaults with a small roster and no real backoff.
pub fn small_config() -> Config {
    let mut config = Config::default();
    config.orchestrator.agents_per_phase = 4;
    config.orchestrator.max_parallel_agents = 2;
    config.orchestrator.max_iterations = 3;
    config.recovery.base_delay_ms = 1;
    config.recovery.max_delay_ms = 10;
    config
}

/// A loop wired to scripted adapters with a recording sink attached.
pub struct Harness {
    pub executor: Arc<ScriptedExecutor>,
    pub diagnostics: Arc<ScriptedDiagnostics>,
    pub sink: Arc<RecordingReportSink>,
    pub stop: StopHandle,
    pub lp: ConvergenceLoop,
}

impl Harness {
    pub fn new(
        config: &Config,
        executor: ScriptedExecutor,
        diagnostics: ScriptedDiagnostics,
    ) -> Self {
        let executor = Arc::new(executor);
        let diagnostics = Arc::new(diagnostics);
        let sink = Arc::new(RecordingReportSink::new());
        let stop = StopHandle::new();
        let sinks: Vec<Arc<dyn ReportSink>> = vec![sink.clone()];

        let lp = ConvergenceLoop::from_config(
            config,
            executor.clone(),
            diagnostics.clone(),
            sinks,
            stop.clone(),
        );

        Self {
            executor,
            diagnostics,
            sink,
            stop,
            lp,
        }
    }
}

/// Progress host that discards everything.
pub fn silent() -> Arc<dyn ProgressHost> {
    Arc::new(|_: &str| {})
}

/// Setup test logging
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
