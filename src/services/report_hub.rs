//! Fan-out of orchestration events to report sinks and the progress host.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::warn;

use crate::domain::models::{Execution, Phase, StagnationReport};
use crate::domain::ports::{ProgressHost, ReportSink, RetryNotice};

/// Delivers events to every registered sink and to the active host.
///
/// A sink that panics is logged and skipped; it never takes the
/// orchestration down with it.
#[derive(Default)]
pub struct ReportHub {
    sinks: Vec<Arc<dyn ReportSink>>,
    host: RwLock<Option<Arc<dyn ProgressHost>>>,
}

impl ReportHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Install the host that receives progress messages for the current run.
    pub fn attach_host(&self, host: Arc<dyn ProgressHost>) {
        if let Ok(mut slot) = self.host.write() {
            *slot = Some(host);
        }
    }

    pub fn detach_host(&self) {
        if let Ok(mut slot) = self.host.write() {
            *slot = None;
        }
    }

    pub fn progress(&self, message: &str) {
        self.each_sink("on_progress", |sink| sink.on_progress(message));

        let host = self.host.read().ok().and_then(|slot| slot.clone());
        if let Some(host) = host {
            if catch_unwind(AssertUnwindSafe(|| host.on_progress(message))).is_err() {
                warn!("progress host panicked; message dropped");
            }
        }
    }

    pub fn phase_complete(&self, phase: &Phase) {
        self.each_sink("on_phase_complete", |sink| sink.on_phase_complete(phase));
    }

    pub fn iteration_complete(&self, execution: &Execution) {
        self.each_sink("on_iteration_complete", |sink| {
            sink.on_iteration_complete(execution);
        });
    }

    pub fn retry(&self, notice: &RetryNotice) {
        self.each_sink("on_retry", |sink| sink.on_retry(notice));
    }

    pub fn stagnation(&self, report: &StagnationReport) {
        self.each_sink("on_stagnation", |sink| sink.on_stagnation(report));
    }

    fn each_sink(&self, event: &'static str, f: impl Fn(&dyn ReportSink)) {
        for sink in &self.sinks {
            if catch_unwind(AssertUnwindSafe(|| f(sink.as_ref()))).is_err() {
                warn!(event, "report sink panicked; event dropped");
            }
        }
    }
}
