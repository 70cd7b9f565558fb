//! Report sink that keeps every event in memory.

use std::sync::Mutex;

use crate::domain::models::{Execution, Phase, StagnationReport};
use crate::domain::ports::{ReportSink, RetryNotice};

/// One event received by a [`RecordingReportSink`].
#[derive(Debug, Clone)]
pub enum RecordedEvent {
    Phase(Phase),
    Iteration(Execution),
    Progress(String),
    Retry(RetryNotice),
    Stagnation(StagnationReport),
}

/// Append-only in-memory sink, used by tests and `--json` output.
#[derive(Debug, Default)]
pub struct RecordingReportSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: RecordedEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// All events in arrival order.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.filter(|e| match e {
            RecordedEvent::Phase(p) => Some(p.clone()),
            _ => None,
        })
    }

    pub fn iterations(&self) -> Vec<Execution> {
        self.filter(|e| match e {
            RecordedEvent::Iteration(x) => Some(x.clone()),
            _ => None,
        })
    }

    pub fn progress(&self) -> Vec<String> {
        self.filter(|e| match e {
            RecordedEvent::Progress(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn retries(&self) -> Vec<RetryNotice> {
        self.filter(|e| match e {
            RecordedEvent::Retry(n) => Some(n.clone()),
            _ => None,
        })
    }

    pub fn stagnation_reports(&self) -> Vec<StagnationReport> {
        self.filter(|e| match e {
            RecordedEvent::Stagnation(r) => Some(r.clone()),
            _ => None,
        })
    }

    fn filter<T>(&self, f: impl Fn(&RecordedEvent) -> Option<T>) -> Vec<T> {
        self.events
            .lock()
            .map(|events| events.iter().filter_map(&f).collect())
            .unwrap_or_default()
    }
}

impl ReportSink for RecordingReportSink {
    fn on_phase_complete(&self, phase: &Phase) {
        self.record(RecordedEvent::Phase(phase.clone()));
    }

    fn on_iteration_complete(&self, execution: &Execution) {
        self.record(RecordedEvent::Iteration(execution.clone()));
    }

    fn on_progress(&self, message: &str) {
        self.record(RecordedEvent::Progress(message.to_string()));
    }

    fn on_retry(&self, notice: &RetryNotice) {
        self.record(RecordedEvent::Retry(notice.clone()));
    }

    fn on_stagnation(&self, report: &StagnationReport) {
        self.record(RecordedEvent::Stagnation(report.clone()));
    }
}
