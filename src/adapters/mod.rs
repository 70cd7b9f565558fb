//! Adapters implementing the domain ports.
//!
//! - `executors`: assistant invocation (`claude` CLI, scripted double)
//! - `diagnostics`: static-analysis sources (`tsc`, scripted double)
//! - `sinks`: report sinks (tracing, in-memory recording)

pub mod diagnostics;
pub mod executors;
pub mod sinks;

pub use diagnostics::{ScriptedDiagnostics, TscDiagnostics};
pub use executors::{ClaudeCliExecutor, ScriptedExecutor};
pub use sinks::{RecordedEvent, RecordingReportSink, TracingReportSink};
