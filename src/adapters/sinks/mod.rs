//! Report sink adapters.

pub mod recording;
pub mod tracing_sink;

pub use recording::{RecordedEvent, RecordingReportSink};
pub use tracing_sink::TracingReportSink;
