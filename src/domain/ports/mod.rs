//! Ports (interfaces) for the orchestrator's external collaborators.

pub mod command_executor;
pub mod diagnostics_source;
pub mod errors;
pub mod report_sink;

pub use command_executor::CommandExecutor;
pub use diagnostics_source::DiagnosticsSource;
pub use errors::{DiagnosticsError, DiagnosticsResult, ExecutorError, ExecutorResult};
pub use report_sink::{ProgressHost, ReportSink, RetryNotice};
