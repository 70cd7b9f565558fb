//! Fixloop - iterative diagnostics orchestrator
//!
//! Fixloop runs a static-analysis tool over a project, hands the diagnostics
//! to a roster of AI-assistant agents in five phases (detect, analyze,
//! resolve, validate, complete), then checks again. It repeats until the tool
//! reports nothing or the iteration cap is hit.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors, and ports
//! - **Service Layer** (`services`): classification, recovery, phases, loop
//! - **Adapters** (`adapters`): assistant CLI, diagnostics tool, report sinks
//! - **Infrastructure Layer** (`infrastructure`): config, logging, processes
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fixloop::{ConvergenceLoop, Config, StopHandle};
//! use fixloop::adapters::{ClaudeCliExecutor, TscDiagnostics, TracingReportSink};
//!
//! let config = Config::default();
//! let executor = Arc::new(ClaudeCliExecutor::new(config.assistant.clone(), &config.timeouts));
//! let diagnostics = Arc::new(TscDiagnostics::new(
//!     config.diagnostics.clone(),
//!     config.timeouts.termination_grace(),
//! ));
//! let lp = ConvergenceLoop::from_config(
//!     &config,
//!     executor,
//!     diagnostics,
//!     vec![Arc::new(TracingReportSink)],
//!     StopHandle::new(),
//! );
//! let report = lp.run(Arc::new(|msg: &str| println!("{msg}"))).await?;
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{OrchestrationError, PhaseError};
pub use domain::models::{
    Agent, AgentStatus, Category, CommandType, Config, Execution, ExecutionStatus, Failure,
    FailureKind, Phase, PhaseKind, PhaseStatus, Severity, StagnationReport, WorkItem,
};
pub use domain::ports::{
    CommandExecutor, DiagnosticsError, DiagnosticsSource, ExecutorError, ProgressHost,
    ReportSink,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ConvergenceLoop, LoopFailure, LoopReport, StopHandle};
