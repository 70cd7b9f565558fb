//! Orchestration services.

pub mod agent_runner;
pub mod convergence_loop;
pub mod error_classifier;
pub mod phase_executor;
pub mod prompts;
pub mod recovery_controller;
pub mod report_hub;
pub mod stagnation;
pub mod stop;

pub use agent_runner::AgentRunner;
pub use convergence_loop::{ConvergenceLoop, LoopFailure, LoopReport, LoopSettings};
pub use error_classifier::ErrorClassifier;
pub use phase_executor::{PhaseExecutor, PhaseExecutorConfig};
pub use recovery_controller::{Recovered, RecoveryController};
pub use report_hub::ReportHub;
pub use stop::{StopHandle, STOPPED_BY_USER};
