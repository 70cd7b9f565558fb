pub mod agent;
pub mod command;
pub mod config;
pub mod execution;
pub mod failure;
pub mod phase;
pub mod stagnation;
pub mod work_item;

pub use agent::{Agent, AgentStatus};
pub use command::CommandType;
pub use config::{
    AssistantConfig, Config, DiagnosticsConfig, LoggingConfig, OrchestratorConfig,
    RecoveryConfig, TimeoutConfig,
};
pub use execution::{DiagnosticDelta, Execution, ExecutionStatus};
pub use failure::{Failure, FailureClassification, FailureKind};
pub use phase::{Phase, PhaseKind, PhaseStatus};
pub use stagnation::{FileHotspot, StagnationReport};
pub use work_item::{Category, Fingerprint, Location, Severity, WorkItem};
