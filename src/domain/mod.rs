//! Domain layer for fixloop
//!
//! Models, errors, and the ports through which the orchestrator reaches the
//! outside world (assistant, static-analysis tool, report sink).

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{OrchestrationError, PhaseError, PhaseResult};
