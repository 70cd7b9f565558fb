//! Diagnostics source adapters.

pub mod scripted;
pub mod tsc;

pub use scripted::ScriptedDiagnostics;
pub use tsc::{parse_diagnostics, TscDiagnostics};
