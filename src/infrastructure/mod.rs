//! Infrastructure layer module
//!
//! - Configuration management
//! - Logging infrastructure
//! - Child process execution and termination

pub mod config;
pub mod logging;
pub mod process;
