//! Command executor adapters.

pub mod claude_cli;
pub mod scripted;

pub use claude_cli::ClaudeCliExecutor;
pub use scripted::ScriptedExecutor;
