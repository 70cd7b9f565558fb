//! Command executor port - interface to the external AI assistant.

use async_trait::async_trait;
use std::time::Duration;

use super::errors::ExecutorResult;

/// Runs one prompt against the external assistant.
///
/// Implementations own all process, shell, and environment concerns. They
/// must honor `timeout` and must not leak the underlying process when it
/// fires or when the returned future is dropped.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Executor type name.
    fn name(&self) -> &'static str;

    /// Check whether the assistant is installed and answering.
    async fn is_available(&self) -> bool;

    /// Run `prompt` and return the assistant's text output.
    async fn invoke(&self, prompt: &str, timeout: Duration) -> ExecutorResult<String>;
}
