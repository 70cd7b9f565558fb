//! Claude CLI executor.
//!
//! Runs the assistant binary in non-interactive print mode, one process per
//! invocation, with the prompt on stdin.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::domain::models::{AssistantConfig, CommandType, TimeoutConfig};
use crate::domain::ports::{CommandExecutor, ExecutorError, ExecutorResult};
use crate::infrastructure::process::{run_captured, ProcessError};

/// [`CommandExecutor`] backed by the `claude` command-line tool.
#[derive(Debug, Clone)]
pub struct ClaudeCliExecutor {
    config: AssistantConfig,
    grace: Duration,
    availability_timeout: Duration,
}

impl ClaudeCliExecutor {
    pub fn new(config: AssistantConfig, timeouts: &TimeoutConfig) -> Self {
        Self {
            config,
            grace: timeouts.termination_grace(),
            availability_timeout: timeouts.timeout(CommandType::Quick),
        }
    }

    /// Arguments for one print-mode invocation.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "--print".to_string(),
            "--output-format".to_string(),
            "text".to_string(),
        ];
        args.extend(self.config.extra_flags.iter().cloned());
        args
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.config.binary_path);
        command.current_dir(&self.config.working_dir);
        command
    }

    fn map_error(error: ProcessError, timeout: Duration) -> ExecutorError {
        match error {
            ProcessError::NotFound(program) => ExecutorError::ToolNotFound { program },
            ProcessError::Spawn { message, .. } => ExecutorError::Spawn(message),
            ProcessError::TimedOut(_) => ExecutorError::Timeout { after: timeout },
            ProcessError::Io(e) => e.into(),
        }
    }
}

#[async_trait]
impl CommandExecutor for ClaudeCliExecutor {
    fn name(&self) -> &'static str {
        "claude_cli"
    }

    async fn is_available(&self) -> bool {
        let mut command = self.command();
        command.arg("--version");

        match run_captured(command, None, self.availability_timeout, self.grace).await {
            Ok(output) => output.success(),
            Err(e) => {
                debug!(error = %e, "Assistant availability check failed");
                false
            }
        }
    }

    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn invoke(&self, prompt: &str, timeout: Duration) -> ExecutorResult<String> {
        let mut command = self.command();
        command.args(self.build_args());

        let output = run_captured(command, Some(prompt), timeout, self.grace)
            .await
            .map_err(|e| Self::map_error(e, timeout))?;

        if output.success() {
            debug!(bytes = output.stdout.len(), "Assistant invocation succeeded");
            Ok(output.stdout)
        } else {
            Err(ExecutorError::Failed {
                exit_code: output.status.code(),
                message: output.error_text().to_string(),
            })
        }
    }
}
