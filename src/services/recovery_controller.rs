//! Recovery controller.
//!
//! Wraps the command executor with classification-driven retries and
//! exponential backoff. Errors are never swallowed: once the budget is spent
//! or a failure is not retryable, the classified [`Failure`] is returned.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::models::{
    CommandType, Failure, FailureClassification, FailureKind, RecoveryConfig, TimeoutConfig,
};
use crate::domain::ports::{CommandExecutor, ExecutorError, RetryNotice};
use crate::services::error_classifier::ErrorClassifier;
use crate::services::report_hub::ReportHub;

/// Successful invocation together with how many attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered {
    pub output: String,
    pub attempts: u32,
}

/// Retry/backoff policy around a [`CommandExecutor`].
pub struct RecoveryController {
    executor: Arc<dyn CommandExecutor>,
    classifier: Arc<ErrorClassifier>,
    policy: RecoveryConfig,
    timeouts: TimeoutConfig,
    reports: Arc<ReportHub>,
}

impl RecoveryController {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        classifier: Arc<ErrorClassifier>,
        policy: RecoveryConfig,
        timeouts: TimeoutConfig,
        reports: Arc<ReportHub>,
    ) -> Self {
        Self {
            executor,
            classifier,
            policy,
            timeouts,
            reports,
        }
    }

    /// Retry budget for a command type.
    pub fn max_retries(&self, command_type: CommandType) -> u32 {
        self.policy.max_retries(command_type)
    }

    /// Delay before retry number `attempt` (1-based).
    ///
    /// Formula: min(base_delay * 2^(attempt-1), max_delay)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let delay_ms = self
            .policy
            .base_delay_ms
            .saturating_mul(2_u64.saturating_pow(exponent))
            .min(self.policy.max_delay_ms);

        Duration::from_millis(delay_ms)
    }

    fn is_retryable(&self, classification: &FailureClassification) -> bool {
        classification.recoverable && !self.policy.non_retryable.contains(&classification.kind)
    }

    /// Run `prompt` with the timeout and retry budget of `command_type`.
    pub async fn execute(
        &self,
        prompt: &str,
        command_type: CommandType,
    ) -> Result<Recovered, Failure> {
        let max_retries = self.max_retries(command_type);
        let timeout = self.timeouts.timeout(command_type);
        let mut retries = 0;

        loop {
            let err = match self.executor.invoke(prompt, timeout).await {
                Ok(output) => {
                    if retries > 0 {
                        debug!(%command_type, retries, "Invocation succeeded after retries");
                    }
                    return Ok(Recovered {
                        output,
                        attempts: retries + 1,
                    });
                }
                Err(err) => err,
            };

            let message = err.to_string();

            if matches!(err, ExecutorError::Cancelled) {
                return Err(Failure::new(
                    FailureClassification {
                        kind: FailureKind::Unknown,
                        recoverable: false,
                        suggested_actions: vec![],
                    },
                    message,
                    retries + 1,
                ));
            }

            let classification = self.classifier.classify_failure(&message);

            if !self.is_retryable(&classification) {
                debug!(kind = %classification.kind, "Non-retryable failure: {}", message);
                return Err(Failure::new(classification, message, retries + 1));
            }

            if retries >= max_retries {
                warn!(
                    %command_type,
                    kind = %classification.kind,
                    attempts = retries + 1,
                    "Retry budget exhausted: {}",
                    message
                );
                return Err(Failure::new(classification, message, retries + 1));
            }

            retries += 1;
            let delay = self.backoff_delay(retries);

            warn!(
                %command_type,
                kind = %classification.kind,
                attempt = retries,
                max_retries,
                "Transient failure, retrying in {:?}: {}",
                delay,
                message
            );
            self.reports.retry(&RetryNotice {
                command_type,
                attempt: retries,
                max_retries,
                delay,
                kind: classification.kind,
            });
            self.reports.progress(&format!(
                "{} failure ({}); retry {}/{} in {:?}",
                classification.kind, command_type, retries, max_retries, delay
            ));

            sleep(delay).await;
        }
    }
}
