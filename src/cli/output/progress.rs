//! Progress display using indicatif
//!
//! The convergence loop reports progress as plain messages. [`SpinnerHost`]
//! shows agent-level messages on a spinner line and prints every other
//! message above it.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

use crate::domain::ports::ProgressHost;

const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create a spinner for indeterminate operations
pub fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(SPINNER_CHARS),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Extension trait for ProgressBar to add common utility methods
pub trait ProgressBarExt {
    /// Finish with a success message (green checkmark)
    fn finish_success(&self, message: impl Into<String>);

    /// Finish with an error message (red X)
    fn finish_error(&self, message: impl Into<String>);
}

impl ProgressBarExt for ProgressBar {
    fn finish_success(&self, message: impl Into<String>) {
        self.finish_with_message(format!("✓ {}", message.into()));
    }

    fn finish_error(&self, message: impl Into<String>) {
        self.finish_with_message(format!("✗ {}", message.into()));
    }
}

/// [`ProgressHost`] rendering loop progress on a spinner.
#[derive(Clone)]
pub struct SpinnerHost {
    spinner: ProgressBar,
}

impl SpinnerHost {
    pub fn new() -> Self {
        Self {
            spinner: create_spinner(),
        }
    }

    /// Host that draws nothing (for tests)
    pub fn hidden() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_draw_target(ProgressDrawTarget::hidden());
        Self { spinner }
    }

    pub const fn spinner(&self) -> &ProgressBar {
        &self.spinner
    }

    /// Agent-level messages are transient; they replace the spinner text.
    pub fn is_transient(message: &str) -> bool {
        message.starts_with("✓ ") || message.contains("; retry ")
    }
}

impl Default for SpinnerHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHost for SpinnerHost {
    fn on_progress(&self, message: &str) {
        if Self::is_transient(message) {
            self.spinner.set_message(message.to_string());
        } else {
            self.spinner.println(message);
            self.spinner.set_message(message.to_string());
        }
    }
}
