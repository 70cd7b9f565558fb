//! Error classification.
//!
//! Maps diagnostic codes to categories and raw failure messages to the
//! failure taxonomy that drives retry decisions.

use regex::Regex;

use crate::domain::models::{Category, FailureClassification, FailureKind};

/// Keyword patterns per failure kind, in priority order.
const FAILURE_PATTERNS: &[(FailureKind, &[&str])] = &[
    (
        FailureKind::Authentication,
        &[
            r"authenticat",
            r"unauthori[sz]ed",
            r"\b401\b",
            r"\b403\b",
            r"forbidden",
            r"api[ _-]?key",
            r"invalid[ _-]?(token|credentials)",
            r"credentials",
            r"not logged in",
            r"please (log ?in|login|run /login)",
        ],
    ),
    (
        FailureKind::Network,
        &[
            r"network",
            r"econnrefused",
            r"econnreset",
            r"enotfound",
            r"ehostunreach",
            r"connection (refused|reset|closed|aborted)",
            r"socket hang up",
            r"getaddrinfo",
            r"\bdns\b",
            r"\b50[234]\b",
            r"\b429\b",
            r"rate limit",
            r"overloaded",
        ],
    ),
    (
        FailureKind::Timeout,
        &[r"timed? ?out", r"timeout", r"etimedout", r"deadline exceeded"],
    ),
    (
        FailureKind::ToolNotFound,
        &[
            r"command not found",
            r"\benoent\b",
            r"no such file or directory",
            r"is not recognized as an internal or external command",
            r"not installed",
        ],
    ),
];

/// Classifies diagnostic codes and invocation failures.
///
/// Constructed once and shared by reference; holds only compiled patterns.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    matchers: Vec<(FailureKind, Regex)>,
}

impl ErrorClassifier {
    pub fn new() -> Self {
        let matchers = FAILURE_PATTERNS
            .iter()
            .map(|(kind, patterns)| {
                let pattern = format!("(?i)({})", patterns.join("|"));
                let regex = Regex::new(&pattern).expect("static failure pattern must compile");
                (*kind, regex)
            })
            .collect();

        Self { matchers }
    }

    /// Category of a raw diagnostic code.
    pub fn classify(&self, raw_code: &str) -> Category {
        Category::from_code(raw_code)
    }

    /// Classify a failure message.
    ///
    /// Kinds are checked in priority order (authentication, network, timeout,
    /// tool-not-found); the first match wins and anything unmatched is
    /// [`FailureKind::Unknown`].
    pub fn classify_failure(&self, message: &str) -> FailureClassification {
        let kind = self
            .matchers
            .iter()
            .find(|(_, regex)| regex.is_match(message))
            .map_or(FailureKind::Unknown, |(kind, _)| *kind);

        FailureClassification {
            kind,
            recoverable: kind.is_recoverable(),
            suggested_actions: suggested_actions(kind),
        }
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn suggested_actions(kind: FailureKind) -> Vec<String> {
    let actions: &[&str] = match kind {
        FailureKind::Authentication => &[
            "Re-authenticate the assistant CLI (run its login command)",
            "Verify the API key or credentials exported to the environment",
        ],
        FailureKind::Network => &[
            "Check network connectivity to the assistant backend",
            "Retry after a short delay",
        ],
        FailureKind::Timeout => &[
            "Reduce the number of diagnostics assigned per agent",
            "Increase the timeout for this command type in timeouts.per_command",
        ],
        FailureKind::ToolNotFound => &[
            "Install the assistant CLI and make sure it is on PATH",
            "Set assistant.binary_path in .fixloop/config.yaml",
        ],
        FailureKind::Unknown => &[
            "Inspect the assistant output for details",
            "Retry with the default policy",
        ],
    };
    actions.iter().map(ToString::to_string).collect()
}
