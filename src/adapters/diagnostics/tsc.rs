//! TypeScript compiler diagnostics.
//!
//! Runs `tsc` (by default through `npx`) with `--pretty false` and parses
//! its line-oriented output:
//!
//! ```text
//! src/app.ts(12,5): error TS2322: Type 'string' is not assignable to type 'number'.
//! ```

use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use crate::domain::models::{DiagnosticsConfig, Severity, WorkItem};
use crate::domain::ports::{DiagnosticsError, DiagnosticsResult, DiagnosticsSource};
use crate::infrastructure::process::{run_captured, ProcessError};

static DIAGNOSTIC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<file>.+?)\((?P<line>\d+),(?P<column>\d+)\): ",
        r"(?P<severity>error|warning) (?P<code>TS\d+): (?P<message>.*)$",
    ))
    .expect("diagnostic line pattern must compile")
});

/// Parse compiler output into work items.
///
/// Indented lines continue the previous diagnostic's message. Identical
/// diagnostics are reported once, in first-seen order.
pub fn parse_diagnostics(output: &str) -> Vec<WorkItem> {
    let mut items: Vec<WorkItem> = Vec::new();
    let mut seen = HashSet::new();
    let mut pending: Option<WorkItem> = None;

    let mut flush = |item: Option<WorkItem>, items: &mut Vec<WorkItem>| {
        if let Some(item) = item {
            if seen.insert(item.clone()) {
                items.push(item);
            }
        }
    };

    for line in output.lines() {
        if let Some(caps) = DIAGNOSTIC_LINE.captures(line.trim_end()) {
            flush(pending.take(), &mut items);

            let severity = caps["severity"].parse().unwrap_or(Severity::Error);
            pending = Some(WorkItem::new(
                &caps["file"],
                caps["line"].parse().unwrap_or(0),
                caps["column"].parse().unwrap_or(0),
                &caps["code"],
                caps["message"].trim(),
                severity,
            ));
        } else if line.starts_with(char::is_whitespace) && !line.trim().is_empty() {
            if let Some(item) = pending.as_mut() {
                item.message.push(' ');
                item.message.push_str(line.trim());
            }
        } else {
            flush(pending.take(), &mut items);
        }
    }
    flush(pending.take(), &mut items);

    items
}

/// [`DiagnosticsSource`] running the TypeScript compiler.
#[derive(Debug, Clone)]
pub struct TscDiagnostics {
    config: DiagnosticsConfig,
    grace: Duration,
}

impl TscDiagnostics {
    pub const fn new(config: DiagnosticsConfig, grace: Duration) -> Self {
        Self { config, grace }
    }

    /// Rendered command line, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.config.program.as_str())
            .chain(self.config.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl DiagnosticsSource for TscDiagnostics {
    fn name(&self) -> &'static str {
        "tsc"
    }

    #[instrument(skip(self), fields(command = %self.command_line()))]
    async fn check(&self) -> DiagnosticsResult<Vec<WorkItem>> {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .current_dir(&self.config.working_dir);

        let limit = Duration::from_secs(self.config.timeout_secs);
        let output = run_captured(command, None, limit, self.grace)
            .await
            .map_err(|e| match e {
                ProcessError::NotFound(program) => DiagnosticsError::ToolNotFound(program),
                ProcessError::TimedOut(after) => DiagnosticsError::Timeout(after),
                other => DiagnosticsError::Spawn(other.to_string()),
            })?;

        // tsc reports diagnostics on stdout; some wrappers use stderr.
        let mut items = parse_diagnostics(&output.stdout);
        if items.is_empty() {
            items = parse_diagnostics(&output.stderr);
        }

        // A non-zero exit is expected whenever diagnostics exist.
        if items.is_empty() && !output.success() {
            return Err(DiagnosticsError::Parse(format!(
                "exit code {:?} with no recognizable diagnostics: {}",
                output.status.code(),
                output.error_text()
            )));
        }

        info!(count = items.len(), "Diagnostics check finished");
        debug!(exit_code = ?output.status.code(), "tsc exit status");
        Ok(items)
    }
}
