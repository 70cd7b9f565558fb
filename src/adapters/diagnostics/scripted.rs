//! Scripted diagnostics source for tests and dry runs.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::models::WorkItem;
use crate::domain::ports::{DiagnosticsError, DiagnosticsResult, DiagnosticsSource};

/// [`DiagnosticsSource`] that returns a fixed sequence of results.
///
/// Check `n` gets entry `n`; after the sequence ends the last entry repeats.
#[derive(Debug)]
pub struct ScriptedDiagnostics {
    script: Vec<DiagnosticsResult<Vec<WorkItem>>>,
    checks: AtomicUsize,
}

impl ScriptedDiagnostics {
    pub fn new(sets: Vec<Vec<WorkItem>>) -> Self {
        Self::with_results(sets.into_iter().map(Ok).collect())
    }

    pub const fn with_results(script: Vec<DiagnosticsResult<Vec<WorkItem>>>) -> Self {
        Self {
            script,
            checks: AtomicUsize::new(0),
        }
    }

    /// Every check fails with `error`.
    pub fn failing(error: DiagnosticsError) -> Self {
        Self::with_results(vec![Err(error)])
    }

    /// Number of checks performed so far.
    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiagnosticsSource for ScriptedDiagnostics {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn check(&self) -> DiagnosticsResult<Vec<WorkItem>> {
        let n = self.checks.fetch_add(1, Ordering::SeqCst);
        self.script
            .get(n)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Severity;

    #[tokio::test]
    async fn test_sequence_repeats_last() {
        let item = WorkItem::new("a.ts", 1, 1, "TS2322", "m", Severity::Error);
        let source = ScriptedDiagnostics::new(vec![vec![item.clone(), item], vec![]]);

        assert_eq!(source.check().await.unwrap().len(), 2);
        assert!(source.check().await.unwrap().is_empty());
        assert!(source.check().await.unwrap().is_empty());
        assert_eq!(source.checks(), 3);
    }

    #[tokio::test]
    async fn test_empty_script_is_clean() {
        let source = ScriptedDiagnostics::new(Vec::new());
        assert!(source.check().await.unwrap().is_empty());
    }
}
