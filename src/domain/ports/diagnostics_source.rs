//! Diagnostics source port - interface to the static-analysis tool.

use async_trait::async_trait;

use super::errors::DiagnosticsResult;
use crate::domain::models::WorkItem;

/// Produces the current set of outstanding diagnostics.
///
/// `check` must be idempotent and must not modify the codebase: two calls
/// with no edit in between return the same items.
#[async_trait]
pub trait DiagnosticsSource: Send + Sync {
    /// Source type name.
    fn name(&self) -> &'static str;

    /// Run the tool and return every diagnostic it reports.
    async fn check(&self) -> DiagnosticsResult<Vec<WorkItem>>;
}
