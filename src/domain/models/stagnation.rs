//! Stagnation analysis output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::work_item::{Category, WorkItem};

/// File with many outstanding diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHotspot {
    pub file: String,
    pub count: usize,
}

/// Deep analysis of a run that stopped making progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagnationReport {
    pub iteration: u32,
    pub diagnostic_count: usize,
    pub previous_count: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub hotspots: Vec<FileHotspot>,
    /// Items unchanged since the previous iteration
    pub stuck_items: Vec<WorkItem>,
    pub guidance: Vec<String>,
}
