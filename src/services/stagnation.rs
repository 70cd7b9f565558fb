//! Stagnation analysis.
//!
//! Runs when the diagnostic count has stopped decreasing for long enough.
//! The output is advisory: the loop continues regardless.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::models::{Category, FileHotspot, StagnationReport, WorkItem};

/// Number of files listed as hotspots.
pub const MAX_HOTSPOTS: usize = 5;

/// Guidance for a category of stuck diagnostics.
pub const fn category_guidance(category: Category) -> &'static str {
    match category {
        Category::TypeAssignment => {
            "Type mismatches persist: check the declared types at both ends of the assignment rather than casting"
        }
        Category::NullOrUndefined => {
            "Nullability errors persist: add explicit guards or narrow optional values before use"
        }
        Category::ImportOrModule => {
            "Module errors persist: verify package installation, path aliases and export names"
        }
        Category::Generics => {
            "Generic errors persist: check type parameter counts and constraint bounds"
        }
        Category::UnknownType => {
            "Unknown names persist: add missing declarations or type annotations for implicit any"
        }
        Category::Other => "Uncategorised errors persist: review them manually",
    }
}

/// Build a report for the diagnostics of the current iteration.
///
/// `previous` is the diagnostic set the previous iteration started from; an
/// item counts as stuck when an item with the same fingerprint was there too.
pub fn analyze(
    iteration: u32,
    current: &[WorkItem],
    previous: &[WorkItem],
    previous_count: usize,
) -> StagnationReport {
    let mut by_category = BTreeMap::new();
    for item in current {
        *by_category.entry(item.category).or_insert(0) += 1;
    }

    let mut per_file: HashMap<&str, usize> = HashMap::new();
    for item in current {
        *per_file.entry(item.location.file.as_str()).or_insert(0) += 1;
    }
    let mut hotspots: Vec<FileHotspot> = per_file
        .into_iter()
        .map(|(file, count)| FileHotspot {
            file: file.to_string(),
            count,
        })
        .collect();
    hotspots.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.file.cmp(&b.file)));
    hotspots.truncate(MAX_HOTSPOTS);

    let seen: HashSet<_> = previous.iter().map(WorkItem::fingerprint).collect();
    let stuck_items: Vec<WorkItem> = current
        .iter()
        .filter(|item| seen.contains(&item.fingerprint()))
        .cloned()
        .collect();

    let mut guidance: Vec<String> = by_category
        .keys()
        .map(|category| category_guidance(*category).to_string())
        .collect();
    if let Some(top) = hotspots.first() {
        if top.count > 1 {
            guidance.push(format!(
                "Focus on {} which holds {} of the remaining diagnostics",
                top.file, top.count
            ));
        }
    }
    if !current.is_empty() && stuck_items.len() == current.len() {
        guidance.push(
            "No diagnostic changed since the previous iteration: the assistant may lack context to fix them"
                .to_string(),
        );
    }

    StagnationReport {
        iteration,
        diagnostic_count: current.len(),
        previous_count,
        by_category,
        hotspots,
        stuck_items,
        guidance,
    }
}

/// One-line summary for progress output.
pub fn summarize(report: &StagnationReport) -> String {
    let categories: Vec<String> = report
        .by_category
        .iter()
        .map(|(category, count)| format!("{category}: {count}"))
        .collect();
    format!(
        "Stagnation analysis (iteration {}): {} diagnostics, {} stuck [{}]",
        report.iteration,
        report.diagnostic_count,
        report.stuck_items.len(),
        categories.join(", ")
    )
}
