//! Table output formatting for CLI commands
//!
//! Renders iterations, phases and diagnostics with comfy-table. Colors are
//! disabled when `NO_COLOR` is set or the terminal is dumb.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::collections::BTreeMap;
use std::env;

use crate::domain::models::{
    AgentStatus, Category, Execution, ExecutionStatus, Phase, PhaseStatus, WorkItem,
};

use super::truncate;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// One row per iteration
    pub fn format_iterations(&self, iterations: &[Execution]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&[
            "Iteration", "Status", "Start", "Remaining", "Phases", "Claimed fixes", "Delta",
        ]));

        for execution in iterations {
            let delta = execution.delta.map_or_else(
                || "-".to_string(),
                |d| format!("-{} +{} ={}", d.resolved, d.introduced, d.persisting),
            );
            table.add_row(vec![
                Cell::new(execution.iteration),
                self.status_cell(execution.status.to_string(), execution_color(execution.status)),
                Cell::new(execution.total_errors),
                Cell::new(execution.errors_remaining),
                Cell::new(format!("{}/5", execution.phases.len())),
                Cell::new(execution.errors_fixed_claimed()),
                Cell::new(delta),
            ]);
        }

        table.to_string()
    }

    /// One row per phase
    pub fn format_phases(&self, phases: &[Phase]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&[
            "Phase", "Status", "Agents", "Completed", "Failed", "Batches", "Claimed fixes",
        ]));

        for phase in phases {
            table.add_row(vec![
                Cell::new(format!("{}. {}", phase.number, phase.name)),
                self.status_cell(phase.status.to_string(), phase_color(phase.status)),
                Cell::new(phase.agents.len()),
                Cell::new(phase.count_with_status(AgentStatus::Completed)),
                Cell::new(phase.count_with_status(AgentStatus::Failed)),
                Cell::new(phase.batches),
                Cell::new(phase.errors_fixed),
            ]);
        }

        table.to_string()
    }

    /// Diagnostic counts per category, in reporting order
    pub fn format_categories(&self, counts: &BTreeMap<Category, usize>) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Category", "Count"]));

        for category in Category::ALL {
            if let Some(count) = counts.get(&category) {
                table.add_row(vec![Cell::new(category.label()), Cell::new(count)]);
            }
        }

        table.to_string()
    }

    /// Individual diagnostics
    pub fn format_items(&self, items: &[WorkItem]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Location", "Code", "Category", "Message"]));

        for item in items {
            table.add_row(vec![
                Cell::new(item.location.to_string()),
                Cell::new(&item.code),
                Cell::new(item.category.label()),
                Cell::new(truncate(&item.message, 80)),
            ]);
        }

        table.to_string()
    }

    fn status_cell(&self, text: String, color: Color) -> Cell {
        if self.use_colors {
            Cell::new(text).fg(color)
        } else {
            Cell::new(text)
        }
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| Cell::new(t).add_attribute(Attribute::Bold))
        .collect()
}

fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

const fn execution_color(status: ExecutionStatus) -> Color {
    match status {
        ExecutionStatus::Pending => Color::Grey,
        ExecutionStatus::Running => Color::Yellow,
        ExecutionStatus::Completed => Color::Green,
        ExecutionStatus::Failed => Color::Red,
    }
}

const fn phase_color(status: PhaseStatus) -> Color {
    match status {
        PhaseStatus::Pending => Color::Grey,
        PhaseStatus::Running => Color::Yellow,
        PhaseStatus::Completed => Color::Green,
        PhaseStatus::Failed => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{PhaseKind, Severity};

    fn formatter() -> TableFormatter {
        TableFormatter::with_config(false, Some(120))
    }

    #[test]
    fn test_format_iterations() {
        let mut execution = Execution::new(1);
        execution.total_errors = 7;
        execution.errors_remaining = 3;
        execution.complete();

        let output = formatter().format_iterations(&[execution]);
        assert!(output.contains("Iteration"));
        assert!(output.contains("completed"));
        assert!(output.contains('7'));
    }

    #[test]
    fn test_format_phases() {
        let phase = Phase::new(PhaseKind::Resolution, Vec::new(), 4);
        let output = formatter().format_phases(&[phase]);
        assert!(output.contains("3. Resolution"));
    }

    #[test]
    fn test_format_categories_skips_absent() {
        let mut counts = BTreeMap::new();
        counts.insert(Category::Generics, 2);
        let output = formatter().format_categories(&counts);
        assert!(output.contains("generics"));
        assert!(!output.contains("null or undefined"));
    }

    #[test]
    fn test_format_items() {
        let item = WorkItem::new(
            "src/a.ts",
            4,
            2,
            "TS2304",
            "Cannot find name 'x'.",
            Severity::Error,
        );
        let output = formatter().format_items(&[item]);
        assert!(output.contains("src/a.ts:4:2"));
        assert!(output.contains("unknown type"));
    }
}
