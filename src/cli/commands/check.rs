//! Implementation of the `fixloop check` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::adapters::TscDiagnostics;
use crate::cli::output::{create_spinner, output, CommandOutput, TableFormatter};
use crate::domain::models::{Category, Config, Severity, WorkItem};
use crate::domain::ports::DiagnosticsSource;

#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// List every diagnostic, not only the per-category summary
    #[arg(long)]
    pub list: bool,
}

#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub items: Vec<WorkItem>,
    #[serde(skip)]
    pub list: bool,
}

impl CheckOutput {
    pub fn new(items: Vec<WorkItem>, list: bool) -> Self {
        let mut by_category = BTreeMap::new();
        for item in &items {
            *by_category.entry(item.category).or_insert(0) += 1;
        }
        let errors = items
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();

        Self {
            total: items.len(),
            errors,
            warnings: items.len() - errors,
            by_category,
            items,
            list,
        }
    }
}

impl CommandOutput for CheckOutput {
    fn to_human(&self) -> String {
        if self.total == 0 {
            return "No diagnostics found".to_string();
        }

        let formatter = TableFormatter::new();
        let mut lines = vec![
            format!(
                "{} diagnostics ({} errors, {} warnings)",
                self.total, self.errors, self.warnings
            ),
            formatter.format_categories(&self.by_category),
        ];
        if self.list {
            lines.push(formatter.format_items(&self.items));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: CheckArgs, config: Config, json_mode: bool) -> Result<()> {
    let source = TscDiagnostics::new(
        config.diagnostics.clone(),
        config.timeouts.termination_grace(),
    );

    let spinner = (!json_mode).then(|| {
        let spinner = create_spinner();
        spinner.set_message(format!("Running {}", source.command_line()));
        spinner
    });

    let result = source.check().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let items = result.context("Failed to run diagnostics check")?;
    output(&CheckOutput::new(items, args.list), json_mode);
    Ok(())
}
