//! Implementation of the `fixloop run` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::adapters::{ClaudeCliExecutor, TracingReportSink, TscDiagnostics};
use crate::cli::output::{output, CommandOutput, ProgressBarExt, SpinnerHost, TableFormatter};
use crate::domain::models::{Config, ExecutionStatus};
use crate::domain::ports::{ProgressHost, ReportSink};
use crate::infrastructure::config::ConfigLoader;
use crate::services::{ConvergenceLoop, LoopReport, StopHandle};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Maximum iterations before giving up
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Agents run concurrently within a batch
    #[arg(long)]
    pub max_parallel: Option<usize>,

    /// Agents in each phase roster
    #[arg(long)]
    pub agents_per_phase: Option<usize>,
}

impl RunArgs {
    /// Apply command-line overrides on top of loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(n) = self.max_iterations {
            config.orchestrator.max_iterations = n;
        }
        if let Some(n) = self.max_parallel {
            config.orchestrator.max_parallel_agents = n;
        }
        if let Some(n) = self.agents_per_phase {
            config.orchestrator.agents_per_phase = n;
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub success: bool,
    pub error: Option<String>,
    pub report: LoopReport,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let report = &self.report;
        let formatter = TableFormatter::new();
        let mut lines = Vec::new();

        if !report.iterations.is_empty() {
            lines.push(formatter.format_iterations(&report.iterations));
        }
        if let Some(last) = report.iterations.last() {
            if !last.phases.is_empty() {
                lines.push(format!("Phases of iteration {}:", last.iteration));
                lines.push(formatter.format_phases(&last.phases));
            }
        }

        let status = match report.status {
            ExecutionStatus::Completed => console::style("completed").green().bold(),
            _ => console::style("failed").red().bold(),
        };
        lines.push(format!("Status:      {status}"));
        lines.push(format!("Iterations:  {}", report.iterations_run()));
        if let Some(initial) = report.initial_errors {
            lines.push(format!("Initial:     {initial} diagnostics"));
        }
        if let Some(remaining) = report.remaining {
            lines.push(format!("Remaining:   {remaining} diagnostics"));
        }
        lines.push(format!(
            "Claimed:     {} fixes (self-reported)",
            report.errors_fixed_claimed()
        ));
        if let Some(duration) = report.duration() {
            lines.push(format!("Duration:    {}s", duration.num_seconds()));
        }
        if !report.stagnation_reports.is_empty() {
            lines.push(format!(
                "Stagnation:  analysed {} time(s)",
                report.stagnation_reports.len()
            ));
        }
        if let Some(error) = &self.error {
            lines.push(format!("Error:       {error}"));
        }

        lines.join("\n")
    }
}

pub async fn execute(args: RunArgs, mut config: Config, json_mode: bool) -> Result<()> {
    args.apply(&mut config);
    ConfigLoader::validate(&config).context("Invalid run configuration")?;

    let executor = Arc::new(ClaudeCliExecutor::new(
        config.assistant.clone(),
        &config.timeouts,
    ));
    let diagnostics = Arc::new(TscDiagnostics::new(
        config.diagnostics.clone(),
        config.timeouts.termination_grace(),
    ));
    let sinks: Vec<Arc<dyn ReportSink>> = vec![Arc::new(TracingReportSink)];

    let stop = StopHandle::new();
    let convergence =
        ConvergenceLoop::from_config(&config, executor, diagnostics, sinks, stop.clone());

    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping");
            stop.stop();
        }
    });

    info!(
        max_iterations = config.orchestrator.max_iterations,
        max_parallel = config.orchestrator.max_parallel_agents,
        agents_per_phase = config.orchestrator.agents_per_phase,
        "Starting convergence loop"
    );

    let spinner = (!json_mode).then(SpinnerHost::new);
    let host: Arc<dyn ProgressHost> = match &spinner {
        Some(spinner) => Arc::new(spinner.clone()),
        None => Arc::new(|_: &str| {}),
    };

    let result = convergence.run(host).await;
    ctrl_c.abort();

    let (run_output, failure) = match result {
        Ok(report) => {
            if let Some(spinner) = &spinner {
                spinner.spinner().finish_success("No diagnostics remaining");
            }
            (
                RunOutput {
                    success: true,
                    error: None,
                    report,
                },
                None,
            )
        }
        Err(failure) => {
            if let Some(spinner) = &spinner {
                spinner.spinner().finish_error(failure.error.to_string());
            }
            (
                RunOutput {
                    success: false,
                    error: Some(failure.error.to_string()),
                    report: failure.report,
                },
                Some(failure.error),
            )
        }
    };

    output(&run_output, json_mode);

    match failure {
        Some(error) => Err(error).context("Convergence loop failed"),
        None => Ok(()),
    }
}
