//! Load command
//!
//! Runs the bronze load for every configured dataset (or a subset) and prints
//! a summary. Per-dataset problems are reported, not returned as errors.

use std::path::PathBuf;

use super::{load_config, runtime};
use crate::cli::error::CliError;
use crate::database::connector_from_config;
use crate::staging::{BronzeRunner, DatasetStatus, InsertMode, RunReport};

/// Load command arguments
#[derive(Debug, Clone)]
pub struct LoadArgs {
    /// Configuration file
    pub config: PathBuf,
    /// Restrict the run to these datasets (empty = all)
    pub datasets: Vec<String>,
    /// Skip the fast path
    pub batched: bool,
    /// Print the run report as JSON
    pub json: bool,
}

/// Run the bronze load
pub fn handle_load(args: &LoadArgs) -> Result<(), CliError> {
    let config = load_config(&args.config)?;
    let connector =
        connector_from_config(&config).map_err(|e| CliError::ConfigError(e.to_string()))?;

    let mut runner = BronzeRunner::new(connector.as_ref(), &config).select(args.datasets.clone())?;
    if args.batched {
        runner = runner.with_mode(InsertMode::Batched);
    }

    let rt = runtime()?;
    let report = rt.block_on(runner.run())?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::IoError(format!("Failed to serialize report: {}", e)))?;
        println!("{}", json);
    } else {
        print!("{}", format_summary(&report));
    }

    Ok(())
}

/// Human-readable run summary
pub fn format_summary(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Run {} -> {}\n", report.run_id, report.target));

    for dataset in &report.datasets {
        let line = match &dataset.status {
            DatasetStatus::Loaded { outcome } => {
                let mut line = format!(
                    "  {:<16} {:>8}/{:<8} inserted ({} path)",
                    dataset.name, outcome.inserted, outcome.total, outcome.path
                );
                if outcome.skipped > 0 {
                    let ranges: Vec<String> = outcome
                        .skipped_batches
                        .iter()
                        .map(|r| r.to_string())
                        .collect();
                    line.push_str(&format!(
                        ", {} skipped [rows {}]",
                        outcome.skipped,
                        ranges.join(", ")
                    ));
                }
                if let Some(reason) = &outcome.rejected_reason {
                    line.push_str(&format!(", rejected: {}", reason));
                }
                line
            }
            DatasetStatus::Missing => format!(
                "  {:<16} missing ({})",
                dataset.name,
                dataset.source.display()
            ),
            DatasetStatus::Failed { error } => {
                format!("  {:<16} failed: {}", dataset.name, error)
            }
        };
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str(&format!(
        "Total: {} inserted, {} skipped of {} rows; {} missing, {} failed\n",
        report.inserted(),
        report.skipped(),
        report.total_rows(),
        report.missing_count(),
        report.failed_count()
    ));
    out
}
