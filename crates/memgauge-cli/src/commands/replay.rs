//! Replay command - Run a recorded usage trace against a limit.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;

use memgauge::Memgauge;
use memgauge_core::{MemoryUsage, MeterConfig};
use memgauge_observe::ExecutionReport;

use crate::OutputFormat;

/// Arguments for the replay command.
#[derive(Args)]
pub struct ReplayArgs {
    /// JSON file holding an array of {"kind": ..., "amount": ...} records
    #[arg(required = true)]
    pub trace: PathBuf,

    /// Memory limit (overrides the config file)
    #[arg(short, long)]
    pub limit: Option<u64>,

    /// Show per-kind metrics
    #[arg(long)]
    pub metrics: bool,
}

/// Parse a usage trace.
fn parse_trace(text: &str) -> Result<Vec<MemoryUsage>> {
    serde_json::from_str(text).context("Trace must be a JSON array of usage records")
}

/// Replay `usages` against a fresh meter built from `config`.
fn replay(config: MeterConfig, name: &str, usages: Vec<MemoryUsage>) -> Result<ExecutionReport> {
    let runtime = Memgauge::builder()
        .with_config(config)
        .with_logging()
        .build()
        .context("Failed to create runtime")?;

    tracing::info!(trace = %name, records = usages.len(), "Replaying trace");
    Ok(runtime.replay(name, usages))
}

/// Fail if the replayed trace did not fit.
fn ensure_within_limit(report: &ExecutionReport) -> Result<()> {
    if !report.is_success() {
        bail!(
            "Trace exceeds the memory limit of {} units",
            report.totals.limit
        );
    }
    Ok(())
}

fn print_metrics(report: &ExecutionReport) {
    println!("\nMetrics:");
    println!("  Records: {}", report.metrics.total_records);
    for (kind, metrics) in &report.metrics.usage {
        println!(
            "  {:<18} records={} amount={} largest={}",
            kind.as_str(),
            metrics.records,
            metrics.amount,
            metrics.largest
        );
    }
    println!("  Rejections: {}", report.metrics.rejections.count);
}

/// Execute the replay command.
pub fn execute(
    args: ReplayArgs,
    config: Option<&Path>,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let mut config = super::load_config(config)?;
    if let Some(limit) = args.limit {
        config.limit = limit;
    }

    let text = std::fs::read_to_string(&args.trace)
        .with_context(|| format!("Failed to read {}", args.trace.display()))?;
    let usages = parse_trace(&text)?;

    let name = args.trace.display().to_string();
    let report = replay(config, &name, usages)?;

    match format {
        OutputFormat::Human => {
            if report.is_success() {
                if !quiet {
                    println!(
                        "Trace fits: {} / {} units in {} records",
                        report.totals.total, report.totals.limit, report.totals.records
                    );
                }
            } else {
                println!("{}", report.to_text());
            }
            if args.metrics {
                print_metrics(&report);
            }
        }
        OutputFormat::Json | OutputFormat::JsonCompact => {
            println!("{}", format.json(&report)?);
        }
    }

    ensure_within_limit(&report)
}
