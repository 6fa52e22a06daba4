//! Analyze command.
//!
//! Runs the full pipeline and emits the report as JSON.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use fee_analysis_core::{AnalysisConfig, ElasticityMethod};
use fee_analysis_engine::{AnalysisReport, FeeExperimentAnalysis};
use tracing::info;

use crate::io;

/// Arguments for the analyze command.
#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Transactions CSV (timestamp,volume_usd,fee_usd)
    #[arg(short, long)]
    pub transactions: String,

    /// Intended schedule CSV (start_date,end_date,intended_fee_bps)
    #[arg(short, long)]
    pub schedule: Option<String>,

    /// Elasticity method (overrides config)
    /// Valid values: simple_average, ols
    #[arg(long)]
    pub method: Option<String>,

    /// Lowest recommendable fee in basis points (overrides config)
    #[arg(long)]
    pub min_bps: Option<f64>,

    /// Highest recommendable fee in basis points (overrides config)
    #[arg(long)]
    pub max_bps: Option<f64>,

    /// Bootstrap and Monte-Carlo seed (overrides config)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

pub fn run(args: &AnalyzeArgs, config: AnalysisConfig) -> Result<()> {
    let config = apply_overrides(config, args)?;

    let transactions = io::load_transactions(&args.transactions)?;
    let schedule = match &args.schedule {
        Some(path) => io::load_schedule(path)?,
        None => Vec::new(),
    };

    let report = FeeExperimentAnalysis::new(config)?.run(&transactions, &schedule);
    log_summary(&report);

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {path}"))?;
            info!(path = %path, "Wrote analysis report");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Applies command-line overrides on top of the loaded configuration.
///
/// # Errors
/// Returns an error for an unknown method or an invalid resulting config.
pub fn apply_overrides(mut config: AnalysisConfig, args: &AnalyzeArgs) -> Result<AnalysisConfig> {
    if let Some(method) = &args.method {
        let method: ElasticityMethod = method.parse().map_err(|e: String| anyhow!(e))?;
        config.elasticity.method = method;
    }
    if args.min_bps.is_some() || args.max_bps.is_some() {
        let min = args.min_bps.unwrap_or(config.optimal_fee.min_bps);
        let max = args.max_bps.unwrap_or(config.optimal_fee.max_bps);
        config.optimal_fee = config.optimal_fee.with_range(min, max);
    }
    if let Some(seed) = args.seed {
        config.elasticity.bootstrap.seed = seed;
        config.optimal_fee.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn log_summary(report: &AnalysisReport) {
    info!(
        days = report.daily.len(),
        periods = report.periods.len(),
        transitions = report.transitions.len(),
        "Analysis finished"
    );
    if let Some(e) = &report.elasticity {
        info!(
            method = %e.method,
            ped = %format!("{:.3}", e.price_elasticity_of_demand),
            ci = %format!("[{:.3}, {:.3}]", e.ci_low, e.ci_high),
            "Price elasticity of demand"
        );
    }
    if let Some(o) = &report.optimal_fee {
        info!(
            current_bps = o.current_fee_bps,
            optimal_bps = %format!("{:.2}", o.optimal_fee_bps),
            ci = %format!("[{:.2}, {:.2}]", o.ci_low, o.ci_high),
            "Recommended fee"
        );
    }
    for note in &report.notes {
        info!(note = %note, "Stage skipped");
    }
}
