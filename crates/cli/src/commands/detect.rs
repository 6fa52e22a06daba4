//! Detect command.
//!
//! Aggregates transactions to days, detects stable-fee periods, and grades
//! them against the intended schedule.

use anyhow::Result;
use clap::Args;
use fee_analysis_core::{AnalysisConfig, IntendedScheduleEntry, Transaction, ValidatedPeriod};
use fee_analysis_engine::{
    check_partition, ChangePointDetector, DailyMetricsAggregator, ScheduleValidator,
};
use tracing::{info, warn};

use crate::io;

/// Arguments for the detect command.
#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
    /// Transactions CSV (timestamp,volume_usd,fee_usd)
    #[arg(short, long)]
    pub transactions: String,

    /// Intended schedule CSV (start_date,end_date,intended_fee_bps)
    #[arg(short, long)]
    pub schedule: Option<String>,

    /// Boundary threshold in basis points (overrides config)
    #[arg(long)]
    pub threshold_bps: Option<f64>,

    /// Write the period table to this CSV file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

pub fn run(args: &DetectArgs, mut config: AnalysisConfig) -> Result<()> {
    if let Some(threshold) = args.threshold_bps {
        config.detection = config.detection.with_threshold(threshold);
        config.validate()?;
    }

    let transactions = io::load_transactions(&args.transactions)?;
    let schedule = match &args.schedule {
        Some(path) => io::load_schedule(path)?,
        None => Vec::new(),
    };

    let periods = detect_periods(&transactions, &schedule, &config);

    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            io::write_periods(file, &periods)?;
            info!(path = %path, periods = periods.len(), "Wrote period table");
        }
        None => io::write_periods(std::io::stdout().lock(), &periods)?,
    }
    Ok(())
}

fn detect_periods(
    transactions: &[Transaction],
    schedule: &[IntendedScheduleEntry],
    config: &AnalysisConfig,
) -> Vec<ValidatedPeriod> {
    let daily = DailyMetricsAggregator::aggregate(transactions);
    let detected = ChangePointDetector::new(config.detection.clone()).detect(&daily);

    if let Some(last) = daily.last() {
        if let Err(e) = check_partition(&detected, last.date) {
            warn!(error = %e, "Detected periods do not partition the range");
        }
    }

    ScheduleValidator::new(config.validation.clone()).validate(&detected, schedule)
}
