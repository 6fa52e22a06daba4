//! Change-point detection over the daily fee series.
//!
//! A single left-to-right pass flags boundary days where either smoothed fee
//! rate moves by at least the configured threshold. The running count of
//! flags is the period id. Days sharing an id are folded into one
//! [`DetectedPeriod`], and lag/lead values are then read by index from the
//! finished list.
//!
//! The trailing 3-day windows take several days to absorb a single step, so a
//! flag suppresses further flags for `settle_days` entries.

use chrono::{Duration, NaiveDate};
use fee_analysis_core::stats::median;
use fee_analysis_core::{
    AnalysisError, AnalysisResult, ChangeDirection, DailyMetric, DetectionConfig, DetectedPeriod,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Tolerance for calling two detected fee rates equal.
const FLAT_EPSILON_BPS: f64 = 1e-9;

/// Members of one period before lag/lead enrichment.
#[derive(Debug)]
struct PeriodDraft {
    start_date: NaiveDate,
    daily_vw_fees: Vec<f64>,
    volume_usd: Decimal,
    fee_revenue_usd: Decimal,
    transaction_count: u64,
}

impl PeriodDraft {
    fn open(day: &DailyMetric) -> Self {
        let mut draft = Self {
            start_date: day.date,
            daily_vw_fees: Vec::new(),
            volume_usd: Decimal::ZERO,
            fee_revenue_usd: Decimal::ZERO,
            transaction_count: 0,
        };
        draft.absorb(day);
        draft
    }

    fn absorb(&mut self, day: &DailyMetric) {
        if let Some(fee) = day.volume_weighted_fee_bps {
            self.daily_vw_fees.push(fee);
        }
        self.volume_usd += day.volume_usd;
        self.fee_revenue_usd += day.fee_revenue_usd;
        self.transaction_count += day.transaction_count;
    }
}

/// Partitions a daily series into stable-fee periods.
#[derive(Debug, Clone)]
pub struct ChangePointDetector {
    config: DetectionConfig,
}

impl ChangePointDetector {
    /// Creates a new detector with the given configuration.
    #[must_use]
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Creates a detector with the default threshold and settle window.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DetectionConfig::default())
    }

    /// Returns the detection configuration.
    #[must_use]
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Returns one flag per day; `true` marks the first day of a period.
    ///
    /// Expects `days` sorted ascending by date.
    #[must_use]
    pub fn flag_boundaries(&self, days: &[DailyMetric]) -> Vec<bool> {
        let mut flags = Vec::with_capacity(days.len());
        let mut last_boundary = 0usize;

        for (i, day) in days.iter().enumerate() {
            if i == 0 {
                flags.push(true);
                continue;
            }
            let prev = &days[i - 1];
            let moved = self.exceeds(prev.rolling_3day_vw_fee_bps, day.rolling_3day_vw_fee_bps)
                || self.exceeds(
                    prev.rolling_3day_median_fee_bps,
                    day.rolling_3day_median_fee_bps,
                );
            let settled = i - last_boundary > self.config.settle_days;

            if moved && settled {
                debug!(date = %day.date, "Fee change point");
                last_boundary = i;
                flags.push(true);
            } else {
                flags.push(false);
            }
        }
        flags
    }

    /// Running count of boundary flags, i.e. the period id of each day.
    #[must_use]
    pub fn period_ids(&self, days: &[DailyMetric]) -> Vec<u32> {
        self.flag_boundaries(days)
            .into_iter()
            .scan(0u32, |count, flag| {
                if flag {
                    *count += 1;
                }
                Some(*count)
            })
            .collect()
    }

    /// Detects periods of stable fee rate.
    ///
    /// Empty input yields no periods.
    #[must_use]
    pub fn detect(&self, days: &[DailyMetric]) -> Vec<DetectedPeriod> {
        let Some(last_day) = days.last().map(|d| d.date) else {
            return Vec::new();
        };

        let flags = self.flag_boundaries(days);
        let drafts = days
            .iter()
            .zip(flags)
            .fold(Vec::<PeriodDraft>::new(), |mut drafts, (day, boundary)| {
                if boundary || drafts.is_empty() {
                    drafts.push(PeriodDraft::open(day));
                } else if let Some(current) = drafts.last_mut() {
                    current.absorb(day);
                }
                drafts
            });

        let detected_fees: Vec<Option<f64>> =
            drafts.iter().map(|d| median(&d.daily_vw_fees)).collect();

        let periods: Vec<DetectedPeriod> = drafts
            .iter()
            .enumerate()
            .map(|(i, draft)| {
                let detected_fee_bps = detected_fees[i];
                let previous_fee_bps = i.checked_sub(1).and_then(|p| detected_fees[p]);
                let next_fee_bps = detected_fees.get(i + 1).copied().flatten();
                let end_date = match drafts.get(i + 1) {
                    Some(next) => next.start_date - Duration::days(1),
                    None => last_day,
                };
                let delta_from_previous = match (detected_fee_bps, previous_fee_bps) {
                    (Some(current), Some(previous)) => Some(current - previous),
                    _ => None,
                };
                let change_direction = if i == 0 {
                    ChangeDirection::Initial
                } else {
                    direction(delta_from_previous)
                };
                let day_count = ((end_date - draft.start_date).num_days() + 1) as u32;

                DetectedPeriod {
                    period_id: (i + 1) as u32,
                    start_date: draft.start_date,
                    end_date,
                    day_count,
                    detected_fee_bps,
                    previous_fee_bps,
                    next_fee_bps,
                    delta_from_previous,
                    change_direction,
                    volume_usd: draft.volume_usd,
                    fee_revenue_usd: draft.fee_revenue_usd,
                    transaction_count: draft.transaction_count,
                    confidence_score: self.confidence_score(
                        day_count,
                        delta_from_previous,
                        draft.volume_usd,
                    ),
                }
            })
            .collect();

        info!(
            days = days.len(),
            periods = periods.len(),
            "Detected fee periods"
        );
        periods
    }

    /// Heuristic confidence in `[0, 1]` from duration, step size, and volume.
    #[must_use]
    pub fn confidence_score(
        &self,
        day_count: u32,
        delta_from_previous: Option<f64>,
        volume_usd: Decimal,
    ) -> f64 {
        let duration_term: f64 = if day_count as usize >= self.config.min_stable_days {
            0.2
        } else {
            0.05
        };
        let magnitude_term: f64 = match delta_from_previous.map(f64::abs) {
            Some(delta) if delta >= 4.0 => 0.35,
            Some(delta) if delta >= 2.0 => 0.25,
            _ => 0.1,
        };
        let volume = volume_usd.to_f64().unwrap_or(0.0);
        let volume_term: f64 = if volume >= self.config.high_volume_usd {
            0.2
        } else {
            0.1
        };

        (0.3 + duration_term + magnitude_term + volume_term).min(1.0)
    }

    fn exceeds(&self, previous: Option<f64>, current: Option<f64>) -> bool {
        match (previous, current) {
            (Some(previous), Some(current)) => {
                (current - previous).abs() >= self.config.change_threshold_bps
            }
            _ => false,
        }
    }
}

impl Default for ChangePointDetector {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn direction(delta: Option<f64>) -> ChangeDirection {
    match delta {
        Some(d) if d > FLAT_EPSILON_BPS => ChangeDirection::Increase,
        Some(d) if d < -FLAT_EPSILON_BPS => ChangeDirection::Decrease,
        _ => ChangeDirection::Flat,
    }
}

/// Verifies that `periods` tile the observed range with no gaps or overlaps.
///
/// # Errors
///
/// Returns [`AnalysisError::InvariantViolation`] naming the first offending period.
pub fn check_partition(periods: &[DetectedPeriod], last_day: NaiveDate) -> AnalysisResult<()> {
    for (i, period) in periods.iter().enumerate() {
        if period.period_id as usize != i + 1 {
            return Err(AnalysisError::InvariantViolation(format!(
                "period at position {} has id {}",
                i + 1,
                period.period_id
            )));
        }
        if period.end_date < period.start_date {
            return Err(AnalysisError::InvariantViolation(format!(
                "period {} ends before it starts",
                period.period_id
            )));
        }
        match periods.get(i + 1) {
            Some(next) if period.end_date + Duration::days(1) != next.start_date => {
                return Err(AnalysisError::InvariantViolation(format!(
                    "period {} ends {} but period {} starts {}",
                    period.period_id, period.end_date, next.period_id, next.start_date
                )));
            }
            None if period.end_date != last_day => {
                return Err(AnalysisError::InvariantViolation(format!(
                    "last period ends {} but the last observed day is {}",
                    period.end_date, last_day
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
