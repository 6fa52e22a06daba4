//! Detected fee periods, the intended schedule, and their validated join.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of the fee move that opened a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDirection {
    /// First period; nothing to compare against.
    Initial,
    Increase,
    Decrease,
    Flat,
}

impl std::fmt::Display for ChangeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeDirection::Initial => write!(f, "initial"),
            ChangeDirection::Increase => write!(f, "increase"),
            ChangeDirection::Decrease => write!(f, "decrease"),
            ChangeDirection::Flat => write!(f, "flat"),
        }
    }
}

/// A contiguous run of days sharing a stable effective fee rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPeriod {
    /// 1-based, strictly increasing with `start_date`.
    pub period_id: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Calendar days from `start_date` to `end_date`, inclusive.
    pub day_count: u32,
    /// Median of the member days' volume-weighted fee rate.
    pub detected_fee_bps: Option<f64>,
    pub previous_fee_bps: Option<f64>,
    pub next_fee_bps: Option<f64>,
    pub delta_from_previous: Option<f64>,
    pub change_direction: ChangeDirection,
    pub volume_usd: Decimal,
    pub fee_revenue_usd: Decimal,
    pub transaction_count: u64,
    /// Heuristic in `[0, 1]`.
    pub confidence_score: f64,
}

impl DetectedPeriod {
    /// Returns true if `date` falls inside the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Average volume per transaction, or `None` with no transactions.
    #[must_use]
    pub fn avg_trade_size_usd(&self) -> Option<f64> {
        if self.transaction_count == 0 {
            return None;
        }
        (self.volume_usd / Decimal::from(self.transaction_count)).to_f64()
    }
}

impl AsRef<DetectedPeriod> for DetectedPeriod {
    fn as_ref(&self) -> &DetectedPeriod {
        self
    }
}

/// One entry of the externally supplied intended fee schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntendedScheduleEntry {
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    pub intended_fee_bps: f64,
}

impl IntendedScheduleEntry {
    #[must_use]
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, intended_fee_bps: f64) -> Self {
        Self {
            start_date,
            end_date,
            intended_fee_bps,
        }
    }

    /// Returns true if `date` falls inside the entry.
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// How closely a detected period matches the intended schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStatus {
    Aligned,
    MinorDeviation,
    MajorDeviation,
    NoIntendedMatch,
}

impl std::fmt::Display for AlignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlignmentStatus::Aligned => write!(f, "aligned"),
            AlignmentStatus::MinorDeviation => write!(f, "minor_deviation"),
            AlignmentStatus::MajorDeviation => write!(f, "major_deviation"),
            AlignmentStatus::NoIntendedMatch => write!(f, "no_intended_match"),
        }
    }
}

/// A detected period annotated with its intended-schedule match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPeriod {
    #[serde(flatten)]
    pub period: DetectedPeriod,
    pub intended_fee_bps: Option<f64>,
    /// `detected_fee_bps - intended_fee_bps`.
    pub delta_bps: Option<f64>,
    pub alignment_status: AlignmentStatus,
    pub overlap_days: u32,
    pub is_partial_overlap: bool,
    pub is_missing_match: bool,
}

impl AsRef<DetectedPeriod> for ValidatedPeriod {
    fn as_ref(&self) -> &DetectedPeriod {
        &self.period
    }
}
