use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// A period paired with its immediate predecessor.
///
/// Percentage changes are in percent (100 = doubled) and are `None` when the
/// predecessor's value is zero or missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTransition {
    pub period_id: u32,
    pub start_date: NaiveDate,
    pub fee_bps: Option<f64>,
    pub prev_fee_bps: Option<f64>,
    pub volume_usd: f64,
    pub prev_volume_usd: f64,
    pub fee_revenue_usd: f64,
    pub prev_fee_revenue_usd: f64,
    pub transaction_count: u64,
    pub prev_transaction_count: u64,
    pub pct_change_fee_bps: Option<f64>,
    pub pct_change_volume: Option<f64>,
    pub pct_change_revenue: Option<f64>,
    pub avg_trade_size: Option<f64>,
    pub prev_avg_trade_size: Option<f64>,
    /// 1-based position of the transition in period order.
    pub time_trend_index: u32,
    pub start_day_of_week: Weekday,
}

impl PeriodTransition {
    /// Returns true if all three percentage changes are present. This is the
    /// inclusion rule for regression.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.pct_change_fee_bps.is_some()
            && self.pct_change_volume.is_some()
            && self.pct_change_revenue.is_some()
    }

    /// Returns true if the row can enter a ratio-of-means estimate: all three
    /// percentage changes are present and the fee actually moved.
    #[must_use]
    pub fn is_valid_observation(&self) -> bool {
        self.has_changes() && matches!(self.pct_change_fee_bps, Some(fee) if fee != 0.0)
    }
}
