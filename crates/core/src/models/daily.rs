use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One calendar day of aggregated transaction activity.
///
/// Rolling fields use trailing windows over the sorted day sequence; the
/// earliest days use whatever shorter window is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetric {
    pub date: NaiveDate,
    /// Number of transactions on this day.
    pub transaction_count: u64,
    pub volume_usd: Decimal,
    pub fee_revenue_usd: Decimal,
    /// Σ(rate × volume) / Σ volume; `None` when the day's volume is zero.
    pub volume_weighted_fee_bps: Option<f64>,
    /// Median of per-transaction fee rates.
    pub median_fee_bps: Option<f64>,
    pub rolling_3day_vw_fee_bps: Option<f64>,
    pub rolling_3day_median_fee_bps: Option<f64>,
    pub rolling_7day_volume_usd: Decimal,
    pub rolling_7day_fee_revenue_usd: Decimal,
}
