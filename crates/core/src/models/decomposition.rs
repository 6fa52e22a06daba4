use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Additive attribution of one period-over-period revenue change.
///
/// `fee_rate_effect + volume_effect + mix_effect + external_effect` equals
/// `total_delta_revenue`; the external effect is the residual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionResult {
    pub period_id: u32,
    pub period_start_date: NaiveDate,
    pub fee_rate_effect: f64,
    pub volume_effect: f64,
    pub mix_effect: f64,
    pub external_effect: f64,
    pub total_delta_revenue: f64,
    pub prev_revenue: f64,
    pub current_revenue: f64,
    /// Share of the total change, in percent; `None` when the total is zero.
    pub fee_rate_pct: Option<f64>,
    pub volume_pct: Option<f64>,
    pub mix_pct: Option<f64>,
    pub external_pct: Option<f64>,
}

impl DecompositionResult {
    /// Sum of the four effects.
    #[must_use]
    pub fn effects_sum(&self) -> f64 {
        self.fee_rate_effect + self.volume_effect + self.mix_effect + self.external_effect
    }
}
