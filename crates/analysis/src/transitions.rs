//! Period-to-period transition rows feeding elasticity and decomposition.

use chrono::Datelike;
use fee_analysis_core::stats::pct_change;
use fee_analysis_core::{DetectedPeriod, PeriodTransition};
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

/// Pairs each period with its predecessor, ordered by start date.
///
/// Accepts raw [`DetectedPeriod`]s or validated periods. The first period has
/// no predecessor and produces no row.
#[must_use]
pub fn build_transitions<P: AsRef<DetectedPeriod>>(periods: &[P]) -> Vec<PeriodTransition> {
    let mut ordered: Vec<&DetectedPeriod> = periods
        .iter()
        .map(AsRef::<DetectedPeriod>::as_ref)
        .collect();
    ordered.sort_by_key(|p| p.start_date);

    let transitions: Vec<PeriodTransition> = ordered
        .windows(2)
        .enumerate()
        .map(|(i, pair)| transition(pair[0], pair[1], (i + 1) as u32))
        .collect();

    let excluded = transitions
        .iter()
        .filter(|t| !t.is_valid_observation())
        .count();
    debug!(
        transitions = transitions.len(),
        excluded, "Built period transitions"
    );
    transitions
}

fn transition(prev: &DetectedPeriod, current: &DetectedPeriod, index: u32) -> PeriodTransition {
    let volume_usd = current.volume_usd.to_f64().unwrap_or(0.0);
    let prev_volume_usd = prev.volume_usd.to_f64().unwrap_or(0.0);
    let fee_revenue_usd = current.fee_revenue_usd.to_f64().unwrap_or(0.0);
    let prev_fee_revenue_usd = prev.fee_revenue_usd.to_f64().unwrap_or(0.0);

    PeriodTransition {
        period_id: current.period_id,
        start_date: current.start_date,
        fee_bps: current.detected_fee_bps,
        prev_fee_bps: prev.detected_fee_bps,
        volume_usd,
        prev_volume_usd,
        fee_revenue_usd,
        prev_fee_revenue_usd,
        transaction_count: current.transaction_count,
        prev_transaction_count: prev.transaction_count,
        pct_change_fee_bps: pct_change(current.detected_fee_bps, prev.detected_fee_bps),
        pct_change_volume: pct_change(Some(volume_usd), Some(prev_volume_usd)),
        pct_change_revenue: pct_change(Some(fee_revenue_usd), Some(prev_fee_revenue_usd)),
        avg_trade_size: current.avg_trade_size_usd(),
        prev_avg_trade_size: prev.avg_trade_size_usd(),
        time_trend_index: index,
        start_day_of_week: current.start_date.weekday(),
    }
}
