//! Additive attribution of period-over-period revenue changes.
//!
//! For each transition `t`:
//!
//! ```text
//! fee_rate_effect = (fee_t - fee_{t-1}) / 10_000 * volume_{t-1}
//! volume_effect   = fee_{t-1} / 10_000 * (volume_t - volume_{t-1})
//! mix_effect      = (avg_size_t - avg_size_{t-1}) * count_t * fee_t / 10_000
//! external_effect = delta_revenue - (fee_rate + volume + mix)
//! ```
//!
//! The external effect is a residual, so the four effects always sum to the
//! observed revenue change. A transition missing either fee rate has no
//! defined fee or volume effect and is left out.

use chrono::NaiveDate;
use fee_analysis_core::{DecompositionResult, PeriodTransition};
use serde::{Deserialize, Serialize};
use tracing::debug;

const BPS_PER_UNIT: f64 = 10_000.0;

/// Running or final sums of each effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectTotals {
    pub fee_rate_effect: f64,
    pub volume_effect: f64,
    pub mix_effect: f64,
    pub external_effect: f64,
    pub total_delta_revenue: f64,
}

impl EffectTotals {
    fn add(self, r: &DecompositionResult) -> Self {
        Self {
            fee_rate_effect: self.fee_rate_effect + r.fee_rate_effect,
            volume_effect: self.volume_effect + r.volume_effect,
            mix_effect: self.mix_effect + r.mix_effect,
            external_effect: self.external_effect + r.external_effect,
            total_delta_revenue: self.total_delta_revenue + r.total_delta_revenue,
        }
    }
}

/// Bar in a revenue waterfall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterfallComponent {
    PreviousRevenue,
    FeeRateEffect,
    VolumeEffect,
    MixEffect,
    ExternalEffect,
    CurrentRevenue,
}

impl std::fmt::Display for WaterfallComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WaterfallComponent::PreviousRevenue => "previous_revenue",
            WaterfallComponent::FeeRateEffect => "fee_rate_effect",
            WaterfallComponent::VolumeEffect => "volume_effect",
            WaterfallComponent::MixEffect => "mix_effect",
            WaterfallComponent::ExternalEffect => "external_effect",
            WaterfallComponent::CurrentRevenue => "current_revenue",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallStep {
    pub period_id: u32,
    pub period_start_date: NaiveDate,
    pub component: WaterfallComponent,
    pub value: f64,
    /// Revenue level after this step.
    pub cumulative: f64,
    pub is_total: bool,
}

/// Per-transition decompositions with multi-period aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionSummary {
    pub transitions: Vec<DecompositionResult>,
    /// Transitions left out because a fee rate was missing.
    pub excluded_period_ids: Vec<u32>,
    /// Effect sums through each transition, aligned with `transitions`.
    pub cumulative: Vec<EffectTotals>,
    pub totals: EffectTotals,
    /// Shares of the total change in percent; `None` when it is zero.
    pub overall_fee_rate_pct: Option<f64>,
    pub overall_volume_pct: Option<f64>,
    pub overall_mix_pct: Option<f64>,
    pub overall_external_pct: Option<f64>,
    pub waterfall: Vec<WaterfallStep>,
}

/// Splits revenue changes into fee rate, volume, mix and external effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevenueDecomposer;

impl RevenueDecomposer {
    /// Creates a decomposer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decomposes every transition with both fee rates, in input order.
    #[must_use]
    pub fn decompose(&self, transitions: &[PeriodTransition]) -> Vec<DecompositionResult> {
        transitions.iter().filter_map(decompose_one).collect()
    }

    /// Decomposes and aggregates for waterfall reporting.
    #[must_use]
    pub fn summarize(&self, transitions: &[PeriodTransition]) -> DecompositionSummary {
        let results = self.decompose(transitions);
        let excluded_period_ids: Vec<u32> = transitions
            .iter()
            .filter(|t| t.fee_bps.is_none() || t.prev_fee_bps.is_none())
            .map(|t| t.period_id)
            .collect();

        let cumulative: Vec<EffectTotals> = results
            .iter()
            .scan(EffectTotals::default(), |acc, r| {
                *acc = acc.add(r);
                Some(*acc)
            })
            .collect();
        let totals = cumulative.last().copied().unwrap_or_default();
        let share = |effect: f64| share_of(effect, totals.total_delta_revenue);

        debug!(
            transitions = results.len(),
            excluded = excluded_period_ids.len(),
            total_delta_revenue = totals.total_delta_revenue,
            "Summarized revenue decomposition"
        );

        DecompositionSummary {
            waterfall: results.iter().flat_map(waterfall_steps).collect(),
            overall_fee_rate_pct: share(totals.fee_rate_effect),
            overall_volume_pct: share(totals.volume_effect),
            overall_mix_pct: share(totals.mix_effect),
            overall_external_pct: share(totals.external_effect),
            transitions: results,
            excluded_period_ids,
            cumulative,
            totals,
        }
    }
}

fn decompose_one(t: &PeriodTransition) -> Option<DecompositionResult> {
    let (Some(fee), Some(prev_fee)) = (t.fee_bps, t.prev_fee_bps) else {
        debug!(period_id = t.period_id, "Skipping decomposition without fee rates");
        return None;
    };
    let total = t.fee_revenue_usd - t.prev_fee_revenue_usd;

    let fee_rate_effect = (fee - prev_fee) / BPS_PER_UNIT * t.prev_volume_usd;
    let volume_effect = prev_fee / BPS_PER_UNIT * (t.volume_usd - t.prev_volume_usd);

    let mix_effect = match (t.avg_trade_size, t.prev_avg_trade_size) {
        (Some(avg), Some(prev_avg)) if t.transaction_count > 0 && prev_avg > 0.0 => {
            (avg - prev_avg) * t.transaction_count as f64 * fee / BPS_PER_UNIT
        }
        _ => 0.0,
    };

    let external_effect = total - (fee_rate_effect + volume_effect + mix_effect);

    Some(DecompositionResult {
        period_id: t.period_id,
        period_start_date: t.start_date,
        fee_rate_effect,
        volume_effect,
        mix_effect,
        external_effect,
        total_delta_revenue: total,
        prev_revenue: t.prev_fee_revenue_usd,
        current_revenue: t.fee_revenue_usd,
        fee_rate_pct: share_of(fee_rate_effect, total),
        volume_pct: share_of(volume_effect, total),
        mix_pct: share_of(mix_effect, total),
        external_pct: share_of(external_effect, total),
    })
}

fn share_of(effect: f64, total: f64) -> Option<f64> {
    (total != 0.0).then(|| effect / total * 100.0)
}

fn waterfall_steps(r: &DecompositionResult) -> Vec<WaterfallStep> {
    let step = |component, value, cumulative, is_total| WaterfallStep {
        period_id: r.period_id,
        period_start_date: r.period_start_date,
        component,
        value,
        cumulative,
        is_total,
    };

    let mut level = r.prev_revenue;
    let mut steps = vec![step(
        WaterfallComponent::PreviousRevenue,
        r.prev_revenue,
        level,
        false,
    )];
    for (component, value) in [
        (WaterfallComponent::FeeRateEffect, r.fee_rate_effect),
        (WaterfallComponent::VolumeEffect, r.volume_effect),
        (WaterfallComponent::MixEffect, r.mix_effect),
        (WaterfallComponent::ExternalEffect, r.external_effect),
    ] {
        level += value;
        steps.push(step(component, value, level, false));
    }
    steps.push(step(
        WaterfallComponent::CurrentRevenue,
        r.current_revenue,
        r.current_revenue,
        true,
    ));
    steps
}
