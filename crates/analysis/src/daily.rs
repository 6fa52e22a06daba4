//! Daily aggregation of raw transactions.
//!
//! Reduces transactions to one [`DailyMetric`] per UTC calendar day, sorted by
//! date, with trailing 3-day and 7-day windows over the day sequence.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use fee_analysis_core::models::transaction::fee_rate_bps;
use fee_analysis_core::stats::median;
use fee_analysis_core::{DailyMetric, Transaction};
use rust_decimal::Decimal;
use tracing::debug;

/// Trailing window length for the smoothed fee rates.
pub const SHORT_WINDOW_DAYS: usize = 3;
/// Trailing window length for volume and revenue totals.
pub const LONG_WINDOW_DAYS: usize = 7;

#[derive(Debug, Default)]
struct DayAccumulator {
    transaction_count: u64,
    volume_usd: Decimal,
    fee_revenue_usd: Decimal,
    fee_rates_bps: Vec<f64>,
}

impl DayAccumulator {
    fn add(&mut self, tx: &Transaction) {
        self.transaction_count += 1;
        self.volume_usd += tx.volume_usd;
        self.fee_revenue_usd += tx.fee_usd;
        if let Some(rate) = tx.fee_rate_bps() {
            self.fee_rates_bps.push(rate);
        }
    }
}

/// Builds the daily metric series from transactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyMetricsAggregator;

impl DailyMetricsAggregator {
    /// Aggregates transactions (in any order) into a date-sorted daily series.
    #[must_use]
    pub fn aggregate(transactions: &[Transaction]) -> Vec<DailyMetric> {
        let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
        for tx in transactions {
            days.entry(tx.date()).or_default().add(tx);
        }

        let mut metrics: Vec<DailyMetric> = days
            .into_iter()
            .map(|(date, acc)| DailyMetric {
                date,
                transaction_count: acc.transaction_count,
                volume_usd: acc.volume_usd,
                fee_revenue_usd: acc.fee_revenue_usd,
                volume_weighted_fee_bps: fee_rate_bps(acc.fee_revenue_usd, acc.volume_usd),
                median_fee_bps: median(&acc.fee_rates_bps),
                rolling_3day_vw_fee_bps: None,
                rolling_3day_median_fee_bps: None,
                rolling_7day_volume_usd: Decimal::ZERO,
                rolling_7day_fee_revenue_usd: Decimal::ZERO,
            })
            .collect();

        Self::apply_rolling_windows(&mut metrics);

        debug!(
            transactions = transactions.len(),
            days = metrics.len(),
            "Aggregated daily metrics"
        );
        metrics
    }

    fn apply_rolling_windows(metrics: &mut [DailyMetric]) {
        for i in 0..metrics.len() {
            let short = &metrics[trailing_start(i, SHORT_WINDOW_DAYS)..=i];
            let short_volume: Decimal = short.iter().map(|m| m.volume_usd).sum();
            let short_fees: Decimal = short.iter().map(|m| m.fee_revenue_usd).sum();
            let short_medians: Vec<f64> = short.iter().filter_map(|m| m.median_fee_bps).collect();
            let rolling_vw = fee_rate_bps(short_fees, short_volume);
            let rolling_median = median(&short_medians);

            let long = &metrics[trailing_start(i, LONG_WINDOW_DAYS)..=i];
            let long_volume: Decimal = long.iter().map(|m| m.volume_usd).sum();
            let long_fees: Decimal = long.iter().map(|m| m.fee_revenue_usd).sum();

            let day = &mut metrics[i];
            day.rolling_3day_vw_fee_bps = rolling_vw;
            day.rolling_3day_median_fee_bps = rolling_median;
            day.rolling_7day_volume_usd = long_volume;
            day.rolling_7day_fee_revenue_usd = long_fees;
        }
    }
}

/// First index of a trailing window of `len` entries ending at `i`.
fn trailing_start(i: usize, len: usize) -> usize {
    (i + 1).saturating_sub(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    // ============================================================
    // Test Helpers
    // ============================================================

    fn tx(day: u32, hour: u32, volume: Decimal, fee: Decimal) -> Transaction {
        Transaction::new(
            Utc.with_ymd_and_hms(2025, 8, day, hour, 0, 0).unwrap(),
            volume,
            fee,
        )
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, day).unwrap()
    }

    // ============================================================
    // Aggregation
    // ============================================================

    #[test]
    fn empty_input_yields_no_days() {
        assert!(DailyMetricsAggregator::aggregate(&[]).is_empty());
    }

    #[test]
    fn unsorted_input_is_grouped_and_sorted_by_day() {
        let txs = vec![
            tx(3, 9, dec!(1000), dec!(1)),
            tx(1, 9, dec!(1000), dec!(1)),
            tx(3, 18, dec!(3000), dec!(3)),
            tx(2, 12, dec!(2000), dec!(2)),
        ];

        let days = DailyMetricsAggregator::aggregate(&txs);

        assert_eq!(
            days.iter().map(|d| d.date).collect::<Vec<_>>(),
            vec![date(1), date(2), date(3)]
        );
        assert_eq!(days[2].transaction_count, 2);
        assert_eq!(days[2].volume_usd, dec!(4000));
        assert_eq!(days[2].fee_revenue_usd, dec!(4));
    }

    #[test]
    fn volume_weighted_and_median_fee_rates() {
        // 10 bps on 1,000 and 30 bps on 3,000 and 20 bps on 1,000
        let txs = vec![
            tx(1, 1, dec!(1000), dec!(1)),
            tx(1, 2, dec!(3000), dec!(9)),
            tx(1, 3, dec!(1000), dec!(2)),
        ];

        let days = DailyMetricsAggregator::aggregate(&txs);
        let day = &days[0];

        // (10*1000 + 30*3000 + 20*1000) / 5000 = 24
        assert!((day.volume_weighted_fee_bps.unwrap() - 24.0).abs() < 1e-9);
        assert!((day.median_fee_bps.unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn zero_volume_day_has_null_fee_rates() {
        let txs = vec![tx(1, 1, Decimal::ZERO, Decimal::ZERO)];

        let days = DailyMetricsAggregator::aggregate(&txs);

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].volume_weighted_fee_bps, None);
        assert_eq!(days[0].median_fee_bps, None);
        assert_eq!(days[0].rolling_3day_vw_fee_bps, None);
    }

    // ============================================================
    // Rolling Windows
    // ============================================================

    #[test]
    fn rolling_windows_use_partial_windows_early() {
        let txs: Vec<Transaction> = (1..=8)
            .map(|d| tx(d, 12, dec!(1000) * Decimal::from(d), Decimal::from(d)))
            .collect();

        let days = DailyMetricsAggregator::aggregate(&txs);

        assert_eq!(days[0].rolling_7day_volume_usd, dec!(1000));
        assert_eq!(days[1].rolling_7day_volume_usd, dec!(3000));
        // Days 1..=7 → 28,000; day 8 drops day 1 → 35,000
        assert_eq!(days[6].rolling_7day_volume_usd, dec!(28000));
        assert_eq!(days[7].rolling_7day_volume_usd, dec!(35000));
        assert_eq!(days[7].rolling_7day_fee_revenue_usd, dec!(35));
    }

    #[test]
    fn rolling_3day_fee_rates_are_trailing() {
        let txs = vec![
            tx(1, 12, dec!(1000), dec!(1)),
            tx(2, 12, dec!(1000), dec!(1)),
            tx(3, 12, dec!(1000), dec!(1)),
            tx(4, 12, dec!(1000), dec!(4)),
        ];

        let days = DailyMetricsAggregator::aggregate(&txs);

        assert!((days[2].rolling_3day_vw_fee_bps.unwrap() - 10.0).abs() < 1e-9);
        // Days 2..=4: (1 + 1 + 4) / 3000 * 10_000 = 20
        assert!((days[3].rolling_3day_vw_fee_bps.unwrap() - 20.0).abs() < 1e-9);
        // Medians of 10, 10, 40
        assert!((days[3].rolling_3day_median_fee_bps.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn trailing_start_clamps_at_zero() {
        assert_eq!(trailing_start(0, 3), 0);
        assert_eq!(trailing_start(1, 3), 0);
        assert_eq!(trailing_start(2, 3), 0);
        assert_eq!(trailing_start(5, 3), 3);
    }
}
