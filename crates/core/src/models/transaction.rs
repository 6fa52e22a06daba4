//! Raw transaction record consumed by the daily aggregator.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Basis points per unit rate.
pub const BPS_PER_UNIT: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// A single fee-bearing transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Execution time; bucketed by UTC calendar day.
    pub timestamp: DateTime<Utc>,
    /// Gross volume in USD.
    pub volume_usd: Decimal,
    /// Fee charged in USD.
    pub fee_usd: Decimal,
}

impl Transaction {
    /// Creates a new transaction record.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, volume_usd: Decimal, fee_usd: Decimal) -> Self {
        Self {
            timestamp,
            volume_usd,
            fee_usd,
        }
    }

    /// UTC calendar day of the transaction.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Effective fee rate in basis points, or `None` for zero volume.
    #[must_use]
    pub fn fee_rate_bps(&self) -> Option<f64> {
        fee_rate_bps(self.fee_usd, self.volume_usd)
    }
}

/// Computes `fee / volume * 10_000`, or `None` when volume is zero.
#[must_use]
pub fn fee_rate_bps(fee_usd: Decimal, volume_usd: Decimal) -> Option<f64> {
    if volume_usd.is_zero() {
        return None;
    }
    (fee_usd * BPS_PER_UNIT / volume_usd).to_f64()
}
