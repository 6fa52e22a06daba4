//! Elasticity estimates and the optimal-fee recommendation derived from them.

use serde::{Deserialize, Serialize};

/// How the point elasticity is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElasticityMethod {
    /// Ratio of mean percentage changes.
    #[default]
    SimpleAverage,
    /// Coefficient on fee change in a least-squares fit.
    Ols,
}

impl std::fmt::Display for ElasticityMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElasticityMethod::SimpleAverage => write!(f, "simple_average"),
            ElasticityMethod::Ols => write!(f, "ols"),
        }
    }
}

impl std::str::FromStr for ElasticityMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple_average" | "simple" | "average" => Ok(ElasticityMethod::SimpleAverage),
            "ols" | "regression" => Ok(ElasticityMethod::Ols),
            _ => Err(format!(
                "Invalid elasticity method: '{s}'. Valid values: simple_average, ols"
            )),
        }
    }
}

/// A named regression coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionCoefficient {
    pub name: String,
    pub estimate: f64,
}

/// Price and revenue elasticity with bootstrap intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticityResult {
    pub method: ElasticityMethod,
    pub price_elasticity_of_demand: f64,
    pub revenue_elasticity: f64,
    /// Fit quality of the volume model; OLS only.
    pub r_squared: Option<f64>,
    /// Bootstrap interval for the price elasticity.
    pub ci_low: f64,
    pub ci_high: f64,
    /// Bootstrap interval for the revenue elasticity.
    pub revenue_ci_low: f64,
    pub revenue_ci_high: f64,
    pub confidence_level: f64,
    pub n_observations: usize,
    /// Resamples that produced a defined estimate.
    pub n_bootstrap_samples: usize,
    pub mean_fee_change_pct: f64,
    pub mean_volume_change_pct: f64,
    pub mean_revenue_change_pct: f64,
    /// OLS intercept of the volume model.
    pub intercept: Option<f64>,
    /// OLS coefficients of the volume model, fee change first.
    pub coefficients: Vec<RegressionCoefficient>,
    /// Sorted bootstrap distribution of the price elasticity.
    #[serde(skip)]
    pub ped_distribution: Vec<f64>,
}

impl ElasticityResult {
    /// Returns true when demand is elastic (|PED| > 1).
    #[must_use]
    pub fn is_elastic(&self) -> bool {
        self.price_elasticity_of_demand.abs() > 1.0
    }
}

/// Shape of demand implied by a price elasticity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandRegime {
    /// PED < -1: an interior revenue optimum exists.
    Elastic,
    /// -1 <= PED < 0: revenue rises with the fee.
    Inelastic,
    /// PED >= 0: volume does not fall as the fee rises.
    NonNegative,
}

impl DemandRegime {
    /// Classifies a price elasticity.
    #[must_use]
    pub fn classify(ped: f64) -> Self {
        if ped >= 0.0 {
            DemandRegime::NonNegative
        } else if ped >= -1.0 {
            DemandRegime::Inelastic
        } else {
            DemandRegime::Elastic
        }
    }
}

/// Revenue-maximizing fee recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalFeeResult {
    pub optimal_fee_bps: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub constrained_to_range: (f64, f64),
    /// Fee the recommendation is scaled from.
    pub current_fee_bps: f64,
    pub price_elasticity_of_demand: f64,
    pub regime: DemandRegime,
    /// Volume change at the optimum under `V = V0 * (f / f0)^PED`.
    pub projected_volume_change_pct: f64,
    pub projected_revenue_change_pct: f64,
}
