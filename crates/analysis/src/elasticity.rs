//! Price and revenue elasticity of demand across fee transitions.
//!
//! Two point estimators are available:
//!
//! - **Simple average**: `mean(%Δvolume) / mean(%Δfee)` and the same ratio for
//!   revenue.
//! - **OLS**: the coefficient on `%Δfee` in a least-squares fit of `%Δvolume`
//!   (resp. `%Δrevenue`), optionally controlling for a time trend and the start
//!   weekday of each period.
//!
//! [`ElasticityEstimator`] wraps either one with a bootstrap interval.

use chrono::Weekday;
use fee_analysis_core::stats::mean;
use fee_analysis_core::{
    AnalysisError, AnalysisResult, ElasticityConfig, ElasticityControls, ElasticityMethod,
    ElasticityResult, PeriodTransition, RegressionCoefficient,
};
use tracing::{debug, info};

use crate::bootstrap::{BootstrapDistribution, BootstrapResampler};
use crate::regression::ols_fit;

const FEE_CHANGE_REGRESSOR: &str = "pct_change_fee_bps";
const TIME_TREND_REGRESSOR: &str = "time_trend";

/// Point estimate from one set of observations.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticityPoint {
    pub ped: f64,
    pub revenue_elasticity: f64,
    /// R² of the volume model (OLS only).
    pub r_squared: Option<f64>,
    pub intercept: Option<f64>,
    pub coefficients: Vec<RegressionCoefficient>,
}

/// Ratio-of-means elasticity over the valid observations in `transitions`.
///
/// Rows failing [`PeriodTransition::is_valid_observation`] are ignored.
///
/// # Errors
/// * [`AnalysisError::InsufficientData`] with no valid observation
/// * [`AnalysisError::Degenerate`] when the mean fee change is zero
pub fn simple_average(transitions: &[&PeriodTransition]) -> AnalysisResult<ElasticityPoint> {
    let valid: Vec<&PeriodTransition> = transitions
        .iter()
        .copied()
        .filter(|t| t.is_valid_observation())
        .collect();
    let (fee, volume, revenue) = changes(&valid);

    let mean_fee = mean(&fee).ok_or(AnalysisError::insufficient("simple_average", 1, 0))?;
    if mean_fee == 0.0 {
        return Err(AnalysisError::degenerate(
            "simple_average",
            "mean fee change is zero",
        ));
    }
    let mean_volume = mean(&volume).unwrap_or(0.0);
    let mean_revenue = mean(&revenue).unwrap_or(0.0);

    Ok(ElasticityPoint {
        ped: mean_volume / mean_fee,
        revenue_elasticity: mean_revenue / mean_fee,
        r_squared: None,
        intercept: None,
        coefficients: Vec::new(),
    })
}

/// Least-squares elasticity over the rows of `transitions` that carry all
/// three percentage changes. Rows where the fee did not move stay in the fit.
///
/// The design holds the fee change first, then the time trend index when
/// enabled, then one indicator per start weekday present (the earliest weekday
/// in the week is the baseline and gets no column).
///
/// # Errors
/// * [`AnalysisError::InsufficientData`] unless observations exceed parameters
/// * [`AnalysisError::Degenerate`] for a singular design
pub fn ols(
    transitions: &[&PeriodTransition],
    controls: ElasticityControls,
) -> AnalysisResult<ElasticityPoint> {
    let valid: Vec<&PeriodTransition> = transitions
        .iter()
        .copied()
        .filter(|t| t.has_changes())
        .collect();
    let (names, rows) = design(&valid, controls);
    let (_, volume, revenue) = changes(&valid);

    let volume_fit = ols_fit(&rows, &volume)?;
    let revenue_fit = ols_fit(&rows, &revenue)?;

    let coefficients = names
        .into_iter()
        .zip(&volume_fit.coefficients)
        .map(|(name, estimate)| RegressionCoefficient {
            name,
            estimate: *estimate,
        })
        .collect();

    Ok(ElasticityPoint {
        ped: volume_fit.coefficients[0],
        revenue_elasticity: revenue_fit.coefficients[0],
        r_squared: Some(volume_fit.r_squared),
        intercept: Some(volume_fit.intercept),
        coefficients,
    })
}

/// Fee, volume and revenue percentage changes of the rows that carry all three.
fn changes(transitions: &[&PeriodTransition]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut fee = Vec::with_capacity(transitions.len());
    let mut volume = Vec::with_capacity(transitions.len());
    let mut revenue = Vec::with_capacity(transitions.len());

    for t in transitions {
        if let (Some(f), Some(v), Some(r)) =
            (t.pct_change_fee_bps, t.pct_change_volume, t.pct_change_revenue)
        {
            fee.push(f);
            volume.push(v);
            revenue.push(r);
        }
    }
    (fee, volume, revenue)
}

fn design(
    transitions: &[&PeriodTransition],
    controls: ElasticityControls,
) -> (Vec<String>, Vec<Vec<f64>>) {
    let mut names = vec![FEE_CHANGE_REGRESSOR.to_string()];
    if controls.time_trend {
        names.push(TIME_TREND_REGRESSOR.to_string());
    }

    let mut weekdays: Vec<Weekday> = Vec::new();
    if controls.day_of_week {
        weekdays = transitions.iter().map(|t| t.start_day_of_week).collect();
        weekdays.sort_by_key(Weekday::num_days_from_monday);
        weekdays.dedup();
        // Baseline category.
        if !weekdays.is_empty() {
            weekdays.remove(0);
        }
        names.extend(
            weekdays
                .iter()
                .map(|d| format!("dow_{}", d.to_string().to_lowercase())),
        );
    }

    let rows = transitions
        .iter()
        .map(|t| {
            let mut row = vec![t.pct_change_fee_bps.unwrap_or(0.0)];
            if controls.time_trend {
                row.push(f64::from(t.time_trend_index));
            }
            row.extend(
                weekdays
                    .iter()
                    .map(|d| if t.start_day_of_week == *d { 1.0 } else { 0.0 }),
            );
            row
        })
        .collect();

    (names, rows)
}

/// Elasticity estimator with bootstrap confidence intervals.
#[derive(Debug, Clone)]
pub struct ElasticityEstimator {
    config: ElasticityConfig,
}

impl ElasticityEstimator {
    /// Creates a new estimator with the given configuration.
    #[must_use]
    pub fn new(config: ElasticityConfig) -> Self {
        Self { config }
    }

    /// Creates an estimator using the simple average and default bootstrap.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ElasticityConfig::default())
    }

    /// Returns the estimator configuration.
    #[must_use]
    pub fn config(&self) -> &ElasticityConfig {
        &self.config
    }

    fn admits(&self, transition: &PeriodTransition) -> bool {
        match self.config.method {
            ElasticityMethod::SimpleAverage => transition.is_valid_observation(),
            ElasticityMethod::Ols => transition.has_changes(),
        }
    }

    /// Point estimate with the configured method, no interval.
    ///
    /// # Errors
    /// Propagates the method's insufficiency or degeneracy.
    pub fn point_estimate(
        &self,
        transitions: &[&PeriodTransition],
    ) -> AnalysisResult<ElasticityPoint> {
        match self.config.method {
            ElasticityMethod::SimpleAverage => simple_average(transitions),
            ElasticityMethod::Ols => ols(transitions, self.config.controls),
        }
    }

    /// Estimates PED and revenue elasticity with bootstrap intervals.
    ///
    /// Rows the configured method cannot use are excluded before anything
    /// else: [`PeriodTransition::is_valid_observation`] for the simple
    /// average, [`PeriodTransition::has_changes`] for OLS.
    ///
    /// # Errors
    /// * [`AnalysisError::InsufficientData`] with fewer valid observations
    ///   than `min_transitions`, or when no resample yields an estimate
    /// * [`AnalysisError::Degenerate`] when the point estimate is undefined
    pub fn estimate(&self, transitions: &[PeriodTransition]) -> AnalysisResult<ElasticityResult> {
        let valid: Vec<&PeriodTransition> =
            transitions.iter().filter(|t| self.admits(t)).collect();
        debug!(
            total = transitions.len(),
            valid = valid.len(),
            "Elasticity observations"
        );

        if valid.len() < self.config.min_transitions {
            return Err(AnalysisError::insufficient(
                "elasticity",
                self.config.min_transitions,
                valid.len(),
            ));
        }

        let point = self.point_estimate(&valid)?;

        let resampler = BootstrapResampler::new(self.config.bootstrap.clone());
        let estimates: Vec<(f64, f64)> = resampler.run(&valid, |sample| {
            let rows: Vec<&PeriodTransition> = sample.iter().map(|t| **t).collect();
            self.point_estimate(&rows)
                .ok()
                .map(|p| (p.ped, p.revenue_elasticity))
        });
        let n_bootstrap_samples = estimates.len();
        let (ped_samples, revenue_samples): (Vec<f64>, Vec<f64>) =
            estimates.into_iter().unzip();

        let level = self.config.bootstrap.confidence_level;
        let ped_dist = BootstrapDistribution::from_samples(point.ped, ped_samples, level)
            .ok_or(AnalysisError::insufficient("bootstrap", 1, 0))?;
        let revenue_dist =
            BootstrapDistribution::from_samples(point.revenue_elasticity, revenue_samples, level)
                .ok_or(AnalysisError::insufficient("bootstrap", 1, 0))?;

        let (fee, volume, revenue) = changes(&valid);

        info!(
            method = %self.config.method,
            ped = point.ped,
            ci_low = ped_dist.ci_lower,
            ci_high = ped_dist.ci_upper,
            n_observations = valid.len(),
            n_bootstrap_samples,
            "Estimated price elasticity"
        );

        Ok(ElasticityResult {
            method: self.config.method,
            price_elasticity_of_demand: point.ped,
            revenue_elasticity: point.revenue_elasticity,
            r_squared: point.r_squared,
            ci_low: ped_dist.ci_lower,
            ci_high: ped_dist.ci_upper,
            revenue_ci_low: revenue_dist.ci_lower,
            revenue_ci_high: revenue_dist.ci_upper,
            confidence_level: level,
            n_observations: valid.len(),
            n_bootstrap_samples,
            mean_fee_change_pct: mean(&fee).unwrap_or(0.0),
            mean_volume_change_pct: mean(&volume).unwrap_or(0.0),
            mean_revenue_change_pct: mean(&revenue).unwrap_or(0.0),
            intercept: point.intercept,
            coefficients: point.coefficients,
            ped_distribution: ped_dist.distribution,
        })
    }
}

impl Default for ElasticityEstimator {
    fn default() -> Self {
        Self::with_defaults()
    }
}
