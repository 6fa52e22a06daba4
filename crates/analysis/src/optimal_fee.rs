//! Revenue-maximizing fee recommendation under constant elasticity.

use fee_analysis_core::stats::{percentile_ci, sort_floats};
use fee_analysis_core::{
    AnalysisResult, DemandRegime, ElasticityResult, OptimalFeeConfig, OptimalFeeResult,
};
use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::bootstrap::stream_rng;

/// Optimal fee for a single elasticity value, clamped to `[min_bps, max_bps]`.
///
/// Elastic demand (PED < -1) scales the current fee by `-1 / PED`. Inelastic
/// or non-negative PED has no interior optimum and recommends `max_bps`.
/// An inverted range collapses to `max_bps`.
#[must_use]
pub fn optimal_fee_bps(current_fee_bps: f64, ped: f64, min_bps: f64, max_bps: f64) -> f64 {
    match DemandRegime::classify(ped) {
        DemandRegime::Elastic => (current_fee_bps * (-1.0 / ped)).max(min_bps).min(max_bps),
        DemandRegime::Inelastic | DemandRegime::NonNegative => max_bps,
    }
}

/// Turns an elasticity estimate into a fee recommendation with an interval.
#[derive(Debug, Clone)]
pub struct OptimalFeeSolver {
    config: OptimalFeeConfig,
}

impl OptimalFeeSolver {
    /// Creates a solver after validating the configuration.
    ///
    /// # Errors
    /// Returns [`fee_analysis_core::AnalysisError::InvalidConfig`] for an
    /// empty fee range or a confidence level outside `(0, 1)`.
    pub fn new(config: OptimalFeeConfig) -> AnalysisResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Creates a solver with the default fee range and draw count.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            config: OptimalFeeConfig::default(),
        }
    }

    /// Returns the solver configuration.
    #[must_use]
    pub fn config(&self) -> &OptimalFeeConfig {
        &self.config
    }

    /// Recommends a fee relative to `current_fee_bps`.
    ///
    /// The interval comes from `n_draws` Monte-Carlo draws of the bootstrap
    /// PED distribution, each mapped through [`optimal_fee_bps`]. Without a
    /// distribution the interval collapses to the point.
    #[must_use]
    pub fn solve(&self, elasticity: &ElasticityResult, current_fee_bps: f64) -> OptimalFeeResult {
        let OptimalFeeConfig {
            min_bps, max_bps, ..
        } = self.config;
        let ped = elasticity.price_elasticity_of_demand;
        let optimal = optimal_fee_bps(current_fee_bps, ped, min_bps, max_bps);

        let mut draws = self.draw_optimal_fees(&elasticity.ped_distribution, current_fee_bps);
        sort_floats(&mut draws);
        let (ci_low, ci_high) =
            percentile_ci(&draws, self.config.confidence_level).unwrap_or((optimal, optimal));

        let (projected_volume_change_pct, projected_revenue_change_pct) =
            project(current_fee_bps, optimal, ped);

        let regime = DemandRegime::classify(ped);
        info!(
            current_fee_bps,
            optimal_fee_bps = optimal,
            ci_low,
            ci_high,
            ?regime,
            "Optimal fee"
        );

        OptimalFeeResult {
            optimal_fee_bps: optimal,
            ci_low,
            ci_high,
            constrained_to_range: (min_bps, max_bps),
            current_fee_bps,
            price_elasticity_of_demand: ped,
            regime,
            projected_volume_change_pct,
            projected_revenue_change_pct,
        }
    }

    fn draw_optimal_fees(&self, distribution: &[f64], current_fee_bps: f64) -> Vec<f64> {
        if distribution.is_empty() {
            debug!("No bootstrap distribution; optimal fee interval is the point");
            return Vec::new();
        }
        let OptimalFeeConfig {
            min_bps,
            max_bps,
            seed,
            n_draws,
            ..
        } = self.config;

        (0..n_draws)
            .into_par_iter()
            .map(|i| {
                let mut rng = stream_rng(seed, i);
                let ped = distribution[rng.gen_range(0..distribution.len())];
                optimal_fee_bps(current_fee_bps, ped, min_bps, max_bps)
            })
            .collect()
    }
}

impl Default for OptimalFeeSolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Volume and revenue change in percent when moving from `current` to
/// `proposed` under `V = V0 * (f / f0)^PED`.
fn project(current: f64, proposed: f64, ped: f64) -> (f64, f64) {
    if current <= 0.0 {
        return (0.0, 0.0);
    }
    let ratio = proposed / current;
    let volume = (ratio.powf(ped) - 1.0) * 100.0;
    let revenue = (ratio.powf(1.0 + ped) - 1.0) * 100.0;
    (volume, revenue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fee_analysis_core::{AnalysisError, ElasticityMethod};

    fn elasticity(ped: f64, distribution: Vec<f64>) -> ElasticityResult {
        ElasticityResult {
            method: ElasticityMethod::SimpleAverage,
            price_elasticity_of_demand: ped,
            revenue_elasticity: 1.0 + ped,
            r_squared: None,
            ci_low: distribution.first().copied().unwrap_or(ped),
            ci_high: distribution.last().copied().unwrap_or(ped),
            revenue_ci_low: 1.0 + ped,
            revenue_ci_high: 1.0 + ped,
            confidence_level: 0.95,
            n_observations: 2,
            n_bootstrap_samples: distribution.len(),
            mean_fee_change_pct: 0.0,
            mean_volume_change_pct: 0.0,
            mean_revenue_change_pct: 0.0,
            intercept: None,
            coefficients: Vec::new(),
            ped_distribution: distribution,
        }
    }

    // ============================================================
    // Point Formula
    // ============================================================

    #[test]
    fn inelastic_demand_recommends_max() {
        assert_eq!(optimal_fee_bps(20.0, -0.2, 1.0, 50.0), 50.0);
        assert_eq!(optimal_fee_bps(20.0, -1.0, 1.0, 50.0), 50.0);
    }

    #[test]
    fn non_negative_elasticity_recommends_max() {
        assert_eq!(optimal_fee_bps(20.0, 0.0, 1.0, 50.0), 50.0);
        assert_eq!(optimal_fee_bps(20.0, 0.8, 1.0, 50.0), 50.0);
    }

    #[test]
    fn elastic_demand_scales_current_fee() {
        assert!((optimal_fee_bps(10.0, -2.0, 1.0, 50.0) - 5.0).abs() < 1e-12);
        assert!((optimal_fee_bps(30.0, -1.5, 1.0, 50.0) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn elastic_result_is_clamped() {
        assert_eq!(optimal_fee_bps(10.0, -100.0, 1.0, 50.0), 1.0);
        assert_eq!(optimal_fee_bps(200.0, -1.5, 1.0, 50.0), 50.0);
    }

    #[test]
    fn inverted_range_does_not_panic() {
        assert_eq!(optimal_fee_bps(20.0, -2.0, 30.0, 10.0), 10.0);
        assert_eq!(optimal_fee_bps(20.0, -0.5, 30.0, 10.0), 10.0);
    }

    #[test]
    fn result_stays_in_range_across_inputs() {
        for ped in [-50.0, -3.0, -1.01, -1.0, -0.5, 0.0, 2.0] {
            for current in [0.0, 0.5, 10.0, 80.0] {
                let fee = optimal_fee_bps(current, ped, 1.0, 50.0);
                assert!((1.0..=50.0).contains(&fee), "ped={ped} current={current}");
            }
        }
    }

    // ============================================================
    // Solver
    // ============================================================

    #[test]
    fn solver_rejects_inverted_range() {
        let config = OptimalFeeConfig::default().with_range(30.0, 10.0);

        let err = OptimalFeeSolver::new(config).unwrap_err();

        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn solver_accepts_valid_range() {
        let config = OptimalFeeConfig::default().with_range(5.0, 25.0);

        let result = OptimalFeeSolver::new(config)
            .unwrap()
            .solve(&elasticity(-2.0, vec![-2.5, -2.0, -1.5]), 20.0);

        assert!((result.optimal_fee_bps - 10.0).abs() < 1e-12);
        assert_eq!(result.constrained_to_range, (5.0, 25.0));
    }

    #[test]
    fn solver_inelastic_case() {
        let result = OptimalFeeSolver::with_defaults().solve(&elasticity(-0.2, vec![-0.2]), 20.0);

        assert_eq!(result.optimal_fee_bps, 50.0);
        assert_eq!(result.regime, DemandRegime::Inelastic);
        assert_eq!(result.constrained_to_range, (1.0, 50.0));
        assert_eq!((result.ci_low, result.ci_high), (50.0, 50.0));
        assert!(result.projected_volume_change_pct < 0.0);
        assert!(result.projected_revenue_change_pct > 0.0);
    }

    #[test]
    fn solver_elastic_case_projects_changes() {
        let result = OptimalFeeSolver::with_defaults().solve(&elasticity(-2.0, vec![-2.0]), 10.0);

        assert!((result.optimal_fee_bps - 5.0).abs() < 1e-12);
        assert_eq!(result.regime, DemandRegime::Elastic);
        assert!((result.projected_volume_change_pct - 300.0).abs() < 1e-9);
        assert!((result.projected_revenue_change_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn interval_spans_distribution_draws() {
        let distribution = vec![-4.0, -3.0, -2.0, -1.5, -0.5];
        let result = OptimalFeeSolver::with_defaults().solve(&elasticity(-2.0, distribution), 10.0);

        assert!(result.ci_low <= result.optimal_fee_bps);
        assert!(result.optimal_fee_bps <= result.ci_high);
        assert!(result.ci_low >= 1.0 && result.ci_high <= 50.0);
    }

    #[test]
    fn empty_distribution_collapses_interval() {
        let result = OptimalFeeSolver::with_defaults().solve(&elasticity(-2.0, Vec::new()), 10.0);

        assert_eq!(result.ci_low, result.optimal_fee_bps);
        assert_eq!(result.ci_high, result.optimal_fee_bps);
    }

    #[test]
    fn draws_are_reproducible() {
        let solver = OptimalFeeSolver::with_defaults();
        let input = elasticity(-2.0, vec![-5.0, -3.0, -2.5, -2.0, -1.2]);

        assert_eq!(solver.solve(&input, 12.0), solver.solve(&input, 12.0));
    }

    #[test]
    fn zero_current_fee_has_flat_projection() {
        let result = OptimalFeeSolver::with_defaults().solve(&elasticity(-2.0, Vec::new()), 0.0);

        assert_eq!(result.optimal_fee_bps, 1.0);
        assert_eq!(result.projected_volume_change_pct, 0.0);
        assert_eq!(result.projected_revenue_change_pct, 0.0);
    }
}
