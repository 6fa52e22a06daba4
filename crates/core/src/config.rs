use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::ElasticityMethod;

/// Top-level configuration threaded through every analysis component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub detection: DetectionConfig,
    pub validation: ValidationConfig,
    pub elasticity: ElasticityConfig,
    pub optimal_fee: OptimalFeeConfig,
}

impl AnalysisConfig {
    /// Checks every section for out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> AnalysisResult<()> {
        self.detection.validate()?;
        self.validation.validate()?;
        self.elasticity.validate()?;
        self.optimal_fee.validate()
    }
}

/// Change-point detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum day-over-day move in a smoothed fee rate that flags a boundary (bps).
    pub change_threshold_bps: f64,
    /// Days after a boundary during which further boundaries are suppressed.
    pub settle_days: usize,
    /// Period length at which the duration term reaches its high tier.
    pub min_stable_days: usize,
    /// Period volume at which the volume term reaches its high tier (USD).
    pub high_volume_usd: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            change_threshold_bps: 1.5,
            settle_days: 2,
            min_stable_days: 5,
            high_volume_usd: 500_000.0,
        }
    }
}

impl DetectionConfig {
    /// Sets the boundary threshold in basis points.
    #[must_use]
    pub fn with_threshold(mut self, change_threshold_bps: f64) -> Self {
        self.change_threshold_bps = change_threshold_bps;
        self
    }

    /// Sets the settle window in days.
    #[must_use]
    pub fn with_settle_days(mut self, settle_days: usize) -> Self {
        self.settle_days = settle_days;
        self
    }

    fn validate(&self) -> AnalysisResult<()> {
        if !(self.change_threshold_bps.is_finite() && self.change_threshold_bps > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "detection.change_threshold_bps must be positive, got {}",
                self.change_threshold_bps
            )));
        }
        Ok(())
    }
}

/// Thresholds for comparing detected and intended fee rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Largest |delta| still considered aligned (bps).
    pub aligned_tolerance_bps: f64,
    /// Largest |delta| still considered a minor deviation (bps).
    pub minor_tolerance_bps: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            aligned_tolerance_bps: 1.0,
            minor_tolerance_bps: 3.0,
        }
    }
}

impl ValidationConfig {
    fn validate(&self) -> AnalysisResult<()> {
        if self.aligned_tolerance_bps < 0.0 || self.minor_tolerance_bps < self.aligned_tolerance_bps
        {
            return Err(AnalysisError::InvalidConfig(format!(
                "validation tolerances must satisfy 0 <= aligned ({}) <= minor ({})",
                self.aligned_tolerance_bps, self.minor_tolerance_bps
            )));
        }
        Ok(())
    }
}

/// Optional regression controls for the OLS method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticityControls {
    /// Include the transition's time-trend index as a regressor.
    pub time_trend: bool,
    /// Include day-of-week indicators for each period's start date.
    pub day_of_week: bool,
}

/// Configuration for bootstrap resampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Number of bootstrap iterations (resamples).
    pub n_iterations: usize,
    /// Confidence level for the interval (e.g., 0.95 for 95% CI).
    pub confidence_level: f64,
    /// Base seed; each resample draws from its own stream of this seed.
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            n_iterations: 1_000,
            confidence_level: 0.95,
            seed: 42,
        }
    }
}

impl BootstrapConfig {
    /// Creates a new configuration with specified parameters.
    #[must_use]
    pub fn new(n_iterations: usize, confidence_level: f64) -> Self {
        Self {
            n_iterations,
            confidence_level,
            ..Default::default()
        }
    }

    /// Sets the base seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> AnalysisResult<()> {
        if self.n_iterations == 0 {
            return Err(AnalysisError::InvalidConfig(
                "bootstrap.n_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "bootstrap.confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        Ok(())
    }
}

/// Elasticity estimation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticityConfig {
    pub method: ElasticityMethod,
    pub controls: ElasticityControls,
    pub bootstrap: BootstrapConfig,
    /// Fewest valid transitions for which an estimate is reported.
    pub min_transitions: usize,
}

impl Default for ElasticityConfig {
    fn default() -> Self {
        Self {
            method: ElasticityMethod::SimpleAverage,
            controls: ElasticityControls::default(),
            bootstrap: BootstrapConfig::default(),
            min_transitions: 2,
        }
    }
}

impl ElasticityConfig {
    /// Sets the estimation method.
    #[must_use]
    pub fn with_method(mut self, method: ElasticityMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the OLS controls.
    #[must_use]
    pub fn with_controls(mut self, controls: ElasticityControls) -> Self {
        self.controls = controls;
        self
    }

    /// Sets the bootstrap configuration.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: BootstrapConfig) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    fn validate(&self) -> AnalysisResult<()> {
        if self.min_transitions < 2 {
            return Err(AnalysisError::InvalidConfig(format!(
                "elasticity.min_transitions must be at least 2, got {}",
                self.min_transitions
            )));
        }
        self.bootstrap.validate()
    }
}

/// Allowed fee range and Monte-Carlo settings for the optimal-fee solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimalFeeConfig {
    pub min_bps: f64,
    pub max_bps: f64,
    /// Draws from the bootstrap elasticity distribution.
    pub n_draws: usize,
    pub confidence_level: f64,
    pub seed: u64,
}

impl Default for OptimalFeeConfig {
    fn default() -> Self {
        Self {
            min_bps: 1.0,
            max_bps: 50.0,
            n_draws: 100,
            confidence_level: 0.95,
            seed: 42,
        }
    }
}

impl OptimalFeeConfig {
    /// Sets the allowed fee range.
    #[must_use]
    pub fn with_range(mut self, min_bps: f64, max_bps: f64) -> Self {
        self.min_bps = min_bps;
        self.max_bps = max_bps;
        self
    }

    /// Checks the fee range is a non-empty finite interval and the confidence
    /// level lies in `(0, 1)`.
    ///
    /// # Errors
    /// Returns [`AnalysisError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> AnalysisResult<()> {
        if !(self.min_bps.is_finite() && self.max_bps.is_finite()) || self.min_bps > self.max_bps {
            return Err(AnalysisError::InvalidConfig(format!(
                "optimal_fee range [{}, {}] is empty",
                self.min_bps, self.max_bps
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "optimal_fee.confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        Ok(())
    }
}
