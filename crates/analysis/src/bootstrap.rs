//! Bootstrap resampling with per-resample deterministic seeding.
//!
//! Every resample `i` draws from its own ChaCha8 stream `i` of the configured
//! seed, so results are identical regardless of how rayon schedules the work.
//!
//! # Example
//!
//! ```ignore
//! use fee_analysis_engine::bootstrap::BootstrapResampler;
//! use fee_analysis_core::BootstrapConfig;
//!
//! let resampler = BootstrapResampler::new(BootstrapConfig::default().with_seed(7));
//! let means = resampler.run(&values, |sample| {
//!     Some(sample.iter().copied().sum::<f64>() / sample.len() as f64)
//! });
//! ```

use fee_analysis_core::stats::{mean, percentile_ci, sort_floats};
use fee_analysis_core::BootstrapConfig;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Deterministic generator for draw `index` under `seed`.
#[must_use]
pub fn stream_rng(seed: u64, index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(index as u64);
    rng
}

/// Summary of a bootstrap distribution for one statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapDistribution {
    /// Statistic on the original sample.
    pub point_estimate: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub standard_error: f64,
    /// Mean of bootstrap estimates minus the point estimate.
    pub bias: f64,
    /// Sorted bootstrap estimates.
    pub distribution: Vec<f64>,
}

impl BootstrapDistribution {
    /// Builds a summary from raw bootstrap estimates.
    ///
    /// Returns `None` when no resample produced an estimate.
    #[must_use]
    pub fn from_samples(
        point_estimate: f64,
        mut samples: Vec<f64>,
        confidence_level: f64,
    ) -> Option<Self> {
        sort_floats(&mut samples);
        let (ci_lower, ci_upper) = percentile_ci(&samples, confidence_level)?;
        let sample_mean = mean(&samples)?;
        let variance = samples
            .iter()
            .map(|x| (x - sample_mean).powi(2))
            .sum::<f64>()
            / (samples.len() - 1).max(1) as f64;

        Some(Self {
            point_estimate,
            ci_lower,
            ci_upper,
            standard_error: variance.sqrt(),
            bias: sample_mean - point_estimate,
            distribution: samples,
        })
    }

    /// Width of the confidence interval.
    #[must_use]
    pub fn ci_width(&self) -> f64 {
        self.ci_upper - self.ci_lower
    }
}

/// Resamples observations with replacement.
#[derive(Debug, Clone)]
pub struct BootstrapResampler {
    config: BootstrapConfig,
}

impl BootstrapResampler {
    /// Creates a new resampler with the given configuration.
    #[must_use]
    pub fn new(config: BootstrapConfig) -> Self {
        Self { config }
    }

    /// Creates a resampler with 1,000 resamples at 95% confidence.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(BootstrapConfig::default())
    }

    /// Returns the resampler configuration.
    #[must_use]
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Draws `n` indices from `[0, n)` with replacement for resample `index`.
    #[must_use]
    pub fn resample_indices(&self, n: usize, index: usize) -> Vec<usize> {
        if n == 0 {
            return Vec::new();
        }
        let mut rng = stream_rng(self.config.seed, index);
        (0..n).map(|_| rng.gen_range(0..n)).collect()
    }

    /// Builds resample `index` of `observations`.
    #[must_use]
    pub fn resample<'a, T>(&self, observations: &'a [T], index: usize) -> Vec<&'a T> {
        self.resample_indices(observations.len(), index)
            .into_iter()
            .map(|i| &observations[i])
            .collect()
    }

    /// Evaluates `statistic` on every resample in parallel.
    ///
    /// Resamples where the statistic is undefined (`None`) are dropped. The
    /// surviving estimates are returned in resample-index order.
    pub fn run<T, S, F>(&self, observations: &[T], statistic: F) -> Vec<S>
    where
        T: Sync,
        S: Send,
        F: Fn(&[&T]) -> Option<S> + Sync,
    {
        if observations.is_empty() {
            return Vec::new();
        }

        let estimates: Vec<S> = (0..self.config.n_iterations)
            .into_par_iter()
            .filter_map(|i| statistic(&self.resample(observations, i)))
            .collect();

        let dropped = self.config.n_iterations - estimates.len();
        if dropped > 0 {
            debug!(
                dropped,
                iterations = self.config.n_iterations,
                "Bootstrap resamples with undefined statistic"
            );
        }
        estimates
    }
}

impl Default for BootstrapResampler {
    fn default() -> Self {
        Self::with_defaults()
    }
}
