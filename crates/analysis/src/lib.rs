//! Analytical engine for fee-schedule experiments.
//!
//! Data flows strictly downstream:
//! transactions → [`daily`] → [`changepoint`] → [`schedule`] →
//! [`transitions`] → {[`elasticity`], [`decomposition`]} → [`optimal_fee`].
//! [`pipeline`] wires the stages together.

pub mod bootstrap;
pub mod changepoint;
pub mod daily;
pub mod decomposition;
pub mod elasticity;
pub mod optimal_fee;
pub mod pipeline;
pub mod regression;
pub mod schedule;
pub mod transitions;

pub use bootstrap::{BootstrapDistribution, BootstrapResampler};
pub use changepoint::{check_partition, ChangePointDetector};
pub use daily::DailyMetricsAggregator;
pub use decomposition::{
    DecompositionSummary, EffectTotals, RevenueDecomposer, WaterfallComponent, WaterfallStep,
};
pub use elasticity::{ElasticityEstimator, ElasticityPoint};
pub use optimal_fee::{optimal_fee_bps, OptimalFeeSolver};
pub use pipeline::{AnalysisReport, FeeExperimentAnalysis};
pub use regression::{ols_fit, OlsFit};
pub use schedule::ScheduleValidator;
pub use transitions::build_transitions;
