//! End-to-end analysis of one fee experiment.
//!
//! Stages that lack data degrade to `None` with an explanatory note; nothing
//! in the pipeline aborts the report.

use fee_analysis_core::{
    AnalysisConfig, AnalysisResult, DailyMetric, ElasticityResult, IntendedScheduleEntry, OptimalFeeResult,
    PeriodTransition, Transaction, ValidatedPeriod,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::changepoint::{check_partition, ChangePointDetector};
use crate::daily::DailyMetricsAggregator;
use crate::decomposition::{DecompositionSummary, RevenueDecomposer};
use crate::elasticity::ElasticityEstimator;
use crate::optimal_fee::OptimalFeeSolver;
use crate::schedule::ScheduleValidator;
use crate::transitions::build_transitions;

/// Transitions needed before a decomposition is reported.
const MIN_DECOMPOSITION_TRANSITIONS: usize = 2;

/// Everything the pipeline produced for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub daily: Vec<DailyMetric>,
    pub periods: Vec<ValidatedPeriod>,
    pub transitions: Vec<PeriodTransition>,
    pub elasticity: Option<ElasticityResult>,
    pub optimal_fee: Option<OptimalFeeResult>,
    pub decomposition: Option<DecompositionSummary>,
    /// Why any optional stage is missing, plus invariant warnings.
    pub notes: Vec<String>,
}

/// Runs detection, validation, elasticity, optimal fee and decomposition.
#[derive(Debug, Clone, Default)]
pub struct FeeExperimentAnalysis {
    config: AnalysisConfig,
}

impl FeeExperimentAnalysis {
    /// Creates the pipeline after validating every config section.
    ///
    /// # Errors
    /// Returns [`fee_analysis_core::AnalysisError::InvalidConfig`] for the
    /// first invalid value.
    pub fn new(config: AnalysisConfig) -> AnalysisResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the validated configuration.
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    #[must_use]
    pub fn run(
        &self,
        transactions: &[Transaction],
        schedule: &[IntendedScheduleEntry],
    ) -> AnalysisReport {
        let mut notes = Vec::new();

        let daily = DailyMetricsAggregator::aggregate(transactions);
        let detected = ChangePointDetector::new(self.config.detection.clone()).detect(&daily);

        match daily.last() {
            None => notes.push("no transactions; no periods detected".to_string()),
            Some(last) => {
                if let Err(e) = check_partition(&detected, last.date) {
                    warn!(error = %e, "Detected periods do not partition the range");
                    notes.push(e.to_string());
                }
            }
        }

        if schedule.is_empty() {
            notes.push("no intended schedule supplied; periods are unmatched".to_string());
        }
        let periods =
            ScheduleValidator::new(self.config.validation.clone()).validate(&detected, schedule);

        let transitions = build_transitions(&periods);

        let elasticity = match ElasticityEstimator::new(self.config.elasticity.clone())
            .estimate(&transitions)
        {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(error = %e, "Elasticity not estimated");
                notes.push(e.to_string());
                None
            }
        };

        let current_fee = periods.last().and_then(|p| p.period.detected_fee_bps);
        let optimal_fee = match (&elasticity, current_fee) {
            (Some(elasticity), Some(current)) => {
                match OptimalFeeSolver::new(self.config.optimal_fee.clone()) {
                    Ok(solver) => Some(solver.solve(elasticity, current)),
                    Err(e) => {
                        warn!(error = %e, "Optimal fee not solved");
                        notes.push(e.to_string());
                        None
                    }
                }
            }
            (Some(_), None) => {
                notes.push("latest period has no detected fee; no optimal fee".to_string());
                None
            }
            (None, _) => None,
        };

        let decomposition = if transitions.len() >= MIN_DECOMPOSITION_TRANSITIONS {
            let summary = RevenueDecomposer::new().summarize(&transitions);
            if !summary.excluded_period_ids.is_empty() {
                notes.push(format!(
                    "revenue decomposition skipped periods {:?}: missing fee rate",
                    summary.excluded_period_ids
                ));
            }
            Some(summary)
        } else {
            notes.push(format!(
                "revenue decomposition needs {MIN_DECOMPOSITION_TRANSITIONS} transitions, found {}",
                transitions.len()
            ));
            None
        };

        info!(
            days = daily.len(),
            periods = periods.len(),
            transitions = transitions.len(),
            elasticity = elasticity.is_some(),
            optimal_fee = optimal_fee.is_some(),
            decomposition = decomposition.is_some(),
            "Fee experiment analysis complete"
        );

        AnalysisReport {
            daily,
            periods,
            transitions,
            elasticity,
            optimal_fee,
            decomposition,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_degrades_to_notes() {
        let report = FeeExperimentAnalysis::default().run(&[], &[]);

        assert!(report.daily.is_empty());
        assert!(report.periods.is_empty());
        assert!(report.elasticity.is_none());
        assert!(report.optimal_fee.is_none());
        assert!(report.decomposition.is_none());
        assert!(report.notes.iter().any(|n| n.contains("no transactions")));
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let mut config = AnalysisConfig::default();
        config.optimal_fee = config.optimal_fee.with_range(30.0, 10.0);

        let err = FeeExperimentAnalysis::new(config).unwrap_err();

        assert!(matches!(
            err,
            fee_analysis_core::AnalysisError::InvalidConfig(_)
        ));
    }
}
