//! Validation of detected periods against the intended fee schedule.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use fee_analysis_core::{
    AlignmentStatus, DetectedPeriod, IntendedScheduleEntry, ValidatedPeriod, ValidationConfig,
};
use tracing::{debug, warn};

/// Matches detected periods to intended fee rates and grades the alignment.
#[derive(Debug, Clone)]
pub struct ScheduleValidator {
    config: ValidationConfig,
}

impl ScheduleValidator {
    /// Creates a new validator with the given tolerances.
    #[must_use]
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Creates a validator with the default alignment tolerances.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Produces one [`ValidatedPeriod`] per detected period, in the same order.
    #[must_use]
    pub fn validate(
        &self,
        periods: &[DetectedPeriod],
        schedule: &[IntendedScheduleEntry],
    ) -> Vec<ValidatedPeriod> {
        let daily = expand_schedule(schedule);

        let validated: Vec<ValidatedPeriod> = periods
            .iter()
            .map(|period| self.validate_period(period, schedule, &daily))
            .collect();

        let unmatched = validated.iter().filter(|v| v.is_missing_match).count();
        if unmatched > 0 {
            warn!(
                unmatched,
                periods = periods.len(),
                "Detected periods without an intended schedule match"
            );
        }
        validated
    }

    /// Grades a fee difference in basis points.
    #[must_use]
    pub fn classify(&self, delta_bps: Option<f64>) -> AlignmentStatus {
        match delta_bps.map(f64::abs) {
            Some(delta) if delta <= self.config.aligned_tolerance_bps => AlignmentStatus::Aligned,
            Some(delta) if delta <= self.config.minor_tolerance_bps => {
                AlignmentStatus::MinorDeviation
            }
            _ => AlignmentStatus::MajorDeviation,
        }
    }

    fn validate_period(
        &self,
        period: &DetectedPeriod,
        schedule: &[IntendedScheduleEntry],
        daily: &BTreeMap<NaiveDate, usize>,
    ) -> ValidatedPeriod {
        // (fee, overlapping days, earliest entry start) per distinct intended fee
        let mut candidates: Vec<(f64, u32, NaiveDate)> = Vec::new();
        let mut overlap_days = 0u32;

        for (_, &entry_idx) in daily.range(period.start_date..=period.end_date) {
            let entry = &schedule[entry_idx];
            overlap_days += 1;
            match candidates
                .iter_mut()
                .find(|(fee, _, _)| *fee == entry.intended_fee_bps)
            {
                Some((_, count, earliest)) => {
                    *count += 1;
                    *earliest = (*earliest).min(entry.start_date);
                }
                None => candidates.push((entry.intended_fee_bps, 1, entry.start_date)),
            }
        }

        let intended_fee_bps = candidates
            .iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.2.cmp(&a.2)))
            .map(|(fee, _, _)| *fee);

        let (delta_bps, alignment_status) = match intended_fee_bps {
            None => (None, AlignmentStatus::NoIntendedMatch),
            Some(intended) => {
                let delta = period.detected_fee_bps.map(|detected| detected - intended);
                (delta, self.classify(delta))
            }
        };

        debug!(
            period_id = period.period_id,
            ?intended_fee_bps,
            overlap_days,
            status = %alignment_status,
            "Validated period"
        );

        ValidatedPeriod {
            period: period.clone(),
            intended_fee_bps,
            delta_bps,
            alignment_status,
            overlap_days,
            is_partial_overlap: overlap_days < period.day_count,
            is_missing_match: overlap_days == 0,
        }
    }
}

impl Default for ScheduleValidator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Expands the schedule to one row per covered day.
///
/// A day covered by several entries belongs to the earliest-starting one.
fn expand_schedule(schedule: &[IntendedScheduleEntry]) -> BTreeMap<NaiveDate, usize> {
    let mut order: Vec<usize> = (0..schedule.len()).collect();
    order.sort_by_key(|&i| schedule[i].start_date);

    let mut daily = BTreeMap::new();
    for idx in order {
        let entry = &schedule[idx];
        let mut date = entry.start_date;
        while date <= entry.end_date {
            daily.entry(date).or_insert(idx);
            date += Duration::days(1);
        }
    }
    daily
}

#[cfg(test)]
mod tests {
    use super::*;
    use fee_analysis_core::ChangeDirection;
    use rust_decimal_macros::dec;

    // ============================================================
    // Test Helpers
    // ============================================================

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, day).unwrap()
    }

    fn period(id: u32, start: u32, end: u32, fee: f64) -> DetectedPeriod {
        DetectedPeriod {
            period_id: id,
            start_date: date(start),
            end_date: date(end),
            day_count: end - start + 1,
            detected_fee_bps: Some(fee),
            previous_fee_bps: None,
            next_fee_bps: None,
            delta_from_previous: None,
            change_direction: ChangeDirection::Initial,
            volume_usd: dec!(1000000),
            fee_revenue_usd: dec!(1000),
            transaction_count: 100,
            confidence_score: 0.8,
        }
    }

    fn entry(start: u32, end: u32, fee: f64) -> IntendedScheduleEntry {
        IntendedScheduleEntry::new(date(start), date(end), fee)
    }

    // ============================================================
    // Alignment
    // ============================================================

    #[test]
    fn classify_uses_tolerances() {
        let validator = ScheduleValidator::with_defaults();

        assert_eq!(validator.classify(Some(0.0)), AlignmentStatus::Aligned);
        assert_eq!(validator.classify(Some(-1.0)), AlignmentStatus::Aligned);
        assert_eq!(validator.classify(Some(2.5)), AlignmentStatus::MinorDeviation);
        assert_eq!(validator.classify(Some(-3.0)), AlignmentStatus::MinorDeviation);
        assert_eq!(validator.classify(Some(3.5)), AlignmentStatus::MajorDeviation);
    }

    #[test]
    fn full_overlap_is_aligned() {
        let periods = vec![period(1, 1, 5, 10.2), period(2, 6, 10, 27.0)];
        let schedule = vec![entry(1, 5, 10.0), entry(6, 10, 25.0)];

        let validated = ScheduleValidator::with_defaults().validate(&periods, &schedule);

        assert_eq!(validated.len(), 2);
        assert_eq!(validated[0].alignment_status, AlignmentStatus::Aligned);
        assert_eq!(validated[0].overlap_days, 5);
        assert!(!validated[0].is_partial_overlap);
        assert_eq!(validated[1].intended_fee_bps, Some(25.0));
        assert!((validated[1].delta_bps.unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(validated[1].alignment_status, AlignmentStatus::MinorDeviation);
    }

    #[test]
    fn period_outside_schedule_has_no_match() {
        let periods = vec![period(1, 1, 5, 10.0), period(2, 6, 10, 25.0)];
        let schedule = vec![entry(1, 5, 10.0)];

        let validated = ScheduleValidator::with_defaults().validate(&periods, &schedule);

        assert_eq!(validated[1].alignment_status, AlignmentStatus::NoIntendedMatch);
        assert!(validated[1].is_missing_match);
        assert_eq!(validated[1].intended_fee_bps, None);
        assert_eq!(validated[1].delta_bps, None);
        assert_eq!(validated[1].overlap_days, 0);
    }

    #[test]
    fn majority_fee_wins_and_partial_overlap_is_flagged() {
        // Period spans days 3..=10; schedule moves from 10 to 25 on day 5.
        let periods = vec![period(1, 3, 10, 24.0)];
        let schedule = vec![entry(1, 4, 10.0), entry(5, 9, 25.0)];

        let validated = ScheduleValidator::with_defaults().validate(&periods, &schedule);

        assert_eq!(validated[0].intended_fee_bps, Some(25.0));
        assert_eq!(validated[0].overlap_days, 7);
        assert!(validated[0].is_partial_overlap);
        assert_eq!(validated[0].alignment_status, AlignmentStatus::Aligned);
    }

    #[test]
    fn tie_goes_to_earliest_schedule_entry() {
        let periods = vec![period(1, 1, 4, 15.0)];
        let schedule = vec![entry(3, 4, 20.0), entry(1, 2, 10.0)];

        let validated = ScheduleValidator::with_defaults().validate(&periods, &schedule);

        assert_eq!(validated[0].intended_fee_bps, Some(10.0));
        assert_eq!(validated[0].alignment_status, AlignmentStatus::MajorDeviation);
    }

    #[test]
    fn overlapping_entries_count_each_day_once() {
        let periods = vec![period(1, 1, 5, 10.0)];
        let schedule = vec![entry(1, 5, 10.0), entry(3, 8, 30.0)];

        let validated = ScheduleValidator::with_defaults().validate(&periods, &schedule);

        assert_eq!(validated[0].overlap_days, 5);
        assert_eq!(validated[0].intended_fee_bps, Some(10.0));
    }

    #[test]
    fn detected_period_is_carried_unchanged() {
        let periods = vec![period(1, 1, 5, 10.0)];
        let schedule = vec![entry(1, 5, 10.0)];

        let validated = ScheduleValidator::with_defaults().validate(&periods, &schedule);

        assert_eq!(validated[0].period, periods[0]);
    }

    #[test]
    fn null_detected_fee_is_major_deviation() {
        let mut p = period(1, 1, 5, 10.0);
        p.detected_fee_bps = None;

        let validated = ScheduleValidator::with_defaults().validate(&[p], &[entry(1, 5, 10.0)]);

        assert_eq!(validated[0].delta_bps, None);
        assert_eq!(validated[0].alignment_status, AlignmentStatus::MajorDeviation);
    }
}
