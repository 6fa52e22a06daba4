//! Plain, serializable records exchanged between analysis components.

pub mod daily;
pub mod decomposition;
pub mod elasticity;
pub mod period;
pub mod transaction;
pub mod transition;

pub use daily::DailyMetric;
pub use decomposition::DecompositionResult;
pub use elasticity::{
    DemandRegime, ElasticityMethod, ElasticityResult, OptimalFeeResult, RegressionCoefficient,
};
pub use period::{
    AlignmentStatus, ChangeDirection, DetectedPeriod, IntendedScheduleEntry, ValidatedPeriod,
};
pub use transaction::Transaction;
pub use transition::PeriodTransition;
