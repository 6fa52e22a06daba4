pub mod config;
pub mod config_loader;
pub mod error;
pub mod models;
pub mod stats;

pub use config::{
    AnalysisConfig, BootstrapConfig, DetectionConfig, ElasticityConfig, ElasticityControls,
    OptimalFeeConfig, ValidationConfig,
};
pub use config_loader::ConfigLoader;
pub use error::{AnalysisError, AnalysisResult};
pub use models::{
    AlignmentStatus, ChangeDirection, DailyMetric, DecompositionResult, DemandRegime,
    DetectedPeriod, ElasticityMethod, ElasticityResult, IntendedScheduleEntry, OptimalFeeResult,
    PeriodTransition, RegressionCoefficient, Transaction, ValidatedPeriod,
};
