pub mod analyze;
pub mod detect;

pub use analyze::AnalyzeArgs;
pub use detect::DetectArgs;
