use crate::config::AnalysisConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Environment prefix for configuration overrides, e.g. `FEE_ANALYSIS_OPTIMAL_FEE__MAX_BPS`.
pub const ENV_PREFIX: &str = "FEE_ANALYSIS_";

/// Default location of the analysis configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/Analysis.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from the default file path merged with environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be parsed or fails validation.
    pub fn load() -> Result<AnalysisConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads configuration by layering built-in defaults, a TOML file, and environment variables.
    ///
    /// A missing file contributes nothing; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be parsed or fails validation.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AnalysisConfig> {
        let config: AnalysisConfig = Self::figment(path.as_ref()).extract()?;
        config.validate()?;

        tracing::debug!(?config, "Loaded analysis configuration");
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AnalysisConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ElasticityMethod;
    use figment::Jail;

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load_from("does-not-exist.toml").map_err(|e| e.to_string())?;

            assert_eq!(config, AnalysisConfig::default());
            Ok(())
        });
    }

    #[test]
    fn toml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Analysis.toml",
                r#"
                [detection]
                change_threshold_bps = 2.5

                [elasticity]
                method = "ols"

                [elasticity.controls]
                time_trend = true
                "#,
            )?;

            let config = ConfigLoader::load_from("Analysis.toml").map_err(|e| e.to_string())?;

            assert!((config.detection.change_threshold_bps - 2.5).abs() < f64::EPSILON);
            assert_eq!(config.elasticity.method, ElasticityMethod::Ols);
            assert!(config.elasticity.controls.time_trend);
            assert!(!config.elasticity.controls.day_of_week);
            assert_eq!(config.elasticity.bootstrap.n_iterations, 1_000);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Analysis.toml",
                r#"
                [optimal_fee]
                max_bps = 30.0
                "#,
            )?;
            jail.set_env("FEE_ANALYSIS_OPTIMAL_FEE__MAX_BPS", "40.5");

            let config = ConfigLoader::load_from("Analysis.toml").map_err(|e| e.to_string())?;

            assert!((config.optimal_fee.max_bps - 40.5).abs() < f64::EPSILON);
            Ok(())
        });
    }

    #[test]
    fn invalid_values_fail_validation() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Analysis.toml",
                r#"
                [optimal_fee]
                min_bps = 60.0
                max_bps = 50.0
                "#,
            )?;

            assert!(ConfigLoader::load_from("Analysis.toml").is_err());
            Ok(())
        });
    }
}
