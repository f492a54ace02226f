//! Configuration management for the claim scoring pipeline

use crate::types::scored::ReviewThresholds;
use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub rules: RulesConfig,
    pub review: ReviewThresholds,
    pub logging: LoggingConfig,
}

/// Isolation forest hyperparameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Expected anomalous fraction of a batch, in (0, 0.5]
    pub contamination: f64,
    /// Number of isolation trees
    pub n_estimators: usize,
    /// Sub-sample size per tree (capped by batch size)
    pub max_samples: usize,
    /// Seed for the tree-building RNG
    pub random_seed: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            contamination: 0.12,
            n_estimators: 200,
            max_samples: 256,
            random_seed: 42,
        }
    }
}

/// Rule engine parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Cost-to-package ratio above which billing breaches the cap
    pub cost_ratio_cap: f64,
    /// Gender value treated as male (exact match)
    pub male_label: String,
    /// Diagnosis treated as maternity care (exact match)
    pub maternity_diagnosis: String,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            cost_ratio_cap: 2.5,
            male_label: "Male".to_string(),
            maternity_diagnosis: "Maternity Care".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path, then apply `CLAIMS_*`
    /// environment overrides (e.g. `CLAIMS_DETECTION__CONTAMINATION=0.1`).
    /// A missing file leaves the defaults in place.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("CLAIMS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let contamination = self.detection.contamination;
        ensure!(
            contamination > 0.0 && contamination <= 0.5,
            "detection.contamination must be in (0, 0.5], got {contamination}"
        );
        ensure!(
            self.detection.n_estimators > 0,
            "detection.n_estimators must be at least 1"
        );
        ensure!(
            self.detection.max_samples > 0,
            "detection.max_samples must be at least 1"
        );
        ensure!(
            self.review.investigating <= self.review.high_risk,
            "review.investigating ({}) must not exceed review.high_risk ({})",
            self.review.investigating,
            self.review.high_risk
        );
        ensure!(
            self.review.high_risk <= 100,
            "review.high_risk must be at most 100"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.detection.contamination, 0.12);
        assert_eq!(config.detection.n_estimators, 200);
        assert_eq!(config.detection.random_seed, 42);
        assert_eq!(config.rules.cost_ratio_cap, 2.5);
        assert_eq!(config.rules.maternity_diagnosis, "Maternity Care");
        assert_eq!(config.review.high_risk, 70);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[detection]\ncontamination = 0.2\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();

        assert_eq!(config.detection.contamination, 0.2);
        assert_eq!(config.detection.n_estimators, 200);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.rules.male_label, "Male");
    }

    #[test]
    fn test_env_overrides_apply_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        std::env::set_var("CLAIMS_DETECTION__RANDOM_SEED", "99");

        let loaded = AppConfig::load_from_path(&missing);
        std::env::remove_var("CLAIMS_DETECTION__RANDOM_SEED");
        let config = loaded.unwrap();

        assert_eq!(config.detection.random_seed, 99);
        assert_eq!(config.detection.contamination, 0.12);
        assert_eq!(config.rules.cost_ratio_cap, 2.5);
    }

    #[test]
    fn test_validate_rejects_bad_contamination() {
        let mut config = AppConfig::default();
        config.detection.contamination = 0.0;
        assert!(config.validate().is_err());

        config.detection.contamination = 0.6;
        assert!(config.validate().is_err());

        config.detection.contamination = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_review_thresholds() {
        let mut config = AppConfig::default();
        config.review.investigating = 80;
        assert!(config.validate().is_err());
    }
}
