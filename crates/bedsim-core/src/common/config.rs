//! Engine configuration: clinical policy toggles and reference data that a
//! site is expected to review, loaded from a camelCase JSON document.

use super::constants::MINIMUM_DOSE_PER_FRACTION;
use super::organs::{OrganAlphaBeta, default_organ_table};
use crate::domain::{BedError, RecoveryModel, SlowRecoveryRule};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_REPORT_LINES_PER_PAGE: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DosePolicy {
    /// Feed `max(d, minimum_dose_per_fraction)` into the BED formula.
    pub enforce_minimum_dose_per_fraction: bool,
    pub minimum_dose_per_fraction: f64,
}

impl Default for DosePolicy {
    fn default() -> Self {
        Self {
            enforce_minimum_dose_per_fraction: false,
            minimum_dose_per_fraction: MINIMUM_DOSE_PER_FRACTION,
        }
    }
}

impl DosePolicy {
    pub fn enforcing_minimum() -> Self {
        Self {
            enforce_minimum_dose_per_fraction: true,
            ..Self::default()
        }
    }

    pub fn effective_dose_per_fraction(&self, dose_per_fraction: f64) -> f64 {
        if self.enforce_minimum_dose_per_fraction {
            dose_per_fraction.max(self.minimum_dose_per_fraction)
        } else {
            dose_per_fraction
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportLayout {
    pub title: String,
    pub lines_per_page: usize,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            title: "Re-irradiation dose summary".to_string(),
            lines_per_page: DEFAULT_REPORT_LINES_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub dose_policy: DosePolicy,
    pub default_recovery_model: RecoveryModel,
    pub slow_recovery_rule: SlowRecoveryRule,
    pub organs: Vec<OrganAlphaBeta>,
    pub report: ReportLayout,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dose_policy: DosePolicy::default(),
            default_recovery_model: RecoveryModel::default(),
            slow_recovery_rule: SlowRecoveryRule::default(),
            organs: default_organ_table(),
            report: ReportLayout::default(),
        }
    }
}

impl EngineConfig {
    pub fn alpha_beta_for_organ(&self, name: &str) -> Option<f64> {
        super::organs::alpha_beta_for_organ(&self.organs, name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read engine config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse engine config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid engine config '{}': {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

impl From<ConfigError> for BedError {
    fn from(error: ConfigError) -> Self {
        match &error {
            ConfigError::Read { .. } => BedError::io_system("IO.CONFIG_READ", error.to_string()),
            ConfigError::Parse { .. } => {
                BedError::input_validation("INPUT.CONFIG_PARSE", error.to_string())
            }
            ConfigError::Invalid { .. } => {
                BedError::input_validation("INPUT.CONFIG_INVALID", error.to_string())
            }
        }
    }
}

pub fn load_engine_config(config_path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let config_path = config_path.as_ref();
    let source = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    let config: EngineConfig =
        serde_json::from_str(&source).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })?;
    validate_engine_config(&config).map_err(|message| ConfigError::Invalid {
        path: config_path.to_path_buf(),
        message,
    })?;

    tracing::debug!(
        path = %config_path.display(),
        organs = config.organs.len(),
        "loaded engine config"
    );
    Ok(config)
}

fn validate_engine_config(config: &EngineConfig) -> Result<(), String> {
    let minimum = config.dose_policy.minimum_dose_per_fraction;
    if !minimum.is_finite() || minimum <= 0.0 {
        return Err(format!(
            "minimumDosePerFraction must be a positive number, got {minimum}"
        ));
    }

    if let Some(organ) = config
        .organs
        .iter()
        .find(|organ| !organ.alpha_beta.is_finite() || organ.alpha_beta <= 0.0)
    {
        return Err(format!(
            "organ '{}' has a non-positive alpha/beta ratio {}",
            organ.name, organ.alpha_beta
        ));
    }

    if config.report.lines_per_page == 0 {
        return Err("report.linesPerPage must be at least 1".to_string());
    }

    Ok(())
}
