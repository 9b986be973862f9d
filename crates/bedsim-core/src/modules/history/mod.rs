//! Saved result snapshots, their stores and the paginated text report.

mod report;
mod store;

pub use report::{ReportPage, render_report, render_report_text};
pub use store::{JsonFileHistory, MemoryHistory};

use crate::domain::{BedError, EngineOutput, RecoveryModel, Resolved};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the forget percentage of a saved entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ForgetSource {
    Computed,
    Overridden,
    /// No percentage was known, so no recovery credit (0 %) was applied.
    Defaulted,
}

/// Every derived result of one calculation, frozen at save time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedEntry {
    pub name: String,
    pub organ: Option<String>,
    pub alpha_beta: Option<f64>,

    pub allowed_bed: Option<f64>,
    pub allowed_eqd2: Option<f64>,
    pub allowed_physical_dose: Option<f64>,

    pub used_bed: Option<f64>,
    pub used_eqd2: Option<f64>,
    pub used_physical_dose: Option<f64>,

    pub elapsed_months: Option<u32>,
    pub recovery_model: RecoveryModel,
    pub forget_percent: Option<f64>,
    pub forget_source: Option<ForgetSource>,

    pub remaining_bed: Option<f64>,
    pub remaining_eqd2: Option<f64>,

    pub planned_fractions: Option<u32>,
    pub max_dose_per_fraction: Option<f64>,
    pub max_total_dose: Option<f64>,

    pub vx_reference_bed: Option<f64>,
    pub vx_equivalent_total_dose: Option<f64>,
    pub vx_equivalent_dose_per_fraction: Option<f64>,
    pub vx_exact_dose_per_fraction: Option<f64>,
    pub vx_target_percent: Option<f64>,

    /// RFC 3339, UTC.
    pub created_at: String,
}

impl SavedEntry {
    pub fn from_output(name: String, output: &EngineOutput, created_at: DateTime<Utc>) -> Self {
        let forget_source = match output.forget_percent {
            Some(Resolved::Computed(_)) => Some(ForgetSource::Computed),
            Some(Resolved::Overridden(_)) => Some(ForgetSource::Overridden),
            None => output.remaining.map(|_| ForgetSource::Defaulted),
        };
        let forget_percent = output
            .forget_percent
            .map(|percent| percent.value())
            .or_else(|| output.remaining.map(|remaining| remaining.forget_percent_applied));

        Self {
            name,
            organ: output.organ.clone(),
            alpha_beta: output.alpha_beta,
            allowed_bed: output.allowed.bed_value(),
            allowed_eqd2: output.allowed.eqd2,
            allowed_physical_dose: output.allowed.physical_dose,
            used_bed: output.used.bed_value(),
            used_eqd2: output.used.eqd2,
            used_physical_dose: output.used.physical_dose,
            elapsed_months: output.elapsed_months,
            recovery_model: output.recovery_model,
            forget_percent,
            forget_source,
            remaining_bed: output.remaining.map(|remaining| remaining.bed),
            remaining_eqd2: output.remaining.and_then(|remaining| remaining.eqd2),
            planned_fractions: output.planned_fractions,
            max_dose_per_fraction: output.max_dose.map(|plan| plan.dose_per_fraction),
            max_total_dose: output.max_dose.map(|plan| plan.total_dose),
            vx_reference_bed: output.vx.map(|vx| vx.reference_bed),
            vx_equivalent_total_dose: output.vx.and_then(|vx| vx.equivalent_total_dose),
            vx_equivalent_dose_per_fraction: output
                .vx
                .and_then(|vx| vx.equivalent_dose_per_fraction),
            vx_exact_dose_per_fraction: output.vx.and_then(|vx| vx.exact_dose_per_fraction),
            vx_target_percent: output.vx.and_then(|vx| vx.target_percent),
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Name given to an unnamed entry when `existing` entries are already saved.
pub fn default_entry_name(existing: usize) -> String {
    format!("Organ {}", existing + 1)
}

/// Entries newest first, each paired with its insertion index.
pub fn most_recent_first(entries: &[SavedEntry]) -> Vec<(usize, &SavedEntry)> {
    entries.iter().enumerate().rev().collect()
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("failed to read history '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse history '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write history '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode history: {source}")]
    Encode { source: serde_json::Error },
    #[error("no saved entry at index {index} (history holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

impl From<HistoryError> for BedError {
    fn from(error: HistoryError) -> Self {
        let message = error.to_string();
        match error {
            HistoryError::Read { .. } => BedError::io_system("IO.HISTORY_READ", message),
            HistoryError::Write { .. } => BedError::io_system("IO.HISTORY_WRITE", message),
            HistoryError::Parse { .. } => {
                BedError::input_validation("INPUT.HISTORY_PARSE", message)
            }
            HistoryError::IndexOutOfRange { .. } => {
                BedError::input_validation("INPUT.HISTORY_INDEX", message)
            }
            HistoryError::Encode { .. } => BedError::internal("RUN.HISTORY_ENCODE", message),
        }
    }
}
