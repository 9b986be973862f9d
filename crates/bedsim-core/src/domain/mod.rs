pub mod errors;

pub use errors::{BedError, BedErrorCategory, BedResult};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A fractionation scheme where any of the three fields may be unknown.
///
/// For a fully specified regimen `total_dose = fraction_count * dose_per_fraction`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoseRegimen {
    pub total_dose: Option<f64>,
    pub fraction_count: Option<u32>,
    pub dose_per_fraction: Option<f64>,
}

impl DoseRegimen {
    pub const fn new(
        total_dose: Option<f64>,
        fraction_count: Option<u32>,
        dose_per_fraction: Option<f64>,
    ) -> Self {
        Self {
            total_dose,
            fraction_count,
            dose_per_fraction,
        }
    }

    pub const fn from_fractions(fraction_count: u32, dose_per_fraction: f64) -> Self {
        Self::new(None, Some(fraction_count), Some(dose_per_fraction))
    }

    pub fn known_field_count(&self) -> usize {
        usize::from(self.total_dose.is_some())
            + usize::from(self.fraction_count.is_some())
            + usize::from(self.dose_per_fraction.is_some())
    }

    pub fn is_under_specified(&self) -> bool {
        self.known_field_count() < 2
    }

    /// Fraction count and dose per fraction, when both are known and usable
    /// in the BED formula.
    pub fn fractions_and_dose(&self) -> Option<(u32, f64)> {
        match (self.fraction_count, self.dose_per_fraction) {
            (Some(n), Some(d)) if n > 0 && d.is_finite() && d > 0.0 => Some((n, d)),
            _ => None,
        }
    }

    /// True when the regimen, after deriving its missing field, can feed the
    /// BED formula.
    pub fn is_computable(&self) -> bool {
        crate::modules::regimen::derive_missing(*self)
            .fractions_and_dose()
            .is_some()
    }
}

/// Tissue α/β ratio in Gy. Always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct AlphaBeta(f64);

impl AlphaBeta {
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    pub fn from_option(value: Option<f64>) -> Option<Self> {
        value.and_then(Self::new)
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

/// A value that was either derived by the engine or typed in by the user.
/// A manual value always wins, including a manual `0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "camelCase")]
pub enum Resolved<T> {
    Computed(T),
    Overridden(T),
}

impl<T: Copy> Resolved<T> {
    pub fn merge(manual: Option<T>, computed: Option<T>) -> Option<Self> {
        match (manual, computed) {
            (Some(value), _) => Some(Self::Overridden(value)),
            (None, Some(value)) => Some(Self::Computed(value)),
            (None, None) => None,
        }
    }

    pub fn value(&self) -> T {
        match self {
            Self::Computed(value) | Self::Overridden(value) => *value,
        }
    }

    pub const fn is_overridden(&self) -> bool {
        matches!(self, Self::Overridden(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryModel {
    /// Fast recovery, coarse steps (model A).
    #[default]
    Paradis,
    /// Fast recovery, month-by-month steps (model B).
    Nieder,
    /// Fast recovery, two steps (model C).
    Abusaris,
    /// Slow recovery, +5 points per year up to ten years (model D).
    Noel,
}

impl RecoveryModel {
    pub const ALL: [RecoveryModel; 4] = [Self::Paradis, Self::Nieder, Self::Abusaris, Self::Noel];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paradis => "paradis",
            Self::Nieder => "nieder",
            Self::Abusaris => "abusaris",
            Self::Noel => "noel",
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Self::Paradis => 'A',
            Self::Nieder => 'B',
            Self::Abusaris => 'C',
            Self::Noel => 'D',
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Paradis => "fast recovery: 0-3 months 0%, 4-6 months 10%, 7-12 months 25%, >12 months 50%",
            Self::Nieder => {
                "fast recovery: 0-3 months 0%, 4: 17%, 5: 25%, 6: 28%, 7: 33%, 8: 37%, 9: 40%, 10: 45%, >=11: 50%"
            }
            Self::Abusaris => "fast recovery: <6 months 0%, 6-12 months 25%, >12 months 50%",
            Self::Noel => "slow recovery: 0% before 1 year, then +5% per year, 50% from 10 years",
        }
    }
}

impl Display for RecoveryModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown recovery model '{0}' (expected paradis, nieder, abusaris or noel)")]
pub struct UnknownRecoveryModel(pub String);

impl FromStr for RecoveryModel {
    type Err = UnknownRecoveryModel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "paradis" | "a" => Ok(Self::Paradis),
            "nieder" | "b" => Ok(Self::Nieder),
            "abusaris" | "c" => Ok(Self::Abusaris),
            "noel" | "noël" | "d" => Ok(Self::Noel),
            _ => Err(UnknownRecoveryModel(value.trim().to_string())),
        }
    }
}

/// How the slow (Noel) model counts years once the first twelve months
/// have elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlowRecoveryRule {
    /// Month 12 still gives 0%; 5% is reached at the start of year 2.
    #[default]
    DelayedOnset,
    /// Every completed year counts, so month 12 already gives 5%.
    FromFirstYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VxInput {
    /// Threshold dose of the original constraint (Gy).
    pub threshold_dose: Option<f64>,
    pub initial_dose_per_fraction: Option<f64>,
    pub new_dose_per_fraction: Option<f64>,
    pub new_fraction_count: Option<u32>,
    /// Falls back to the main α/β when absent.
    pub alpha_beta: Option<f64>,
    /// The `x` of `VxGy < x%`.
    pub target_percent: Option<f64>,
}

/// One calculation request. The caller owns every mutable piece of state and
/// rebuilds this value whenever an input changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineInput {
    pub organ: Option<String>,
    pub alpha_beta: Option<f64>,
    pub allowed: DoseRegimen,
    pub manual_allowed_bed: Option<f64>,
    pub used: DoseRegimen,
    pub manual_forget_percent: Option<f64>,
    pub treatment_start: Option<NaiveDate>,
    pub treatment_end: Option<NaiveDate>,
    pub recovery_model: RecoveryModel,
    pub planned_fractions: Option<u32>,
    pub vx: Option<VxInput>,
}

/// BED, EQD2 and physical dose of one regimen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseConversion {
    /// The regimen after derivation of its missing field, unmodified by any
    /// dose-per-fraction floor.
    pub regimen: DoseRegimen,
    pub bed: Option<Resolved<f64>>,
    pub eqd2: Option<f64>,
    pub physical_dose: Option<f64>,
}

impl DoseConversion {
    pub fn bed_value(&self) -> Option<f64> {
        self.bed.map(|bed| bed.value())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainingBudget {
    pub bed: f64,
    pub eqd2: Option<f64>,
    /// The forget percentage actually applied, 0 when none was available.
    pub forget_percent_applied: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxDosePlan {
    pub dose_per_fraction: f64,
    pub fraction_count: u32,
    pub total_dose: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VxResult {
    pub alpha_beta: f64,
    pub reference_bed: f64,
    pub equivalent_total_dose: Option<f64>,
    pub equivalent_dose_per_fraction: Option<f64>,
    /// Dose per fraction that reproduces the reference BED exactly over the
    /// new fraction count.
    pub exact_dose_per_fraction: Option<f64>,
    pub target_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOutput {
    pub organ: Option<String>,
    pub alpha_beta: Option<f64>,
    pub allowed: DoseConversion,
    pub used: DoseConversion,
    pub elapsed_months: Option<u32>,
    pub recovery_model: RecoveryModel,
    pub forget_percent: Option<Resolved<f64>>,
    pub remaining: Option<RemainingBudget>,
    pub planned_fractions: Option<u32>,
    pub max_dose: Option<MaxDosePlan>,
    pub vx: Option<VxResult>,
}
