//! Raw text fields as typed by a user, and their conversion into an
//! [`EngineInput`].

use super::recovery::parse_treatment_date;
use super::regimen::derive_missing;
use crate::common::config::EngineConfig;
use crate::common::constants::DEFAULT_VX_TARGET_PERCENT;
use crate::domain::{DoseRegimen, EngineInput, RecoveryModel, VxInput};
use crate::numerics::{format_fixed, parse_fraction_count, parse_locale_number};
use serde::{Deserialize, Serialize};

/// Decimals used when a derived dose is written back into a text field.
const FILLED_DOSE_DECIMALS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormFields {
    pub organ: String,
    pub alpha_beta: String,

    pub total_dose: String,
    pub dose_per_fraction: String,
    pub fraction_count: String,
    pub manual_allowed_bed: String,

    pub used_total_dose: String,
    pub used_dose_per_fraction: String,
    pub used_fraction_count: String,

    pub manual_forget_percent: String,
    pub treatment_start: String,
    pub treatment_end: String,
    pub recovery_model: String,

    pub planned_fractions: String,

    pub vx_threshold_dose: String,
    pub vx_initial_dose_per_fraction: String,
    pub vx_new_dose_per_fraction: String,
    pub vx_new_fraction_count: String,
    pub vx_alpha_beta: String,
    pub vx_target_percent: String,
}

impl FormFields {
    /// Parse every field. Unparsable text becomes a missing value, so this
    /// never fails.
    ///
    /// An empty α/β is filled from the organ table of `config`. An empty or
    /// unknown recovery model falls back to `config.default_recovery_model`.
    pub fn to_engine_input(&self, config: &EngineConfig) -> EngineInput {
        let organ = non_empty(&self.organ).map(str::to_string);
        let alpha_beta = parse_locale_number(&self.alpha_beta).or_else(|| {
            let name = organ.as_deref()?;
            let looked_up = config.alpha_beta_for_organ(name);
            if looked_up.is_none() {
                tracing::warn!(organ = name, "no alpha/beta ratio known for organ");
            }
            looked_up
        });

        EngineInput {
            organ,
            alpha_beta,
            allowed: parse_regimen(&self.total_dose, &self.fraction_count, &self.dose_per_fraction),
            manual_allowed_bed: parse_locale_number(&self.manual_allowed_bed),
            used: parse_regimen(
                &self.used_total_dose,
                &self.used_fraction_count,
                &self.used_dose_per_fraction,
            ),
            manual_forget_percent: parse_locale_number(&self.manual_forget_percent),
            treatment_start: parse_treatment_date(&self.treatment_start),
            treatment_end: parse_treatment_date(&self.treatment_end),
            recovery_model: self.recovery_model(config),
            planned_fractions: parse_fraction_count(&self.planned_fractions),
            vx: self.vx_input(),
        }
    }

    /// Write the derivable third field of the allowed and used regimens back
    /// into the form. Only blank fields are filled; text the user typed is
    /// never replaced.
    pub fn fill_missing(&mut self) {
        fill_regimen_fields(
            &mut self.total_dose,
            &mut self.fraction_count,
            &mut self.dose_per_fraction,
        );
        fill_regimen_fields(
            &mut self.used_total_dose,
            &mut self.used_fraction_count,
            &mut self.used_dose_per_fraction,
        );
    }

    fn recovery_model(&self, config: &EngineConfig) -> RecoveryModel {
        let Some(text) = non_empty(&self.recovery_model) else {
            return config.default_recovery_model;
        };
        text.parse().unwrap_or_else(|error| {
            tracing::warn!(%error, fallback = %config.default_recovery_model, "using default recovery model");
            config.default_recovery_model
        })
    }

    fn vx_input(&self) -> Option<VxInput> {
        let fields = [
            &self.vx_threshold_dose,
            &self.vx_initial_dose_per_fraction,
            &self.vx_new_dose_per_fraction,
            &self.vx_new_fraction_count,
            &self.vx_alpha_beta,
        ];
        if fields.iter().all(|field| non_empty(field).is_none()) {
            return None;
        }

        Some(VxInput {
            threshold_dose: parse_locale_number(&self.vx_threshold_dose),
            initial_dose_per_fraction: parse_locale_number(&self.vx_initial_dose_per_fraction),
            new_dose_per_fraction: parse_locale_number(&self.vx_new_dose_per_fraction),
            new_fraction_count: parse_fraction_count(&self.vx_new_fraction_count),
            alpha_beta: parse_locale_number(&self.vx_alpha_beta),
            target_percent: parse_locale_number(&self.vx_target_percent)
                .or(Some(DEFAULT_VX_TARGET_PERCENT)),
        })
    }
}

fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn parse_regimen(total: &str, fractions: &str, dose_per_fraction: &str) -> DoseRegimen {
    DoseRegimen::new(
        parse_locale_number(total),
        parse_fraction_count(fractions),
        parse_locale_number(dose_per_fraction),
    )
}

fn fill_regimen_fields(total: &mut String, fractions: &mut String, dose_per_fraction: &mut String) {
    let blank = [total.as_str(), fractions.as_str(), dose_per_fraction.as_str()]
        .into_iter()
        .filter(|field| non_empty(field).is_none())
        .count();
    if blank != 1 {
        return;
    }

    let regimen = parse_regimen(total, fractions, dose_per_fraction);
    if regimen.known_field_count() != 2 {
        return;
    }

    let derived = derive_missing(regimen);
    if regimen.total_dose.is_none() {
        *total = format_fixed(derived.total_dose, FILLED_DOSE_DECIMALS);
    } else if regimen.fraction_count.is_none() {
        *fractions = derived
            .fraction_count
            .map(|count| count.to_string())
            .unwrap_or_default();
    } else {
        *dose_per_fraction = format_fixed(derived.dose_per_fraction, FILLED_DOSE_DECIMALS);
    }
}
