//! The whole re-irradiation pipeline as one pure function.
//!
//! 1. allowed BED/EQD2 (manual BED wins, dose floor applies)
//! 2. BED/EQD2 of the previous course (dose floor applies)
//! 3. elapsed months, forget percent, remaining BED/EQD2
//! 4. maximum dose per fraction for the planned fraction count (no floor)
//! 5. optional Vx threshold conversion

use super::budget::remaining_budget;
use super::conversion::convert;
use super::recovery::{months_between_dates, resolve_forget_percent};
use super::solver::max_dose_plan;
use super::vx::convert_threshold;
use crate::common::config::EngineConfig;
use crate::domain::{AlphaBeta, EngineInput, EngineOutput};

pub fn recompute(input: &EngineInput, config: &EngineConfig) -> EngineOutput {
    let alpha_beta = AlphaBeta::from_option(input.alpha_beta);
    let policy = &config.dose_policy;

    let allowed = convert(input.allowed, alpha_beta, input.manual_allowed_bed, policy);
    let used = convert(input.used, alpha_beta, None, policy);

    let elapsed_months = months_between_dates(input.treatment_start, input.treatment_end);
    let forget_percent = resolve_forget_percent(
        input.manual_forget_percent,
        elapsed_months,
        input.recovery_model,
        config.slow_recovery_rule,
    );

    let remaining = remaining_budget(
        allowed.bed_value(),
        used.bed_value(),
        forget_percent.map(|percent| percent.value()),
        alpha_beta,
    );

    let max_dose = remaining.zip(alpha_beta).and_then(|(remaining, alpha_beta)| {
        input
            .planned_fractions
            .and_then(|fractions| max_dose_plan(remaining.bed, fractions, alpha_beta))
    });

    let vx = input
        .vx
        .as_ref()
        .and_then(|vx| convert_threshold(vx, alpha_beta));

    tracing::debug!(
        allowed_bed = ?allowed.bed_value(),
        used_bed = ?used.bed_value(),
        elapsed_months = ?elapsed_months,
        forget_percent = ?forget_percent.map(|percent| percent.value()),
        remaining_bed = ?remaining.map(|remaining| remaining.bed),
        max_dose_per_fraction = ?max_dose.map(|plan| plan.dose_per_fraction),
        "recomputed dose pipeline"
    );

    EngineOutput {
        organ: input.organ.clone(),
        alpha_beta: alpha_beta.map(AlphaBeta::value),
        allowed,
        used,
        elapsed_months,
        recovery_model: input.recovery_model,
        forget_percent,
        remaining,
        planned_fractions: input.planned_fractions,
        max_dose,
        vx,
    }
}
