use super::conversion::bed_of_total;
use super::solver::max_dose_per_fraction;
use crate::domain::{AlphaBeta, VxInput, VxResult};

/// Re-express a `VxGy < x%` threshold under a new fractionation.
///
/// `BEDref = D0 · (1 + d0/αβ)` is the biological effect of the original
/// threshold; the equivalent physical dose at `d1` per fraction is
/// `BEDref / (1 + d1/αβ)`. With a new fraction count `n1 > 0` the result also
/// carries the per-fraction share of that total and the dose per fraction
/// that reproduces `BEDref` exactly over `n1` fractions.
///
/// `fallback_alpha_beta` is used when the input carries no ratio of its own.
pub fn convert_threshold(input: &VxInput, fallback_alpha_beta: Option<AlphaBeta>) -> Option<VxResult> {
    let alpha_beta = AlphaBeta::from_option(input.alpha_beta).or(fallback_alpha_beta)?;
    let threshold_dose = input.threshold_dose.filter(|dose| dose.is_finite())?;
    let initial_dose_per_fraction = input
        .initial_dose_per_fraction
        .filter(|dose| dose.is_finite())?;

    let reference_bed = bed_of_total(threshold_dose, initial_dose_per_fraction, alpha_beta);

    let equivalent_total_dose = input
        .new_dose_per_fraction
        .filter(|dose| dose.is_finite())
        .map(|new_dose| reference_bed / (1.0 + new_dose / alpha_beta.value()))
        .filter(|dose| dose.is_finite());

    let new_fraction_count = input.new_fraction_count.filter(|count| *count > 0);
    let equivalent_dose_per_fraction = equivalent_total_dose
        .zip(new_fraction_count)
        .map(|(total, count)| total / f64::from(count));
    let exact_dose_per_fraction = new_fraction_count
        .and_then(|count| max_dose_per_fraction(reference_bed, count, alpha_beta));

    Some(VxResult {
        alpha_beta: alpha_beta.value(),
        reference_bed,
        equivalent_total_dose,
        equivalent_dose_per_fraction,
        exact_dose_per_fraction,
        target_percent: input.target_percent.filter(|percent| percent.is_finite()),
    })
}
