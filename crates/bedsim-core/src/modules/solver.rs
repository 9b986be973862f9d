use crate::domain::{AlphaBeta, MaxDosePlan};
use crate::numerics::positive_quadratic_root;

/// Largest uniform dose per fraction `d` such that `n · d · (1 + d/αβ) = B`.
///
/// This is the positive root of `(n/αβ)·d² + n·d − B = 0`. Requires `B > 0`,
/// `n > 0` and a valid α/β; anything else, a negative discriminant or a
/// non-positive root yields `None`.
pub fn max_dose_per_fraction(
    bed_budget: f64,
    fraction_count: u32,
    alpha_beta: AlphaBeta,
) -> Option<f64> {
    if !bed_budget.is_finite() || bed_budget <= 0.0 || fraction_count == 0 {
        return None;
    }

    let n = f64::from(fraction_count);
    positive_quadratic_root(n / alpha_beta.value(), n, -bed_budget)
}

/// Dose per fraction and total dose of the largest plan fitting `bed_budget`.
pub fn max_dose_plan(
    bed_budget: f64,
    fraction_count: u32,
    alpha_beta: AlphaBeta,
) -> Option<MaxDosePlan> {
    let dose_per_fraction = max_dose_per_fraction(bed_budget, fraction_count, alpha_beta)?;
    Some(MaxDosePlan {
        dose_per_fraction,
        fraction_count,
        total_dose: dose_per_fraction * f64::from(fraction_count),
    })
}
