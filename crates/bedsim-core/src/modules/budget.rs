use super::conversion::eqd2_from_bed;
use crate::domain::{AlphaBeta, RemainingBudget};

/// BED still available for a new course.
///
/// `max(0, allowed − used · (1 − forget/100))`. Without a forget percentage no
/// recovery credit is given. The result is never negative: a used dose that
/// exceeds the allowed budget leaves exactly zero.
pub fn remaining_bed(allowed_bed: f64, used_bed: f64, forget_percent: Option<f64>) -> Option<f64> {
    if !allowed_bed.is_finite() || !used_bed.is_finite() {
        return None;
    }

    let forget = forget_percent.filter(|percent| percent.is_finite()).unwrap_or(0.0);
    let remaining = allowed_bed - used_bed * (1.0 - forget / 100.0);
    Some(remaining.max(0.0))
}

pub fn remaining_budget(
    allowed_bed: Option<f64>,
    used_bed: Option<f64>,
    forget_percent: Option<f64>,
    alpha_beta: Option<AlphaBeta>,
) -> Option<RemainingBudget> {
    let bed = remaining_bed(allowed_bed?, used_bed?, forget_percent)?;
    Some(RemainingBudget {
        bed,
        eqd2: alpha_beta.map(|alpha_beta| eqd2_from_bed(bed, alpha_beta)),
        forget_percent_applied: forget_percent
            .filter(|percent| percent.is_finite())
            .unwrap_or(0.0),
    })
}
