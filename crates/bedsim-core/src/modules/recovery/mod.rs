//! Time since the previous course and the recovery ("forget") models that
//! turn it into a percentage of that course's BED.

mod elapsed;
mod model;

pub use elapsed::{
    DATE_FORMAT, months_between, months_between_dates, months_between_text,
    parse_treatment_date,
};
pub use model::{
    abusaris_forget_percent, forget_percent, nieder_forget_percent, noel_forget_percent,
    paradis_forget_percent,
};

use crate::domain::{RecoveryModel, Resolved, SlowRecoveryRule};

/// A manual percentage within `0..=100` wins; otherwise the model value for
/// the elapsed months, when those are known.
pub fn resolve_forget_percent(
    manual: Option<f64>,
    elapsed_months: Option<u32>,
    model: RecoveryModel,
    rule: SlowRecoveryRule,
) -> Option<Resolved<f64>> {
    let manual = manual.filter(|percent| {
        let accepted = percent.is_finite() && (0.0..=100.0).contains(percent);
        if !accepted {
            tracing::debug!(percent, "ignoring manual forget percent outside 0..=100");
        }
        accepted
    });
    let computed = elapsed_months.map(|months| forget_percent(model, months, rule));
    Resolved::merge(manual, computed)
}
