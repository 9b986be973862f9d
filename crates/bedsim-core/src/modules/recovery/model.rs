use crate::common::constants::{
    FORGET_PLATEAU_PERCENT, MONTHS_PER_YEAR, SLOW_RECOVERY_PLATEAU_YEARS,
    SLOW_RECOVERY_STEP_PERCENT,
};
use crate::domain::{RecoveryModel, SlowRecoveryRule};

/// Month-by-month steps of the Nieder model for months 4..=10.
const NIEDER_STEPS: [(u32, f64); 7] = [
    (4, 17.0),
    (5, 25.0),
    (6, 28.0),
    (7, 33.0),
    (8, 37.0),
    (9, 40.0),
    (10, 45.0),
];

pub fn paradis_forget_percent(months: u32) -> f64 {
    match months {
        0..=3 => 0.0,
        4..=6 => 10.0,
        7..=12 => 25.0,
        _ => FORGET_PLATEAU_PERCENT,
    }
}

pub fn nieder_forget_percent(months: u32) -> f64 {
    if months <= 3 {
        return 0.0;
    }

    NIEDER_STEPS
        .iter()
        .find(|(month, _)| *month == months)
        .map_or(FORGET_PLATEAU_PERCENT, |(_, percent)| *percent)
}

pub fn abusaris_forget_percent(months: u32) -> f64 {
    match months {
        0..=5 => 0.0,
        6..=12 => 25.0,
        _ => FORGET_PLATEAU_PERCENT,
    }
}

pub fn noel_forget_percent(months: u32, rule: SlowRecoveryRule) -> f64 {
    if months < MONTHS_PER_YEAR {
        return 0.0;
    }

    let years = months / MONTHS_PER_YEAR;
    if years >= SLOW_RECOVERY_PLATEAU_YEARS {
        return FORGET_PLATEAU_PERCENT;
    }

    let counted_years = match rule {
        SlowRecoveryRule::DelayedOnset => years - 1,
        SlowRecoveryRule::FromFirstYear => years,
    };
    (f64::from(counted_years) * SLOW_RECOVERY_STEP_PERCENT).min(FORGET_PLATEAU_PERCENT)
}

/// Percentage of the previous course's BED assumed recovered after `months`.
pub fn forget_percent(model: RecoveryModel, months: u32, rule: SlowRecoveryRule) -> f64 {
    match model {
        RecoveryModel::Paradis => paradis_forget_percent(months),
        RecoveryModel::Nieder => nieder_forget_percent(months),
        RecoveryModel::Abusaris => abusaris_forget_percent(months),
        RecoveryModel::Noel => noel_forget_percent(months, rule),
    }
}
