//! Radiobiological constants shared by the conversion kernels.

/// Reference dose per fraction of EQD2 (Gy).
pub const REFERENCE_DOSE_PER_FRACTION: f64 = 2.0;

/// Floor applied to the dose per fraction when the minimum-dose policy is on (Gy).
pub const MINIMUM_DOSE_PER_FRACTION: f64 = 1.8;

/// Upper bound of every recovery model (percent).
pub const FORGET_PLATEAU_PERCENT: f64 = 50.0;

/// Slow-recovery increment per completed year (percentage points).
pub const SLOW_RECOVERY_STEP_PERCENT: f64 = 5.0;

/// Completed years after which the slow-recovery model is at its plateau.
pub const SLOW_RECOVERY_PLATEAU_YEARS: u32 = 10;

pub const MONTHS_PER_YEAR: u32 = 12;

/// Default `x` of a `VxGy < x%` constraint.
pub const DEFAULT_VX_TARGET_PERCENT: f64 = 30.0;
