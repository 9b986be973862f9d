//! Re-irradiation dose conversions: BED and EQD2, recovery of a previous
//! course over time, the remaining dose budget, the maximum dose per
//! fraction of a new course and Vx threshold re-fractionation.
//!
//! Every calculation is a total function. Inputs that cannot produce a
//! result yield `None` instead of an error.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;
