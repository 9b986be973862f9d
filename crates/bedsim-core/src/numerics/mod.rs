//! Number parsing, display formatting and the small numeric kernels the dose
//! conversions share.

use serde::{Deserialize, Serialize};

/// Parse user-typed text into a finite number.
///
/// Accepts either `,` or `.` as the decimal separator. Empty, non-numeric and
/// non-finite input (`inf`, `NaN`) all yield `None`.
pub fn parse_locale_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = trimmed.replacen(',', ".", 1);
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parse a fraction count. Only whole, non-negative numbers are accepted, so
/// `"30"` and `"30,0"` parse while `"30.5"` does not.
pub fn parse_fraction_count(text: &str) -> Option<u32> {
    parse_locale_number(text).and_then(whole_count)
}

pub fn whole_count(value: f64) -> Option<u32> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return None;
    }
    Some(value as u32)
}

/// Round half up to `decimals` places and render with exactly that many
/// digits. A missing or non-finite value renders as an empty string.
pub fn format_fixed(value: Option<f64>, decimals: usize) -> String {
    let Some(value) = value.filter(|value| value.is_finite()) else {
        return String::new();
    };

    let factor = 10_f64.powi(decimals as i32);
    let scaled = (value * factor + 0.5).floor() / factor;
    let rounded = if scaled.is_finite() { scaled } else { value };
    let rendered = format!("{rounded:.decimals$}");

    if rendered.starts_with('-') && rendered[1..].chars().all(|c| c == '0' || c == '.') {
        rendered[1..].to_string()
    } else {
        rendered
    }
}

/// Positive root of `a·x² + b·x + c = 0`.
///
/// Uses the cancellation-free pair `q = -(b + sign(b)·√disc) / 2`,
/// `x₁ = q / a`, `x₂ = c / q`, so the result stays accurate when `4ac` is
/// tiny next to `b²`. Returns `None` for a negative discriminant or when no
/// finite positive root exists.
pub fn positive_quadratic_root(a: f64, b: f64, c: f64) -> Option<f64> {
    if !(a.is_finite() && b.is_finite() && c.is_finite()) || a == 0.0 {
        return None;
    }

    let discriminant = b * b - 4.0 * a * c;
    if !discriminant.is_finite() || discriminant < 0.0 {
        return None;
    }

    let sign = if b >= 0.0 { 1.0 } else { -1.0 };
    let q = -0.5 * (b + sign * discriminant.sqrt());
    if q == 0.0 {
        return None;
    }

    [q / a, c / q]
        .into_iter()
        .filter(|root| root.is_finite() && *root > 0.0)
        .max_by(f64::total_cmp)
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericTolerance {
    pub abs_tol: f64,
    pub rel_tol: f64,
    #[serde(default = "default_relative_floor")]
    pub relative_floor: f64,
}

const fn default_relative_floor() -> f64 {
    1.0e-12
}

impl NumericTolerance {
    pub const fn relative(rel_tol: f64) -> Self {
        Self {
            abs_tol: 0.0,
            rel_tol,
            relative_floor: 1.0e-12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceComparison {
    pub abs_diff: f64,
    pub rel_diff: f64,
    pub passes: bool,
}

pub fn compare_with_tolerance(
    expected: f64,
    actual: f64,
    tolerance: NumericTolerance,
) -> ToleranceComparison {
    let abs_diff = (actual - expected).abs();
    let rel_denominator = expected.abs().max(tolerance.relative_floor);
    let rel_diff = abs_diff / rel_denominator;
    let passes = abs_diff <= tolerance.abs_tol || abs_diff <= tolerance.rel_tol * rel_denominator;

    ToleranceComparison {
        abs_diff,
        rel_diff,
        passes,
    }
}
