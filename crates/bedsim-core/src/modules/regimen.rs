use crate::domain::DoseRegimen;

/// Fill the single missing field of a regimen from the other two.
///
/// A regimen with fewer than two known fields, or with all three known, is
/// returned unchanged. Zero fraction counts and zero doses per fraction are
/// never used as divisors; the field they would have produced stays missing.
pub fn derive_missing(regimen: DoseRegimen) -> DoseRegimen {
    let DoseRegimen {
        total_dose,
        fraction_count,
        dose_per_fraction,
    } = regimen;

    match (total_dose, fraction_count, dose_per_fraction) {
        (Some(total), Some(n), None) => DoseRegimen {
            dose_per_fraction: (n > 0).then(|| total / f64::from(n)),
            ..regimen
        },
        (Some(total), None, Some(d)) => DoseRegimen {
            fraction_count: rounded_fraction_count(total, d),
            ..regimen
        },
        (None, Some(n), Some(d)) => DoseRegimen {
            total_dose: Some(f64::from(n) * d),
            ..regimen
        },
        _ => regimen,
    }
}

fn rounded_fraction_count(total: f64, dose_per_fraction: f64) -> Option<u32> {
    if !dose_per_fraction.is_finite() || dose_per_fraction <= 0.0 || !total.is_finite() {
        return None;
    }

    let count = (total / dose_per_fraction).round();
    if count < 0.0 || count > f64::from(u32::MAX) {
        return None;
    }
    Some(count as u32)
}
