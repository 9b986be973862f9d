use super::regimen::derive_missing;
use crate::common::config::DosePolicy;
use crate::common::constants::REFERENCE_DOSE_PER_FRACTION;
use crate::domain::{AlphaBeta, DoseConversion, DoseRegimen, Resolved};

/// `BED = n · d · (1 + d/αβ)`
pub fn bed(fraction_count: u32, dose_per_fraction: f64, alpha_beta: AlphaBeta) -> f64 {
    f64::from(fraction_count) * dose_per_fraction * (1.0 + dose_per_fraction / alpha_beta.value())
}

/// `EQD2 = BED / (1 + 2/αβ)`
pub fn eqd2_from_bed(bed: f64, alpha_beta: AlphaBeta) -> f64 {
    bed / (1.0 + REFERENCE_DOSE_PER_FRACTION / alpha_beta.value())
}

/// BED of a physical dose `D` delivered at `d` Gy per fraction:
/// `D · (1 + d/αβ)`.
pub fn bed_of_total(total_dose: f64, dose_per_fraction: f64, alpha_beta: AlphaBeta) -> f64 {
    total_dose * (1.0 + dose_per_fraction / alpha_beta.value())
}

/// Convert a possibly partial regimen into BED, EQD2 and physical dose.
///
/// The regimen is derived first. A finite `manual_bed` is used verbatim and
/// does not need α/β; EQD2 still does. The minimum-dose policy only changes
/// the dose per fraction fed into the formula, never the regimen returned
/// for display. Physical dose is only reported alongside a BED.
pub fn convert(
    regimen: DoseRegimen,
    alpha_beta: Option<AlphaBeta>,
    manual_bed: Option<f64>,
    policy: &DosePolicy,
) -> DoseConversion {
    let regimen = derive_missing(regimen);

    let computed_bed = alpha_beta.and_then(|alpha_beta| {
        regimen.fractions_and_dose().map(|(n, d)| {
            let effective = policy.effective_dose_per_fraction(d);
            bed(n, effective, alpha_beta)
        })
    });
    let manual_bed = manual_bed.filter(|value| value.is_finite());
    let bed = Resolved::merge(manual_bed, computed_bed);

    let eqd2 = bed
        .zip(alpha_beta)
        .map(|(bed, alpha_beta)| eqd2_from_bed(bed.value(), alpha_beta));

    DoseConversion {
        regimen,
        bed,
        eqd2,
        physical_dose: bed.and(regimen.total_dose.filter(|dose| dose.is_finite())),
    }
}

#[cfg(test)]
mod tests {
    use super::{bed, bed_of_total, convert, eqd2_from_bed};
    use crate::common::config::DosePolicy;
    use crate::domain::{AlphaBeta, DoseRegimen, Resolved};

    fn ab(value: f64) -> AlphaBeta {
        AlphaBeta::new(value).expect("valid alpha/beta")
    }

    #[test]
    fn conventional_scheme_gives_known_bed_and_eqd2() {
        let bed = bed(30, 2.0, ab(3.0));
        assert!((bed - 100.0).abs() <= 1.0e-9);
        assert!((eqd2_from_bed(bed, ab(3.0)) - 60.0).abs() <= 1.0e-9);
    }

    #[test]
    fn eqd2_of_two_gray_fractions_equals_physical_dose() {
        for alpha_beta in [1.5, 2.0, 3.0, 10.0] {
            let bed = bed(25, 2.0, ab(alpha_beta));
            assert!((eqd2_from_bed(bed, ab(alpha_beta)) - 50.0).abs() <= 1.0e-9);
        }
    }

    #[test]
    fn bed_of_total_matches_fractionated_formula() {
        let by_total = bed_of_total(20.0, 2.0, ab(3.0));
        let by_fractions = bed(10, 2.0, ab(3.0));
        assert!((by_total - by_fractions).abs() <= 1.0e-12);
    }

    #[test]
    fn convert_derives_the_regimen_first() {
        let conversion = convert(
            DoseRegimen::new(Some(60.0), Some(30), None),
            AlphaBeta::new(3.0),
            None,
            &DosePolicy::default(),
        );
        assert_eq!(conversion.regimen.dose_per_fraction, Some(2.0));
        assert_eq!(conversion.physical_dose, Some(60.0));
        assert!(!conversion.bed.expect("bed").is_overridden());
        assert!((conversion.bed_value().expect("bed") - 100.0).abs() <= 1.0e-9);
        assert!((conversion.eqd2.expect("eqd2") - 60.0).abs() <= 1.0e-9);
    }

    #[test]
    fn floor_changes_the_formula_input_but_not_the_regimen() {
        let conversion = convert(
            DoseRegimen::from_fractions(10, 1.5),
            AlphaBeta::new(3.0),
            None,
            &DosePolicy::enforcing_minimum(),
        );
        assert_eq!(conversion.regimen.dose_per_fraction, Some(1.5));
        assert_eq!(conversion.physical_dose, Some(15.0));

        let expected = 10.0 * 1.8 * (1.0 + 1.8 / 3.0);
        assert!((conversion.bed_value().expect("bed") - expected).abs() <= 1.0e-9);
    }

    #[test]
    fn manual_bed_is_used_verbatim_without_alpha_beta() {
        let conversion = convert(
            DoseRegimen::default(),
            None,
            Some(120.0),
            &DosePolicy::default(),
        );
        assert_eq!(conversion.bed, Some(Resolved::Overridden(120.0)));
        assert_eq!(conversion.eqd2, None);
        assert_eq!(conversion.physical_dose, None);

        let with_total = convert(
            DoseRegimen::new(Some(45.0), None, None),
            None,
            Some(120.0),
            &DosePolicy::default(),
        );
        assert_eq!(with_total.physical_dose, Some(45.0));
    }

    #[test]
    fn manual_bed_overrides_a_computable_regimen() {
        let conversion = convert(
            DoseRegimen::from_fractions(30, 2.0),
            AlphaBeta::new(2.0),
            Some(0.0),
            &DosePolicy::default(),
        );
        assert_eq!(conversion.bed, Some(Resolved::Overridden(0.0)));
        assert_eq!(conversion.eqd2, Some(0.0));
        assert_eq!(conversion.physical_dose, Some(60.0));
    }

    #[test]
    fn missing_alpha_beta_or_regimen_leaves_results_unavailable() {
        let no_ratio = convert(
            DoseRegimen::from_fractions(30, 2.0),
            None,
            None,
            &DosePolicy::default(),
        );
        assert_eq!(no_ratio.bed, None);
        assert_eq!(no_ratio.eqd2, None);
        assert_eq!(no_ratio.physical_dose, None);
        assert_eq!(no_ratio.regimen.total_dose, Some(60.0));

        let only_total = convert(
            DoseRegimen::new(Some(60.0), None, None),
            AlphaBeta::new(3.0),
            None,
            &DosePolicy::default(),
        );
        assert_eq!(only_total.bed, None);
        assert_eq!(only_total.eqd2, None);
        assert_eq!(only_total.physical_dose, None);
    }
}
