use nephrolens::domain::{
    classify, equation, estimate, normalize, CkdStage, CreatinineUnit, EgfrError, Ethnicity,
    Gender, MdrdCoefficients, Subject, MICROMOL_PER_MG_DL,
};
use nephrolens::EgfrEngine;
use proptest::prelude::*;

fn gender() -> impl Strategy<Value = Gender> {
    prop_oneof![Just(Gender::Male), Just(Gender::Female)]
}

fn ethnicity() -> impl Strategy<Value = Ethnicity> {
    prop_oneof![Just(Ethnicity::Black), Just(Ethnicity::NonBlack)]
}

#[test]
fn test_reference_values() {
    let male = Subject::adult(40.0, Gender::Male, Ethnicity::NonBlack);
    let female = Subject::adult(40.0, Gender::Female, Ethnicity::NonBlack);

    assert_eq!(estimate(&male, 1.0).expect("Should estimate"), 87.96);
    assert_eq!(estimate(&female, 1.0).expect("Should estimate"), 65.27);

    let child = Subject::pediatric(10.0, 120.0, Gender::Male);
    assert_eq!(estimate(&child, 0.5).expect("Should estimate"), 99.12);
}

#[test]
fn test_gender_can_change_stage() {
    let male = Subject::adult(40.0, Gender::Male, Ethnicity::NonBlack);
    let female = Subject::adult(40.0, Gender::Female, Ethnicity::NonBlack);

    let male_rate = estimate(&male, 1.1).expect("Should estimate");
    let female_rate = estimate(&female, 1.1).expect("Should estimate");
    assert_eq!(male_rate, 78.80);
    assert_eq!(female_rate, 58.47);
    assert_eq!(classify(male_rate).stage, CkdStage::G2);
    assert_eq!(classify(female_rate).stage, CkdStage::G3);
}

#[test]
fn test_stage_boundaries() {
    let cases = [
        (120.0, 1),
        (90.0, 1),
        (89.99, 2),
        (60.0, 2),
        (59.99, 3),
        (30.0, 3),
        (29.99, 4),
        (15.0, 4),
        (14.99, 5),
        (0.0, 5),
    ];
    for (rate, stage) in cases {
        assert_eq!(classify(rate).stage.number(), stage, "rate {rate}");
    }
}

#[test]
fn test_unknown_unit_is_rejected() {
    let err = normalize("1.0", "lbs").expect_err("Should reject");
    assert_eq!(err, EgfrError::InvalidUnit("lbs".to_string()));
}

#[test]
fn test_micromol_round_trip() {
    let m = normalize(120.0, "µmol/L").expect("Should normalize");
    assert_eq!(m.unit, CreatinineUnit::MicromolPerL);
    assert!((m.mg_per_dl() * MICROMOL_PER_MG_DL - 120.0).abs() < 1e-9);
}

#[test]
fn test_conventions_differ() {
    let subject = Subject::adult(40.0, Gender::Male, Ethnicity::NonBlack);
    let creatinine = normalize(1.0, "mg/dL").expect("Should normalize");
    let original = EgfrEngine::new(MdrdCoefficients::ORIGINAL)
        .calculate(&subject, &creatinine)
        .expect("Should calculate");
    let idms = EgfrEngine::new(MdrdCoefficients::IDMS)
        .calculate(&subject, &creatinine)
        .expect("Should calculate");
    assert_eq!(original.rate, 87.96);
    assert_eq!(idms.rate, 82.76);
}

proptest! {
    #[test]
    fn prop_estimate_is_deterministic(
        age in 18.0f64..120.0,
        creatinine in 0.1f64..20.0,
        gender in gender(),
        ethnicity in ethnicity(),
    ) {
        let subject = Subject::adult(age, gender, ethnicity);
        let first = estimate(&subject, creatinine).expect("Should estimate");
        let second = estimate(&subject, creatinine).expect("Should estimate");
        prop_assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn prop_rate_falls_as_creatinine_rises(
        age in 18.0f64..120.0,
        creatinine in 0.1f64..15.0,
        delta in 0.01f64..5.0,
        gender in gender(),
        ethnicity in ethnicity(),
    ) {
        let subject = Subject::adult(age, gender, ethnicity);
        let lower = estimate(&subject, creatinine).expect("Should estimate");
        let higher = estimate(&subject, creatinine + delta).expect("Should estimate");
        prop_assert!(higher <= lower);
    }

    // Over this range a 0.5 mg/dL rise moves the rate by more than 0.4, so
    // two-decimal rounding cannot produce a tie.
    #[test]
    fn prop_rate_strictly_falls_for_clinical_creatinine(
        age in 18.0f64..120.0,
        creatinine in 0.1f64..5.0,
        delta in 0.5f64..5.0,
        gender in gender(),
        ethnicity in ethnicity(),
    ) {
        let subject = Subject::adult(age, gender, ethnicity);
        let lower = estimate(&subject, creatinine).expect("Should estimate");
        let higher = estimate(&subject, creatinine + delta).expect("Should estimate");
        prop_assert!(higher < lower, "{} !< {}", higher, lower);
    }

    #[test]
    fn prop_unrounded_mdrd_strictly_decreasing(
        age in 18.0f64..120.0,
        creatinine in 0.1f64..15.0,
        delta in 0.01f64..5.0,
    ) {
        let base = |cr: f64| {
            MdrdCoefficients::ORIGINAL.k
                * cr.powf(equation::CREATININE_EXPONENT)
                * age.powf(equation::AGE_EXPONENT)
        };
        prop_assert!(base(creatinine + delta) < base(creatinine));
    }

    #[test]
    fn prop_pediatric_rate_rises_with_height(
        age in 0.0f64..18.0,
        height in 31.0f64..190.0,
        delta in 0.1f64..10.0,
        creatinine in 0.1f64..5.0,
    ) {
        let short = Subject::pediatric(age, height, Gender::Female);
        let tall = Subject::pediatric(age, height + delta, Gender::Female);
        let short_rate = estimate(&short, creatinine).expect("Should estimate");
        let tall_rate = estimate(&tall, creatinine).expect("Should estimate");
        prop_assert!(tall_rate >= short_rate);
    }

    #[test]
    fn prop_female_never_above_male(
        age in 18.0f64..120.0,
        creatinine in 0.1f64..20.0,
        ethnicity in ethnicity(),
    ) {
        let male = estimate(&Subject::adult(age, Gender::Male, ethnicity), creatinine)
            .expect("Should estimate");
        let female = estimate(&Subject::adult(age, Gender::Female, ethnicity), creatinine)
            .expect("Should estimate");
        prop_assert!(female <= male);
    }

    #[test]
    fn prop_unit_conversion_is_transparent(
        age in 18.0f64..120.0,
        micromol in 10.0f64..1500.0,
        gender in gender(),
    ) {
        let engine = EgfrEngine::default();
        let subject = Subject::adult(age, gender, Ethnicity::NonBlack);
        let in_micromol = normalize(micromol, "µmol/L").expect("Should normalize");
        let in_mg = normalize(micromol / MICROMOL_PER_MG_DL, "mg/dL").expect("Should normalize");

        let a = engine.calculate(&subject, &in_micromol).expect("Should calculate");
        let b = engine.calculate(&subject, &in_mg).expect("Should calculate");
        prop_assert_eq!(a.rate.to_bits(), b.rate.to_bits());
        prop_assert_eq!(a.stage, b.stage);
    }

    #[test]
    fn prop_stage_matches_thresholds(rate in 0.0f64..200.0) {
        let expected = if rate >= 90.0 {
            1
        } else if rate >= 60.0 {
            2
        } else if rate >= 30.0 {
            3
        } else if rate >= 15.0 {
            4
        } else {
            5
        };
        prop_assert_eq!(classify(rate).stage.number(), expected);
    }

    #[test]
    fn prop_rate_has_two_decimals(
        age in 18.0f64..120.0,
        creatinine in 0.1f64..20.0,
    ) {
        let subject = Subject::adult(age, Gender::Male, Ethnicity::Black);
        let rate = estimate(&subject, creatinine).expect("Should estimate");
        prop_assert!(((rate * 100.0).round() - rate * 100.0).abs() < 1e-6);
    }
}
