use super::money::*;
use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_montant_zero() {
    assert!(Montant::ZERO.is_zero());
    assert!(!Montant::ZERO.is_negative());
    assert!(!Montant::ZERO.is_positive());
    assert_eq!(Montant::default(), Montant::ZERO);
}

#[test]
fn test_checked_add_overflow() {
    let max = Montant::new(i64::MAX);
    assert_eq!(max.checked_add(Montant::new(1)), Err(MoneyError::Overflow));
}

#[test]
fn test_checked_sub() {
    let a = Montant::new(300_000);
    let b = Montant::new(100_000);
    assert_eq!(a.checked_sub(b), Ok(Montant::new(200_000)));
    assert_eq!(b.checked_sub(a), Ok(Montant::new(-200_000)));
}

#[test]
fn test_sum() {
    let total = Montant::sum([Montant::new(1), Montant::new(2), Montant::new(3)]).unwrap();
    assert_eq!(total, Montant::new(6));
    assert_eq!(Montant::sum(Vec::new()), Ok(Montant::ZERO));
}

#[rstest]
#[case(1_000_000, dec!(18), 180_000)]
#[case(1_000_000, dec!(2), 20_000)]
#[case(333, dec!(7.5), 25)] // 24.975 rounds up
#[case(5, dec!(10), 1)] // 0.5 rounds away from zero
#[case(1_000, dec!(0), 0)]
fn test_apply_rate(#[case] base: i64, #[case] rate: Decimal, #[case] expected: i64) {
    assert_eq!(
        Montant::new(base).apply_rate(rate),
        Ok(Montant::new(expected))
    );
}

#[test]
fn test_apply_negative_rate_fails() {
    assert_eq!(
        Montant::new(100).apply_rate(dec!(-1)),
        Err(MoneyError::InvalidRate(dec!(-1)))
    );
}

#[rstest]
#[case(800, 1_000, dec!(80.00))]
#[case(1, 3, dec!(33.33))]
#[case(500, 0, dec!(0))]
fn test_percent_of(#[case] part: i64, #[case] total: i64, #[case] expected: Decimal) {
    assert_eq!(Montant::new(part).percent_of(Montant::new(total)), expected);
}

#[test]
fn test_ratio_percent_keeps_precision() {
    assert_eq!(
        Montant::new(800_001).ratio_percent(Montant::new(1_000_000)),
        dec!(80.0001)
    );
    assert_eq!(Montant::new(800_001).percent_of(Montant::new(1_000_000)), dec!(80.00));
    assert_eq!(Montant::new(5).ratio_percent(Montant::ZERO), Decimal::ZERO);
}

#[test]
fn test_try_from_decimal() {
    assert_eq!(Montant::try_from(dec!(1500)), Ok(Montant::new(1500)));
    assert_eq!(
        Montant::try_from(dec!(15.5)),
        Err(MoneyError::NotWholeUnits(dec!(15.5)))
    );
}

#[test]
fn test_serde_transparent() {
    let json = serde_json::to_string(&Montant::new(42)).unwrap();
    assert_eq!(json, "42");
    let back: Montant = serde_json::from_str("42").unwrap();
    assert_eq!(back, Montant::new(42));
}

proptest! {
    /// Adding then subtracting the same amount is the identity.
    #[test]
    fn prop_add_sub_identity(a in -1_000_000_000_000i64..1_000_000_000_000, b in -1_000_000_000_000i64..1_000_000_000_000) {
        let a = Montant::new(a);
        let b = Montant::new(b);
        prop_assert_eq!(a.checked_add(b).unwrap().checked_sub(b).unwrap(), a);
    }

    /// A 100% rate returns the base amount unchanged.
    #[test]
    fn prop_full_rate_is_identity(a in 0i64..1_000_000_000_000) {
        prop_assert_eq!(Montant::new(a).apply_rate(Decimal::ONE_HUNDRED).unwrap(), Montant::new(a));
    }
}
