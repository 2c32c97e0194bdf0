use crate::properties::strategies::MAX_MANTISSA;

use proptest::{prelude::*, test_runner::Config};
use rust_decimal::Decimal;
use wallet_notifier::utils::{
	amount::{AmountError, MAX_DECIMALS},
	to_display_units, to_smallest_units,
};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_display_units_roundtrip(raw in 0..=MAX_MANTISSA, decimals in 0..=MAX_DECIMALS) {
		let display = to_display_units(raw, decimals).unwrap();
		prop_assert!(!display.is_sign_negative() || display.is_zero());
		prop_assert_eq!(to_smallest_units(display, decimals).unwrap(), raw);
	}

	#[test]
	fn test_display_units_are_scaled_exactly(raw in 0..=u64::MAX as u128, decimals in 0u32..=18) {
		let display = to_display_units(raw, decimals).unwrap();
		let scale = Decimal::from(10u64.pow(decimals));
		prop_assert_eq!(display * scale, Decimal::from(raw));
	}

	#[test]
	fn test_normalized_amount_keeps_value(raw in 0..=MAX_MANTISSA, decimals in 0..=MAX_DECIMALS) {
		let display = to_display_units(raw, decimals).unwrap();
		let normalized = display.normalize();
		prop_assert_eq!(normalized, display);
		prop_assert_eq!(to_smallest_units(normalized, decimals).unwrap(), raw);
	}

	#[test]
	fn test_values_beyond_mantissa_overflow(raw in (MAX_MANTISSA + 1)..=u128::MAX, decimals in 0..=MAX_DECIMALS) {
		prop_assert!(matches!(
			to_display_units(raw, decimals),
			Err(AmountError::Overflow(_))
		));
	}

	#[test]
	fn test_extra_precision_is_rejected(units in 1u64..1_000_000, decimals in 0u32..=8) {
		// One digit more than the unit allows, never a multiple of ten
		let digits = units * 10 + 1;
		let amount = Decimal::from_i128_with_scale(digits as i128, decimals + 1);
		prop_assert!(matches!(
			to_smallest_units(amount, decimals),
			Err(AmountError::FractionalUnits(_))
		));
	}
}
