//! Exact conversion between a chain's smallest unit (wei, satoshi) and its display unit.
//!
//! Values are scaled with integer arithmetic only. A display amount is a
//! [`Decimal`] whose mantissa is the raw smallest-unit count and whose scale is the
//! chain's number of decimals, so converting back recovers the original integer.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error as ThisError;

/// Largest scale a [`Decimal`] can carry.
pub const MAX_DECIMALS: u32 = 28;

/// Errors produced while scaling amounts
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
	#[error("Amount {0} does not fit in a 96-bit decimal mantissa")]
	Overflow(String),

	#[error("Unsupported number of decimals: {0}")]
	UnsupportedDecimals(u32),

	#[error("Amount {0} is negative")]
	Negative(String),

	#[error("Amount {0} has more fractional digits than the unit allows")]
	FractionalUnits(String),

	#[error("Invalid amount literal: {0}")]
	InvalidLiteral(String),
}

/// Converts `raw` smallest units into display units with `decimals` fractional digits.
///
/// `to_display_units(2_500_000_000_000_000_000, 18)` is `2.5`.
pub fn to_display_units(raw: u128, decimals: u32) -> Result<Decimal, AmountError> {
	if decimals > MAX_DECIMALS {
		return Err(AmountError::UnsupportedDecimals(decimals));
	}
	let mantissa = i128::try_from(raw).map_err(|_| AmountError::Overflow(raw.to_string()))?;
	Decimal::try_from_i128_with_scale(mantissa, decimals)
		.map_err(|_| AmountError::Overflow(raw.to_string()))
}

/// Converts a display amount back into smallest units.
///
/// Fails when the amount is negative or carries more precision than `decimals`.
pub fn to_smallest_units(amount: Decimal, decimals: u32) -> Result<u128, AmountError> {
	if decimals > MAX_DECIMALS {
		return Err(AmountError::UnsupportedDecimals(decimals));
	}
	if amount.is_sign_negative() && !amount.is_zero() {
		return Err(AmountError::Negative(amount.to_string()));
	}

	let mantissa = amount.mantissa().unsigned_abs();
	let scale = amount.scale();

	if scale > decimals {
		let divisor = pow10(scale - decimals)?;
		if mantissa % divisor != 0 {
			return Err(AmountError::FractionalUnits(amount.to_string()));
		}
		Ok(mantissa / divisor)
	} else {
		let factor = pow10(decimals - scale)?;
		mantissa
			.checked_mul(factor)
			.ok_or_else(|| AmountError::Overflow(amount.to_string()))
	}
}

/// Parses a numeric literal such as `0.00012` or `1.5e-5` into a `Decimal` without `f64` arithmetic.
pub fn parse_decimal_literal(literal: &str) -> Result<Decimal, AmountError> {
	Decimal::from_str(literal)
		.or_else(|_| Decimal::from_scientific(literal))
		.map_err(|_| AmountError::InvalidLiteral(literal.to_string()))
}

fn pow10(exp: u32) -> Result<u128, AmountError> {
	10u128
		.checked_pow(exp)
		.ok_or(AmountError::UnsupportedDecimals(exp))
}
