use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A signed, checked 64-bit fixed-point quantity — the unit every balance,
/// supply, collateral and debt figure in the chain is expressed in. All
/// arithmetic is explicit and checked: the core never silently wraps or
/// saturates a balance (`spec.md` §7, *Overflow* error kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(pub i64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OverflowError {
	#[error("amount arithmetic overflowed ({lhs} {op} {rhs})")]
	Overflow { lhs: i64, op: &'static str, rhs: i64 },
	#[error("amount {0} must not be negative here")]
	Negative(i64),
}

impl Amount {
	pub const ZERO: Amount = Amount(0);

	pub fn checked_add(self, rhs: Amount) -> Result<Amount, OverflowError> {
		self.0
			.checked_add(rhs.0)
			.map(Amount)
			.ok_or(OverflowError::Overflow { lhs: self.0, op: "+", rhs: rhs.0 })
	}

	pub fn checked_sub(self, rhs: Amount) -> Result<Amount, OverflowError> {
		self.0
			.checked_sub(rhs.0)
			.map(Amount)
			.ok_or(OverflowError::Overflow { lhs: self.0, op: "-", rhs: rhs.0 })
	}

	pub fn checked_neg(self) -> Result<Amount, OverflowError> {
		self.0
			.checked_neg()
			.map(Amount)
			.ok_or(OverflowError::Overflow { lhs: self.0, op: "neg", rhs: 0 })
	}

	pub fn is_positive(self) -> bool {
		self.0 > 0
	}

	pub fn is_zero(self) -> bool {
		self.0 == 0
	}

	/// Requires the amount to be non-negative; evaluators use this at the
	/// boundary where a field was deserialized and must be checked before
	/// any arithmetic is performed on it.
	pub fn require_non_negative(self) -> Result<Amount, OverflowError> {
		if self.0 < 0 {
			Err(OverflowError::Negative(self.0))
		} else {
			Ok(self)
		}
	}

	/// `self * numerator / denominator`, rounding toward zero, computed with
	/// a 128-bit intermediate so that market-fee and price conversions on
	/// large balances cannot silently overflow (`spec.md` §4.D).
	pub fn mul_ratio(self, numerator: i64, denominator: i64) -> Result<Amount, OverflowError> {
		assert!(denominator != 0, "mul_ratio denominator must not be zero");
		let wide = (self.0 as i128) * (numerator as i128) / (denominator as i128);
		i64::try_from(wide)
			.map(Amount)
			.map_err(|_| OverflowError::Overflow { lhs: self.0, op: "mul_ratio", rhs: numerator })
	}
}

impl fmt::Display for Amount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<i64> for Amount {
	fn from(value: i64) -> Self {
		Amount(value)
	}
}
