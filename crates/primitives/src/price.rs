use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Amount, ObjectId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
	#[error("price must have strictly positive base and quote amounts")]
	NonPositiveAmount,
	#[error("price arithmetic overflowed")]
	Overflow,
}

/// An amount of a specific asset, used as one leg of a [`Price`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmount {
	pub asset_id: ObjectId,
	pub amount: Amount,
}

impl AssetAmount {
	pub const fn new(asset_id: ObjectId, amount: Amount) -> Self {
		Self { asset_id, amount }
	}
}

/// A ratio `base / quote` of two assets, represented as two strictly
/// positive integer amounts rather than a floating-point value so that
/// comparisons and products are exact (`spec.md` §4.D).
///
/// All cross-multiplication is carried out on 128-bit intermediates; every
/// call site that could overflow returns [`PriceError::Overflow`] instead of
/// wrapping, per the *Overflow* error kind in `spec.md` §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
	pub base: AssetAmount,
	pub quote: AssetAmount,
}

impl Price {
	pub fn new(base: AssetAmount, quote: AssetAmount) -> Result<Self, PriceError> {
		if base.amount.0 <= 0 || quote.amount.0 <= 0 {
			return Err(PriceError::NonPositiveAmount);
		}
		Ok(Self { base, quote })
	}

	/// `self.base / self.quote < other.base / other.quote`, computed as
	/// `self.base * other.quote < other.base * self.quote` to avoid
	/// floating point, widened to i128 to avoid overflow.
	fn cross(&self, other: &Price) -> (i128, i128) {
		let lhs = (self.base.amount.0 as i128) * (other.quote.amount.0 as i128);
		let rhs = (other.base.amount.0 as i128) * (self.quote.amount.0 as i128);
		(lhs, rhs)
	}

	/// Requires both prices to be quoted in the same asset pair (base/quote
	/// assets match, in either order is not accepted: callers must first
	/// normalize via [`Price::to_asset_pair`]).
	pub fn less_than(&self, other: &Price) -> bool {
		let (lhs, rhs) = self.cross(other);
		lhs < rhs
	}

	pub fn less_or_equal(&self, other: &Price) -> bool {
		let (lhs, rhs) = self.cross(other);
		lhs <= rhs
	}

	/// The reciprocal price `quote / base`.
	pub fn invert(&self) -> Price {
		Price { base: self.quote, quote: self.base }
	}

	/// `amount_of_quote * self` → an amount of `base`, i.e. how much base
	/// asset a given quote amount buys at this price. Used to convert a
	/// `for_sale` (base) amount into `to_receive` (quote) and back.
	pub fn multiply_quote(&self, quote_amount: Amount) -> Result<Amount, PriceError> {
		let wide = (quote_amount.0 as i128) * (self.base.amount.0 as i128)
			/ (self.quote.amount.0 as i128);
		i64::try_from(wide).map(Amount).map_err(|_| PriceError::Overflow)
	}

	pub fn multiply_base(&self, base_amount: Amount) -> Result<Amount, PriceError> {
		self.invert().multiply_quote(base_amount)
	}

	/// `call_price` per `spec.md` §4.D: the price at which a call order
	/// with the given collateral and debt becomes eligible for a margin
	/// call, derived from the backing collateral ratio and the asset's
	/// maintenance collateral ratio (expressed in basis points, e.g. 1750
	/// for a 1.75x ratio).
	pub fn call_price(
		debt: AssetAmount,
		collateral: AssetAmount,
		maintenance_collateral_ratio_bps: u16,
	) -> Result<Price, PriceError> {
		// call_price = debt * MCR / (collateral * 1000)
		let scaled_debt = (debt.amount.0 as i128) * (maintenance_collateral_ratio_bps as i128);
		let scaled_debt = i64::try_from(scaled_debt).map_err(|_| PriceError::Overflow)?;
		Price::new(
			AssetAmount::new(debt.asset_id, Amount(scaled_debt)),
			AssetAmount::new(collateral.asset_id, Amount(collateral.amount.0 * 1000)),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn aa(asset: u64, amount: i64) -> AssetAmount {
		AssetAmount::new(ObjectId::new(crate::Space::Protocol, 3, asset), Amount(amount))
	}

	#[test]
	fn rejects_non_positive_amounts() {
		assert!(Price::new(aa(0, 0), aa(1, 1)).is_err());
		assert!(Price::new(aa(0, 1), aa(1, -1)).is_err());
	}

	#[test]
	fn compares_without_floats() {
		let a = Price::new(aa(0, 1), aa(1, 2)).unwrap(); // 1/2
		let b = Price::new(aa(0, 2), aa(1, 3)).unwrap(); // 2/3
		assert!(a.less_than(&b));
		assert!(!b.less_than(&a));
	}

	#[test]
	fn invert_swaps_legs() {
		let p = Price::new(aa(0, 1), aa(1, 2)).unwrap();
		let inv = p.invert();
		assert_eq!(inv.base, p.quote);
		assert_eq!(inv.quote, p.base);
	}

	#[test]
	fn multiply_quote_converts_using_ratio() {
		let p = Price::new(aa(0, 3), aa(1, 2)).unwrap(); // 3 base per 2 quote
		assert_eq!(p.multiply_quote(Amount(4)).unwrap(), Amount(6));
	}
}
