use std::cmp::Ordering;

use primitives::{ObjectId, Price};

/// A total order over [`Price`] values suitable for use as a `BTreeMap` key:
/// orders group by `(base asset, quote asset)` first (so the book for one
/// market sorts contiguously), then by the exact rational value via
/// cross-multiplication on 128-bit intermediates (never floats), matching
/// `spec.md` §4.D's "comparisons and arithmetic are exact rational
/// operations". This is a key-only ordering, deliberately separate from
/// [`Price`]'s derived structural `PartialEq`/`Eq`, which compares amounts
/// field-by-field rather than by ratio.
#[derive(Debug, Clone, Copy)]
pub struct PriceKey(pub Price);

impl PriceKey {
	fn market(&self) -> (ObjectId, ObjectId) {
		(self.0.base.asset_id, self.0.quote.asset_id)
	}
}

impl PartialEq for PriceKey {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for PriceKey {}

impl PartialOrd for PriceKey {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for PriceKey {
	fn cmp(&self, other: &Self) -> Ordering {
		self.market().cmp(&other.market()).then_with(|| {
			let lhs = (self.0.base.amount.0 as i128) * (other.0.quote.amount.0 as i128);
			let rhs = (other.0.base.amount.0 as i128) * (self.0.quote.amount.0 as i128);
			lhs.cmp(&rhs)
		})
	}
}

/// Descending variant of [`PriceKey`], used by the limit-order book's
/// by-price index (`spec.md` §3: "Indexed by price (descending)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceKeyDesc(pub PriceKey);

impl PartialOrd for PriceKeyDesc {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for PriceKeyDesc {
	fn cmp(&self, other: &Self) -> Ordering {
		other.0.cmp(&self.0)
	}
}

/// A bare `numerator / denominator` ratio, ordered descending by exact
/// cross-multiplication, for indices that are already grouped by asset
/// (and so don't need [`PriceKey`]'s market-grouping prefix) — the
/// collateral-bid book's `inv_swan_price` (`spec.md` §3, CollateralBid
/// entity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioKeyDesc {
	pub numerator: i64,
	pub denominator: i64,
}

impl PartialOrd for RatioKeyDesc {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for RatioKeyDesc {
	fn cmp(&self, other: &Self) -> Ordering {
		let lhs = (self.numerator as i128) * (other.denominator as i128);
		let rhs = (other.numerator as i128) * (self.denominator as i128);
		// Descending: a larger ratio sorts first.
		rhs.cmp(&lhs)
	}
}
