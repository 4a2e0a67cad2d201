use serde::{Deserialize, Serialize};

use primitives::{Amount, BlockTime, ObjectId, Price};

/// A resting limit order, indexed by `(sell_price descending, id)`, by
/// account, and by expiration (`spec.md` §3, LimitOrder entity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrder {
	pub id: ObjectId,
	pub seller: ObjectId,
	pub for_sale: Amount,
	pub sell_price: Price,
	pub expiration: BlockTime,
	pub deferred_fee: Amount,
}

impl LimitOrder {
	/// Amount the seller would receive if the whole remaining `for_sale`
	/// filled at `sell_price`.
	pub fn amount_to_receive(&self) -> Result<Amount, primitives::PriceError> {
		self.sell_price.multiply_base(self.for_sale)
	}
}

/// A collateralized debt position (`spec.md` §3, CallOrder entity).
/// `call_price` is derived, not stored independently of
/// `(collateral, debt, maintenance_collateral_ratio_bps)`, but is cached
/// here because the by-price index needs a stable sort key and recomputing
/// it from the owning asset's current maintenance ratio on every comparison
/// would require the index to reach back into the asset, which the plain
/// `BTreeMap`-keyed index style (`SPEC_FULL.md` §4.A) does not support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOrder {
	pub id: ObjectId,
	pub borrower: ObjectId,
	pub collateral: Amount,
	pub collateral_asset: ObjectId,
	pub debt: Amount,
	pub debt_asset: ObjectId,
	pub call_price: Price,
}

impl CallOrder {
	pub fn is_closed(&self) -> bool {
		self.debt.is_zero() && self.collateral.is_zero()
	}
}

/// A maturing request to sell a balance back to the issuer at the feed
/// price (`spec.md` §3, ForceSettlement entity), indexed by expiration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceSettlement {
	pub id: ObjectId,
	pub owner: ObjectId,
	pub asset: ObjectId,
	pub balance: Amount,
	pub settlement_date: BlockTime,
}

/// An offer of collateral made during a globally-settled market, used by
/// revival to redistribute supply (`spec.md` §3, CollateralBid entity;
/// §4.D, Global settlement revival).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralBid {
	pub id: ObjectId,
	pub bidder: ObjectId,
	pub asset: ObjectId,
	pub additional_collateral: Amount,
	pub debt_covered: Amount,
}

impl CollateralBid {
	/// `inv_swan_price`: collateral offered per unit of debt covered, used
	/// to sort bids descending for greedy revival (`spec.md` §4.D).
	pub fn inv_swan_price(&self) -> Option<(i64, i64)> {
		if self.debt_covered.0 == 0 {
			None
		} else {
			Some((self.additional_collateral.0, self.debt_covered.0))
		}
	}
}
