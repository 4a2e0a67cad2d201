use std::collections::BTreeMap;

use chain_objects::Object;
use primitives::{BlockTime, ObjectId};

use crate::price_key::{PriceKey, PriceKeyDesc, RatioKeyDesc};

/// Account lookups by name (`spec.md` §3 invariant 5: name uniqueness).
#[derive(Debug, Default)]
pub struct AccountIndex {
	pub by_name: BTreeMap<String, ObjectId>,
}

/// Asset lookups by symbol (`spec.md` §3 invariant 5: symbol uniqueness).
#[derive(Debug, Default)]
pub struct AssetIndex {
	pub by_symbol: BTreeMap<String, ObjectId>,
}

/// `(account, asset)` is unique (`spec.md` §3, AccountBalance entity).
#[derive(Debug, Default)]
pub struct AccountBalanceIndex {
	pub by_owner_asset: BTreeMap<(ObjectId, ObjectId), ObjectId>,
}

#[derive(Debug, Default)]
pub struct LimitOrderIndex {
	pub by_price: BTreeMap<(PriceKeyDesc, ObjectId), ObjectId>,
	pub by_account: BTreeMap<(ObjectId, ObjectId), ObjectId>,
	pub by_expiration: BTreeMap<(BlockTime, ObjectId), ObjectId>,
}

impl LimitOrderIndex {
	/// Resting orders selling `base` for `quote`, best price (highest
	/// `base`/`quote`) first — the side of the book the Market Engine
	/// walks when matching an incoming order on the opposite side
	/// (`spec.md` §4.D, `apply_order`). A full scan of `by_price` rather
	/// than a range query: the key already groups by market and orders
	/// descending within it, so this only costs a linear filter rather
	/// than a second index.
	pub fn orders_for_market(&self, base: ObjectId, quote: ObjectId) -> Vec<ObjectId> {
		self.by_price
			.iter()
			.filter(|((key, _), _)| {
				let price = key.0 .0;
				price.base.asset_id == base && price.quote.asset_id == quote
			})
			.map(|(_, id)| *id)
			.collect()
	}
}

#[derive(Debug, Default)]
pub struct CallOrderIndex {
	pub by_call_price: BTreeMap<(PriceKey, ObjectId), ObjectId>,
	pub by_account: BTreeMap<(ObjectId, ObjectId), ObjectId>,
}

impl CallOrderIndex {
	/// Call orders on `debt_asset`, lowest collateral ratio (most at-risk,
	/// i.e. highest `call_price`: less collateral per unit of debt raises
	/// the price at which a call is triggered) first, walking toward
	/// safer positions (`spec.md` §4.D, `check_call_orders` step 3: "walk
	/// call orders from lowest collateral ratio up").
	pub fn orders_for_asset(&self, debt_asset: ObjectId) -> Vec<ObjectId> {
		let mut out: Vec<ObjectId> = self
			.by_call_price
			.iter()
			.filter(|((key, _), _)| key.0.base.asset_id == debt_asset)
			.map(|(_, id)| *id)
			.collect();
		out.reverse();
		out
	}
}

#[derive(Debug, Default)]
pub struct ForceSettlementIndex {
	pub by_expiration: BTreeMap<(BlockTime, ObjectId), ObjectId>,
}

#[derive(Debug, Default)]
pub struct CollateralBidIndex {
	pub by_price: BTreeMap<(ObjectId, RatioKeyDesc, ObjectId), ObjectId>,
}

#[derive(Debug, Default)]
pub struct ProposalIndex {
	pub by_expiration: BTreeMap<(BlockTime, ObjectId), ObjectId>,
}

#[derive(Debug, Default)]
pub struct WithdrawPermissionIndex {
	pub by_expiration: BTreeMap<(BlockTime, ObjectId), ObjectId>,
}

/// All secondary indices owned by the store, one field per indexed entity
/// (`SPEC_FULL.md` §4.A). Each is a handful of `BTreeMap`s keyed by a
/// derived, lexicographically ordered key holding `ObjectId`s, never
/// borrowed references.
#[derive(Debug, Default)]
pub struct Indices {
	pub accounts: AccountIndex,
	pub assets: AssetIndex,
	pub balances: AccountBalanceIndex,
	pub limit_orders: LimitOrderIndex,
	pub call_orders: CallOrderIndex,
	pub force_settlements: ForceSettlementIndex,
	pub collateral_bids: CollateralBidIndex,
	pub proposals: ProposalIndex,
	pub withdraw_permissions: WithdrawPermissionIndex,
}

impl Indices {
	/// Checked before a `create` is allowed to proceed: true iff inserting
	/// `object` would collide with an existing unique-index key belonging
	/// to a *different* id (`spec.md` §4.A: "fails only if an index
	/// constraint is violated (e.g., duplicate unique key)").
	pub fn would_conflict(&self, object: &Object) -> bool {
		match object {
			Object::Account(a) => {
				self.accounts.by_name.get(&a.name).is_some_and(|existing| *existing != a.id)
			}
			Object::Asset(a) => {
				self.assets.by_symbol.get(&a.symbol).is_some_and(|existing| *existing != a.id)
			}
			Object::AccountBalance(b) => self
				.balances
				.by_owner_asset
				.get(&(b.owner, b.asset))
				.is_some_and(|existing| *existing != b.id),
			_ => false,
		}
	}

	pub fn insert(&mut self, object: &Object) {
		match object {
			Object::Account(a) => {
				self.accounts.by_name.insert(a.name.clone(), a.id);
			}
			Object::Asset(a) => {
				self.assets.by_symbol.insert(a.symbol.clone(), a.id);
			}
			Object::AccountBalance(b) => {
				self.balances.by_owner_asset.insert((b.owner, b.asset), b.id);
			}
			Object::LimitOrder(o) => {
				let key = PriceKeyDesc(PriceKey(o.sell_price));
				self.limit_orders.by_price.insert((key, o.id), o.id);
				self.limit_orders.by_account.insert((o.seller, o.id), o.id);
				self.limit_orders.by_expiration.insert((o.expiration, o.id), o.id);
			}
			Object::CallOrder(o) => {
				self.call_orders.by_call_price.insert((PriceKey(o.call_price), o.id), o.id);
				self.call_orders.by_account.insert((o.borrower, o.id), o.id);
			}
			Object::ForceSettlement(s) => {
				self.force_settlements.by_expiration.insert((s.settlement_date, s.id), s.id);
			}
			Object::CollateralBid(b) => {
				if let Some((num, den)) = b.inv_swan_price() {
					self.collateral_bids.by_price.insert(
						(b.asset, RatioKeyDesc { numerator: num, denominator: den }, b.id),
						b.id,
					);
				}
			}
			Object::Proposal(p) => {
				self.proposals.by_expiration.insert((p.expiration_time, p.id), p.id);
			}
			Object::WithdrawPermission(p) => {
				self.withdraw_permissions.by_expiration.insert((p.expiration, p.id), p.id);
			}
			_ => {}
		}
	}

	pub fn remove(&mut self, object: &Object) {
		match object {
			Object::Account(a) => {
				self.accounts.by_name.remove(&a.name);
			}
			Object::Asset(a) => {
				self.assets.by_symbol.remove(&a.symbol);
			}
			Object::AccountBalance(b) => {
				self.balances.by_owner_asset.remove(&(b.owner, b.asset));
			}
			Object::LimitOrder(o) => {
				let key = PriceKeyDesc(PriceKey(o.sell_price));
				self.limit_orders.by_price.remove(&(key, o.id));
				self.limit_orders.by_account.remove(&(o.seller, o.id));
				self.limit_orders.by_expiration.remove(&(o.expiration, o.id));
			}
			Object::CallOrder(o) => {
				self.call_orders.by_call_price.remove(&(PriceKey(o.call_price), o.id));
				self.call_orders.by_account.remove(&(o.borrower, o.id));
			}
			Object::ForceSettlement(s) => {
				self.force_settlements.by_expiration.remove(&(s.settlement_date, s.id));
			}
			Object::CollateralBid(b) => {
				if let Some((num, den)) = b.inv_swan_price() {
					self.collateral_bids.by_price.remove(&(
						b.asset,
						RatioKeyDesc { numerator: num, denominator: den },
						b.id,
					));
				}
			}
			Object::Proposal(p) => {
				self.proposals.by_expiration.remove(&(p.expiration_time, p.id));
			}
			Object::WithdrawPermission(p) => {
				self.withdraw_permissions.by_expiration.remove(&(p.expiration, p.id));
			}
			_ => {}
		}
	}

	/// Removes the old keys for `before` and inserts the new keys for
	/// `after`, the (i)/(iii) steps of the `modify` primitive
	/// (`spec.md` §4.A).
	pub fn reindex(&mut self, before: &Object, after: &Object) {
		self.remove(before);
		self.insert(after);
	}
}
