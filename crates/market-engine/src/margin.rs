use chain_objects::{BitassetData, CallOrder, LimitOrder, Object, VirtualOp};
use object_store::Store;
use primitives::{Amount, AssetAmount, ObjectId, Price};
use tracing::warn;

use crate::error::MarketError;
use crate::fund;

/// Orientation convention used throughout this module (an Open Question
/// resolution recorded in `DESIGN.md`): every [`Price`] concerning a
/// market-issued asset — `BitassetData::settlement_price`,
/// `PriceFeed::settlement_price`/`max_short_squeeze_price`,
/// `CallOrder::call_price`, and the resting-order prices this module reads
/// off the book — shares `Price::call_price`'s existing orientation of
/// `base = debt asset`, `quote = backing (collateral) asset`. That lets
/// `spec.md` §4.D's literal "a margin call fires when a call order's
/// call_price ≤ the best bid's price" read as a direct `less_or_equal` on
/// two `Price` values with no per-call inversion.
fn backing_asset(store: &Store, debt_asset: ObjectId) -> Result<(ObjectId, BitassetData), MarketError> {
	let asset = store.get(debt_asset)?.as_asset().ok_or(MarketError::WrongObjectType(debt_asset))?;
	let bitasset_id = asset.bitasset_data.ok_or(MarketError::NotMarketIssued(debt_asset))?;
	let bitasset = store.get(bitasset_id)?.as_bitasset_data().cloned().ok_or(MarketError::WrongObjectType(bitasset_id))?;
	Ok((bitasset.backing_asset, bitasset))
}

/// Entry point from the limit-order book: runs the margin-call check for
/// whichever of `a`/`b` is a market-issued asset backed by the other, a
/// no-op otherwise (`spec.md` §4.D, `apply_order` steps 1 and 3).
pub fn check_call_orders_for_pair(store: &mut Store, a: ObjectId, b: ObjectId) -> Result<Vec<VirtualOp>, MarketError> {
	let mut ops = Vec::new();
	for (candidate, backing) in [(a, b), (b, a)] {
		let Some(asset) = store.find(candidate).and_then(Object::as_asset) else { continue };
		let Some(bitasset_id) = asset.bitasset_data else { continue };
		let bitasset = store.get(bitasset_id)?.as_bitasset_data().unwrap();
		if bitasset.backing_asset == backing {
			ops.extend(check_call_orders(store, candidate)?);
		}
	}
	Ok(ops)
}

/// `spec.md` §4.D, `check_call_orders`: sweeps every call order on
/// `debt_asset`, most at-risk first, margin-calling any that cross the
/// best available counter-liquidity, triggering global settlement if even
/// the best available price can't cover a call at fair value.
pub fn check_call_orders(store: &mut Store, debt_asset: ObjectId) -> Result<Vec<VirtualOp>, MarketError> {
	let mut ops = Vec::new();
	let (backing_asset, bitasset) = backing_asset(store, debt_asset)?;
	if bitasset.is_globally_settled() {
		return Ok(ops);
	}
	let Some(feed) = bitasset.current_feed.clone() else {
		return Ok(ops);
	};

	loop {
		let call_ids = store.indices().call_orders.orders_for_asset(debt_asset);
		let Some(&call_id) = call_ids.first() else { break };
		let call = store.get(call_id)?.as_call_order().cloned().ok_or(MarketError::WrongObjectType(call_id))?;
		if call.call_price.less_than(&feed.settlement_price) {
			break; // feed-protected (HARDFORK_436): the feed still values this debt below what the call would require
		}

		let Some(bid) = best_bid(store, debt_asset, backing_asset)? else { break };
		if !call.call_price.less_or_equal(&bid.sell_price) {
			break; // no resting liquidity crosses the call price
		}

		if bid.sell_price.less_than(&feed.settlement_price) {
			// Even the best resting offer undervalues the debt relative to
			// the feed: the market can't cover calls at fair value.
			warn!(asset = ?debt_asset, "no liquidity covers margin calls at fair value, triggering global settlement");
			let swan_price = compute_swan_price(store, debt_asset, backing_asset)?;
			let mut settle_ops = settle_market(store, debt_asset, swan_price)?;
			settle_ops.append(&mut ops);
			return Ok(settle_ops);
		}

		ops.extend(fill_call_against_bid(store, &call, &bid)?);
	}
	Ok(ops)
}

/// The resting order offering the most debt per unit of collateral — the
/// counterparty a margin call prefers, since it lets the call retire the
/// most debt for the least collateral (`spec.md` §4.D step 3: "walk the
/// limit-order book from highest bid down").
fn best_bid(store: &Store, debt_asset: ObjectId, backing_asset: ObjectId) -> Result<Option<LimitOrder>, MarketError> {
	let ids = store.indices().limit_orders.orders_for_market(debt_asset, backing_asset);
	Ok(ids.into_iter().find_map(|id| store.find(id).and_then(Object::as_limit_order).cloned()))
}

/// Executes one margin-call fill at the bid's resting price: the call
/// order pays collateral and retires debt, the resting bid pays debt
/// (burned, not transferred onward) and receives collateral. No market fee
/// is charged on a forced fill (Open Question resolution, `DESIGN.md`).
fn fill_call_against_bid(store: &mut Store, call: &CallOrder, bid: &LimitOrder) -> Result<Vec<VirtualOp>, MarketError> {
	// `bid.for_sale` is already denominated in the debt asset (`bid.sell_price.base`),
	// so it compares directly against `call.debt` with no price conversion.
	let call_fully_closes = call.debt.0 <= bid.for_sale.0;

	let (collateral_given, debt_retired) = if call_fully_closes {
		let debt_retired = call.debt;
		let collateral_given = bid.sell_price.multiply_base(debt_retired)?;
		(collateral_given, debt_retired)
	} else {
		let debt_retired = bid.for_sale;
		let collateral_given = bid.amount_to_receive()?;
		(collateral_given, debt_retired)
	};

	store.modify(call.id, |o| {
		let c = o.as_call_order_mut().unwrap();
		c.collateral = c.collateral.checked_sub(collateral_given).expect("bounded by capacity check above");
		c.debt = c.debt.checked_sub(debt_retired).expect("bounded by capacity check above");
	})?;
	reduce_supply(store, call.debt_asset, debt_retired)?;

	let remaining_bid = bid.for_sale.checked_sub(debt_retired)?;
	if remaining_bid.is_zero() {
		store.remove(bid.id)?;
	} else {
		store.modify(bid.id, |o| {
			o.as_limit_order_mut().unwrap().for_sale = remaining_bid;
		})?;
	}
	fund::credit_balance(store, bid.seller, call.collateral_asset, collateral_given)?;

	let mut ops = vec![VirtualOp::FillOrder {
		order: bid.id,
		account: bid.seller,
		pays: AssetAmount::new(call.debt_asset, debt_retired),
		receives: AssetAmount::new(call.collateral_asset, collateral_given),
		fee: AssetAmount::new(call.collateral_asset, Amount::ZERO),
		is_maker: true,
	}];

	let updated = store.get(call.id)?.as_call_order().unwrap().clone();
	if updated.debt.is_zero() {
		// Debt fully retired: any leftover collateral belongs to the
		// borrower again, not to the system.
		if updated.collateral.is_positive() {
			fund::credit_balance(store, updated.borrower, updated.collateral_asset, updated.collateral)?;
		}
		store.remove(call.id)?;
		ops.push(VirtualOp::CallOrderClosed { order: call.id, borrower: call.borrower });
	}
	Ok(ops)
}

fn reduce_supply(store: &mut Store, asset: ObjectId, amount: Amount) -> Result<(), MarketError> {
	let dynamic_data = store.get(asset)?.as_asset().ok_or(MarketError::WrongObjectType(asset))?.dynamic_data;
	store.modify(dynamic_data, |o| {
		let dd = o.as_asset_dynamic_data_mut().unwrap();
		dd.current_supply = dd.current_supply.checked_sub(amount).expect("supply cannot go negative under invariant 1");
	})?;
	Ok(())
}

/// `spec.md` §4.D step 5: the black-swan settlement price — set so that
/// existing debt exactly consumes all posted collateral across every
/// remaining call order on the asset.
fn compute_swan_price(store: &Store, debt_asset: ObjectId, backing_asset: ObjectId) -> Result<Price, MarketError> {
	let ids = store.indices().call_orders.orders_for_asset(debt_asset);
	let (mut total_collateral, mut total_debt) = (0i64, 0i64);
	for id in ids {
		if let Some(call) = store.find(id).and_then(Object::as_call_order) {
			total_collateral += call.collateral.0;
			total_debt += call.debt.0;
		}
	}
	Price::new(
		AssetAmount::new(debt_asset, Amount(total_debt.max(1))),
		AssetAmount::new(backing_asset, Amount(total_collateral.max(1))),
	)
	.map_err(MarketError::from)
}

/// `spec.md` §4.D: "drains all CallOrders into a settlement fund at that
/// price"; used both by the automatic black-swan trigger and by the
/// issuer-initiated `AssetGlobalSettle` evaluator. From this moment no new
/// calls or trades are possible for this asset until revival.
pub fn settle_market(store: &mut Store, debt_asset: ObjectId, settle_price: Price) -> Result<Vec<VirtualOp>, MarketError> {
	let asset = store.get(debt_asset)?.as_asset().ok_or(MarketError::WrongObjectType(debt_asset))?;
	let bitasset_id = asset.bitasset_data.ok_or(MarketError::NotMarketIssued(debt_asset))?;
	let mut fund_total = Amount::ZERO;
	let ids = store.indices().call_orders.orders_for_asset(debt_asset);
	for id in ids {
		let call = store.get(id)?.as_call_order().cloned().ok_or(MarketError::WrongObjectType(id))?;
		fund_total = fund_total.checked_add(call.collateral)?;
		store.remove(id)?;
	}
	store.modify(bitasset_id, |o| {
		let b = o.as_bitasset_data_mut().unwrap();
		b.settlement_price = Some(settle_price);
		b.settlement_fund = fund_total;
	})?;
	Ok(vec![VirtualOp::GlobalSettle { asset: debt_asset, settle_price }])
}

#[cfg(test)]
mod tests {
	use super::*;
	use chain_objects::{ids, Account, AccountOptions, Asset, AssetDynamicData, AssetFlags, AssetOptions, Authority, FeedOptions, PriceFeed};
	use object_store::Store;
	use primitives::{BlockTime, Space};

	fn dummy_account(id: ObjectId, name: &str) -> Object {
		Object::Account(Account {
			id,
			name: name.to_string(),
			owner: Authority::default(),
			active: Authority::default(),
			options: AccountOptions::default(),
			registrar: id,
			lifetime_member: false,
			statistics: ObjectId::new(Space::Implementation, ids::implementation::ACCOUNT_STATISTICS, 0),
		})
	}

	fn setup_backed_asset(
		store: &mut Store,
	) -> (ObjectId, ObjectId, ObjectId /* core, mark, borrower */) {
		let issuer = store.create(Space::Protocol, ids::protocol::ACCOUNT, |id| dummy_account(id, "issuer")).unwrap();
		let borrower = store.create(Space::Protocol, ids::protocol::ACCOUNT, |id| dummy_account(id, "borrower")).unwrap();
		let core_dyn = store
			.create(Space::Implementation, ids::implementation::ASSET_DYNAMIC_DATA, |id| {
				Object::AssetDynamicData(AssetDynamicData { id, asset: ObjectId::new(Space::Protocol, 0, 0), current_supply: Amount(0), accumulated_fees: Amount(0) })
			})
			.unwrap();
		let core = store
			.create(Space::Protocol, ids::protocol::ASSET, |id| {
				Object::Asset(Asset {
					id,
					symbol: "CORE".into(),
					precision: 5,
					issuer,
					options: AssetOptions {
						max_supply: Amount(1_000_000_000),
						flags: AssetFlags::NONE,
						issuer_permissions: AssetFlags::NONE,
						market_fee_percent: 0,
						max_market_fee: Amount(0),
						core_exchange_rate: None,
						whitelist_authorities: vec![],
						blacklist_authorities: vec![],
					},
					dynamic_data: core_dyn,
					bitasset_data: None,
				})
			})
			.unwrap();
		store.modify(core_dyn, |o| o.as_asset_dynamic_data_mut().unwrap().asset = core).unwrap();

		let mark_dyn = store
			.create(Space::Implementation, ids::implementation::ASSET_DYNAMIC_DATA, |id| {
				Object::AssetDynamicData(AssetDynamicData { id, asset: ObjectId::new(Space::Protocol, 0, 0), current_supply: Amount(1000), accumulated_fees: Amount(0) })
			})
			.unwrap();
		let mark = store
			.create(Space::Protocol, ids::protocol::ASSET, |id| {
				Object::Asset(Asset {
					id,
					symbol: "MARK".into(),
					precision: 4,
					issuer,
					options: AssetOptions {
						max_supply: Amount(1_000_000_000),
						flags: AssetFlags::MARKET_ISSUED,
						issuer_permissions: AssetFlags::NONE,
						market_fee_percent: 0,
						max_market_fee: Amount(0),
						core_exchange_rate: None,
						whitelist_authorities: vec![],
						blacklist_authorities: vec![],
					},
					dynamic_data: mark_dyn,
					bitasset_data: None,
				})
			})
			.unwrap();
		store.modify(mark_dyn, |o| o.as_asset_dynamic_data_mut().unwrap().asset = mark).unwrap();

		let feed = PriceFeed {
			settlement_price: Price::new(AssetAmount::new(mark, Amount(1)), AssetAmount::new(core, Amount(1))).unwrap(),
			maintenance_collateral_ratio_bps: 1750,
			max_short_squeeze_ratio_bps: 1500,
		};
		let bitasset_id = store
			.create(Space::Implementation, ids::implementation::BITASSET_DATA, |id| {
				Object::BitassetData(BitassetData {
					id,
					asset: mark,
					backing_asset: core,
					feeds: Default::default(),
					current_feed: Some(feed),
					options: FeedOptions { force_settle_offset_percent: 100, force_settle_delay_seconds: 86400, minimum_feeds: 1 },
					settlement_price: None,
					settlement_fund: Amount(0),
				})
			})
			.unwrap();
		store.modify(mark, |o| o.as_asset_mut().unwrap().bitasset_data = Some(bitasset_id)).unwrap();

		(core, mark, borrower)
	}

	#[test]
	fn margin_call_fills_against_crossing_bid() {
		let mut store = Store::new();
		let (core, mark, borrower) = setup_backed_asset(&mut store);
		let lender = store.create(Space::Protocol, ids::protocol::ACCOUNT, |id| dummy_account(id, "lender")).unwrap();

		let call_price = Price::call_price(AssetAmount::new(mark, Amount(100)), AssetAmount::new(core, Amount(120)), 1750).unwrap();
		store
			.create(Space::Protocol, ids::protocol::CALL_ORDER, |id| {
				Object::CallOrder(CallOrder { id, borrower, collateral: Amount(120), collateral_asset: core, debt: Amount(100), debt_asset: mark, call_price })
			})
			.unwrap();

		// A bid offering far more debt per unit collateral than the call
		// requires: crosses the call price and beats the feed.
		let bid_price = Price::new(AssetAmount::new(mark, Amount(2)), AssetAmount::new(core, Amount(1))).unwrap();
		store
			.create(Space::Protocol, ids::protocol::LIMIT_ORDER, |id| {
				Object::LimitOrder(LimitOrder { id, seller: lender, for_sale: Amount(200), sell_price: bid_price, expiration: BlockTime(u64::MAX), deferred_fee: Amount(0) })
			})
			.unwrap();

		let ops = check_call_orders(&mut store, mark).unwrap();
		assert!(ops.iter().any(|op| matches!(op, VirtualOp::FillOrder { .. })));
		assert!(store.indices().call_orders.orders_for_asset(mark).is_empty());
	}

	/// The feed-protection gate compares `call_price` against the feed's
	/// bare `settlement_price`, not against `max_short_squeeze_price`
	/// (`spec.md` §4.D; historically HARDFORK_436). A call whose price sits
	/// between the two — above `settlement_price` but still below
	/// `max_short_squeeze_price` (1.5x here) — must still be margin-called;
	/// gating on the squeeze price instead would wrongly skip it.
	#[test]
	fn call_between_settlement_and_squeeze_price_is_still_margin_called() {
		let mut store = Store::new();
		let (core, mark, borrower) = setup_backed_asset(&mut store);
		let lender = store.create(Space::Protocol, ids::protocol::ACCOUNT, |id| dummy_account(id, "lender")).unwrap();

		let bitasset_id = store.get(mark).unwrap().as_asset().unwrap().bitasset_data.unwrap();
		let settlement_price = Price::new(AssetAmount::new(mark, Amount(6)), AssetAmount::new(core, Amount(5))).unwrap();
		store
			.modify(bitasset_id, |o| {
				o.as_bitasset_data_mut().unwrap().current_feed.as_mut().unwrap().settlement_price = settlement_price;
			})
			.unwrap();

		// call_price = (100*1750)/(120*1000) = 35/24 ≈ 1.458, strictly
		// between settlement_price (6/5 = 1.2) and 1.5x squeeze (9/5 = 1.8).
		let call_price = Price::call_price(AssetAmount::new(mark, Amount(100)), AssetAmount::new(core, Amount(120)), 1750).unwrap();
		let call_id = store
			.create(Space::Protocol, ids::protocol::CALL_ORDER, |id| {
				Object::CallOrder(CallOrder { id, borrower, collateral: Amount(120), collateral_asset: core, debt: Amount(100), debt_asset: mark, call_price })
			})
			.unwrap();

		let bid_price = Price::new(AssetAmount::new(mark, Amount(2)), AssetAmount::new(core, Amount(1))).unwrap();
		store
			.create(Space::Protocol, ids::protocol::LIMIT_ORDER, |id| {
				Object::LimitOrder(LimitOrder { id, seller: lender, for_sale: Amount(200), sell_price: bid_price, expiration: BlockTime(u64::MAX), deferred_fee: Amount(0) })
			})
			.unwrap();

		let ops = check_call_orders(&mut store, mark).unwrap();
		assert!(ops.iter().any(|op| matches!(op, VirtualOp::FillOrder { .. })));
		assert!(store.find(call_id).is_none());
	}

	/// A call below the feed's settlement price is feed-protected and must
	/// not be margin-called even though a crossing bid exists.
	#[test]
	fn call_below_settlement_price_is_feed_protected() {
		let mut store = Store::new();
		let (core, mark, borrower) = setup_backed_asset(&mut store);
		let lender = store.create(Space::Protocol, ids::protocol::ACCOUNT, |id| dummy_account(id, "lender")).unwrap();

		let bitasset_id = store.get(mark).unwrap().as_asset().unwrap().bitasset_data.unwrap();
		let settlement_price = Price::new(AssetAmount::new(mark, Amount(3)), AssetAmount::new(core, Amount(1))).unwrap();
		store
			.modify(bitasset_id, |o| {
				o.as_bitasset_data_mut().unwrap().current_feed.as_mut().unwrap().settlement_price = settlement_price;
			})
			.unwrap();

		let call_price = Price::call_price(AssetAmount::new(mark, Amount(100)), AssetAmount::new(core, Amount(120)), 1750).unwrap();
		let call_id = store
			.create(Space::Protocol, ids::protocol::CALL_ORDER, |id| {
				Object::CallOrder(CallOrder { id, borrower, collateral: Amount(120), collateral_asset: core, debt: Amount(100), debt_asset: mark, call_price })
			})
			.unwrap();

		let bid_price = Price::new(AssetAmount::new(mark, Amount(2)), AssetAmount::new(core, Amount(1))).unwrap();
		store
			.create(Space::Protocol, ids::protocol::LIMIT_ORDER, |id| {
				Object::LimitOrder(LimitOrder { id, seller: lender, for_sale: Amount(200), sell_price: bid_price, expiration: BlockTime(u64::MAX), deferred_fee: Amount(0) })
			})
			.unwrap();

		let ops = check_call_orders(&mut store, mark).unwrap();
		assert!(ops.is_empty());
		assert!(store.find(call_id).is_some());
	}

	#[test]
	fn no_action_when_no_crossing_liquidity() {
		let mut store = Store::new();
		let (core, mark, borrower) = setup_backed_asset(&mut store);
		let call_price = Price::call_price(AssetAmount::new(mark, Amount(100)), AssetAmount::new(core, Amount(120)), 1750).unwrap();
		let call_id = store
			.create(Space::Protocol, ids::protocol::CALL_ORDER, |id| {
				Object::CallOrder(CallOrder { id, borrower, collateral: Amount(120), collateral_asset: core, debt: Amount(100), debt_asset: mark, call_price })
			})
			.unwrap();

		let ops = check_call_orders(&mut store, mark).unwrap();
		assert!(ops.is_empty());
		assert!(store.find(call_id).is_some());
	}
}
