use chain_objects::{
	ids, AssetForceSettleOp, AssetPublishFeedOp, BidCollateralOp, CallOrder, CallOrderUpdateOp,
	CollateralBid, ForceSettlement, LimitOrder, LimitOrderCancelOp, LimitOrderCreateOp, Object,
	PriceFeed, VirtualOp,
};
use object_store::Store;
use primitives::{Amount, AssetAmount, ObjectId, Price, Space};

use crate::context::EvaluationContext;
use crate::error::EvaluatorError;

pub fn validate_limit_order_create(op: &LimitOrderCreateOp) -> Result<(), EvaluatorError> {
	op.amount_to_sell.require_non_negative()?;
	op.min_to_receive.require_non_negative()?;
	Ok(())
}

pub fn do_evaluate_limit_order_create(store: &Store, op: &LimitOrderCreateOp) -> Result<(), EvaluatorError> {
	let balance = store
		.indices()
		.balances
		.by_owner_asset
		.get(&(op.seller, op.sell_asset))
		.and_then(|id| store.find(*id))
		.and_then(Object::as_account_balance);
	let available = balance.map(|b| b.amount).unwrap_or(Amount::ZERO);
	if available.0 < op.amount_to_sell.0 {
		return Err(EvaluatorError::InsufficientBalance(op.seller));
	}
	Ok(())
}

/// `spec.md` §4.D, `apply_order`: debits the seller's balance up front,
/// creates the resting `LimitOrder`, then hands it to the market engine's
/// matching loop.
pub fn do_apply_limit_order_create(store: &mut Store, op: &LimitOrderCreateOp) -> Result<(ObjectId, Vec<VirtualOp>), EvaluatorError> {
	market_engine::fund::debit_balance(store, op.seller, op.sell_asset, op.amount_to_sell)?;
	let sell_price = Price::new(
		AssetAmount::new(op.sell_asset, op.amount_to_sell),
		AssetAmount::new(op.receive_asset, op.min_to_receive),
	)?;
	let order_id = store.create(Space::Protocol, ids::protocol::LIMIT_ORDER, |id| {
		Object::LimitOrder(LimitOrder {
			id,
			seller: op.seller,
			for_sale: op.amount_to_sell,
			sell_price,
			expiration: op.expiration,
			deferred_fee: Amount::ZERO,
		})
	})?;
	let ops = market_engine::apply_order(store, order_id)?;

	if op.fill_or_kill && store.find(order_id).is_some() {
		market_engine::cancel_and_refund(store, order_id, None)?;
	}
	Ok((order_id, ops))
}

pub fn do_evaluate_limit_order_cancel(store: &Store, op: &LimitOrderCancelOp) -> Result<(), EvaluatorError> {
	let order = store.get(op.order)?.as_limit_order().ok_or(EvaluatorError::WrongObjectType(op.order))?;
	if order.seller != op.fee_paying_account {
		return Err(EvaluatorError::WrongObjectType(op.order));
	}
	Ok(())
}

pub fn do_apply_limit_order_cancel(store: &mut Store, op: &LimitOrderCancelOp) -> Result<(), EvaluatorError> {
	Ok(market_engine::cancel_and_refund(store, op.order, None)?)
}

/// `spec.md` §4.C, Call order update (a.k.a. borrow/cover): adjusts an
/// existing position or opens a new one, recomputing `call_price` from the
/// new collateral/debt and the asset's current maintenance ratio.
pub fn do_evaluate_call_order_update(store: &Store, op: &CallOrderUpdateOp) -> Result<(), EvaluatorError> {
	let asset = store.get(op.debt_asset)?.as_asset().ok_or(EvaluatorError::WrongObjectType(op.debt_asset))?;
	let bitasset_id = asset.bitasset_data.ok_or(EvaluatorError::NotMarketIssued(op.debt_asset))?;
	let bitasset = store.get(bitasset_id)?.as_bitasset_data().unwrap();
	if bitasset.is_globally_settled() {
		return Err(EvaluatorError::AlreadyGloballySettled(op.debt_asset));
	}
	if bitasset.backing_asset != op.collateral_asset {
		return Err(EvaluatorError::WrongObjectType(op.collateral_asset));
	}
	if op.delta_collateral.is_positive() {
		let balance = store
			.indices()
			.balances
			.by_owner_asset
			.get(&(op.funding_account, op.collateral_asset))
			.and_then(|id| store.find(*id))
			.and_then(Object::as_account_balance);
		let available = balance.map(|b| b.amount).unwrap_or(Amount::ZERO);
		if available.0 < op.delta_collateral.0 {
			return Err(EvaluatorError::InsufficientBalance(op.funding_account));
		}
	}
	Ok(())
}

pub fn do_apply_call_order_update(store: &mut Store, op: &CallOrderUpdateOp) -> Result<(ObjectId, Vec<VirtualOp>), EvaluatorError> {
	let asset = store.get(op.debt_asset)?.as_asset().unwrap().clone();
	let bitasset_id = asset.bitasset_data.unwrap();
	let bitasset = store.get(bitasset_id)?.as_bitasset_data().unwrap().clone();
	let mcr_bps = bitasset.current_feed.as_ref().map(|f| f.maintenance_collateral_ratio_bps).unwrap_or(1000);

	// `by_account` is keyed `(account, order_id)`; an account can owe at
	// most one call order per debt asset, so scan its range for a match.
	let existing = store
		.indices()
		.call_orders
		.by_account
		.range((op.funding_account, ObjectId::new(Space::Protocol, 0, 0))..)
		.take_while(|((account, _), _)| *account == op.funding_account)
		.find_map(|(_, id)| store.find(*id).and_then(Object::as_call_order).filter(|c| c.debt_asset == op.debt_asset).cloned());

	if op.delta_collateral.is_positive() {
		market_engine::fund::debit_balance(store, op.funding_account, op.collateral_asset, op.delta_collateral)?;
	} else if op.delta_collateral.0 < 0 {
		market_engine::fund::credit_balance(store, op.funding_account, op.collateral_asset, Amount(-op.delta_collateral.0))?;
	}

	let (new_collateral, new_debt) = match &existing {
		Some(call) => (call.collateral.checked_add(op.delta_collateral)?, call.debt.checked_add(op.delta_debt)?),
		None => (op.delta_collateral.require_non_negative()?, op.delta_debt.require_non_negative()?),
	};

	if new_debt.is_zero() {
		if let Some(call) = &existing {
			if new_collateral.is_positive() {
				market_engine::fund::credit_balance(store, op.funding_account, op.collateral_asset, new_collateral)?;
			}
			store.remove(call.id)?;
		}
		return Ok((op.funding_account, Vec::new()));
	}

	let call_price = Price::call_price(
		AssetAmount::new(op.debt_asset, new_debt),
		AssetAmount::new(op.collateral_asset, new_collateral),
		mcr_bps,
	)?;

	// The position must come out either closed (handled above) or safely
	// above the feed's short-squeeze trigger (`spec.md` §4.C, Call order
	// update: "must... pass the margin-call guard").
	if let Some(feed) = &bitasset.current_feed {
		let squeeze_price = feed.max_short_squeeze_price()?;
		if !call_price.less_or_equal(&squeeze_price) {
			return Err(EvaluatorError::InsufficientCollateral(op.funding_account));
		}
	}

	let order_id = match &existing {
		Some(call) => {
			store.modify(call.id, |o| {
				let c = o.as_call_order_mut().unwrap();
				c.collateral = new_collateral;
				c.debt = new_debt;
				c.call_price = call_price;
			})?;
			call.id
		}
		None => store.create(Space::Protocol, ids::protocol::CALL_ORDER, |id| {
			Object::CallOrder(CallOrder {
				id,
				borrower: op.funding_account,
				collateral: new_collateral,
				collateral_asset: op.collateral_asset,
				debt: new_debt,
				debt_asset: op.debt_asset,
				call_price,
			})
		})?,
	};
	if existing.is_none() {
		market_engine::fund::credit_balance(store, op.funding_account, op.debt_asset, new_debt)?;
		let dynamic_data = asset.dynamic_data;
		store.modify(dynamic_data, |o| {
			let dd = o.as_asset_dynamic_data_mut().unwrap();
			dd.current_supply = dd.current_supply.checked_add(new_debt).expect("bounded by max_supply check upstream");
		})?;
	} else if new_debt.0 != existing.as_ref().unwrap().debt.0 {
		let delta = new_debt.checked_sub(existing.as_ref().unwrap().debt)?;
		market_engine::fund::credit_balance(store, op.funding_account, op.debt_asset, delta)?;
		let dynamic_data = asset.dynamic_data;
		store.modify(dynamic_data, |o| {
			let dd = o.as_asset_dynamic_data_mut().unwrap();
			dd.current_supply = dd.current_supply.checked_add(delta).expect("bounded upstream");
		})?;
	}

	let ops = market_engine::check_call_orders(store, op.debt_asset)?;
	Ok((order_id, ops))
}

/// `spec.md` §4.C, Force settle: enqueues a `ForceSettlement`, reserving
/// `amount` of the market-issued asset out of the account's balance until
/// it matures.
pub fn do_evaluate_force_settle(store: &Store, op: &AssetForceSettleOp) -> Result<(), EvaluatorError> {
	let asset = store.get(op.asset)?.as_asset().ok_or(EvaluatorError::WrongObjectType(op.asset))?;
	if !asset.is_market_issued() {
		return Err(EvaluatorError::NotMarketIssued(op.asset));
	}
	if asset.options.flags.contains(chain_objects::AssetFlags::DISABLE_FORCE_SETTLE) {
		return Err(EvaluatorError::ForceSettleDisabled(op.asset));
	}
	let balance = store
		.indices()
		.balances
		.by_owner_asset
		.get(&(op.account, op.asset))
		.and_then(|id| store.find(*id))
		.and_then(Object::as_account_balance);
	let available = balance.map(|b| b.amount).unwrap_or(Amount::ZERO);
	if available.0 < op.amount.0 {
		return Err(EvaluatorError::InsufficientBalance(op.account));
	}
	Ok(())
}

pub fn do_apply_force_settle(store: &mut Store, ctx: &EvaluationContext, op: &AssetForceSettleOp) -> Result<ObjectId, EvaluatorError> {
	market_engine::fund::debit_balance(store, op.account, op.asset, op.amount)?;
	let asset = store.get(op.asset)?.as_asset().unwrap();
	let bitasset = store.get(asset.bitasset_data.unwrap())?.as_bitasset_data().unwrap();
	let settlement_date = ctx.head_time.plus_seconds(bitasset.options.force_settle_delay_seconds);
	let id = store.create(Space::Implementation, ids::implementation::FORCE_SETTLEMENT, |id| {
		Object::ForceSettlement(ForceSettlement { id, owner: op.account, asset: op.asset, balance: op.amount, settlement_date })
	})?;
	Ok(id)
}

/// `spec.md` §4.C, Bid collateral: only valid while the asset is globally
/// settled; bids are executed greedily at revival (`market_engine::revival`).
pub fn do_evaluate_bid_collateral(store: &Store, op: &BidCollateralOp) -> Result<(), EvaluatorError> {
	let asset = store.get(op.asset)?.as_asset().ok_or(EvaluatorError::WrongObjectType(op.asset))?;
	let bitasset_id = asset.bitasset_data.ok_or(EvaluatorError::NotMarketIssued(op.asset))?;
	let bitasset = store.get(bitasset_id)?.as_bitasset_data().unwrap();
	if !bitasset.is_globally_settled() {
		return Err(EvaluatorError::NotGloballySettled(op.asset));
	}
	let balance = store
		.indices()
		.balances
		.by_owner_asset
		.get(&(op.bidder, bitasset.backing_asset))
		.and_then(|id| store.find(*id))
		.and_then(Object::as_account_balance);
	let available = balance.map(|b| b.amount).unwrap_or(Amount::ZERO);
	if available.0 < op.additional_collateral.0 {
		return Err(EvaluatorError::InsufficientBalance(op.bidder));
	}
	Ok(())
}

pub fn do_apply_bid_collateral(store: &mut Store, op: &BidCollateralOp) -> Result<ObjectId, EvaluatorError> {
	let bitasset_id = store.get(op.asset)?.as_asset().unwrap().bitasset_data.unwrap();
	let backing_asset = store.get(bitasset_id)?.as_bitasset_data().unwrap().backing_asset;
	market_engine::fund::debit_balance(store, op.bidder, backing_asset, op.additional_collateral)?;

	let existing = store
		.indices()
		.collateral_bids
		.by_price
		.iter()
		.find(|&(key, id)| key.0 == op.asset && store.find(*id).and_then(Object::as_collateral_bid).is_some_and(|b| b.bidder == op.bidder))
		.map(|(_, id)| *id);
	if let Some(existing_id) = existing {
		let prior = store.get(existing_id)?.as_collateral_bid().cloned().unwrap();
		market_engine::fund::credit_balance(store, op.bidder, backing_asset, prior.additional_collateral)?;
		store.remove(existing_id)?;
	}

	let id = store.create(Space::Implementation, ids::implementation::COLLATERAL_BID, |id| {
		Object::CollateralBid(CollateralBid { id, bidder: op.bidder, asset: op.asset, additional_collateral: op.additional_collateral, debt_covered: op.debt_covered })
	})?;
	Ok(id)
}

/// `spec.md` §4.C, Publish price feed: records `publisher`'s feed;
/// recomputes `current_feed` as the median of recent feeds from recognized
/// producers, or `None` if fewer than `minimum_feeds` are present.
pub fn do_evaluate_publish_feed(store: &Store, op: &AssetPublishFeedOp) -> Result<(), EvaluatorError> {
	let asset = store.get(op.asset)?.as_asset().ok_or(EvaluatorError::WrongObjectType(op.asset))?;
	asset.bitasset_data.ok_or(EvaluatorError::NotMarketIssued(op.asset))?;
	let _ = Price::new(op.feed.settlement_price.base, op.feed.settlement_price.quote)?;
	Ok(())
}

pub fn do_apply_publish_feed(store: &mut Store, ctx: &EvaluationContext, op: &AssetPublishFeedOp) -> Result<(), EvaluatorError> {
	let asset = store.get(op.asset)?.as_asset().unwrap();
	let bitasset_id = asset.bitasset_data.unwrap();
	let minimum_feeds = store.get(bitasset_id)?.as_bitasset_data().unwrap().options.minimum_feeds;

	store.modify(bitasset_id, |o| {
		let b = o.as_bitasset_data_mut().unwrap();
		b.feeds.insert(op.publisher, (ctx.head_time, op.feed.clone()));
		b.current_feed = median_feed(&b.feeds, minimum_feeds);
	})?;
	Ok(())
}

/// The median settlement price (and its accompanying ratio fields) across
/// all recorded feeds, or `None` if fewer than `minimum_feeds` producers
/// have published (`spec.md` §4.C, Publish price feed).
fn median_feed(feeds: &std::collections::BTreeMap<ObjectId, (primitives::BlockTime, PriceFeed)>, minimum_feeds: u8) -> Option<PriceFeed> {
	if feeds.len() < minimum_feeds as usize {
		return None;
	}
	let mut sorted: Vec<&PriceFeed> = feeds.values().map(|(_, feed)| feed).collect();
	sorted.sort_by(|a, b| {
		let a_ratio = (a.settlement_price.quote.amount.0 as i128) * (b.settlement_price.base.amount.0 as i128);
		let b_ratio = (b.settlement_price.quote.amount.0 as i128) * (a.settlement_price.base.amount.0 as i128);
		a_ratio.cmp(&b_ratio)
	});
	sorted.get(sorted.len() / 2).cloned().cloned()
}
