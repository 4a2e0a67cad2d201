use chain_objects::{LimitOrder, Object, VirtualOp};
use object_store::Store;
use primitives::{Amount, AssetAmount, ObjectId, Price};

use crate::error::MarketError;
use crate::fees::market_fee;
use crate::margin;

/// Runs `spec.md` §4.D's `apply_order` to completion for the resting
/// [`LimitOrder`] already created at `order_id`: first lets call orders on
/// either side act as makers if the new order would trigger a margin call,
/// then walks the opposite side of the limit-order book from best price to
/// worst, then re-checks call orders once more since a fill may have
/// exposed an under-collateralized position, then cancels any dust
/// remainder. Returns every [`VirtualOp`] emitted along the way.
pub fn apply_order(store: &mut Store, order_id: ObjectId) -> Result<Vec<VirtualOp>, MarketError> {
	let mut ops = Vec::new();

	let (base_asset, quote_asset) = {
		let order = get_limit_order(store, order_id)?;
		(order.sell_price.base.asset_id, order.sell_price.quote.asset_id)
	};
	ops.extend(margin::check_call_orders_for_pair(store, base_asset, quote_asset)?);

	loop {
		if store.find(order_id).is_none() {
			break; // fully filled and removed by a prior iteration
		}
		let matched = match_best_opposite(store, order_id, &mut ops)?;
		if !matched {
			break;
		}
	}

	ops.extend(margin::check_call_orders_for_pair(store, base_asset, quote_asset)?);

	if let Some(order) = store.find(order_id).and_then(Object::as_limit_order) {
		if order.amount_to_receive()?.is_zero() {
			cancel_and_refund(store, order_id, None)?;
		}
	}

	Ok(ops)
}

fn get_limit_order(store: &Store, id: ObjectId) -> Result<LimitOrder, MarketError> {
	store
		.get(id)?
		.as_limit_order()
		.cloned()
		.ok_or(MarketError::WrongObjectType(id))
}

/// Finds the best-priced resting order on the opposite side of the book
/// and, if the two prices cross, fills both at the maker's price. Returns
/// `Ok(true)` if a fill happened (so the caller should loop again).
fn match_best_opposite(
	store: &mut Store,
	new_id: ObjectId,
	ops: &mut Vec<VirtualOp>,
) -> Result<bool, MarketError> {
	let new = get_limit_order(store, new_id)?;
	let maker_base = new.sell_price.quote.asset_id;
	let maker_quote = new.sell_price.base.asset_id;

	let candidate_ids = store.indices().limit_orders.orders_for_market(maker_base, maker_quote);
	let mut candidates: Vec<LimitOrder> = candidate_ids
		.into_iter()
		.filter_map(|id| store.find(id).and_then(Object::as_limit_order).cloned())
		.collect();
	// Best price first (lowest `maker.sell_price`, i.e. the cheapest ask
	// against `new`'s side), oldest order first on an exact tie
	// (`spec.md` §4.D, Ordering guarantees).
	candidates.sort_by(|a, b| {
		a.sell_price
			.less_than(&b.sell_price)
			.then_some(std::cmp::Ordering::Less)
			.unwrap_or_else(|| {
				if b.sell_price.less_than(&a.sell_price) {
					std::cmp::Ordering::Greater
				} else {
					a.id.cmp(&b.id)
				}
			})
	});

	let Some(maker) = candidates.into_iter().next() else {
		return Ok(false);
	};

	let match_price = maker.sell_price.invert();
	if !new.sell_price.less_or_equal(&match_price) {
		return Ok(false); // best maker doesn't cross; nothing left to match
	}

	fill_pair(store, new_id, maker.id, match_price, ops)?;
	Ok(true)
}

/// Fills `new` against `maker` at `match_price` (expressed in `new`'s
/// base/quote orientation): whichever side's remaining `for_sale` is fully
/// absorbed becomes the taker-filled side, the other is partially filled
/// and stays resting (`spec.md` §4.D, `apply_order` step 2).
fn fill_pair(
	store: &mut Store,
	new_id: ObjectId,
	maker_id: ObjectId,
	match_price: Price,
	ops: &mut Vec<VirtualOp>,
) -> Result<(), MarketError> {
	let new = get_limit_order(store, new_id)?;
	let maker = get_limit_order(store, maker_id)?;

	let maker_capacity_in_new_base = maker.amount_to_receive()?; // maker.quote == new.base
	let new_fully_fills = new.for_sale.0 <= maker_capacity_in_new_base.0;

	let (new_pays, new_receives, maker_pays, maker_receives) = if new_fully_fills {
		let new_pays = new.for_sale;
		let new_receives = match_price.multiply_base(new_pays)?;
		(new_pays, new_receives, new_receives, new_pays)
	} else {
		let maker_pays = maker.for_sale;
		let maker_receives = maker_capacity_in_new_base;
		(maker_receives, maker_pays, maker_pays, maker_receives)
	};

	settle_fill(store, new_id, new.seller, new_pays, new_receives, !new_fully_fills, ops)?;
	settle_fill(store, maker_id, maker.seller, maker_pays, maker_receives, new_fully_fills, ops)?;
	Ok(())
}

/// Applies one side's fill: pays `pays` out of the order's `for_sale`
/// (reducing or removing the order), credits `receives` (minus market
/// fee) to the seller's balance, and emits the `fill_order` virtual op.
/// `is_maker` marks whether this order rests unfilled afterward.
fn settle_fill(
	store: &mut Store,
	order_id: ObjectId,
	seller: ObjectId,
	pays: Amount,
	receives: Amount,
	is_maker: bool,
	ops: &mut Vec<VirtualOp>,
) -> Result<(), MarketError> {
	let order = get_limit_order(store, order_id)?;
	let receive_asset_id = order.sell_price.quote.asset_id;
	let fee = {
		let asset = store.get(receive_asset_id)?.as_asset().ok_or(MarketError::WrongObjectType(receive_asset_id))?;
		market_fee(asset, receives)
	};
	let net_received = receives.checked_sub(fee)?;

	crate::fund::credit_balance(store, seller, receive_asset_id, net_received)?;
	if fee.is_positive() {
		crate::fund::accrue_fee(store, receive_asset_id, fee)?;
	}

	let remaining = order.for_sale.checked_sub(pays)?;
	if remaining.is_zero() {
		store.remove(order_id)?;
	} else {
		store.modify(order_id, |o| {
			o.as_limit_order_mut().unwrap().for_sale = remaining;
		})?;
	}

	ops.push(VirtualOp::FillOrder {
		order: order_id,
		account: seller,
		pays: AssetAmount::new(order.sell_price.base.asset_id, pays),
		receives: AssetAmount::new(receive_asset_id, net_received),
		fee: AssetAmount::new(receive_asset_id, fee),
		is_maker,
	});
	Ok(())
}

/// Cancels a dust-remainder (or explicitly cancelled) order and refunds
/// `for_sale` plus any `deferred_fee` to the seller (`spec.md` §4.D,
/// `apply_order` step 4; §4.C, Limit order cancel: "cancel refunds
/// `amount_for_sale` plus any `deferred_fee`"). `fee_asset` is the asset
/// `deferred_fee` was originally paid in (the chain's fee asset); callers
/// that don't track a deferred fee (the automatic dust-cancel path) pass
/// `None` and rely on `deferred_fee` being zero.
pub fn cancel_and_refund(
	store: &mut Store,
	order_id: ObjectId,
	fee_asset: Option<ObjectId>,
) -> Result<(), MarketError> {
	let order = get_limit_order(store, order_id)?;
	let sell_asset = order.sell_price.base.asset_id;
	crate::fund::credit_balance(store, order.seller, sell_asset, order.for_sale)?;
	if order.deferred_fee.is_positive() {
		let fee_asset = fee_asset.expect("deferred_fee set without a fee asset to refund it in");
		crate::fund::credit_balance(store, order.seller, fee_asset, order.deferred_fee)?;
	}
	store.remove(order_id)?;
	Ok(())
}
