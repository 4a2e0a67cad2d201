use chain_objects::{ids, CallOrder, Object, VirtualOp};
use object_store::Store;
use primitives::{Amount, AssetAmount, ObjectId, Price, Space};
use tracing::{info, warn};

use crate::error::MarketError;
use crate::fund;

/// `spec.md` §4.D, "Global settlement revival": on an issuer-initiated
/// revival trigger, greedily redistributes the globally-settled supply of
/// `debt_asset` across its queued [`chain_objects::CollateralBid`]s, best
/// `inv_swan_price` first, each becoming a fresh [`CallOrder`] backed by
/// its own offered collateral plus a pro-rata share of the settlement
/// fund. Fails with [`MarketError::RevivalIncomplete`] if the bids don't
/// cover the full supply; the caller is expected to run this inside a
/// [`object_store::Store`] undo session and undo it on error so a failed
/// revival leaves no partial state (`spec.md` §4.A, undo sessions).
pub fn revive_market(store: &mut Store, debt_asset: ObjectId) -> Result<Vec<VirtualOp>, MarketError> {
	let asset = store.get(debt_asset)?.as_asset().ok_or(MarketError::WrongObjectType(debt_asset))?;
	let bitasset_id = asset.bitasset_data.ok_or(MarketError::NotMarketIssued(debt_asset))?;
	let bitasset = store.get(bitasset_id)?.as_bitasset_data().cloned().ok_or(MarketError::WrongObjectType(bitasset_id))?;
	if !bitasset.is_globally_settled() {
		return Err(MarketError::NotGloballySettled(debt_asset));
	}

	let total_supply = store.get(asset.dynamic_data)?.as_asset_dynamic_data().unwrap().current_supply;
	let fund_total = bitasset.settlement_fund;
	let mcr_bps = bitasset.current_feed.as_ref().map(|f| f.maintenance_collateral_ratio_bps).unwrap_or(1000);

	let bid_ids: Vec<ObjectId> = store
		.indices()
		.collateral_bids
		.by_price
		.iter()
		.filter(|((asset_id, _, _), _)| *asset_id == debt_asset)
		.map(|(_, id)| *id)
		.collect();

	let mut remaining_supply = total_supply;
	let mut remaining_fund = fund_total;
	let mut ops = Vec::new();
	let mut consumed = 0usize;

	for bid_id in &bid_ids {
		if remaining_supply.is_zero() {
			break;
		}
		let bid = store.get(*bid_id)?.as_collateral_bid().cloned().ok_or(MarketError::WrongObjectType(*bid_id))?;
		let debt_for_bid = Amount(bid.debt_covered.0.min(remaining_supply.0));

		let collateral_from_bid = if debt_for_bid.0 == bid.debt_covered.0 {
			bid.additional_collateral
		} else {
			bid.additional_collateral.mul_ratio(debt_for_bid.0, bid.debt_covered.0.max(1))?
		};
		let fund_share = Amount(fund_total.mul_ratio(debt_for_bid.0, total_supply.0.max(1))?.0.min(remaining_fund.0));
		let collateral = collateral_from_bid.checked_add(fund_share)?;

		let call_price = Price::call_price(AssetAmount::new(debt_asset, debt_for_bid), AssetAmount::new(bitasset.backing_asset, collateral), mcr_bps)?;
		store.create(Space::Protocol, ids::protocol::CALL_ORDER, |id| {
			Object::CallOrder(CallOrder {
				id,
				borrower: bid.bidder,
				collateral,
				collateral_asset: bitasset.backing_asset,
				debt: debt_for_bid,
				debt_asset,
				call_price,
			})
		})?;

		let leftover_collateral = bid.additional_collateral.checked_sub(collateral_from_bid)?;
		if leftover_collateral.is_positive() {
			fund::credit_balance(store, bid.bidder, bitasset.backing_asset, leftover_collateral)?;
		}
		store.remove(*bid_id)?;

		remaining_supply = remaining_supply.checked_sub(debt_for_bid)?;
		remaining_fund = remaining_fund.checked_sub(fund_share)?;
		consumed += 1;
	}

	if remaining_supply.is_positive() {
		warn!(asset = ?debt_asset, remaining = remaining_supply.0, "revival failed, queued bids do not cover the settled supply");
		return Err(MarketError::RevivalIncomplete(debt_asset));
	}

	// Bids past the point where supply ran out are cancelled and refunded in full.
	for bid_id in bid_ids.into_iter().skip(consumed) {
		let bid = store.get(bid_id)?.as_collateral_bid().cloned().ok_or(MarketError::WrongObjectType(bid_id))?;
		fund::credit_balance(store, bid.bidder, bitasset.backing_asset, bid.additional_collateral)?;
		store.remove(bid_id)?;
	}

	store.modify(bitasset_id, |o| {
		let b = o.as_bitasset_data_mut().unwrap();
		b.settlement_price = None;
		b.settlement_fund = Amount::ZERO;
	})?;

	ops.push(VirtualOp::Revived { asset: debt_asset });
	info!(asset = ?debt_asset, bids_consumed = consumed, "market revived");
	Ok(ops)
}
