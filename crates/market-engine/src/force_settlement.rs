use chain_objects::{BitassetData, ForceSettlement, Object, VirtualOp};
use object_store::Store;
use primitives::{Amount, AssetAmount, BlockTime, ObjectId, OverflowError, Price};

use crate::error::MarketError;
use crate::fund;

/// `spec.md` §4.D, "Force settlement": runs once per maintenance window,
/// maturing up to `maximum_force_settlement_volume_bps` (of current supply)
/// worth of the oldest queued [`ForceSettlement`]s on `debt_asset`, paid
/// either from the globally-settled fund or by calling the
/// least-collateralized call orders at `feed * (1 - offset)`.
pub fn process_matured_settlements(
	store: &mut Store,
	debt_asset: ObjectId,
	head_time: BlockTime,
	maximum_force_settlement_volume_bps: u16,
) -> Result<Vec<VirtualOp>, MarketError> {
	let mut ops = Vec::new();
	let asset = store.get(debt_asset)?.as_asset().ok_or(MarketError::WrongObjectType(debt_asset))?;
	let bitasset_id = asset.bitasset_data.ok_or(MarketError::NotMarketIssued(debt_asset))?;
	let bitasset = store.get(bitasset_id)?.as_bitasset_data().cloned().ok_or(MarketError::WrongObjectType(bitasset_id))?;

	let supply = store.get(asset.dynamic_data)?.as_asset_dynamic_data().unwrap().current_supply;
	let cap = supply.mul_ratio(maximum_force_settlement_volume_bps as i64, 10_000)?;
	let mut volume_done = Amount::ZERO;

	// Oldest-matured-first, restricted to this asset (`by_expiration` is
	// shared across every market-issued asset in the chain).
	let due: Vec<ObjectId> = store
		.indices()
		.force_settlements
		.by_expiration
		.iter()
		.take_while(|((date, _), _)| *date <= head_time)
		.map(|(_, id)| *id)
		.filter(|id| store.find(*id).and_then(Object::as_force_settlement).is_some_and(|s| s.asset == debt_asset))
		.collect();

	for settlement_id in due {
		if volume_done.0 >= cap.0 {
			break;
		}
		let settlement = store.get(settlement_id)?.as_force_settlement().cloned().ok_or(MarketError::WrongObjectType(settlement_id))?;
		let remaining_cap = cap.checked_sub(volume_done).unwrap_or(Amount::ZERO);
		let to_settle = Amount(settlement.balance.0.min(remaining_cap.0));
		if to_settle.is_zero() {
			break;
		}

		let paid = if bitasset.is_globally_settled() {
			pay_from_fund(store, bitasset_id, &bitasset, &settlement, to_settle, &mut ops)?
		} else {
			pay_from_call_orders(store, debt_asset, &bitasset, &settlement, to_settle, &mut ops)?
		};
		volume_done = volume_done.checked_add(paid)?;

		let remaining_balance = settlement.balance.checked_sub(paid)?;
		if remaining_balance.is_zero() {
			store.remove(settlement_id)?;
		} else {
			store.modify(settlement_id, |o| {
				o.as_force_settlement_mut().unwrap().balance = remaining_balance;
			})?;
		}
	}
	Ok(ops)
}

/// The feed (or recorded global-settlement) price discounted by
/// `force_settle_offset_percent`, in the force-settler's disfavor
/// (`spec.md` §4.D: "in favor of the call").
fn effective_price(base_price: Price, offset_percent: u16) -> Result<Price, MarketError> {
	let scaled_quote =
		(base_price.quote.amount.0 as i128) * ((10_000 - offset_percent as i64 * 100) as i128) / 10_000;
	let quote_amount = i64::try_from(scaled_quote)
		.map_err(|_| OverflowError::Overflow { lhs: base_price.quote.amount.0, op: "force-settle offset", rhs: offset_percent as i64 })?;
	Price::new(base_price.base, AssetAmount::new(base_price.quote.asset_id, Amount(quote_amount))).map_err(MarketError::from)
}

fn pay_from_fund(
	store: &mut Store,
	bitasset_id: ObjectId,
	bitasset: &BitassetData,
	settlement: &ForceSettlement,
	amount: Amount,
	ops: &mut Vec<VirtualOp>,
) -> Result<Amount, MarketError> {
	let settle_price = bitasset.settlement_price.expect("is_globally_settled implies Some");
	let price = effective_price(settle_price, bitasset.options.force_settle_offset_percent)?;
	let full_payout = price.multiply_base(amount)?;
	let payout = Amount(full_payout.0.min(bitasset.settlement_fund.0));
	// Re-derive the debt actually covered if the fund ran short, so the two
	// stay proportional.
	let debt_covered = if payout.0 == full_payout.0 { amount } else { price.invert().multiply_base(payout)? };

	fund::credit_balance(store, settlement.owner, bitasset.backing_asset, payout)?;
	store.modify(bitasset_id, |o| {
		let b = o.as_bitasset_data_mut().unwrap();
		b.settlement_fund = b.settlement_fund.checked_sub(payout).expect("capped above");
	})?;
	reduce_supply(store, settlement.asset, debt_covered)?;
	ops.push(VirtualOp::AssetSettle { settlement: settlement.id, account: settlement.owner, paid: AssetAmount::new(bitasset.backing_asset, payout) });
	Ok(debt_covered)
}

/// Walks call orders most-at-risk first, calling each against the
/// settlement request at the offset-discounted feed price until `amount`
/// of debt is covered or call orders run out.
fn pay_from_call_orders(
	store: &mut Store,
	debt_asset: ObjectId,
	bitasset: &BitassetData,
	settlement: &ForceSettlement,
	amount: Amount,
	ops: &mut Vec<VirtualOp>,
) -> Result<Amount, MarketError> {
	let feed = bitasset.current_feed.clone().ok_or(MarketError::NoCurrentFeed(debt_asset))?;
	let price = effective_price(feed.settlement_price, bitasset.options.force_settle_offset_percent)?;

	let mut remaining = amount;
	let mut total_paid_collateral = Amount::ZERO;
	let mut total_debt_covered = Amount::ZERO;
	loop {
		if remaining.is_zero() {
			break;
		}
		let call_ids = store.indices().call_orders.orders_for_asset(debt_asset);
		let Some(&call_id) = call_ids.first() else { break }; // most at-risk first == least-collateralized
		let call = store.get(call_id)?.as_call_order().cloned().ok_or(MarketError::WrongObjectType(call_id))?;

		let debt_here = Amount(remaining.0.min(call.debt.0));
		let full_collateral_here = price.multiply_base(debt_here)?;
		let collateral_here = Amount(full_collateral_here.0.min(call.collateral.0));
		let debt_here = if collateral_here.0 == full_collateral_here.0 { debt_here } else { price.invert().multiply_base(collateral_here)? };
		if debt_here.is_zero() {
			break;
		}

		store.modify(call_id, |o| {
			let c = o.as_call_order_mut().unwrap();
			c.debt = c.debt.checked_sub(debt_here).expect("bounded above");
			c.collateral = c.collateral.checked_sub(collateral_here).expect("bounded above");
		})?;
		let updated = store.get(call_id)?.as_call_order().unwrap().clone();
		if updated.debt.is_zero() {
			if updated.collateral.is_positive() {
				fund::credit_balance(store, updated.borrower, updated.collateral_asset, updated.collateral)?;
			}
			store.remove(call_id)?;
			ops.push(VirtualOp::CallOrderClosed { order: call_id, borrower: updated.borrower });
		}

		fund::credit_balance(store, settlement.owner, call.collateral_asset, collateral_here)?;
		reduce_supply(store, debt_asset, debt_here)?;
		total_paid_collateral = total_paid_collateral.checked_add(collateral_here)?;
		total_debt_covered = total_debt_covered.checked_add(debt_here)?;
		remaining = remaining.checked_sub(debt_here)?;
	}

	ops.push(VirtualOp::AssetSettle {
		settlement: settlement.id,
		account: settlement.owner,
		paid: AssetAmount::new(bitasset.backing_asset, total_paid_collateral),
	});
	Ok(total_debt_covered)
}

fn reduce_supply(store: &mut Store, asset: ObjectId, amount: Amount) -> Result<(), MarketError> {
	if amount.is_zero() {
		return Ok(());
	}
	let dynamic_data = store.get(asset)?.as_asset().ok_or(MarketError::WrongObjectType(asset))?.dynamic_data;
	store.modify(dynamic_data, |o| {
		let dd = o.as_asset_dynamic_data_mut().unwrap();
		dd.current_supply = dd.current_supply.checked_sub(amount).expect("supply cannot go negative under invariant 1");
	})?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use chain_objects::{ids, Account, AccountOptions, Asset, AssetDynamicData, AssetFlags, AssetOptions, Authority, FeedOptions};
	use primitives::Space;

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

	#[test]
	fn matured_settlement_pays_from_fund_when_globally_settled() {
		let mut store = Store::new();
		let issuer = store.create(Space::Protocol, ids::protocol::ACCOUNT, |id| dummy_account(id, "issuer")).unwrap();
		let owner = store.create(Space::Protocol, ids::protocol::ACCOUNT, |id| dummy_account(id, "owner")).unwrap();

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
						max_supply: Amount(1_000_000),
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

		let mark_dyn = store
			.create(Space::Implementation, ids::implementation::ASSET_DYNAMIC_DATA, |id| {
				Object::AssetDynamicData(AssetDynamicData { id, asset: ObjectId::new(Space::Protocol, 0, 0), current_supply: Amount(100), accumulated_fees: Amount(0) })
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
						max_supply: Amount(1_000_000),
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

		let settle_price = Price::new(AssetAmount::new(mark, Amount(1)), AssetAmount::new(core, Amount(95))).unwrap();
		let bitasset_id = store
			.create(Space::Implementation, ids::implementation::BITASSET_DATA, |id| {
				Object::BitassetData(BitassetData {
					id,
					asset: mark,
					backing_asset: core,
					feeds: Default::default(),
					current_feed: None,
					options: FeedOptions { force_settle_offset_percent: 0, force_settle_delay_seconds: 86400, minimum_feeds: 1 },
					settlement_price: Some(settle_price),
					settlement_fund: Amount(9_500),
				})
			})
			.unwrap();
		store.modify(mark, |o| o.as_asset_mut().unwrap().bitasset_data = Some(bitasset_id)).unwrap();

		store
			.create(Space::Implementation, ids::implementation::FORCE_SETTLEMENT, |id| {
				Object::ForceSettlement(ForceSettlement { id, owner, asset: mark, balance: Amount(100), settlement_date: BlockTime(1000) })
			})
			.unwrap();

		let ops = process_matured_settlements(&mut store, mark, BlockTime(2000), 10_000).unwrap();
		assert!(matches!(ops.as_slice(), [VirtualOp::AssetSettle { .. }]));
		let owner_balance = store.get(fund::find_balance(&store, owner, core).unwrap()).unwrap().as_account_balance().unwrap();
		assert_eq!(owner_balance.amount, Amount(9_500));
		assert!(store.indices().force_settlements.by_expiration.is_empty());
	}
}
