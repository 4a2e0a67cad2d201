use chain_objects::{
	ids, Asset, AssetCreateOp, AssetDynamicData, AssetFlags, AssetIssueOp, AssetReserveOp,
	AssetUpdateOp, BitassetData, Object,
};
use object_store::Store;
use primitives::{validate_asset_symbol, Amount, ObjectId, Price, Space};
use tracing::info;

use crate::error::EvaluatorError;

/// `spec.md` §4.C, Asset create/update: symbol shape and `issuer_permissions
/// ⊇ flags`.
fn check_flags(asset: ObjectId, flags: AssetFlags, issuer_permissions: AssetFlags) -> Result<(), EvaluatorError> {
	if !flags.is_subset_of(issuer_permissions) {
		return Err(EvaluatorError::IssuerPermissionsNotSuperset(asset));
	}
	Ok(())
}

pub fn validate_create(op: &AssetCreateOp) -> Result<(), EvaluatorError> {
	validate_asset_symbol(&op.symbol)?;
	check_flags(ObjectId::new(Space::Protocol, ids::protocol::ASSET, 0), op.options.flags, op.options.issuer_permissions)
}

pub fn do_evaluate_create(store: &Store, op: &AssetCreateOp) -> Result<(), EvaluatorError> {
	store.get(op.issuer)?.as_account().ok_or(EvaluatorError::WrongObjectType(op.issuer))?;
	if let Some(bitasset) = &op.bitasset {
		store.get(bitasset.backing_asset)?.as_asset().ok_or(EvaluatorError::WrongObjectType(bitasset.backing_asset))?;
	}
	Ok(())
}

pub fn do_apply_create(store: &mut Store, op: &AssetCreateOp) -> Result<ObjectId, EvaluatorError> {
	let dynamic_data = store.create(Space::Implementation, ids::implementation::ASSET_DYNAMIC_DATA, |id| {
		Object::AssetDynamicData(AssetDynamicData { id, asset: ObjectId::new(Space::Protocol, 0, 0), current_supply: Amount::ZERO, accumulated_fees: Amount::ZERO })
	})?;
	let asset_id = store.create(Space::Protocol, ids::protocol::ASSET, |id| {
		Object::Asset(Asset {
			id,
			symbol: op.symbol.clone(),
			precision: op.precision,
			issuer: op.issuer,
			options: op.options.clone(),
			dynamic_data,
			bitasset_data: None,
		})
	})?;
	store.modify(dynamic_data, |o| o.as_asset_dynamic_data_mut().unwrap().asset = asset_id)?;

	if let Some(bitasset) = &op.bitasset {
		let bitasset_id = store.create(Space::Implementation, ids::implementation::BITASSET_DATA, |id| {
			Object::BitassetData(BitassetData {
				id,
				asset: asset_id,
				backing_asset: bitasset.backing_asset,
				feeds: Default::default(),
				current_feed: None,
				options: bitasset.feed_options.clone(),
				settlement_price: None,
				settlement_fund: Amount::ZERO,
			})
		})?;
		store.modify(asset_id, |o| o.as_asset_mut().unwrap().bitasset_data = Some(bitasset_id))?;
	}
	Ok(asset_id)
}

pub fn validate_update(op: &AssetUpdateOp) -> Result<(), EvaluatorError> {
	check_flags(op.asset, op.new_options.flags, op.new_options.issuer_permissions)
}

/// `spec.md` §4.C, Asset update: `issuer_permissions` "cannot be widened
/// after creation" — the new permission bits must already be a subset of
/// the asset's current ones.
pub fn do_evaluate_update(store: &Store, op: &AssetUpdateOp) -> Result<(), EvaluatorError> {
	let asset = store.get(op.asset)?.as_asset().ok_or(EvaluatorError::WrongObjectType(op.asset))?;
	if !op.new_options.issuer_permissions.is_subset_of(asset.options.issuer_permissions) {
		return Err(EvaluatorError::IssuerPermissionsWidened(op.asset));
	}
	Ok(())
}

pub fn do_apply_update(store: &mut Store, op: &AssetUpdateOp) -> Result<(), EvaluatorError> {
	store.modify(op.asset, |o| {
		let asset = o.as_asset_mut().unwrap();
		asset.options = op.new_options.clone();
		if let Some(new_issuer) = op.new_issuer {
			asset.issuer = new_issuer;
		}
	})?;
	Ok(())
}

/// `spec.md` §4.C, Asset issue: mints `amount` into `issue_to`'s balance,
/// failing if it would push `current_supply` past `max_supply`.
pub fn do_evaluate_issue(store: &Store, op: &AssetIssueOp) -> Result<(), EvaluatorError> {
	let asset = store.get(op.asset)?.as_asset().ok_or(EvaluatorError::WrongObjectType(op.asset))?;
	if asset.issuer != op.issuer {
		return Err(EvaluatorError::WrongObjectType(op.asset));
	}
	let supply = store.get(asset.dynamic_data)?.as_asset_dynamic_data().unwrap().current_supply;
	let new_supply = supply.checked_add(op.amount)?;
	if new_supply.0 > asset.options.max_supply.0 {
		return Err(EvaluatorError::ExceedsMaxSupply(op.asset, op.amount.0));
	}
	Ok(())
}

pub fn do_apply_issue(store: &mut Store, op: &AssetIssueOp) -> Result<(), EvaluatorError> {
	let dynamic_data = store.get(op.asset)?.as_asset().unwrap().dynamic_data;
	store.modify(dynamic_data, |o| {
		let dd = o.as_asset_dynamic_data_mut().unwrap();
		dd.current_supply = dd.current_supply.checked_add(op.amount).expect("checked in do_evaluate");
	})?;
	market_engine::fund::credit_balance(store, op.issue_to, op.asset, op.amount)?;
	Ok(())
}

/// `spec.md` §4.C, Asset reserve: burns `amount` out of `payer`'s balance
/// and out of supply; forbidden for market-issued assets (their supply is
/// backed 1:1 by collateral, so reserving would desync it from the call
/// orders that created it).
pub fn do_evaluate_reserve(store: &Store, op: &AssetReserveOp) -> Result<(), EvaluatorError> {
	let asset = store.get(op.asset)?.as_asset().ok_or(EvaluatorError::WrongObjectType(op.asset))?;
	if asset.is_market_issued() {
		return Err(EvaluatorError::ReserveOfMarketIssued(op.asset));
	}
	let balance = store.indices().balances.by_owner_asset.get(&(op.payer, op.asset)).and_then(|id| store.find(*id)).and_then(Object::as_account_balance);
	let available = balance.map(|b| b.amount).unwrap_or(Amount::ZERO);
	if available.0 < op.amount.0 {
		return Err(EvaluatorError::InsufficientBalance(op.payer));
	}
	Ok(())
}

pub fn do_apply_reserve(store: &mut Store, op: &AssetReserveOp) -> Result<(), EvaluatorError> {
	market_engine::fund::debit_balance(store, op.payer, op.asset, op.amount)?;
	let dynamic_data = store.get(op.asset)?.as_asset().unwrap().dynamic_data;
	store.modify(dynamic_data, |o| {
		let dd = o.as_asset_dynamic_data_mut().unwrap();
		dd.current_supply = dd.current_supply.checked_sub(op.amount).expect("checked in do_evaluate");
	})?;
	Ok(())
}

/// `spec.md` §4.C, Asset global settle: issuer-only, requires the
/// `global_settle` flag, drains all call orders into the settlement fund
/// at `op.settle_price`.
pub fn do_evaluate_global_settle(store: &Store, op: &chain_objects::AssetGlobalSettleOp) -> Result<(), EvaluatorError> {
	let asset = store.get(op.asset)?.as_asset().ok_or(EvaluatorError::WrongObjectType(op.asset))?;
	if asset.issuer != op.issuer {
		return Err(EvaluatorError::WrongObjectType(op.asset));
	}
	if !asset.options.flags.contains(AssetFlags::GLOBAL_SETTLE) {
		return Err(EvaluatorError::GlobalSettleDisabled(op.asset));
	}
	let bitasset_id = asset.bitasset_data.ok_or(EvaluatorError::NotMarketIssued(op.asset))?;
	let bitasset = store.get(bitasset_id)?.as_bitasset_data().unwrap();
	if bitasset.is_globally_settled() {
		return Err(EvaluatorError::AlreadyGloballySettled(op.asset));
	}
	let _ = Price::new(op.settle_price.base, op.settle_price.quote)?;
	Ok(())
}

pub fn do_apply_global_settle(store: &mut Store, op: &chain_objects::AssetGlobalSettleOp) -> Result<Vec<chain_objects::VirtualOp>, EvaluatorError> {
	let ops = market_engine::settle_market(store, op.asset, op.settle_price)?;
	info!(asset = ?op.asset, "asset globally settled");
	Ok(ops)
}

/// `spec.md` §4.D, Global settlement revival: issuer-only, requires the
/// asset to already be globally settled.
pub fn do_evaluate_revive(store: &Store, op: &chain_objects::AssetReviveOp) -> Result<(), EvaluatorError> {
	let asset = store.get(op.asset)?.as_asset().ok_or(EvaluatorError::WrongObjectType(op.asset))?;
	if asset.issuer != op.issuer {
		return Err(EvaluatorError::WrongObjectType(op.asset));
	}
	let bitasset_id = asset.bitasset_data.ok_or(EvaluatorError::NotMarketIssued(op.asset))?;
	let bitasset = store.get(bitasset_id)?.as_bitasset_data().unwrap();
	if !bitasset.is_globally_settled() {
		return Err(EvaluatorError::NotGloballySettled(op.asset));
	}
	Ok(())
}

pub fn do_apply_revive(store: &mut Store, op: &chain_objects::AssetReviveOp) -> Result<Vec<chain_objects::VirtualOp>, EvaluatorError> {
	let ops = market_engine::revive_market(store, op.asset)?;
	info!(asset = ?op.asset, "asset revived from global settlement");
	Ok(ops)
}
