use chain_objects::{Object, TransferOp};
use object_store::Store;
use primitives::ObjectId;

use crate::context::EvaluationContext;
use crate::error::EvaluatorError;

/// `spec.md` §4.C, Transfer: syntactic checks only — a non-zero amount and
/// distinct endpoints. Everything state-dependent (balances, whitelist,
/// restriction flags) is a `do_evaluate` precondition.
pub fn validate(op: &TransferOp) -> Result<(), EvaluatorError> {
	op.amount.require_non_negative()?;
	if op.amount.is_zero() {
		return Err(EvaluatorError::ZeroAmount);
	}
	if op.from == op.to {
		return Err(EvaluatorError::SelfTransfer);
	}
	Ok(())
}

fn asset_of(store: &Store, asset: ObjectId) -> Result<&chain_objects::Asset, EvaluatorError> {
	store.get(asset)?.as_asset().ok_or(EvaluatorError::WrongObjectType(asset))
}

/// `spec.md` §4.C, Transfer preconditions: the asset's whitelist (if the
/// `WHITE_LIST` flag is set, both endpoints must be the issuer or already
/// on `whitelist_authorities`, and neither may be on `blacklist_authorities`),
/// the `transfer_restricted` flag (only the issuer may be a counterparty),
/// and a sufficient `from` balance.
pub fn do_evaluate(store: &Store, op: &TransferOp) -> Result<(), EvaluatorError> {
	let asset = asset_of(store, op.asset)?;
	use chain_objects::AssetFlags;

	if asset.options.flags.contains(AssetFlags::WHITE_LIST) {
		for party in [op.from, op.to] {
			if party != asset.issuer && !asset.options.whitelist_authorities.contains(&party) {
				return Err(EvaluatorError::NotWhitelisted(op.asset, party));
			}
			if asset.options.blacklist_authorities.contains(&party) {
				return Err(EvaluatorError::NotWhitelisted(op.asset, party));
			}
		}
	}
	if asset.options.flags.contains(AssetFlags::TRANSFER_RESTRICTED)
		&& op.from != asset.issuer
		&& op.to != asset.issuer
	{
		return Err(EvaluatorError::TransferRestricted(op.asset));
	}

	let from_balance = store
		.indices()
		.balances
		.by_owner_asset
		.get(&(op.from, op.asset))
		.and_then(|id| store.find(*id))
		.and_then(Object::as_account_balance);
	let available = from_balance.map(|b| b.amount).unwrap_or(primitives::Amount::ZERO);
	if available.0 < op.amount.0 {
		return Err(EvaluatorError::InsufficientBalance(op.from));
	}
	Ok(())
}

pub fn do_apply(store: &mut Store, _ctx: &EvaluationContext, op: &TransferOp) -> Result<(), EvaluatorError> {
	market_engine::fund::debit_balance(store, op.from, op.asset, op.amount)?;
	market_engine::fund::credit_balance(store, op.to, op.asset, op.amount)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use chain_objects::{ids, Asset, AssetDynamicData, AssetFlags, AssetOptions};
	use primitives::{Amount, Space};

	fn core_asset(store: &mut Store, issuer: ObjectId, flags: AssetFlags) -> ObjectId {
		let dynamic_data = store
			.create(Space::Implementation, ids::implementation::ASSET_DYNAMIC_DATA, |id| {
				Object::AssetDynamicData(AssetDynamicData { id, asset: ObjectId::new(Space::Protocol, 0, 0), current_supply: Amount(0), accumulated_fees: Amount(0) })
			})
			.unwrap();
		let asset = store
			.create(Space::Protocol, ids::protocol::ASSET, |id| {
				Object::Asset(Asset {
					id,
					symbol: "CORE".into(),
					precision: 5,
					issuer,
					options: AssetOptions {
						max_supply: Amount(1_000_000),
						flags,
						issuer_permissions: flags,
						market_fee_percent: 0,
						max_market_fee: Amount(0),
						core_exchange_rate: None,
						whitelist_authorities: vec![],
						blacklist_authorities: vec![],
					},
					dynamic_data,
					bitasset_data: None,
				})
			})
			.unwrap();
		store.modify(dynamic_data, |o| o.as_asset_dynamic_data_mut().unwrap().asset = asset).unwrap();
		asset
	}

	#[test]
	fn rejects_negative_amount_at_validate() {
		let op = TransferOp { from: ObjectId::new(Space::Protocol, 0, 1), to: ObjectId::new(Space::Protocol, 0, 2), asset: ObjectId::new(Space::Protocol, 0, 3), amount: Amount(-1), memo: None };
		assert!(validate(&op).is_err());
	}

	#[test]
	fn rejects_zero_amount_at_validate() {
		let op = TransferOp { from: ObjectId::new(Space::Protocol, 0, 1), to: ObjectId::new(Space::Protocol, 0, 2), asset: ObjectId::new(Space::Protocol, 0, 3), amount: Amount::ZERO, memo: None };
		assert_eq!(validate(&op), Err(EvaluatorError::ZeroAmount));
	}

	#[test]
	fn rejects_self_transfer_at_validate() {
		let account = ObjectId::new(Space::Protocol, 0, 1);
		let op = TransferOp { from: account, to: account, asset: ObjectId::new(Space::Protocol, 0, 3), amount: Amount(1), memo: None };
		assert_eq!(validate(&op), Err(EvaluatorError::SelfTransfer));
	}

	#[test]
	fn fails_insufficient_balance() {
		let mut store = Store::new();
		let issuer = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 0);
		let asset = core_asset(&mut store, issuer, AssetFlags::NONE);
		let from = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1);
		let to = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 2);
		let op = TransferOp { from, to, asset, amount: Amount(500), memo: None };
		assert_eq!(do_evaluate(&store, &op), Err(EvaluatorError::InsufficientBalance(from)));
	}

	#[test]
	fn transfer_restricted_rejects_non_issuer_counterparty() {
		let mut store = Store::new();
		let issuer = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 0);
		let asset = core_asset(&mut store, issuer, AssetFlags::TRANSFER_RESTRICTED);
		let from = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1);
		let to = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 2);
		market_engine::fund::credit_balance(&mut store, from, asset, Amount(1000)).unwrap();
		let op = TransferOp { from, to, asset, amount: Amount(100), memo: None };
		assert_eq!(do_evaluate(&store, &op), Err(EvaluatorError::TransferRestricted(asset)));
	}

	#[test]
	fn successful_transfer_moves_balance() {
		let mut store = Store::new();
		let issuer = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 0);
		let asset = core_asset(&mut store, issuer, AssetFlags::NONE);
		let from = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1);
		let to = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 2);
		market_engine::fund::credit_balance(&mut store, from, asset, Amount(10_000)).unwrap();
		let op = TransferOp { from, to, asset, amount: Amount(500), memo: None };
		let ctx = EvaluationContext { head_time: primitives::BlockTime(0), max_authority_membership: 10, min_review_period_seconds: 0, evaluating_proposed_transaction: false };
		do_evaluate(&store, &op).unwrap();
		do_apply(&mut store, &ctx, &op).unwrap();

		let from_balance = store.get(market_engine::fund::find_balance(&store, from, asset).unwrap()).unwrap().as_account_balance().unwrap();
		let to_balance = store.get(market_engine::fund::find_balance(&store, to, asset).unwrap()).unwrap().as_account_balance().unwrap();
		assert_eq!(from_balance.amount, Amount(9_500));
		assert_eq!(to_balance.amount, Amount(500));
	}
}
