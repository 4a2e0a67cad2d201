use chain_objects::{
	ids, BalanceClaimOp, Object, VestingBalance, VestingBalanceCreateOp, VestingBalanceWithdrawOp,
};
use object_store::Store;
use primitives::{Amount, ObjectId, Space};

use crate::context::EvaluationContext;
use crate::error::EvaluatorError;

pub fn validate_create(op: &VestingBalanceCreateOp) -> Result<(), EvaluatorError> {
	op.amount.require_non_negative()?;
	Ok(())
}

pub fn do_evaluate_create(store: &Store, op: &VestingBalanceCreateOp) -> Result<(), EvaluatorError> {
	store.get(op.owner)?.as_account().ok_or(EvaluatorError::WrongObjectType(op.owner))?;
	let balance = store
		.indices()
		.balances
		.by_owner_asset
		.get(&(op.creator, op.asset))
		.and_then(|id| store.find(*id))
		.and_then(Object::as_account_balance);
	let available = balance.map(|b| b.amount).unwrap_or(Amount::ZERO);
	if available.0 < op.amount.0 {
		return Err(EvaluatorError::InsufficientBalance(op.creator));
	}
	Ok(())
}

pub fn do_apply_create(store: &mut Store, ctx: &EvaluationContext, op: &VestingBalanceCreateOp) -> Result<ObjectId, EvaluatorError> {
	market_engine::fund::debit_balance(store, op.creator, op.asset, op.amount)?;
	let id = store.create(Space::Protocol, ids::protocol::VESTING_BALANCE, |id| {
		Object::VestingBalance(VestingBalance {
			id,
			owner: op.owner,
			asset: op.asset,
			balance: op.amount,
			policy: op.policy.clone(),
			last_claim: ctx.head_time,
		})
	})?;
	Ok(id)
}

/// `spec.md` §4.C, Vesting balance withdraw: bounded by
/// [`VestingBalance::get_allowed_withdraw`]; draws down `balance` and
/// advances `last_claim` so coin-days-destroyed policies reset.
pub fn do_evaluate_withdraw(store: &Store, ctx: &EvaluationContext, op: &VestingBalanceWithdrawOp) -> Result<(), EvaluatorError> {
	let vb = store.get(op.vesting_balance)?.as_vesting_balance().ok_or(EvaluatorError::WrongObjectType(op.vesting_balance))?;
	if vb.owner != op.owner {
		return Err(EvaluatorError::WrongObjectType(op.vesting_balance));
	}
	let allowed = vb.get_allowed_withdraw(ctx.head_time);
	if op.amount.0 > allowed.0 {
		return Err(EvaluatorError::ExceedsAllowedWithdraw(op.vesting_balance, op.amount.0));
	}
	Ok(())
}

pub fn do_apply_withdraw(store: &mut Store, ctx: &EvaluationContext, op: &VestingBalanceWithdrawOp) -> Result<(), EvaluatorError> {
	let vb = store.get(op.vesting_balance)?.as_vesting_balance().unwrap();
	let asset = vb.asset;
	store.modify(op.vesting_balance, |o| {
		let vb = o.as_vesting_balance_mut().unwrap();
		vb.balance = vb.balance.checked_sub(op.amount).expect("checked in do_evaluate");
		vb.last_claim = ctx.head_time;
	})?;
	market_engine::fund::credit_balance(store, op.owner, asset, op.amount)?;
	Ok(())
}

/// `spec.md` §4.C, Balance claim: genesis balances are modeled as
/// [`VestingBalance`]s pre-seeded at genesis rather than a dedicated
/// object type, so a claim is a withdraw gated by `balance_owner_key`
/// identifying which vesting balance `deposit_to_account` may drain (the
/// cryptographic proof of key ownership is the transaction signature
/// itself, checked by the authority resolver against `deposit_to_account`'s
/// active authority — see `Operation::required_authorities`). Lockup is
/// enforced unconditionally; there is no early-claim override.
pub fn do_evaluate_balance_claim(store: &Store, ctx: &EvaluationContext, op: &BalanceClaimOp) -> Result<(), EvaluatorError> {
	if op.balance_owner_key.is_empty() {
		return Err(EvaluatorError::KeyMismatch(op.balance_id));
	}
	let vb = store.get(op.balance_id)?.as_vesting_balance().ok_or(EvaluatorError::WrongObjectType(op.balance_id))?;
	if vb.owner != op.deposit_to_account {
		return Err(EvaluatorError::KeyMismatch(op.balance_id));
	}
	let allowed = vb.get_allowed_withdraw(ctx.head_time);
	if op.total_claimed.0 > allowed.0 {
		return Err(EvaluatorError::StillLockedUp(op.balance_id));
	}
	Ok(())
}

pub fn do_apply_balance_claim(store: &mut Store, ctx: &EvaluationContext, op: &BalanceClaimOp) -> Result<(), EvaluatorError> {
	let vb = store.get(op.balance_id)?.as_vesting_balance().unwrap();
	let asset = vb.asset;
	store.modify(op.balance_id, |o| {
		let vb = o.as_vesting_balance_mut().unwrap();
		vb.balance = vb.balance.checked_sub(op.total_claimed).expect("checked in do_evaluate");
		vb.last_claim = ctx.head_time;
	})?;
	market_engine::fund::credit_balance(store, op.deposit_to_account, asset, op.total_claimed)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use chain_objects::VestingPolicy;
	use primitives::BlockTime;

	fn ctx(head_time: u64) -> EvaluationContext {
		EvaluationContext { head_time: BlockTime(head_time), max_authority_membership: 10, min_review_period_seconds: 0, evaluating_proposed_transaction: false }
	}

	fn linear_vesting(store: &mut Store, owner: ObjectId, asset: ObjectId) -> ObjectId {
		store
			.create(Space::Protocol, ids::protocol::VESTING_BALANCE, |id| {
				Object::VestingBalance(VestingBalance {
					id,
					owner,
					asset,
					balance: Amount(1000),
					policy: VestingPolicy::Linear { begin_timestamp: BlockTime(0), vesting_cliff_seconds: 0, vesting_duration_seconds: 1000 },
					last_claim: BlockTime(0),
				})
			})
			.unwrap()
	}

	#[test]
	fn rejects_negative_create_amount() {
		let op = VestingBalanceCreateOp {
			creator: ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1),
			owner: ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 2),
			asset: ObjectId::new(Space::Protocol, ids::protocol::ASSET, 0),
			amount: Amount(-1),
			policy: VestingPolicy::CoinDaysDestroyed { min_withdrawal_seconds: 0, last_deposit: BlockTime(0) },
		};
		assert!(validate_create(&op).is_err());
	}

	#[test]
	fn create_requires_sufficient_creator_balance() {
		let store = Store::new();
		let op = VestingBalanceCreateOp {
			creator: ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1),
			owner: ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 2),
			asset: ObjectId::new(Space::Protocol, ids::protocol::ASSET, 0),
			amount: Amount(100),
			policy: VestingPolicy::CoinDaysDestroyed { min_withdrawal_seconds: 0, last_deposit: BlockTime(0) },
		};
		assert_eq!(do_evaluate_create(&store, &op), Err(EvaluatorError::InsufficientBalance(op.creator)));
	}

	#[test]
	fn withdraw_before_cliff_allows_nothing() {
		let mut store = Store::new();
		let owner = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1);
		let asset = ObjectId::new(Space::Protocol, ids::protocol::ASSET, 0);
		let vb = store
			.create(Space::Protocol, ids::protocol::VESTING_BALANCE, |id| {
				Object::VestingBalance(VestingBalance {
					id,
					owner,
					asset,
					balance: Amount(1000),
					policy: VestingPolicy::Linear { begin_timestamp: BlockTime(0), vesting_cliff_seconds: 500, vesting_duration_seconds: 1000 },
					last_claim: BlockTime(0),
				})
			})
			.unwrap();
		let op = VestingBalanceWithdrawOp { vesting_balance: vb, owner, amount: Amount(1) };
		assert_eq!(do_evaluate_withdraw(&store, &ctx(100), &op), Err(EvaluatorError::ExceedsAllowedWithdraw(vb, 1)));
	}

	#[test]
	fn withdraw_partial_linear_vest_succeeds() {
		let mut store = Store::new();
		let owner = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1);
		let asset = ObjectId::new(Space::Protocol, ids::protocol::ASSET, 0);
		let vb = linear_vesting(&mut store, owner, asset);

		let op = VestingBalanceWithdrawOp { vesting_balance: vb, owner, amount: Amount(500) };
		do_evaluate_withdraw(&store, &ctx(500), &op).unwrap();
		do_apply_withdraw(&mut store, &ctx(500), &op).unwrap();

		let vb_obj = store.get(vb).unwrap().as_vesting_balance().unwrap();
		assert_eq!(vb_obj.balance, Amount(500));
		assert_eq!(vb_obj.last_claim, BlockTime(500));
		let owner_balance = store.get(market_engine::fund::find_balance(&store, owner, asset).unwrap()).unwrap().as_account_balance().unwrap();
		assert_eq!(owner_balance.amount, Amount(500));
	}

	#[test]
	fn balance_claim_rejects_empty_key() {
		let mut store = Store::new();
		let owner = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1);
		let asset = ObjectId::new(Space::Protocol, ids::protocol::ASSET, 0);
		let vb = linear_vesting(&mut store, owner, asset);
		let op = BalanceClaimOp { balance_id: vb, balance_owner_key: vec![], deposit_to_account: owner, total_claimed: Amount(10) };
		assert_eq!(do_evaluate_balance_claim(&store, &ctx(1000), &op), Err(EvaluatorError::KeyMismatch(vb)));
	}

	#[test]
	fn balance_claim_rejects_still_locked_up() {
		let mut store = Store::new();
		let owner = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1);
		let asset = ObjectId::new(Space::Protocol, ids::protocol::ASSET, 0);
		let vb = linear_vesting(&mut store, owner, asset);
		let op = BalanceClaimOp { balance_id: vb, balance_owner_key: vec![1], deposit_to_account: owner, total_claimed: Amount(900) };
		assert_eq!(do_evaluate_balance_claim(&store, &ctx(100), &op), Err(EvaluatorError::StillLockedUp(vb)));
	}

	#[test]
	fn balance_claim_fully_vested_succeeds() {
		let mut store = Store::new();
		let owner = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1);
		let asset = ObjectId::new(Space::Protocol, ids::protocol::ASSET, 0);
		let vb = linear_vesting(&mut store, owner, asset);
		let op = BalanceClaimOp { balance_id: vb, balance_owner_key: vec![1], deposit_to_account: owner, total_claimed: Amount(1000) };
		do_evaluate_balance_claim(&store, &ctx(2000), &op).unwrap();
		do_apply_balance_claim(&mut store, &ctx(2000), &op).unwrap();
		let vb_obj = store.get(vb).unwrap().as_vesting_balance().unwrap();
		assert_eq!(vb_obj.balance, Amount(0));
	}
}
