use chain_objects::{
	ids, Object, WithdrawPermission, WithdrawPermissionClaimOp, WithdrawPermissionCreateOp,
	WithdrawPermissionDeleteOp, WithdrawPermissionUpdateOp,
};
use object_store::Store;
use primitives::{Amount, ObjectId, Space};

use crate::context::EvaluationContext;
use crate::error::EvaluatorError;

pub fn validate_create(op: &WithdrawPermissionCreateOp) -> Result<(), EvaluatorError> {
	op.withdrawal_limit.require_non_negative()?;
	Ok(())
}

pub fn do_evaluate_create(store: &Store, op: &WithdrawPermissionCreateOp) -> Result<(), EvaluatorError> {
	store.get(op.withdraw_from_account)?.as_account().ok_or(EvaluatorError::WrongObjectType(op.withdraw_from_account))?;
	Ok(())
}

pub fn do_apply_create(store: &mut Store, op: &WithdrawPermissionCreateOp) -> Result<ObjectId, EvaluatorError> {
	let expiration = op.period_start_time.plus_seconds(op.withdrawal_period_sec * op.periods_until_expiration as u64);
	let id = store.create(Space::Protocol, ids::protocol::WITHDRAW_PERMISSION, |id| {
		Object::WithdrawPermission(WithdrawPermission {
			id,
			withdraw_from_account: op.withdraw_from_account,
			authorized: op.authorized_account.clone(),
			withdrawal_limit: op.withdrawal_limit,
			asset: op.asset,
			withdrawal_period_sec: op.withdrawal_period_sec,
			periods_until_expiration: op.periods_until_expiration,
			period_start_time: op.period_start_time,
			claimed_this_period: Amount::ZERO,
			expiration,
		})
	})?;
	Ok(id)
}

pub fn do_evaluate_update(store: &Store, op: &WithdrawPermissionUpdateOp) -> Result<(), EvaluatorError> {
	let perm = store.get(op.permission_to_update)?.as_withdraw_permission().ok_or(EvaluatorError::WrongObjectType(op.permission_to_update))?;
	if perm.withdraw_from_account != op.withdraw_from_account {
		return Err(EvaluatorError::WrongObjectType(op.permission_to_update));
	}
	Ok(())
}

pub fn do_apply_update(store: &mut Store, op: &WithdrawPermissionUpdateOp) -> Result<(), EvaluatorError> {
	let expiration = op.period_start_time.plus_seconds(op.withdrawal_period_sec * op.periods_until_expiration as u64);
	store.modify(op.permission_to_update, |o| {
		let perm = o.as_withdraw_permission_mut().unwrap();
		perm.authorized = op.authorized_account.clone();
		perm.withdrawal_limit = op.withdrawal_limit;
		perm.withdrawal_period_sec = op.withdrawal_period_sec;
		perm.periods_until_expiration = op.periods_until_expiration;
		perm.period_start_time = op.period_start_time;
		perm.claimed_this_period = Amount::ZERO;
		perm.expiration = expiration;
	})?;
	Ok(())
}

/// `spec.md` §4.C, Withdraw permission claim: bounded by
/// [`WithdrawPermission::available`]; rejects claims before
/// `period_start_time` or after `expiration`, and resets
/// `claimed_this_period` when a new period has started.
pub fn do_evaluate_claim(store: &Store, ctx: &EvaluationContext, op: &WithdrawPermissionClaimOp) -> Result<(), EvaluatorError> {
	let perm = store.get(op.withdraw_permission)?.as_withdraw_permission().ok_or(EvaluatorError::WrongObjectType(op.withdraw_permission))?;
	if perm.withdraw_from_account != op.withdraw_from_account || perm.asset != op.asset {
		return Err(EvaluatorError::WrongObjectType(op.withdraw_permission));
	}
	if perm.is_expired(ctx.head_time) {
		return Err(EvaluatorError::PermissionExpired(op.withdraw_permission));
	}
	if !perm.authorized.permits(op.withdraw_to_account) {
		return Err(EvaluatorError::NotAuthorizedSpender(op.withdraw_permission, op.withdraw_to_account));
	}
	if ctx.head_time < perm.period_start_time {
		return Err(EvaluatorError::ClaimBeforePeriodStart(op.withdraw_permission));
	}
	let periods_elapsed = ctx.head_time.seconds_since(perm.period_start_time) / perm.withdrawal_period_sec.max(1);
	let claimed_this_period = if periods_elapsed > 0 { Amount::ZERO } else { perm.claimed_this_period };
	if op.amount_to_withdraw.0 > perm.withdrawal_limit.checked_sub(claimed_this_period)?.0 {
		return Err(EvaluatorError::ExceedsPeriodAllowance(op.withdraw_permission, op.amount_to_withdraw.0));
	}
	let balance = store
		.indices()
		.balances
		.by_owner_asset
		.get(&(op.withdraw_from_account, op.asset))
		.and_then(|id| store.find(*id))
		.and_then(Object::as_account_balance);
	let available = balance.map(|b| b.amount).unwrap_or(Amount::ZERO);
	if available.0 < op.amount_to_withdraw.0 {
		return Err(EvaluatorError::InsufficientBalance(op.withdraw_from_account));
	}
	Ok(())
}

pub fn do_apply_claim(store: &mut Store, ctx: &EvaluationContext, op: &WithdrawPermissionClaimOp) -> Result<(), EvaluatorError> {
	let perm = store.get(op.withdraw_permission)?.as_withdraw_permission().unwrap();
	let periods_elapsed = ctx.head_time.seconds_since(perm.period_start_time) / perm.withdrawal_period_sec.max(1);
	let new_period_start =
		perm.period_start_time.plus_seconds(periods_elapsed * perm.withdrawal_period_sec);

	market_engine::fund::debit_balance(store, op.withdraw_from_account, op.asset, op.amount_to_withdraw)?;
	market_engine::fund::credit_balance(store, op.withdraw_to_account, op.asset, op.amount_to_withdraw)?;

	store.modify(op.withdraw_permission, |o| {
		let perm = o.as_withdraw_permission_mut().unwrap();
		if periods_elapsed > 0 {
			perm.period_start_time = new_period_start;
			perm.claimed_this_period = op.amount_to_withdraw;
		} else {
			perm.claimed_this_period = perm.claimed_this_period.checked_add(op.amount_to_withdraw).expect("checked in do_evaluate");
		}
	})?;
	Ok(())
}

pub fn do_evaluate_delete(store: &Store, op: &WithdrawPermissionDeleteOp) -> Result<(), EvaluatorError> {
	let perm = store.get(op.withdraw_permission)?.as_withdraw_permission().ok_or(EvaluatorError::WrongObjectType(op.withdraw_permission))?;
	if perm.withdraw_from_account != op.withdraw_from_account {
		return Err(EvaluatorError::WrongObjectType(op.withdraw_permission));
	}
	Ok(())
}

pub fn do_apply_delete(store: &mut Store, op: &WithdrawPermissionDeleteOp) -> Result<(), EvaluatorError> {
	store.remove(op.withdraw_permission)?;
	Ok(())
}
