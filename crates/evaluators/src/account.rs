use chain_objects::{ids, Account, AccountCreateOp, AccountStatistics, AccountUpdateOp, Object};
use object_store::Store;
use primitives::{validate_account_name, ObjectId, Space};

use crate::context::EvaluationContext;
use crate::error::EvaluatorError;

fn check_membership(ctx: &EvaluationContext, owner: &chain_objects::Authority, active: &chain_objects::Authority) -> Result<(), EvaluatorError> {
	for authority in [owner, active] {
		let membership = authority.total_membership();
		if membership > ctx.max_authority_membership as usize {
			return Err(EvaluatorError::AuthorityTooLarge(ctx.max_authority_membership, membership));
		}
	}
	Ok(())
}

/// `spec.md` §4.C, Account create/update: RFC-1035-like name validation and
/// the authority-membership bound. Cycle prevention in the account-auth
/// graph is not checked here — it's enforced indirectly by the resolver's
/// `max_authority_depth` bound at signing time (`spec.md` §4.C).
pub fn validate_create(ctx: &EvaluationContext, op: &AccountCreateOp) -> Result<(), EvaluatorError> {
	validate_account_name(&op.name)?;
	check_membership(ctx, &op.owner, &op.active)
}

pub fn validate_update(ctx: &EvaluationContext, op: &AccountUpdateOp) -> Result<(), EvaluatorError> {
	if let (Some(owner), Some(active)) = (&op.owner, &op.active) {
		check_membership(ctx, owner, active)?;
	} else if let Some(owner) = &op.owner {
		check_membership(ctx, owner, &chain_objects::Authority::default())?;
	} else if let Some(active) = &op.active {
		check_membership(ctx, &chain_objects::Authority::default(), active)?;
	}
	Ok(())
}

pub fn do_evaluate_create(store: &Store, op: &AccountCreateOp) -> Result<(), EvaluatorError> {
	store.get(op.registrar)?.as_account().ok_or(EvaluatorError::WrongObjectType(op.registrar))?;
	Ok(())
}

pub fn do_apply_create(store: &mut Store, op: &AccountCreateOp) -> Result<ObjectId, EvaluatorError> {
	let statistics = store.create(Space::Implementation, ids::implementation::ACCOUNT_STATISTICS, |id| {
		Object::AccountStatistics(AccountStatistics { id, owner: id, total_ops: 0, most_recent_op: None })
	})?;
	let account = store.create(Space::Protocol, ids::protocol::ACCOUNT, |id| {
		Object::Account(Account {
			id,
			name: op.name.clone(),
			owner: op.owner.clone(),
			active: op.active.clone(),
			options: op.options.clone(),
			registrar: op.registrar,
			lifetime_member: false,
			statistics,
		})
	})?;
	store.modify(statistics, |o| o.as_account_statistics_mut().unwrap().owner = account)?;
	Ok(account)
}

pub fn do_evaluate_update(store: &Store, op: &AccountUpdateOp) -> Result<(), EvaluatorError> {
	store.get(op.account)?.as_account().ok_or(EvaluatorError::WrongObjectType(op.account))?;
	Ok(())
}

pub fn do_apply_update(store: &mut Store, op: &AccountUpdateOp) -> Result<(), EvaluatorError> {
	store.modify(op.account, |o| {
		let account = o.as_account_mut().unwrap();
		if let Some(owner) = &op.owner {
			account.owner = owner.clone();
		}
		if let Some(active) = &op.active {
			account.active = active.clone();
		}
		if let Some(options) = &op.options {
			account.options = options.clone();
		}
	})?;
	Ok(())
}
