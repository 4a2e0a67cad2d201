use std::collections::BTreeSet;

use chain_objects::{
	ids, CompactSignature, Object, Operation, Proposal, ProposalCreateOp, ProposalDeleteOp,
	ProposalUpdateOp, Transaction, VirtualOp,
};
use object_store::Store;
use primitives::{ObjectId, Space};

use crate::context::EvaluationContext;
use crate::error::EvaluatorError;
use tracing::{info, warn};

/// `spec.md` §4.C, Proposal create: a nested operation touching
/// `WitnessUpdate`/`CommitteeMemberUpdate` names the committee account as
/// its required active authority (`Operation::required_authorities`), which
/// nobody can satisfy with a direct signature, so the chain additionally
/// enforces a minimum review period before such a proposal can execute.
fn needs_review_period(ops: &[Operation]) -> bool {
	ops.iter().any(|op| {
		matches!(op, Operation::WitnessUpdate(_) | Operation::CommitteeMemberUpdate(_))
	})
}

pub fn validate_create(op: &ProposalCreateOp) -> Result<(), EvaluatorError> {
	if op.proposed_ops.is_empty() {
		return Err(EvaluatorError::WrongObjectType(op.fee_paying_account));
	}
	Ok(())
}

pub fn do_evaluate_create(ctx: &EvaluationContext, op: &ProposalCreateOp) -> Result<(), EvaluatorError> {
	if needs_review_period(&op.proposed_ops) {
		let declared = op.review_period_seconds.unwrap_or(0);
		if declared < ctx.min_review_period_seconds {
			return Err(EvaluatorError::ReviewPeriodTooShort(op.fee_paying_account));
		}
	}
	Ok(())
}

pub fn do_apply_create(store: &mut Store, ctx: &EvaluationContext, op: &ProposalCreateOp) -> Result<ObjectId, EvaluatorError> {
	let proposed_transaction = Transaction {
		reference_block_num: 0,
		reference_block_prefix: 0,
		expiration: op.expiration_time,
		operations: op.proposed_ops.clone(),
		signatures: Vec::<CompactSignature>::new(),
	};
	let required = proposed_transaction.required_authorities();
	let review_period_time = op.review_period_seconds.map(|secs| ctx.head_time.plus_seconds(secs));

	let id = store.create(Space::Protocol, ids::protocol::PROPOSAL, |id| {
		Object::Proposal(Proposal {
			id,
			proposed_transaction: proposed_transaction.clone(),
			required_active_approvals: required.active.clone(),
			required_owner_approvals: required.owner.clone(),
			available_active_approvals: BTreeSet::new(),
			available_owner_approvals: BTreeSet::new(),
			expiration_time: op.expiration_time,
			review_period_time,
		})
	})?;
	Ok(id)
}

/// `spec.md` §8 scenario 5: "before review-period-time, updating approvals
/// is allowed; after, updates are rejected with *proposal-in-review*." A
/// proposal created without a review period (`review_period_time: None`)
/// has no such deadline and may always be updated.
fn reject_if_past_review_period(proposal: &Proposal, ctx: &EvaluationContext) -> Result<(), EvaluatorError> {
	if let Some(review_time) = proposal.review_period_time {
		if ctx.head_time >= review_time {
			return Err(EvaluatorError::ProposalInReview(proposal.id));
		}
	}
	Ok(())
}

pub fn do_evaluate_update(store: &Store, ctx: &EvaluationContext, op: &ProposalUpdateOp) -> Result<(), EvaluatorError> {
	let proposal = store.get(op.proposal)?.as_proposal().ok_or(EvaluatorError::WrongObjectType(op.proposal))?;
	reject_if_past_review_period(proposal, ctx)
}

/// Applies the requested approval additions/removals, then immediately
/// attempts execution (`spec.md` §4.C, Proposal update: "after each
/// modification... if authorized, apply the proposed transaction").
/// Only accounts that appear in the proposed operation's required
/// authority set may approve (`spec.md` §4.C) — an id named in
/// `*_approvals_to_add` that isn't in `required_active_approvals`/
/// `required_owner_approvals` is rejected before anything is recorded.
pub fn do_apply_update(store: &mut Store, ctx: &EvaluationContext, op: &ProposalUpdateOp) -> Result<Vec<VirtualOp>, EvaluatorError> {
	let proposal = store.get(op.proposal)?.as_proposal().ok_or(EvaluatorError::WrongObjectType(op.proposal))?.clone();
	reject_if_past_review_period(&proposal, ctx)?;
	for id in op.active_approvals_to_add.iter().chain(&op.owner_approvals_to_add) {
		if !proposal.required_active_approvals.contains(id) && !proposal.required_owner_approvals.contains(id) {
			return Err(EvaluatorError::NotARequiredApprover(*id));
		}
	}

	store.modify(op.proposal, |o| {
		let p = o.as_proposal_mut().unwrap();
		for id in &op.active_approvals_to_add { p.available_active_approvals.insert(*id); }
		for id in &op.active_approvals_to_remove { p.available_active_approvals.remove(id); }
		for id in &op.owner_approvals_to_add { p.available_owner_approvals.insert(*id); }
		for id in &op.owner_approvals_to_remove { p.available_owner_approvals.remove(id); }
	})?;
	try_execute(store, ctx, op.proposal)
}

pub fn do_evaluate_delete(store: &Store, op: &ProposalDeleteOp) -> Result<(), EvaluatorError> {
	store.get(op.proposal)?.as_proposal().ok_or(EvaluatorError::WrongObjectType(op.proposal))?;
	Ok(())
}

pub fn do_apply_delete(store: &mut Store, op: &ProposalDeleteOp) -> Result<(), EvaluatorError> {
	store.remove(op.proposal)?;
	Ok(())
}

/// Attempts to execute `proposal_id`'s nested transaction if it is
/// authorized and past its review period. On any nested evaluator failure
/// the whole attempt is rolled back via the store's undo session, but the
/// proposal is removed regardless — a failed proposal does not linger for
/// a retry (`spec.md` §4.C, Proposal update: "on any evaluator failure
/// during application, the proposal is removed but no state changes from
/// the proposed ops persist"). Reached both from `ProposalUpdate` (an
/// approval may immediately satisfy authorization) and from every block's
/// `end_of_block` sweep (`chain::maintenance`), so a proposal whose author
/// never submits another update still executes the moment it clears its
/// review period.
pub fn try_execute(store: &mut Store, ctx: &EvaluationContext, proposal_id: ObjectId) -> Result<Vec<VirtualOp>, EvaluatorError> {
	let proposal = match store.find(proposal_id).and_then(Object::as_proposal) {
		Some(p) => p.clone(),
		None => return Ok(Vec::new()),
	};
	if proposal.in_review_period(ctx.head_time) || !proposal.is_authorized_to_execute() {
		return Ok(Vec::new());
	}

	let nested_ctx = EvaluationContext { evaluating_proposed_transaction: true, ..*ctx };
	let session = store.start_undo_session();
	let mut ops = Vec::new();
	let mut failed = false;
	for nested in &proposal.proposed_transaction.operations {
		match crate::apply_operation(store, &nested_ctx, nested) {
			Ok((mut virtual_ops, _)) => ops.append(&mut virtual_ops),
			Err(_) => { failed = true; break; }
		}
	}
	if failed {
		store.undo(session)?;
		ops.clear();
		warn!(proposal = ?proposal_id, "proposed transaction failed during execution, nested changes undone");
	} else {
		store.commit(session)?;
		info!(proposal = ?proposal_id, "proposal executed");
	}
	store.remove(proposal_id)?;
	Ok(ops)
}

#[cfg(test)]
mod tests {
	use super::*;
	use primitives::BlockTime;

	fn ctx() -> EvaluationContext {
		EvaluationContext { head_time: BlockTime(1000), max_authority_membership: 10, min_review_period_seconds: 86400, evaluating_proposed_transaction: false }
	}

	fn transfer_op(from: ObjectId, to: ObjectId) -> Operation {
		Operation::Transfer(chain_objects::TransferOp { from, to, asset: ObjectId::new(Space::Protocol, ids::protocol::ASSET, 0), amount: primitives::Amount(1), memo: None })
	}

	#[test]
	fn create_requires_review_period_for_witness_update() {
		let op = ProposalCreateOp {
			fee_paying_account: ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1),
			expiration_time: BlockTime(2000),
			proposed_ops: vec![Operation::WitnessUpdate(chain_objects::WitnessUpdateOp { witness: ObjectId::new(Space::Protocol, ids::protocol::WITNESS, 0), new_signing_key: None })],
			review_period_seconds: Some(10),
		};
		assert_eq!(do_evaluate_create(&ctx(), &op), Err(EvaluatorError::ReviewPeriodTooShort(op.fee_paying_account)));
	}

	#[test]
	fn create_accepts_ordinary_proposal_without_review_period() {
		let alice = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1);
		let bob = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 2);
		let op = ProposalCreateOp { fee_paying_account: alice, expiration_time: BlockTime(2000), proposed_ops: vec![transfer_op(alice, bob)], review_period_seconds: None };
		assert!(do_evaluate_create(&ctx(), &op).is_ok());
	}

	#[test]
	fn update_after_review_period_elapses_is_rejected() {
		let mut store = Store::new();
		let alice = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1);
		let create_ctx = EvaluationContext { head_time: BlockTime(1000), max_authority_membership: 10, min_review_period_seconds: 10, evaluating_proposed_transaction: false };
		let create_op = ProposalCreateOp {
			fee_paying_account: alice,
			expiration_time: BlockTime(5000),
			proposed_ops: vec![Operation::WitnessUpdate(chain_objects::WitnessUpdateOp { witness: ObjectId::new(Space::Protocol, ids::protocol::WITNESS, 0), new_signing_key: None })],
			review_period_seconds: Some(10),
		};
		let proposal_id = do_apply_create(&mut store, &create_ctx, &create_op).unwrap();

		// review_period_time = 1000 + 10 = 1010; head_time has now reached it.
		let late_ctx = EvaluationContext { head_time: BlockTime(1010), ..create_ctx };
		let update_op = ProposalUpdateOp {
			fee_paying_account: alice,
			proposal: proposal_id,
			active_approvals_to_add: vec![ids::committee_account()],
			active_approvals_to_remove: vec![],
			owner_approvals_to_add: vec![],
			owner_approvals_to_remove: vec![],
		};
		assert_eq!(do_evaluate_update(&store, &late_ctx, &update_op), Err(EvaluatorError::ProposalInReview(proposal_id)));
		assert_eq!(do_apply_update(&mut store, &late_ctx, &update_op), Err(EvaluatorError::ProposalInReview(proposal_id)));
	}

	#[test]
	fn update_rejects_approval_from_non_required_account() {
		let mut store = Store::new();
		let alice = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1);
		let bob = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 2);
		let outsider = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 3);
		let create_op = ProposalCreateOp { fee_paying_account: alice, expiration_time: BlockTime(2000), proposed_ops: vec![transfer_op(alice, bob)], review_period_seconds: None };
		let proposal_id = do_apply_create(&mut store, &ctx(), &create_op).unwrap();

		let update_op = ProposalUpdateOp {
			fee_paying_account: outsider,
			proposal: proposal_id,
			active_approvals_to_add: vec![outsider],
			active_approvals_to_remove: vec![],
			owner_approvals_to_add: vec![],
			owner_approvals_to_remove: vec![],
		};
		assert_eq!(do_apply_update(&mut store, &ctx(), &update_op), Err(EvaluatorError::NotARequiredApprover(outsider)));
	}

	#[test]
	fn update_executes_once_authorized() {
		let mut store = Store::new();
		let alice = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 1);
		let bob = ObjectId::new(Space::Protocol, ids::protocol::ACCOUNT, 2);
		let asset_create = chain_objects::AssetCreateOp {
			issuer: alice,
			symbol: "USD".into(),
			precision: 4,
			options: chain_objects::AssetOptions {
				max_supply: primitives::Amount(1_000_000),
				flags: chain_objects::AssetFlags::NONE,
				issuer_permissions: chain_objects::AssetFlags::NONE,
				market_fee_percent: 0,
				max_market_fee: primitives::Amount::ZERO,
				core_exchange_rate: None,
				whitelist_authorities: vec![],
				blacklist_authorities: vec![],
			},
			bitasset: None,
		};
		let asset = crate::asset::do_apply_create(&mut store, &asset_create).unwrap();
		market_engine::fund::credit_balance(&mut store, alice, asset, primitives::Amount(10)).unwrap();

		let transfer = Operation::Transfer(chain_objects::TransferOp { from: alice, to: bob, asset, amount: primitives::Amount(1), memo: None });
		let create_op = ProposalCreateOp { fee_paying_account: alice, expiration_time: BlockTime(2000), proposed_ops: vec![transfer], review_period_seconds: None };
		let proposal_id = do_apply_create(&mut store, &ctx(), &create_op).unwrap();

		let update_op = ProposalUpdateOp {
			fee_paying_account: alice,
			proposal: proposal_id,
			active_approvals_to_add: vec![alice],
			active_approvals_to_remove: vec![],
			owner_approvals_to_add: vec![],
			owner_approvals_to_remove: vec![],
		};
		do_apply_update(&mut store, &ctx(), &update_op).unwrap();

		assert!(store.find(proposal_id).is_none());
		let bob_balance = market_engine::fund::find_balance(&store, bob, asset).map(|id| store.get(id).unwrap().as_account_balance().unwrap().amount);
		assert_eq!(bob_balance, Some(primitives::Amount(1)));
	}
}
