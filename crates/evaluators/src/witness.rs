use chain_objects::{
	ids, CommitteeMember, CommitteeMemberCreateOp, CommitteeMemberUpdateOp, Object, Witness,
	WitnessCreateOp, WitnessUpdateOp, Worker, WorkerCreateOp,
};
use object_store::Store;
use primitives::{ObjectId, Space};

use crate::context::EvaluationContext;
use crate::error::EvaluatorError;

pub fn do_evaluate_witness_create(store: &Store, op: &WitnessCreateOp) -> Result<(), EvaluatorError> {
	store.get(op.witness_account)?.as_account().ok_or(EvaluatorError::WrongObjectType(op.witness_account))?;
	Ok(())
}

pub fn do_apply_witness_create(store: &mut Store, op: &WitnessCreateOp) -> Result<ObjectId, EvaluatorError> {
	let id = store.create(Space::Protocol, ids::protocol::WITNESS, |id| {
		Object::Witness(Witness { id, witness_account: op.witness_account, signing_key: op.signing_key.clone(), total_votes: 0, last_aslot: 0 })
	})?;
	Ok(id)
}

/// `spec.md` §4.C, Witness update: requires the committee account's active
/// authority (`Operation::required_authorities`) rather than any
/// particular user account's, and — since nobody signs for the committee
/// account directly — is only ever reachable through the proposal
/// mechanism; submitted as an ordinary top-level transaction it is
/// rejected outright regardless of whose signatures accompany it
/// (`spec.md` §4.B: "a transaction whose signer satisfies only committee
/// authority is invalid outside the proposal mechanism").
pub fn do_evaluate_witness_update(store: &Store, ctx: &EvaluationContext, op: &WitnessUpdateOp) -> Result<(), EvaluatorError> {
	if !ctx.evaluating_proposed_transaction {
		return Err(EvaluatorError::CommitteeAuthorityRequiresProposal);
	}
	store.get(op.witness)?.as_witness().ok_or(EvaluatorError::WrongObjectType(op.witness))?;
	Ok(())
}

pub fn do_apply_witness_update(store: &mut Store, op: &WitnessUpdateOp) -> Result<(), EvaluatorError> {
	if let Some(new_key) = &op.new_signing_key {
		store.modify(op.witness, |o| o.as_witness_mut().unwrap().signing_key = new_key.clone())?;
	}
	Ok(())
}

pub fn do_evaluate_committee_member_create(store: &Store, op: &CommitteeMemberCreateOp) -> Result<(), EvaluatorError> {
	store.get(op.committee_member_account)?.as_account().ok_or(EvaluatorError::WrongObjectType(op.committee_member_account))?;
	Ok(())
}

pub fn do_apply_committee_member_create(store: &mut Store, op: &CommitteeMemberCreateOp) -> Result<ObjectId, EvaluatorError> {
	let id = store.create(Space::Protocol, ids::protocol::COMMITTEE_MEMBER, |id| {
		Object::CommitteeMember(CommitteeMember { id, committee_member_account: op.committee_member_account, url: op.url.clone(), total_votes: 0 })
	})?;
	Ok(id)
}

/// Same committee-account gate as [`do_evaluate_witness_update`]: only
/// reachable through the proposal mechanism.
pub fn do_evaluate_committee_member_update(store: &Store, ctx: &EvaluationContext, op: &CommitteeMemberUpdateOp) -> Result<(), EvaluatorError> {
	if !ctx.evaluating_proposed_transaction {
		return Err(EvaluatorError::CommitteeAuthorityRequiresProposal);
	}
	store.get(op.committee_member)?.as_committee_member().ok_or(EvaluatorError::WrongObjectType(op.committee_member))?;
	Ok(())
}

pub fn do_apply_committee_member_update(store: &mut Store, op: &CommitteeMemberUpdateOp) -> Result<(), EvaluatorError> {
	if let Some(new_url) = &op.new_url {
		store.modify(op.committee_member, |o| o.as_committee_member_mut().unwrap().url = new_url.clone())?;
	}
	Ok(())
}

pub fn do_evaluate_worker_create(store: &Store, op: &WorkerCreateOp) -> Result<(), EvaluatorError> {
	store.get(op.owner)?.as_account().ok_or(EvaluatorError::WrongObjectType(op.owner))?;
	if op.work_end <= op.work_begin {
		return Err(EvaluatorError::WrongObjectType(op.owner));
	}
	op.daily_pay.require_non_negative()?;
	Ok(())
}

pub fn do_apply_worker_create(store: &mut Store, op: &WorkerCreateOp) -> Result<ObjectId, EvaluatorError> {
	let id = store.create(Space::Protocol, ids::protocol::WORKER, |id| {
		Object::Worker(Worker {
			id,
			owner: op.owner,
			name: op.name.clone(),
			work_begin: op.work_begin,
			work_end: op.work_end,
			daily_pay: op.daily_pay,
			total_votes_for: 0,
		})
	})?;
	Ok(id)
}
