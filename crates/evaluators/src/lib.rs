//! `validate`/`do_evaluate`/`do_apply` evaluators for every [`Operation`]
//! variant (`spec.md` §4.C, *Operation Evaluators*). Each module groups the
//! evaluators for one family of operations; [`apply_operation`] is the
//! single entry point the `chain` crate's block processor calls for every
//! operation in a transaction.
//!
//! Evaluators never read chain-wide parameters directly — they borrow an
//! [`EvaluationContext`] built fresh by the caller from its own state, so
//! this crate has no dependency on `chain` (which depends on this crate).

pub mod account;
pub mod asset;
pub mod context;
pub mod error;
pub mod market;
pub mod proposal;
pub mod transfer;
pub mod vesting;
pub mod withdraw_permission;
pub mod witness;

pub use context::EvaluationContext;
pub use error::EvaluatorError;

use chain_objects::{Operation, VirtualOp};
use object_store::Store;
use primitives::{Amount, ObjectId};

/// The result of applying a single operation: most operations return
/// nothing beyond their virtual ops, some return the id of a newly created
/// object, and a handful return an amount (`spec.md` §4.C: "typically an
/// id or an asset amount").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
	None,
	ObjectId(ObjectId),
	Amount(Amount),
}

/// Runs `validate`, `do_evaluate` and `do_apply` for `op` against `store`,
/// in that order, short-circuiting on the first error (`spec.md` §4.C:
/// the three-phase evaluator pattern). Callers that need to wrap several
/// operations atomically (proposal execution, transaction application)
/// should run this inside a `Store` undo session and call `store.undo` on
/// the first failure.
pub fn apply_operation(
	store: &mut Store,
	ctx: &EvaluationContext,
	op: &Operation,
) -> Result<(Vec<VirtualOp>, OperationResult), EvaluatorError> {
	match op {
		Operation::Transfer(inner) => {
			transfer::validate(inner)?;
			transfer::do_evaluate(store, inner)?;
			transfer::do_apply(store, ctx, inner)?;
			Ok((Vec::new(), OperationResult::None))
		}
		Operation::AccountCreate(inner) => {
			account::validate_create(ctx, inner)?;
			account::do_evaluate_create(store, inner)?;
			let id = account::do_apply_create(store, inner)?;
			Ok((Vec::new(), OperationResult::ObjectId(id)))
		}
		Operation::AccountUpdate(inner) => {
			account::validate_update(ctx, inner)?;
			account::do_evaluate_update(store, inner)?;
			account::do_apply_update(store, inner)?;
			Ok((Vec::new(), OperationResult::None))
		}
		Operation::AssetCreate(inner) => {
			asset::validate_create(inner)?;
			asset::do_evaluate_create(store, inner)?;
			let id = asset::do_apply_create(store, inner)?;
			Ok((Vec::new(), OperationResult::ObjectId(id)))
		}
		Operation::AssetUpdate(inner) => {
			asset::validate_update(inner)?;
			asset::do_evaluate_update(store, inner)?;
			asset::do_apply_update(store, inner)?;
			Ok((Vec::new(), OperationResult::None))
		}
		Operation::AssetIssue(inner) => {
			asset::do_evaluate_issue(store, inner)?;
			asset::do_apply_issue(store, inner)?;
			Ok((Vec::new(), OperationResult::None))
		}
		Operation::AssetReserve(inner) => {
			asset::do_evaluate_reserve(store, inner)?;
			asset::do_apply_reserve(store, inner)?;
			Ok((Vec::new(), OperationResult::None))
		}
		Operation::LimitOrderCreate(inner) => {
			market::validate_limit_order_create(inner)?;
			market::do_evaluate_limit_order_create(store, inner)?;
			let (id, ops) = market::do_apply_limit_order_create(store, inner)?;
			Ok((ops, OperationResult::ObjectId(id)))
		}
		Operation::LimitOrderCancel(inner) => {
			market::do_evaluate_limit_order_cancel(store, inner)?;
			market::do_apply_limit_order_cancel(store, inner)?;
			Ok((Vec::new(), OperationResult::None))
		}
		Operation::CallOrderUpdate(inner) => {
			market::do_evaluate_call_order_update(store, inner)?;
			let (id, ops) = market::do_apply_call_order_update(store, inner)?;
			Ok((ops, OperationResult::ObjectId(id)))
		}
		Operation::AssetForceSettle(inner) => {
			market::do_evaluate_force_settle(store, inner)?;
			let id = market::do_apply_force_settle(store, ctx, inner)?;
			Ok((Vec::new(), OperationResult::ObjectId(id)))
		}
		Operation::AssetGlobalSettle(inner) => {
			asset::do_evaluate_global_settle(store, inner)?;
			let ops = asset::do_apply_global_settle(store, inner)?;
			Ok((ops, OperationResult::None))
		}
		Operation::AssetRevive(inner) => {
			asset::do_evaluate_revive(store, inner)?;
			let ops = asset::do_apply_revive(store, inner)?;
			Ok((ops, OperationResult::None))
		}
		Operation::BidCollateral(inner) => {
			market::do_evaluate_bid_collateral(store, inner)?;
			let id = market::do_apply_bid_collateral(store, inner)?;
			Ok((Vec::new(), OperationResult::ObjectId(id)))
		}
		Operation::AssetPublishFeed(inner) => {
			market::do_evaluate_publish_feed(store, inner)?;
			market::do_apply_publish_feed(store, ctx, inner)?;
			Ok((Vec::new(), OperationResult::None))
		}
		Operation::ProposalCreate(inner) => {
			proposal::validate_create(inner)?;
			proposal::do_evaluate_create(ctx, inner)?;
			let id = proposal::do_apply_create(store, ctx, inner)?;
			Ok((Vec::new(), OperationResult::ObjectId(id)))
		}
		Operation::ProposalUpdate(inner) => {
			proposal::do_evaluate_update(store, ctx, inner)?;
			let ops = proposal::do_apply_update(store, ctx, inner)?;
			Ok((ops, OperationResult::None))
		}
		Operation::ProposalDelete(inner) => {
			proposal::do_evaluate_delete(store, inner)?;
			proposal::do_apply_delete(store, inner)?;
			Ok((Vec::new(), OperationResult::None))
		}
		Operation::WitnessCreate(inner) => {
			witness::do_evaluate_witness_create(store, inner)?;
			let id = witness::do_apply_witness_create(store, inner)?;
			Ok((Vec::new(), OperationResult::ObjectId(id)))
		}
		Operation::WitnessUpdate(inner) => {
			witness::do_evaluate_witness_update(store, ctx, inner)?;
			witness::do_apply_witness_update(store, inner)?;
			Ok((Vec::new(), OperationResult::None))
		}
		Operation::CommitteeMemberCreate(inner) => {
			witness::do_evaluate_committee_member_create(store, inner)?;
			let id = witness::do_apply_committee_member_create(store, inner)?;
			Ok((Vec::new(), OperationResult::ObjectId(id)))
		}
		Operation::CommitteeMemberUpdate(inner) => {
			witness::do_evaluate_committee_member_update(store, ctx, inner)?;
			witness::do_apply_committee_member_update(store, inner)?;
			Ok((Vec::new(), OperationResult::None))
		}
		Operation::WorkerCreate(inner) => {
			witness::do_evaluate_worker_create(store, inner)?;
			let id = witness::do_apply_worker_create(store, inner)?;
			Ok((Vec::new(), OperationResult::ObjectId(id)))
		}
		Operation::VestingBalanceCreate(inner) => {
			vesting::validate_create(inner)?;
			vesting::do_evaluate_create(store, inner)?;
			let id = vesting::do_apply_create(store, ctx, inner)?;
			Ok((Vec::new(), OperationResult::ObjectId(id)))
		}
		Operation::VestingBalanceWithdraw(inner) => {
			vesting::do_evaluate_withdraw(store, ctx, inner)?;
			vesting::do_apply_withdraw(store, ctx, inner)?;
			Ok((Vec::new(), OperationResult::Amount(inner.amount)))
		}
		Operation::BalanceClaim(inner) => {
			vesting::do_evaluate_balance_claim(store, ctx, inner)?;
			vesting::do_apply_balance_claim(store, ctx, inner)?;
			Ok((Vec::new(), OperationResult::Amount(inner.total_claimed)))
		}
		Operation::WithdrawPermissionCreate(inner) => {
			withdraw_permission::validate_create(inner)?;
			withdraw_permission::do_evaluate_create(store, inner)?;
			let id = withdraw_permission::do_apply_create(store, inner)?;
			Ok((Vec::new(), OperationResult::ObjectId(id)))
		}
		Operation::WithdrawPermissionUpdate(inner) => {
			withdraw_permission::do_evaluate_update(store, inner)?;
			withdraw_permission::do_apply_update(store, inner)?;
			Ok((Vec::new(), OperationResult::None))
		}
		Operation::WithdrawPermissionClaim(inner) => {
			withdraw_permission::do_evaluate_claim(store, ctx, inner)?;
			withdraw_permission::do_apply_claim(store, ctx, inner)?;
			Ok((Vec::new(), OperationResult::Amount(inner.amount_to_withdraw)))
		}
		Operation::WithdrawPermissionDelete(inner) => {
			withdraw_permission::do_evaluate_delete(store, inner)?;
			withdraw_permission::do_apply_delete(store, inner)?;
			Ok((Vec::new(), OperationResult::None))
		}
	}
}
