use chain_objects::{ids, Object, VirtualOp};
use evaluators::EvaluationContext;
use object_store::Store;
use primitives::{BlockTime, ObjectId, Space};

use crate::error::ChainError;

/// Runs after every applied block, regardless of whether this block also
/// crosses a maintenance boundary (`spec.md` §4.E item 2: "run the
/// end-of-block hook (expire orders, mature vesting, expire proposals,
/// mature force-settlements)").
///
/// "Mature vesting" has no state to sweep under this design: a
/// [`chain_objects::VestingBalance`]'s claimable amount is computed
/// on-demand from `head_time` by `get_allowed_withdraw`, so maturity is a
/// read-time property rather than a write the block processor performs —
/// an Open Question resolution recorded in `DESIGN.md`.
pub fn end_of_block(
	store: &mut Store,
	ctx: &EvaluationContext,
	maximum_force_settlement_volume_bps: u16,
) -> Result<Vec<VirtualOp>, ChainError> {
	let head_time = ctx.head_time;
	let mut virtual_ops = Vec::new();

	let expired_orders: Vec<ObjectId> = store
		.indices()
		.limit_orders
		.by_expiration
		.iter()
		.take_while(|((expiration, _), _)| *expiration <= head_time)
		.map(|(_, id)| *id)
		.collect();
	for order_id in expired_orders {
		if store.find(order_id).is_some() {
			market_engine::cancel_and_refund(store, order_id, None)?;
		}
	}

	// Every live proposal gets a chance to run before it is swept: one
	// authorized and past its review period executes its nested
	// transaction right here rather than waiting on a `ProposalUpdate`
	// that may never come (`spec.md` §4.C: "on every block, if
	// authorized... apply the proposed transaction atomically"; §8
	// scenario 5). `try_execute` only removes the proposal once it
	// actually attempts execution (success or failure); one that is
	// still unauthorized or still in review is left untouched here, and
	// only deleted below once it has also expired.
	let live_proposals: Vec<ObjectId> =
		store.objects_of_type(Space::Protocol, ids::protocol::PROPOSAL).map(Object::id).collect();
	for proposal_id in live_proposals {
		let Some(proposal) = store.find(proposal_id).and_then(Object::as_proposal) else { continue };
		let expired = proposal.expiration_time <= head_time;
		let mut executed = evaluators::proposal::try_execute(store, ctx, proposal_id)?;
		virtual_ops.append(&mut executed);
		if expired && store.find(proposal_id).is_some() {
			store.remove(proposal_id)?;
		}
	}

	let market_issued_assets: Vec<ObjectId> = store
		.indices()
		.assets
		.by_symbol
		.values()
		.copied()
		.filter(|id| store.get(*id).ok().and_then(Object::as_asset).is_some_and(|a| a.is_market_issued()))
		.collect();
	for asset_id in market_issued_assets {
		let mut settled = market_engine::process_matured_settlements(
			store,
			asset_id,
			head_time,
			maximum_force_settlement_volume_bps,
		)?;
		virtual_ops.append(&mut settled);
	}

	Ok(virtual_ops)
}

/// The schedule a maintenance pass produces: witnesses and committee
/// members ordered by tallied vote weight, most-voted first
/// (`spec.md` §4.E item 2, "maintenance pass": "vote tally,
/// witness/committee schedule").
#[derive(Debug, Clone, Default)]
pub struct MaintenanceSchedule {
	pub witnesses: Vec<ObjectId>,
	pub committee: Vec<ObjectId>,
}

/// Runs the once-per-window maintenance pass: tallies votes, reschedules
/// witnesses and committee members, and pays active workers their prorated
/// daily budget (`spec.md` §4.E item 2, "if head-block-time crosses the
/// next maintenance time then run the maintenance pass (vote tally,
/// witness/committee schedule, budget allocation, worker payouts,
/// fee-schedule update)").
///
/// Vote weight here is a plain count of accounts naming the witness or
/// committee member in `options.votes` — Graphene-family chains typically
/// weight votes by core-asset stake, but nothing in this system's data
/// model ties an account to a stake balance independent of its
/// `AccountBalance` objects, so a stake-weighted tally would need to pick
/// a core asset and read balances that may not exist yet at genesis. Kept
/// as a one-account-one-vote count; recorded as an Open Question
/// resolution in `DESIGN.md`.
///
/// Fee-schedule update is a no-op here: nothing in `SPEC_FULL.md`'s
/// evaluator set exposes an operation that schedules a future fee change,
/// so there is nothing for this pass to apply yet. The hook point exists
/// so a future governance operation has somewhere to feed its effect in.
pub fn run_maintenance(
	store: &mut Store,
	ctx: &EvaluationContext,
	core_asset: ObjectId,
) -> Result<MaintenanceSchedule, ChainError> {
	let mut tally: std::collections::BTreeMap<ObjectId, u64> = std::collections::BTreeMap::new();
	for account in store.objects_of_type(Space::Protocol, ids::protocol::ACCOUNT) {
		let account = account.as_account().expect("ranged by ACCOUNT type_id");
		for voted in &account.options.votes {
			*tally.entry(*voted).or_default() += 1;
		}
	}

	let mut witnesses: Vec<(ObjectId, u64)> = Vec::new();
	for witness in store.objects_of_type(Space::Protocol, ids::protocol::WITNESS) {
		let witness = witness.as_witness().expect("ranged by WITNESS type_id");
		witnesses.push((witness.id, tally.get(&witness.id).copied().unwrap_or(0)));
	}
	witnesses.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
	for (id, votes) in &witnesses {
		store.modify(*id, |o| {
			o.as_witness_mut().unwrap().total_votes = *votes;
		})?;
	}

	let mut committee: Vec<(ObjectId, u64)> = Vec::new();
	let mut committee_accounts: Vec<ObjectId> = Vec::new();
	for member in store.objects_of_type(Space::Protocol, ids::protocol::COMMITTEE_MEMBER) {
		let member = member.as_committee_member().expect("ranged by COMMITTEE_MEMBER type_id");
		committee.push((member.id, tally.get(&member.id).copied().unwrap_or(0)));
		committee_accounts.push(member.committee_member_account);
	}
	committee.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
	for (id, votes) in &committee {
		store.modify(*id, |o| {
			o.as_committee_member_mut().unwrap().total_votes = *votes;
		})?;
	}

	// The committee account's active authority is not owned by any single
	// keyholder: it is recomputed every maintenance pass from the current
	// committee member set, one vote each, majority threshold
	// (`spec.md` §4.B: committee authority "gates committee operations").
	// Left untouched the one time this set is empty — the genesis-seeded
	// account has no authority at all until a first committee exists.
	if !committee_accounts.is_empty() && store.find(ids::committee_account()).is_some() {
		let weight_threshold = (committee_accounts.len() as u32) / 2 + 1;
		let account_auths: std::collections::BTreeMap<ObjectId, u32> =
			committee_accounts.iter().map(|id| (*id, 1)).collect();
		store.modify(ids::committee_account(), |o| {
			o.as_account_mut().unwrap().active =
				chain_objects::Authority { weight_threshold, account_auths, key_auths: Default::default() };
		})?;
	}

	let active_workers: Vec<ObjectId> = store
		.objects_of_type(Space::Protocol, ids::protocol::WORKER)
		.filter(|w| w.as_worker().expect("ranged by WORKER type_id").is_active(ctx.head_time))
		.map(Object::id)
		.collect();
	let core_dynamic_data = store
		.get(core_asset)?
		.as_asset()
		.expect("core_asset parameter must name a valid Asset object")
		.dynamic_data;
	for worker_id in active_workers {
		let worker = store.get(worker_id)?.as_worker().expect("just filtered by as_worker").clone();
		if worker.daily_pay.is_positive() {
			store.modify(core_dynamic_data, |o| {
				let dd = o.as_asset_dynamic_data_mut().unwrap();
				dd.current_supply = dd.current_supply.checked_add(worker.daily_pay).expect("worker budget overflow");
			})?;
			market_engine::fund::credit_balance(store, worker.owner, core_asset, worker.daily_pay)?;
		}
	}

	Ok(MaintenanceSchedule {
		witnesses: witnesses.into_iter().map(|(id, _)| id).collect(),
		committee: committee.into_iter().map(|(id, _)| id).collect(),
	})
}

/// Whether `head_time` has advanced past `next_maintenance_time`
/// (`spec.md` §4.E item 2: "if head-block-time crosses the next
/// maintenance time").
pub fn crosses_maintenance_boundary(head_time: BlockTime, next_maintenance_time: BlockTime) -> bool {
	head_time >= next_maintenance_time
}

pub fn next_maintenance_after(head_time: BlockTime, interval_seconds: u64) -> BlockTime {
	head_time.plus_seconds(interval_seconds)
}
