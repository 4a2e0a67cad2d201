mod common;

use chain::{Chain, ChainParameters, FeeSchedule};
use chain_objects::{ids, Object, Operation, ProposalCreateOp, ProposalUpdateOp, Transaction, WitnessUpdateOp};
use common::{create_account, create_witness, public_key_bytes, secret_key, seal_and_push, sign_transaction, single_key_authority, CHAIN_ID};
use object_store::Store;
use primitives::{BlockTime, ObjectId, Space};
use secp256k1::Secp256k1;

/// A proposed `WitnessUpdate` requires the committee account's active
/// authority (`Operation::required_authorities`), which nobody can satisfy
/// directly — the proposal only executes once an approval naming the
/// committee account has been recorded *and* its review period has
/// elapsed. Execution itself needs no further `ProposalUpdate`: the
/// end-of-block sweep (`chain::maintenance::end_of_block`) retries every
/// live proposal on every block and applies this one the moment both
/// conditions hold (`spec.md` §4.C, §8 scenario 5).
#[test]
fn witness_update_proposal_executes_once_approved_and_review_period_elapses() {
	let secp = Secp256k1::new();
	let proposer_key = secret_key(1);
	let witness_key = secret_key(2);
	let new_witness_key = secret_key(3);
	let sealer_key = secret_key(4);

	let mut store = Store::new();
	let proposer = create_account(&mut store, "proposer", single_key_authority(public_key_bytes(&secp, &proposer_key)));
	let witness_account = create_account(&mut store, "watcher", single_key_authority(public_key_bytes(&secp, &witness_key)));
	let witness = create_witness(&mut store, witness_account, public_key_bytes(&secp, &witness_key));
	let sealer_account = create_account(&mut store, "sealer", single_key_authority(public_key_bytes(&secp, &sealer_key)));
    let sealer = create_witness(&mut store, sealer_account, public_key_bytes(&secp, &sealer_key));

	let genesis_time = BlockTime(1_700_000_000);
	let core = store
		.create(Space::Implementation, ids::implementation::ASSET_DYNAMIC_DATA, |id| {
			Object::AssetDynamicData(chain_objects::AssetDynamicData { id, asset: ObjectId::new(Space::Protocol, 0, 0), current_supply: primitives::Amount(0), accumulated_fees: primitives::Amount(0) })
		})
		.and_then(|dynamic_data| {
			store.create(Space::Protocol, ids::protocol::ASSET, |id| {
				Object::Asset(chain_objects::Asset {
					id,
					symbol: "CORE".to_string(),
					precision: 5,
					issuer: proposer,
					options: chain_objects::AssetOptions {
						max_supply: primitives::Amount(1_000_000),
						flags: chain_objects::AssetFlags::NONE,
						issuer_permissions: chain_objects::AssetFlags::NONE,
						market_fee_percent: 0,
						max_market_fee: primitives::Amount::ZERO,
						core_exchange_rate: None,
						whitelist_authorities: Vec::new(),
						blacklist_authorities: Vec::new(),
					},
					dynamic_data,
					bitasset_data: None,
				})
			})
		})
		.unwrap();

	let review_period_seconds = 10;
	let parameters = ChainParameters { min_review_period_seconds: review_period_seconds, ..ChainParameters::default() };
	let mut chain = Chain::new(store, CHAIN_ID, parameters, FeeSchedule::default(), core, genesis_time);

	let new_key_bytes = public_key_bytes(&secp, &new_witness_key);
	let propose = Transaction {
		reference_block_num: 0,
		reference_block_prefix: 0,
		expiration: genesis_time.plus_seconds(86_400),
		operations: vec![Operation::ProposalCreate(ProposalCreateOp {
			fee_paying_account: proposer,
			expiration_time: genesis_time.plus_seconds(86_400),
			proposed_ops: vec![Operation::WitnessUpdate(WitnessUpdateOp { witness, new_signing_key: Some(new_key_bytes.clone()) })],
			review_period_seconds: Some(review_period_seconds),
		})],
		signatures: Vec::new(),
	};
	let propose = sign(&secp, &proposer_key, propose);
	chain.push_transaction(propose).expect("review period meets the chain minimum");
	seal_and_push(&mut chain, sealer, &sealer_key, &CHAIN_ID);

	let proposal_id = chain
		.store()
		.objects_of_type(Space::Protocol, ids::protocol::PROPOSAL)
		.next()
		.expect("proposal create must have landed an object")
		.id();

	// Records the committee account's approval — the only account named in
	// this proposal's `required_active_approvals` — without which
	// `is_authorized_to_execute` can never return true.
	let approve = Transaction {
		reference_block_num: 0,
		reference_block_prefix: 0,
		expiration: genesis_time.plus_seconds(86_400),
		operations: vec![Operation::ProposalUpdate(ProposalUpdateOp {
			fee_paying_account: proposer,
			proposal: proposal_id,
			active_approvals_to_add: vec![ids::committee_account()],
			active_approvals_to_remove: Vec::new(),
			owner_approvals_to_add: Vec::new(),
			owner_approvals_to_remove: Vec::new(),
		})],
		signatures: Vec::new(),
	};
	let approve = sign(&secp, &proposer_key, approve);

	// Still inside the review period: even with the approval recorded,
	// `try_execute` must decline and leave the witness's signing key
	// untouched.
	chain.push_transaction(approve).expect("approving the proposal is itself authorized");
	seal_and_push(&mut chain, sealer, &sealer_key, &CHAIN_ID);
	assert_eq!(
		chain.store().get(witness).unwrap().as_witness().unwrap().signing_key,
		public_key_bytes(&secp, &witness_key)
	);
	assert!(chain.store().find(proposal_id).is_some());

	// Advance head_time past `review_period_time` with empty blocks: no
	// further `ProposalUpdate` is submitted, so only `end_of_block`'s
	// per-block retry can be what executes it.
	for _ in 0..(review_period_seconds + 2) {
		seal_and_push(&mut chain, sealer, &sealer_key, &CHAIN_ID);
	}

	assert_eq!(chain.store().get(witness).unwrap().as_witness().unwrap().signing_key, new_key_bytes);
	assert!(chain.store().find(proposal_id).is_none(), "an executed proposal is removed");
}

/// `spec.md` §8 scenario 5: "before review-period-time, updating approvals
/// is allowed; after, updates are rejected with *proposal-in-review*."
/// This proposal never records an approval, so `try_execute`'s
/// maintenance sweep never fires and the proposal is still sitting there
/// (unauthorized) once its review period elapses — the only thing left to
/// observe is that a late `ProposalUpdate` itself is rejected.
#[test]
fn update_after_review_period_elapses_is_rejected() {
	let secp = Secp256k1::new();
	let proposer_key = secret_key(1);
	let sealer_key = secret_key(4);

	let mut store = Store::new();
	let proposer = create_account(&mut store, "proposer", single_key_authority(public_key_bytes(&secp, &proposer_key)));
	let sealer_account = create_account(&mut store, "sealer", single_key_authority(public_key_bytes(&secp, &sealer_key)));
	let sealer = create_witness(&mut store, sealer_account, public_key_bytes(&secp, &sealer_key));

	let genesis_time = BlockTime(1_700_000_000);
	let review_period_seconds = 5;
	let parameters = ChainParameters::default();
	let mut chain = Chain::new(store, CHAIN_ID, parameters, FeeSchedule::default(), proposer, genesis_time);

	let propose = Transaction {
		reference_block_num: 0,
		reference_block_prefix: 0,
		expiration: genesis_time.plus_seconds(86_400),
		operations: vec![Operation::ProposalCreate(ProposalCreateOp {
			fee_paying_account: proposer,
			expiration_time: genesis_time.plus_seconds(86_400),
			proposed_ops: vec![Operation::Transfer(chain_objects::TransferOp { from: proposer, to: proposer, asset: proposer, amount: primitives::Amount(1), memo: None })],
			review_period_seconds: Some(review_period_seconds),
		})],
		signatures: Vec::new(),
	};
	let propose = sign(&secp, &proposer_key, propose);
	chain.push_transaction(propose).expect("an ordinary proposal may declare any review period");
	seal_and_push(&mut chain, sealer, &sealer_key, &CHAIN_ID);

	let proposal_id = chain
		.store()
		.objects_of_type(Space::Protocol, ids::protocol::PROPOSAL)
		.next()
		.expect("proposal create must have landed an object")
		.id();

	// Advance head_time past review_period_time with empty blocks, leaving
	// the proposal unauthorized (no approval was ever recorded) so it
	// survives every maintenance sweep instead of executing.
	for _ in 0..(review_period_seconds + 2) {
		seal_and_push(&mut chain, sealer, &sealer_key, &CHAIN_ID);
	}
	assert!(chain.store().find(proposal_id).is_some(), "an unauthorized proposal is never swept");

	let late_update = Transaction {
		reference_block_num: 0,
		reference_block_prefix: 0,
		expiration: chain.head_time().plus_seconds(86_400),
		operations: vec![Operation::ProposalUpdate(ProposalUpdateOp {
			fee_paying_account: proposer,
			proposal: proposal_id,
			active_approvals_to_add: vec![proposer],
			active_approvals_to_remove: Vec::new(),
			owner_approvals_to_add: Vec::new(),
			owner_approvals_to_remove: Vec::new(),
		})],
		signatures: Vec::new(),
	};
	let late_update = sign(&secp, &proposer_key, late_update);
	let err = chain.push_transaction(late_update).expect_err("an update past review-period-time must be rejected");
	assert!(matches!(err, chain::ChainError::Evaluator(evaluators::EvaluatorError::ProposalInReview(id)) if id == proposal_id));
}

fn sign(secp: &Secp256k1<secp256k1::All>, key: &secp256k1::SecretKey, tx: Transaction) -> Transaction {
	let signature = sign_transaction(secp, key, &CHAIN_ID, &tx);
	Transaction { signatures: vec![signature], ..tx }
}
