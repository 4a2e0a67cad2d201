mod common;

use authority::AuthorityError;
use chain::{Chain, ChainError, ChainParameters, FeeSchedule};
use chain_objects::{ids, Asset, AssetDynamicData, AssetFlags, AssetOptions, Object, Operation, Transaction, TransferOp};
use common::{create_account, create_witness, multi_key_authority, public_key_bytes, secret_key, seal_and_push, sign_transaction, single_key_authority, CHAIN_ID};
use market_engine::fund::credit_balance;
use object_store::Store;
use primitives::{Amount, BlockTime, ObjectId, Space};
use secp256k1::Secp256k1;

fn create_core_asset(store: &mut Store, issuer: ObjectId) -> ObjectId {
	let dynamic_data = store
		.create(Space::Implementation, ids::implementation::ASSET_DYNAMIC_DATA, |id| {
			Object::AssetDynamicData(AssetDynamicData { id, asset: ObjectId::new(Space::Protocol, 0, 0), current_supply: Amount::ZERO, accumulated_fees: Amount::ZERO })
		})
		.unwrap();
	let asset = store
		.create(Space::Protocol, ids::protocol::ASSET, |id| {
			Object::Asset(Asset {
				id,
				symbol: "CORE".to_string(),
				precision: 5,
				issuer,
				options: AssetOptions {
					max_supply: Amount(1_000_000_000),
					flags: AssetFlags::NONE,
					issuer_permissions: AssetFlags::NONE,
					market_fee_percent: 0,
					max_market_fee: Amount::ZERO,
					core_exchange_rate: None,
					whitelist_authorities: Vec::new(),
					blacklist_authorities: Vec::new(),
				},
				dynamic_data,
				bitasset_data: None,
			})
		})
		.unwrap();
	store.modify(dynamic_data, |o| o.as_asset_dynamic_data_mut().unwrap().asset = asset).unwrap();
	asset
}

/// `spec.md` §4.B scenario 2, 2-of-3 multisig: an account whose active
/// authority is three equally-weighted keys with `weight_threshold: 2`
/// must see a lone signer rejected, any pair accepted, and a signature
/// from outside the authority's keys rejected even when paired with a
/// member's — the full `push_transaction` path exercised by
/// `authority::resolver`'s own unit test, here through `Chain`.
#[test]
fn two_of_three_multisig_accepts_any_pair_and_rejects_others() {
	let secp = Secp256k1::new();
	let sk1 = secret_key(1);
	let sk2 = secret_key(2);
	let sk3 = secret_key(3);
	let sk_random = secret_key(9);
	let pk1 = public_key_bytes(&secp, &sk1);
	let pk2 = public_key_bytes(&secp, &sk2);
	let pk3 = public_key_bytes(&secp, &sk3);

	let witness_key = secret_key(4);

	let mut store = Store::new();
	let authority = multi_key_authority(2, &[pk1, pk2, pk3]);
	let account = create_account(&mut store, "n", authority);
	let core = create_core_asset(&mut store, account);
	let recipient = create_account(&mut store, "recipient", single_key_authority(public_key_bytes(&secp, &secret_key(8))));
	let witness_account = create_account(&mut store, "witness", single_key_authority(public_key_bytes(&secp, &witness_key)));
	let witness = create_witness(&mut store, witness_account, public_key_bytes(&secp, &witness_key));
	// Large enough that even a double-applied transfer (see DESIGN.md's note
	// on self-sealed blocks) can't underflow it.
	credit_balance(&mut store, account, core, Amount(1_000_000)).unwrap();

	let genesis_time = BlockTime(1_700_000_000);
	let mut chain = Chain::new(store, CHAIN_ID, ChainParameters::default(), FeeSchedule::default(), core, genesis_time);

	let build = |memo: &str| Transaction {
		reference_block_num: 0,
		reference_block_prefix: 0,
		expiration: genesis_time.plus_seconds(3600),
		operations: vec![Operation::Transfer(TransferOp { from: account, to: recipient, asset: core, amount: Amount(10), memo: Some(memo.as_bytes().to_vec()) })],
		signatures: Vec::new(),
	};

	let lone = build("lone signer");
	let sig1 = sign_transaction(&secp, &sk1, &CHAIN_ID, &lone);
	let err = chain.push_transaction(Transaction { signatures: vec![sig1.clone()], ..lone }).unwrap_err();
	assert!(matches!(err, ChainError::Authority(AuthorityError::MissingActiveAuth(id)) if id == account));

	let pair_12 = build("sig1 and sig2");
	let sig1_b = sign_transaction(&secp, &sk1, &CHAIN_ID, &pair_12);
	let sig2 = sign_transaction(&secp, &sk2, &CHAIN_ID, &pair_12);
	chain
		.push_transaction(Transaction { signatures: vec![sig1_b, sig2.clone()], ..pair_12 })
		.expect("sig1 + sig2 meet the weight_threshold of 2");

	let pair_23 = build("sig2 and sig3");
	let sig2_b = sign_transaction(&secp, &sk2, &CHAIN_ID, &pair_23);
	let sig3 = sign_transaction(&secp, &sk3, &CHAIN_ID, &pair_23);
	chain
		.push_transaction(Transaction { signatures: vec![sig2_b, sig3.clone()], ..pair_23 })
		.expect("sig2 + sig3 meet the weight_threshold of 2");

	let pair_3random = build("sig3 and a stranger");
	let sig3_b = sign_transaction(&secp, &sk3, &CHAIN_ID, &pair_3random);
	let sig_random = sign_transaction(&secp, &sk_random, &CHAIN_ID, &pair_3random);
	let err = chain.push_transaction(Transaction { signatures: vec![sig3_b, sig_random], ..pair_3random }).unwrap_err();
	assert!(matches!(err, ChainError::Authority(AuthorityError::IrrelevantSignature)));

	// Seal the two accepted (zero-amount) transfers into a block to exercise
	// the full push_transaction/push_block path.
	seal_and_push(&mut chain, witness, &witness_key, &CHAIN_ID);
	assert_eq!(chain.head_num(), 1);
}
