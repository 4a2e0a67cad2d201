mod common;

use chain::{Chain, ChainParameters, FeeSchedule};
use chain_objects::{
	ids, Asset, AssetDynamicData, AssetFlags, AssetOptions, Object, Operation, Transaction, TransferOp,
};
use common::{create_account, create_witness, public_key_bytes, secret_key, seal_and_push, sign_transaction, single_key_authority, CHAIN_ID};
use market_engine::fund::credit_balance;
use object_store::Store;
use primitives::{Amount, BlockTime, ObjectId, Space};
use secp256k1::Secp256k1;

fn create_core_asset(store: &mut Store, issuer: ObjectId, initial_supply: Amount, holder: ObjectId) -> ObjectId {
	let dynamic_data = store
		.create(Space::Implementation, ids::implementation::ASSET_DYNAMIC_DATA, |id| {
			Object::AssetDynamicData(AssetDynamicData {
				id,
				asset: ObjectId::new(Space::Protocol, 0, 0),
				current_supply: initial_supply,
				accumulated_fees: Amount::ZERO,
			})
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
	credit_balance(store, holder, asset, initial_supply).unwrap();
	asset
}

/// The simplest seed scenario: one signed transfer between two accounts,
/// sealed into a block by a single witness.
#[test]
fn simple_transfer_moves_balance_between_accounts() {
	let secp = Secp256k1::new();
	let alice_key = secret_key(1);
	let bob_key = secret_key(2);
	let witness_key = secret_key(3);

	let mut store = Store::new();
	let alice = create_account(&mut store, "alice", single_key_authority(public_key_bytes(&secp, &alice_key)));
	let bob = create_account(&mut store, "bob", single_key_authority(public_key_bytes(&secp, &bob_key)));
	let witness_account = create_account(&mut store, "witness", single_key_authority(public_key_bytes(&secp, &witness_key)));
	let witness = create_witness(&mut store, witness_account, public_key_bytes(&secp, &witness_key));
	let core = create_core_asset(&mut store, alice, Amount(1_000), alice);

	let genesis_time = BlockTime(1_700_000_000);
	let mut chain = Chain::new(store, CHAIN_ID, ChainParameters::default(), FeeSchedule::default(), core, genesis_time);
	let mut notifications = chain.subscribe();

	let unsigned = Transaction {
		reference_block_num: 0,
		reference_block_prefix: 0,
		expiration: genesis_time.plus_seconds(3600),
		operations: vec![Operation::Transfer(TransferOp { from: alice, to: bob, asset: core, amount: Amount(100), memo: None })],
		signatures: Vec::new(),
	};
	let signature = sign_transaction(&secp, &alice_key, &CHAIN_ID, &unsigned);
	let signed = Transaction { signatures: vec![signature], ..unsigned };

	chain.push_transaction(signed).expect("alice's own signature satisfies the transfer's active authority");
	seal_and_push(&mut chain, witness, &witness_key, &CHAIN_ID);
	common::drain(&mut notifications);

	assert_eq!(chain.head_num(), 1);
	let balance_of = |account: ObjectId| -> i64 {
		chain
			.store()
			.indices()
			.balances
			.by_owner_asset
			.get(&(account, core))
			.and_then(|id| chain.store().find(*id))
			.and_then(Object::as_account_balance)
			.map(|b| b.amount.0)
			.unwrap_or(0)
	};
	assert_eq!(balance_of(alice), 900);
	assert_eq!(balance_of(bob), 100);
}
