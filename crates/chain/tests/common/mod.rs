//! Shared fixtures for the scenario tests under `chain/tests/`: every test
//! builds its own small store by hand (the same statistics-before-account,
//! dynamic-data-before-asset construction `node::genesis` and the
//! `market-engine`/`authority` unit tests use) rather than going through
//! `node`'s JSON genesis loader, since these tests want full control over
//! account keys and chain parameters.

use chain::{BlockHeader, Chain, ChangeNotification};
use chain_objects::{
	ids, Account, AccountOptions, AccountStatistics, Authority, CompactSignature, KeyOrAddress,
	Object, Transaction, Witness,
};
use object_store::Store;
use primitives::{ObjectId, Space};
use secp256k1::{All, PublicKey, Secp256k1, SecretKey};

#[allow(dead_code)]
pub const CHAIN_ID: [u8; 32] = [7u8; 32];

#[allow(dead_code)]
pub fn secret_key(seed: u8) -> SecretKey {
	SecretKey::from_slice(&[seed; 32]).expect("32-byte seed is a valid secret key")
}

#[allow(dead_code)]
pub fn public_key_bytes(secp: &Secp256k1<All>, sk: &SecretKey) -> Vec<u8> {
	PublicKey::from_secret_key(secp, sk).serialize().to_vec()
}

#[allow(dead_code)]
pub fn single_key_authority(key: Vec<u8>) -> Authority {
	let mut authority = Authority { weight_threshold: 1, ..Authority::default() };
	authority.key_auths.insert(KeyOrAddress::Key(key), 1);
	authority
}

/// An m-of-n authority over `keys`, each weighted 1 (`spec.md` §4.B
/// scenario 2, 2-of-3 multisig).
#[allow(dead_code)]
pub fn multi_key_authority(weight_threshold: u32, keys: &[Vec<u8>]) -> Authority {
	let mut authority = Authority { weight_threshold, ..Authority::default() };
	for key in keys {
		authority.key_auths.insert(KeyOrAddress::Key(key.clone()), 1);
	}
	authority
}

/// Mirrors `evaluators::account::do_apply_create`'s statistics-then-account
/// construction, since there is no signed transaction to run through the
/// evaluator pipeline before any account exists.
#[allow(dead_code)]
pub fn create_account(store: &mut Store, name: &str, authority: Authority) -> ObjectId {
	let statistics = store
		.create(Space::Implementation, ids::implementation::ACCOUNT_STATISTICS, |id| {
			Object::AccountStatistics(AccountStatistics { id, owner: id, total_ops: 0, most_recent_op: None })
		})
		.unwrap();
	let account = store
		.create(Space::Protocol, ids::protocol::ACCOUNT, |id| {
			Object::Account(Account {
				id,
				name: name.to_string(),
				owner: authority.clone(),
				active: authority,
				options: AccountOptions::default(),
				registrar: id,
				lifetime_member: true,
				statistics,
			})
		})
		.unwrap();
	store.modify(statistics, |o| o.as_account_statistics_mut().unwrap().owner = account).unwrap();
	account
}

#[allow(dead_code)]
pub fn create_witness(store: &mut Store, witness_account: ObjectId, signing_key: Vec<u8>) -> ObjectId {
	store
		.create(Space::Protocol, ids::protocol::WITNESS, |id| {
			Object::Witness(Witness { id, witness_account, signing_key, total_votes: 0, last_aslot: 0 })
		})
		.unwrap()
}

#[allow(dead_code)]
pub fn sign_transaction(secp: &Secp256k1<All>, key: &SecretKey, chain_id: &[u8; 32], tx: &Transaction) -> CompactSignature {
	let digest = authority::signing_digest(chain_id, tx);
	let message = secp256k1::Message::from_digest_slice(&digest).unwrap();
	let (recovery_id, compact) = secp.sign_ecdsa_recoverable(&message, key).serialize_compact();
	let mut out = [0u8; 65];
	out[0] = 27 + recovery_id.to_i32() as u8;
	out[1..].copy_from_slice(&compact);
	CompactSignature(out)
}

#[allow(dead_code)]
pub fn sign_header(key: &SecretKey, chain_id: &[u8; 32], header: &BlockHeader) -> CompactSignature {
	let digest = chain::witness_signing_digest(chain_id, header);
	let message = secp256k1::Message::from_digest_slice(&digest).unwrap();
	let secp = Secp256k1::signing_only();
	let (recovery_id, compact) = secp.sign_ecdsa_recoverable(&message, key).serialize_compact();
	let mut out = [0u8; 65];
	out[0] = 27 + recovery_id.to_i32() as u8;
	out[1..].copy_from_slice(&compact);
	CompactSignature(out)
}

/// Assembles, signs and pushes whatever is currently pending (possibly
/// nothing) as the next block, returning its id.
#[allow(dead_code)]
pub fn seal_and_push(chain: &mut Chain, witness: ObjectId, witness_key: &SecretKey, chain_id: &[u8; 32]) -> [u8; 32] {
	let (header, transactions) = chain.assemble_block(witness);
	let signature = sign_header(witness_key, chain_id, &header);
	let block = Chain::seal_block(header, transactions, signature);
	let id = block.id();
	chain.push_block(block).expect("well-formed self-sealed block must apply");
	id
}

#[allow(dead_code)]
pub fn drain(receiver: &mut tokio::sync::broadcast::Receiver<ChangeNotification>) -> Vec<ChangeNotification> {
	let mut out = Vec::new();
	loop {
		match receiver.try_recv() {
			Ok(n) => out.push(n),
			Err(_) => break,
		}
	}
	out
}
