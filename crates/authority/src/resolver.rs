use std::collections::BTreeSet;

use chain_objects::{Authority, KeyOrAddress, Transaction};
use object_store::Store;
use primitives::ObjectId;
use secp256k1::{
	ecdsa::{RecoverableSignature, RecoveryId},
	Message, PublicKey, Secp256k1,
};

use crate::digest::signing_digest;
use crate::error::AuthorityError;
use tracing::warn;

/// Raw, serialized public-key bytes — the currency that flows through
/// resolution. [`chain_objects::KeyOrAddress`] distinguishes keys from
/// legacy addresses in storage; here both compare as opaque byte strings,
/// since resolution only needs byte equality against an authority's
/// `key_auths`.
pub type KeyBytes = Vec<u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthorityKind {
	Active,
	Owner,
}

/// Resolves authorities against a [`Store`] snapshot. Holds no mutable
/// state of its own — every call borrows the store immutably, matching
/// the "readers may borrow immutably only while no writer exists"
/// constraint of `spec.md` §5.
pub struct AuthorityResolver<'a> {
	store: &'a Store,
	chain_id: [u8; 32],
	max_authority_depth: u8,
}

impl<'a> AuthorityResolver<'a> {
	pub fn new(store: &'a Store, chain_id: [u8; 32], max_authority_depth: u8) -> Self {
		Self { store, chain_id, max_authority_depth }
	}

	fn account_authority(&self, account: ObjectId, kind: AuthorityKind) -> Result<&Authority, AuthorityError> {
		let object = self.store.find(account).ok_or(AuthorityError::AccountNotFound(account))?;
		let account = object.as_account().ok_or(AuthorityError::AccountNotFound(account))?;
		Ok(match kind {
			AuthorityKind::Active => &account.active,
			AuthorityKind::Owner => &account.owner,
		})
	}

	/// Sums the weight `provided` contributes to `authority`, recursing
	/// into referenced accounts via their *active* authority (only the
	/// top-level requirement may be an owner requirement — nested
	/// `account_auths` always resolve via active, `spec.md` §4.B item 2).
	fn satisfied_weight(
		&self,
		authority: &Authority,
		provided: &BTreeSet<KeyBytes>,
		depth_remaining: u8,
		on_account: ObjectId,
	) -> Result<u32, AuthorityError> {
		let mut total: u64 = 0;
		for (key, weight) in &authority.key_auths {
			let bytes = match key {
				KeyOrAddress::Key(bytes) | KeyOrAddress::Address(bytes) => bytes,
			};
			if provided.contains(bytes) {
				total += *weight as u64;
			}
		}
		for (account, weight) in &authority.account_auths {
			if depth_remaining == 0 {
				warn!(account = ?on_account, "authority recursion depth exceeded");
				return Err(AuthorityError::RecursionExceeded(on_account));
			}
			let sub_authority = self.account_authority(*account, AuthorityKind::Active)?;
			let sub_weight =
				self.satisfied_weight(sub_authority, provided, depth_remaining - 1, *account)?;
			if sub_weight as u64 >= sub_authority.weight_threshold as u64 {
				total += *weight as u64;
			}
		}
		Ok(total.min(u32::MAX as u64) as u32)
	}

	fn is_satisfied(
		&self,
		account: ObjectId,
		kind: AuthorityKind,
		provided: &BTreeSet<KeyBytes>,
	) -> Result<bool, AuthorityError> {
		let authority = self.account_authority(account, kind)?;
		let weight = self.satisfied_weight(authority, provided, self.max_authority_depth, account)?;
		Ok(weight >= authority.weight_threshold)
	}

	fn check_all_required(
		&self,
		transaction: &Transaction,
		provided: &BTreeSet<KeyBytes>,
	) -> Result<(), AuthorityError> {
		let required = transaction.required_authorities();
		for account in &required.owner {
			if !self.is_satisfied(*account, AuthorityKind::Owner, provided)? {
				return Err(AuthorityError::MissingOwnerAuth(*account));
			}
		}
		for account in &required.active {
			// Owner weight counts toward active (`spec.md` §4.B item 1):
			// an account satisfying its owner requirement is, by
			// definition, also satisfying active.
			if required.owner.contains(account) {
				continue;
			}
			if !self.is_satisfied(*account, AuthorityKind::Active, provided)?
				&& !self.is_satisfied(*account, AuthorityKind::Owner, provided)?
			{
				return Err(AuthorityError::MissingActiveAuth(*account));
			}
		}
		Ok(())
	}

	/// Every key reachable (within `max_authority_depth`) from some
	/// authority the transaction requires — the superset
	/// `get_required_signatures` minimizes from (`SPEC_FULL.md` §4.B).
	pub fn get_potential_signatures(
		&self,
		transaction: &Transaction,
	) -> Result<BTreeSet<KeyBytes>, AuthorityError> {
		let required = transaction.required_authorities();
		let mut out = BTreeSet::new();
		for account in required.active.iter().chain(required.owner.iter()) {
			self.collect_reachable_keys(*account, self.max_authority_depth, &mut out)?;
		}
		Ok(out)
	}

	fn collect_reachable_keys(
		&self,
		account: ObjectId,
		depth_remaining: u8,
		out: &mut BTreeSet<KeyBytes>,
	) -> Result<(), AuthorityError> {
		for kind in [AuthorityKind::Active, AuthorityKind::Owner] {
			let authority = self.account_authority(account, kind)?;
			for key in authority.key_auths.keys() {
				let bytes = match key {
					KeyOrAddress::Key(bytes) | KeyOrAddress::Address(bytes) => bytes.clone(),
				};
				out.insert(bytes);
			}
			if depth_remaining > 0 {
				for sub_account in authority.account_auths.keys() {
					self.collect_reachable_keys(*sub_account, depth_remaining - 1, out)?;
				}
			}
		}
		Ok(())
	}

	/// The minimal `S ⊆ available_keys` that satisfies every authority the
	/// transaction requires: greedily drop keys from `available_keys` that
	/// are not needed, in a stable (sorted) order, so the result is
	/// deterministic across calls (`spec.md` §4.B item 4).
	pub fn get_required_signatures(
		&self,
		transaction: &Transaction,
		available_keys: &BTreeSet<KeyBytes>,
	) -> Result<BTreeSet<KeyBytes>, AuthorityError> {
		self.check_all_required(transaction, available_keys)?;
		let mut working: BTreeSet<KeyBytes> = available_keys.clone();
		for key in available_keys {
			working.remove(key);
			if self.check_all_required(transaction, &working).is_err() {
				working.insert(key.clone());
			}
		}
		Ok(working)
	}

	/// Recovers a public key from each signature, checks for duplicates
	/// and irrelevance, then verifies the recovered set satisfies every
	/// required authority (`spec.md` §4.B).
	pub fn verify_authority(&self, transaction: &Transaction) -> Result<BTreeSet<KeyBytes>, AuthorityError> {
		let digest = signing_digest(&self.chain_id, transaction);
		let message = Message::from_digest_slice(&digest).map_err(|_| AuthorityError::InvalidSignature)?;
		let secp = Secp256k1::verification_only();

		let potential = self.get_potential_signatures(transaction)?;
		let mut recovered = BTreeSet::new();
		for sig in &transaction.signatures {
			let key_bytes = recover_public_key(&secp, &message, sig)?;
			if !recovered.insert(key_bytes.clone()) {
				warn!("duplicate signature recovered for the same key");
				return Err(AuthorityError::DuplicateSignature);
			}
			if !potential.contains(&key_bytes) {
				warn!("signature recovered to a key outside the required authority set");
				return Err(AuthorityError::IrrelevantSignature);
			}
		}
		self.check_all_required(transaction, &recovered)?;
		Ok(recovered)
	}
}

fn recover_public_key(
	secp: &Secp256k1<secp256k1::VerifyOnly>,
	message: &Message,
	sig: &chain_objects::CompactSignature,
) -> Result<KeyBytes, AuthorityError> {
	let recovery_id = (sig.0[0] as i32) - 27;
	let recovery_id = RecoveryId::from_i32(recovery_id.rem_euclid(4)).map_err(|_| AuthorityError::InvalidSignature)?;
	let recoverable = RecoverableSignature::from_compact(&sig.0[1..65], recovery_id)
		.map_err(|_| AuthorityError::InvalidSignature)?;
	let public_key: PublicKey =
		secp.recover_ecdsa(message, &recoverable).map_err(|_| AuthorityError::InvalidSignature)?;
	Ok(public_key.serialize().to_vec())
}

#[cfg(test)]
mod tests {
	use super::*;
	use chain_objects::{Account, AccountOptions, Object, TransferOp};
	use object_store::Store;
	use primitives::{Amount, BlockTime, Space};
	use secp256k1::SecretKey;

	fn account_with_authority(store: &mut Store, name: &str, authority: Authority) -> ObjectId {
		store
			.create(Space::Protocol, chain_objects::ids::protocol::ACCOUNT, |id| {
				Object::Account(Account {
					id,
					name: name.to_string(),
					owner: authority.clone(),
					active: authority,
					options: AccountOptions::default(),
					registrar: id,
					lifetime_member: false,
					statistics: ObjectId::new(Space::Implementation, 4, 0),
				})
			})
			.unwrap()
	}

	fn transfer_tx(from: ObjectId, sigs: Vec<chain_objects::CompactSignature>) -> Transaction {
		Transaction {
			reference_block_num: 0,
			reference_block_prefix: 0,
			expiration: BlockTime(0),
			operations: vec![chain_objects::Operation::Transfer(TransferOp {
				from,
				to: from,
				asset: ObjectId::new(Space::Protocol, 2, 0),
				amount: Amount(1),
				memo: None,
			})],
			signatures: sigs,
		}
	}

	fn sign(secp: &Secp256k1<secp256k1::All>, sk: &SecretKey, chain_id: &[u8; 32], tx: &Transaction) -> chain_objects::CompactSignature {
		let digest = signing_digest(chain_id, tx);
		let message = Message::from_digest_slice(&digest).unwrap();
		let (recovery_id, compact) = secp.sign_ecdsa_recoverable(&message, sk).serialize_compact();
		let mut out = [0u8; 65];
		out[0] = 27 + recovery_id.to_i32() as u8;
		out[1..].copy_from_slice(&compact);
		chain_objects::CompactSignature(out)
	}

	#[test]
	fn two_of_three_multisig_matches_spec_scenario() {
		let secp = Secp256k1::new();
		let sk1 = SecretKey::from_slice(&[1u8; 32]).unwrap();
		let sk2 = SecretKey::from_slice(&[2u8; 32]).unwrap();
		let sk3 = SecretKey::from_slice(&[3u8; 32]).unwrap();
		let sk_random = SecretKey::from_slice(&[9u8; 32]).unwrap();
		let pk1 = PublicKey::from_secret_key(&secp, &sk1).serialize().to_vec();
		let pk2 = PublicKey::from_secret_key(&secp, &sk2).serialize().to_vec();
		let pk3 = PublicKey::from_secret_key(&secp, &sk3).serialize().to_vec();

		let mut authority = Authority { weight_threshold: 2, ..Default::default() };
		authority.key_auths.insert(KeyOrAddress::Key(pk1.clone()), 1);
		authority.key_auths.insert(KeyOrAddress::Key(pk2.clone()), 1);
		authority.key_auths.insert(KeyOrAddress::Key(pk3.clone()), 1);

		let mut store = Store::new();
		let account = account_with_authority(&mut store, "n", authority);
		let chain_id = [0u8; 32];
		let resolver = AuthorityResolver::new(&store, chain_id, 2);

		let unsigned = transfer_tx(account, vec![]);
		let sig1 = sign(&secp, &sk1, &chain_id, &unsigned);
		let sig2 = sign(&secp, &sk2, &chain_id, &unsigned);
		let sig3 = sign(&secp, &sk3, &chain_id, &unsigned);
		let sig_random = sign(&secp, &sk_random, &chain_id, &unsigned);

		assert!(matches!(
			resolver.verify_authority(&transfer_tx(account, vec![sig1.clone()])),
			Err(AuthorityError::MissingActiveAuth(_))
		));
		assert!(resolver.verify_authority(&transfer_tx(account, vec![sig1, sig2.clone()])).is_ok());
		assert!(resolver.verify_authority(&transfer_tx(account, vec![sig2, sig3.clone()])).is_ok());
		assert!(matches!(
			resolver.verify_authority(&transfer_tx(account, vec![sig3, sig_random])),
			Err(AuthorityError::IrrelevantSignature)
		));
	}
}
