use chain_objects::Transaction;
use sha2::{Digest, Sha256};

/// The digest a signature is computed over: the chain id mixed into every
/// signature (`spec.md` §6: "Chain identity is a 32-byte hash mixed into
/// every signature") followed by the bincode encoding of the transaction
/// with its `signatures` field cleared, so a signature never signs itself.
pub fn signing_digest(chain_id: &[u8; 32], transaction: &Transaction) -> [u8; 32] {
	let mut unsigned = transaction.clone();
	unsigned.signatures.clear();
	let encoded = bincode::serialize(&unsigned).expect("transaction encoding is infallible");
	let mut hasher = Sha256::new();
	hasher.update(chain_id);
	hasher.update(&encoded);
	hasher.finalize().into()
}
