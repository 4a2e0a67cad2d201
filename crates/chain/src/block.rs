use chain_objects::{CompactSignature, Transaction};
use primitives::{BlockTime, ObjectId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::merkle::merkle_root;

/// 32-byte block identity, the hash of the header (`spec.md` §6: the same
/// length-prefixed deterministic encoding used for every wire type).
pub type BlockId = [u8; 32];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
	pub previous: BlockId,
	pub block_num: u32,
	pub timestamp: BlockTime,
	pub witness: ObjectId,
	pub transaction_merkle_root: [u8; 32],
}

impl BlockHeader {
	pub fn id(&self) -> BlockId {
		let encoded = bincode::serialize(self).expect("header encoding is infallible");
		let mut hasher = Sha256::new();
		hasher.update(&encoded);
		hasher.finalize().into()
	}
}

/// A block as pushed over the wire: header plus the transactions it
/// covers plus the scheduled witness's signature over the header id
/// (`spec.md` §4.E, "Block generation": "seals the block with a witness
/// signature").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlock {
	pub header: BlockHeader,
	pub transactions: Vec<Transaction>,
	pub witness_signature: CompactSignature,
}

impl SignedBlock {
	pub fn id(&self) -> BlockId {
		self.header.id()
	}

	/// Recomputes the merkle root over `transactions` and compares it to
	/// the header's claimed root — the first check `push_block` performs
	/// on every incoming block.
	pub fn merkle_root_matches(&self) -> bool {
		let leaves: Vec<[u8; 32]> = self
			.transactions
			.iter()
			.map(|tx| {
				let encoded = bincode::serialize(tx).expect("transaction encoding is infallible");
				let mut hasher = Sha256::new();
				hasher.update(&encoded);
				hasher.finalize().into()
			})
			.collect();
		merkle_root(&leaves) == self.header.transaction_merkle_root
	}
}

/// Computes the `transaction_merkle_root` for a prospective block body,
/// used by `assemble_block` before a witness has signed anything.
pub fn compute_merkle_root(transactions: &[Transaction]) -> [u8; 32] {
	let leaves: Vec<[u8; 32]> = transactions
		.iter()
		.map(|tx| {
			let encoded = bincode::serialize(tx).expect("transaction encoding is infallible");
			let mut hasher = Sha256::new();
			hasher.update(&encoded);
			hasher.finalize().into()
		})
		.collect();
	merkle_root(&leaves)
}
