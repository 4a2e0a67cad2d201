use serde::{Deserialize, Serialize};

use primitives::ObjectId;

/// A ring entry of recent block ids keyed by the low bits of the block
/// number (`SPEC_FULL.md` §3: the "BlockSummary / transaction-expiration
/// window"), used to validate a transaction's `reference_block_num` /
/// `reference_block_prefix` against replay outside the bounded
/// `transaction_expiration_seconds` window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
	pub id: ObjectId,
	pub block_num: u32,
	/// The low 32 bits of the block's id hash, compared against a
	/// transaction's `reference_block_prefix`.
	pub block_id_prefix: u32,
}
