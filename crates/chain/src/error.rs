use primitives::ObjectId;
use thiserror::Error;

use crate::block::BlockId;

/// Top-level error surfaced to `push_transaction`/`push_block` callers,
/// wrapping each component's error via `#[from]` (`SPEC_FULL.md` §7).
/// *Fatal* invariant violations are not a variant here: they `panic!` at
/// the point of detection per `spec.md` §7's explicit directive, rather
/// than propagating as a `Result`.
#[derive(Debug, Error)]
pub enum ChainError {
	#[error(transparent)]
	Authority(#[from] authority::AuthorityError),
	#[error(transparent)]
	Evaluator(#[from] evaluators::EvaluatorError),
	#[error(transparent)]
	Market(#[from] market_engine::MarketError),
	#[error(transparent)]
	Store(#[from] object_store::StoreError),

	/// *Session* error kind (`spec.md` §7): the transaction's
	/// `reference_block_num`/`reference_block_prefix` falls outside the
	/// recent-block window tracked by `BlockSummary`.
	#[error("transaction references a stale or unknown block (num {0}, prefix {1:#x})")]
	StaleReferenceBlock(u16, u32),
	#[error("transaction expiration {0:?} is at or before head time {1:?}")]
	ExpiredTransaction(primitives::BlockTime, primitives::BlockTime),
	#[error("transaction exceeds maximum_transaction_size ({0} > {1} bytes)")]
	TransactionTooLarge(usize, usize),
	#[error("transaction is a byte-for-byte duplicate of one already pending or applied")]
	DuplicateTransaction,

	#[error("block exceeds maximum_block_size ({0} > {1} bytes)")]
	BlockTooLarge(usize, usize),
	#[error("block {0:?} has already been applied")]
	DuplicateBlock(BlockId),
	#[error("block {0:?} is marked bad and will not be re-attempted")]
	KnownBadBlock(BlockId),
	#[error("block references unknown parent {0:?}")]
	UnknownParentBlock(BlockId),
	#[error("block witness signature does not recover to the scheduled witness's key")]
	BadWitnessSignature,
	#[error("block transaction_merkle_root does not match its transactions")]
	BadMerkleRoot,

	#[error("no such account {0} in genesis/registry")]
	UnknownAccount(ObjectId),
}
