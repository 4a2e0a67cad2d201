use std::collections::VecDeque;

use authority::AuthorityResolver;
use chain_objects::{Transaction, VirtualOp};
use evaluators::EvaluationContext;
use object_store::Store;

use crate::error::ChainError;
use crate::parameters::ChainParameters;

/// A transaction that passed validation and is sitting in the pending pool
/// on top of the current head state, with the virtual ops its application
/// produced (`spec.md` §4.E, "Pending pool": "holds transactions that have
/// passed validation but are not yet in a block").
#[derive(Debug, Clone)]
pub struct PendingTransaction {
	pub transaction: Transaction,
	pub virtual_ops: Vec<VirtualOp>,
}

/// Transactions accepted since the last block, each applied against `store`
/// inside its own undo session so the pool can be flushed (on block
/// assembly) or individually evicted (on re-validation failure) without
/// touching anything else (`spec.md` §4.E item 1: "push_transaction").
#[derive(Debug, Default)]
pub struct PendingPool {
	entries: VecDeque<PendingTransaction>,
}

impl PendingPool {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &PendingTransaction> {
		self.entries.iter()
	}

	/// Validates and applies `transaction` against `store`'s current head
	/// state inside its own undo session, rolling back on any failure and
	/// otherwise leaving the mutation live (layered under whatever pool
	/// entries came before it) and appending to the pool
	/// (`spec.md` §4.E item 1, "push_transaction" bullets 1-4).
	pub fn push_transaction(
		&mut self,
		store: &mut Store,
		chain_id: &[u8; 32],
		parameters: &ChainParameters,
		ctx: &EvaluationContext,
		transaction: Transaction,
	) -> Result<Vec<VirtualOp>, ChainError> {
		let encoded_size = bincode::serialize(&transaction).expect("transaction encoding is infallible").len();
		if encoded_size > parameters.maximum_transaction_size {
			return Err(ChainError::TransactionTooLarge(encoded_size, parameters.maximum_transaction_size));
		}
		if transaction.expiration <= ctx.head_time {
			return Err(ChainError::ExpiredTransaction(transaction.expiration, ctx.head_time));
		}
		if self.entries.iter().any(|pending| pending.transaction == transaction) {
			return Err(ChainError::DuplicateTransaction);
		}

		let resolver = AuthorityResolver::new(store, *chain_id, parameters.max_authority_depth);
		resolver.verify_authority(&transaction)?;

		let session = store.start_undo_session();
		let mut virtual_ops = Vec::new();
		let mut failed = None;
		for op in &transaction.operations {
			match evaluators::apply_operation(store, ctx, op) {
				Ok((mut ops, _)) => virtual_ops.append(&mut ops),
				Err(err) => {
					failed = Some(err);
					break;
				}
			}
		}
		if let Some(err) = failed {
			store.undo(session)?;
			return Err(err.into());
		}
		store.commit(session)?;

		self.entries.push_back(PendingTransaction { transaction, virtual_ops: virtual_ops.clone() });
		Ok(virtual_ops)
	}

	/// Drains the whole pool, handing the caller its transactions in
	/// acceptance order for block assembly (`spec.md` §4.E item 2,
	/// "Assemble block").
	pub fn drain(&mut self) -> Vec<PendingTransaction> {
		self.entries.drain(..).collect()
	}

	/// Drops every pending transaction without touching `store` — used
	/// when a reorg has already undone the sessions they were layered on
	/// top of, so their prior application no longer exists to roll back
	/// (`spec.md` §4.E item 1, "Push block": re-validation after a fork
	/// switch starts from an empty pool).
	pub fn clear(&mut self) {
		self.entries.clear();
	}
}
