use std::collections::{BTreeSet, VecDeque};

use authority::AuthorityResolver;
use chain_objects::{CompactSignature, Object, Transaction, VirtualOp};
use evaluators::EvaluationContext;
use object_store::{SessionId, Store};
use primitives::{BlockTime, ObjectId};
use tracing::{info, info_span, warn};

use crate::block::{compute_merkle_root, BlockHeader, BlockId, SignedBlock};
use crate::error::ChainError;
use crate::fork_db::{ForkDatabase, GENESIS_PARENT};
use crate::maintenance::{self, MaintenanceSchedule};
use crate::notifications::{ChangeNotification, Notifier};
use crate::parameters::{ChainParameters, FeeSchedule};
use crate::pool::PendingPool;

/// The block processor (`spec.md` §4.E): owns the object store, the fork
/// database, the pending transaction pool, and every chain-wide parameter
/// evaluators consult but don't own. Matches Design Note §9's "model
/// global mutable singletons as owned fields on a single `Chain` root" —
/// there is exactly one of these per running node, guarded by the caller
/// behind a `tokio::sync::RwLock` (`SPEC_FULL.md` §3, *Concurrency model*).
pub struct Chain {
	store: Store,
	chain_id: [u8; 32],
	parameters: ChainParameters,
	fee_schedule: FeeSchedule,
	core_asset: ObjectId,
	fork_db: ForkDatabase,
	head_id: BlockId,
	head_num: u32,
	head_time: BlockTime,
	next_maintenance_time: BlockTime,
	last_maintenance_schedule: MaintenanceSchedule,
	last_irreversible_block_num: u32,
	/// One session covering every mutation since `last_irreversible_block_num`,
	/// re-opened each time the previous one is committed away
	/// (`spec.md` §4.E item 2: "commit the session onto the irreversible
	/// baseline if block number ≤ last-irreversible; otherwise leave
	/// sessions unmerged"). `None` only at genesis, before the first block.
	reversible_session: Option<SessionId>,
	/// The witness of up to the last `recent_slots_window` applied blocks,
	/// oldest first — the "recent-slots bitfield" of `spec.md` §4.E,
	/// represented as the producing witness per slot rather than a bare
	/// bit, since distinct-producer count is what the irreversibility rule
	/// actually needs (`DESIGN.md` records the simplification from
	/// BitShares' numeric commit-tracking algorithm).
	recent_witnesses: VecDeque<ObjectId>,
	pool: PendingPool,
	notifier: Notifier,
}

impl Chain {
	/// Builds a `Chain` on top of an already-seeded genesis `Store` —
	/// genesis construction (parsing a genesis JSON, creating the initial
	/// accounts/assets/witnesses) is out of scope for this crate
	/// (`spec.md` §1, Non-goals) and is the `node` binary's job.
	pub fn new(
		store: Store,
		chain_id: [u8; 32],
		parameters: ChainParameters,
		fee_schedule: FeeSchedule,
		core_asset: ObjectId,
		genesis_time: BlockTime,
	) -> Self {
		let next_maintenance_time =
			maintenance::next_maintenance_after(genesis_time, parameters.maintenance_interval_seconds);
		Self {
			store,
			chain_id,
			core_asset,
			next_maintenance_time,
			parameters,
			fee_schedule,
			fork_db: ForkDatabase::new(),
			head_id: GENESIS_PARENT,
			head_num: 0,
			head_time: genesis_time,
			last_maintenance_schedule: MaintenanceSchedule::default(),
			last_irreversible_block_num: 0,
			reversible_session: None,
			recent_witnesses: VecDeque::new(),
			pool: PendingPool::new(),
			notifier: Notifier::default(),
		}
	}

	pub fn store(&self) -> &Store {
		&self.store
	}

	pub fn head_id(&self) -> BlockId {
		self.head_id
	}

	pub fn head_num(&self) -> u32 {
		self.head_num
	}

	pub fn head_time(&self) -> BlockTime {
		self.head_time
	}

	pub fn last_irreversible_block_num(&self) -> u32 {
		self.last_irreversible_block_num
	}

	pub fn parameters(&self) -> &ChainParameters {
		&self.parameters
	}

	pub fn fee_schedule(&self) -> &FeeSchedule {
		&self.fee_schedule
	}

	pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ChangeNotification> {
		self.notifier.subscribe()
	}

	fn evaluation_context(&self) -> EvaluationContext {
		EvaluationContext {
			head_time: self.head_time,
			max_authority_membership: self.parameters.max_authority_membership,
			min_review_period_seconds: self.parameters.min_review_period_seconds,
			evaluating_proposed_transaction: false,
		}
	}

	/// `spec.md` §4.E item 1, "push_transaction": validates and applies
	/// `transaction` against the current head state, appending it to the
	/// pending pool on success.
	pub fn push_transaction(&mut self, transaction: Transaction) -> Result<Vec<VirtualOp>, ChainError> {
		let ctx = self.evaluation_context();
		let ops = self.pool.push_transaction(&mut self.store, &self.chain_id, &self.parameters, &ctx, transaction)?;
		for op in &ops {
			self.notifier.publish(ChangeNotification::VirtualOp(op.clone()));
		}
		Ok(ops)
	}

	/// `spec.md` §4.E item 2, "Assemble block": drains the pending pool
	/// (whose transactions are already applied against head state) into an
	/// unsigned header plus the transaction list, for `witness` to sign
	/// with [`Self::seal_block`]. Key management and the actual signing
	/// step are out of scope (`spec.md` §1, Non-goals) — this crate only
	/// produces the bytes a witness's wallet would sign.
	pub fn assemble_block(&mut self, witness: ObjectId) -> (BlockHeader, Vec<Transaction>) {
		let pending = self.pool.drain();
		let transactions: Vec<Transaction> = pending.into_iter().map(|p| p.transaction).collect();
		let header = BlockHeader {
			previous: self.head_id,
			block_num: self.head_num + 1,
			timestamp: self.head_time.plus_seconds(1),
			witness,
			transaction_merkle_root: compute_merkle_root(&transactions),
		};
		(header, transactions)
	}

	/// Attaches a witness's signature to an assembled header, producing the
	/// wire-ready block (`spec.md` §4.E item 2).
	pub fn seal_block(header: BlockHeader, transactions: Vec<Transaction>, witness_signature: CompactSignature) -> SignedBlock {
		SignedBlock { header, transactions, witness_signature }
	}

	/// `spec.md` §4.E item 1, "Push block": the main entry point for a
	/// block received from the network (or just self-sealed). Rejects
	/// duplicates and known-bad blocks, checks structural validity, and
	/// either extends the current head directly or performs a fork switch.
	pub fn push_block(&mut self, block: SignedBlock) -> Result<(), ChainError> {
		let id = block.id();
		if self.fork_db.is_bad(&id) {
			return Err(ChainError::KnownBadBlock(id));
		}
		if self.fork_db.contains(&id) {
			return Err(ChainError::DuplicateBlock(id));
		}
		let encoded_size = bincode::serialize(&block).expect("block encoding is infallible").len();
		if encoded_size > self.parameters.maximum_block_size {
			return Err(ChainError::BlockTooLarge(encoded_size, self.parameters.maximum_block_size));
		}
		if !block.merkle_root_matches() {
			return Err(ChainError::BadMerkleRoot);
		}
		self.verify_witness_signature(&block)?;

		let previous = block.header.previous;
		if previous != GENESIS_PARENT && !self.fork_db.contains(&previous) && self.head_id != previous {
			return Err(ChainError::UnknownParentBlock(previous));
		}

		self.fork_db.insert(block.clone());

		if previous == self.head_id {
			self.apply_block(&block)?;
			return Ok(());
		}
		self.switch_fork(id)
	}

	fn verify_witness_signature(&self, block: &SignedBlock) -> Result<(), ChainError> {
		let witness_object = self.store.find(block.header.witness);
		let Some(witness) = witness_object.and_then(Object::as_witness) else {
			return Err(ChainError::UnknownAccount(block.header.witness));
		};
		let digest = witness_signing_digest(&self.chain_id, &block.header);
		let message = secp256k1::Message::from_digest_slice(&digest).map_err(|_| ChainError::BadWitnessSignature)?;
		let secp = secp256k1::Secp256k1::verification_only();
		let recovered = recover_signing_key(&secp, &message, &block.witness_signature)
			.map_err(|_| ChainError::BadWitnessSignature)?;
		if recovered != witness.signing_key {
			return Err(ChainError::BadWitnessSignature);
		}
		Ok(())
	}

	/// Applies `block` directly on top of the current head: opens the
	/// per-block session, replays/validates every transaction, runs the
	/// end-of-block hook and (if due) the maintenance pass, then folds the
	/// session into the running reversible window and advances
	/// irreversibility (`spec.md` §4.E item 2).
	fn apply_block(&mut self, block: &SignedBlock) -> Result<(), ChainError> {
		let _span = info_span!("apply_block", block_num = block.header.block_num).entered();
		if self.reversible_session.is_none() {
			self.reversible_session = Some(self.store.start_undo_session());
		}
		let block_session = self.store.start_undo_session();

		match self.apply_block_body(block) {
			Ok(virtual_ops) => {
				self.store.merge(block_session)?;
				self.head_id = block.id();
				self.head_num = block.header.block_num;
				self.head_time = block.header.timestamp;
				self.pool.clear();
				self.advance_irreversibility(block.header.witness);
				for op in virtual_ops {
					self.notifier.publish(ChangeNotification::VirtualOp(op));
				}
				self.notifier
					.publish(ChangeNotification::AppliedBlock { id: self.head_id, block_num: self.head_num });
				info!(block_num = self.head_num, "applied block");
				Ok(())
			}
			Err(err) => {
				self.store.undo(block_session)?;
				self.fork_db.mark_bad(block.id());
				warn!(block_num = block.header.block_num, error = %err, "block application failed");
				Err(err)
			}
		}
	}

	fn apply_block_body(&mut self, block: &SignedBlock) -> Result<Vec<VirtualOp>, ChainError> {
		let ctx = EvaluationContext {
			head_time: block.header.timestamp,
			max_authority_membership: self.parameters.max_authority_membership,
			min_review_period_seconds: self.parameters.min_review_period_seconds,
			evaluating_proposed_transaction: false,
		};
		let mut virtual_ops = Vec::new();
		for transaction in &block.transactions {
			if !self.pool_already_verified(transaction) {
				let resolver =
					AuthorityResolver::new(&self.store, self.chain_id, self.parameters.max_authority_depth);
				resolver.verify_authority(transaction)?;
			}
			for op in &transaction.operations {
				let (mut ops, _) = evaluators::apply_operation(&mut self.store, &ctx, op)?;
				virtual_ops.append(&mut ops);
			}
			self.bump_account_statistics(transaction)?;
		}

		let mut end_of_block_ops =
			maintenance::end_of_block(&mut self.store, &ctx, self.parameters.maximum_force_settlement_volume_bps)?;
		virtual_ops.append(&mut end_of_block_ops);

		if maintenance::crosses_maintenance_boundary(ctx.head_time, self.next_maintenance_time) {
			self.last_maintenance_schedule = maintenance::run_maintenance(&mut self.store, &ctx, self.core_asset)?;
			self.next_maintenance_time =
				maintenance::next_maintenance_after(ctx.head_time, self.parameters.maintenance_interval_seconds);
		}

		Ok(virtual_ops)
	}

	/// Whether `transaction` matches a pending-pool entry byte-for-byte,
	/// letting a just-sealed block skip re-verifying signatures it already
	/// verified on entry to the pool (`spec.md` §4.E item 2: "skip the
	/// already-verified signatures (configurable skip-flags)").
	fn pool_already_verified(&self, transaction: &Transaction) -> bool {
		self.pool.iter().any(|pending| &pending.transaction == transaction)
	}

	fn bump_account_statistics(&mut self, transaction: &Transaction) -> Result<(), ChainError> {
		let required = transaction.required_authorities();
		for account_id in required.active.iter().chain(required.owner.iter()).collect::<BTreeSet<_>>() {
			let Some(account) = self.store.find(*account_id).and_then(Object::as_account) else { continue };
			let statistics_id = account.statistics;
			if self.store.find(statistics_id).is_some() {
				self.store.modify(statistics_id, |o| {
					let stats = o.as_account_statistics_mut().unwrap();
					stats.total_ops += 1;
					stats.most_recent_op = Some(*account_id);
				})?;
			}
		}
		Ok(())
	}

	/// Updates the recent-witnesses window and, if enough distinct
	/// witnesses have now produced blocks, advances
	/// `last_irreversible_block_num` and commits the reversible session
	/// (`spec.md` §4.E: "Irreversibility"/"Recent-slots tracking").
	fn advance_irreversibility(&mut self, witness: ObjectId) {
		self.recent_witnesses.push_back(witness);
		while self.recent_witnesses.len() > self.parameters.recent_slots_window as usize {
			self.recent_witnesses.pop_front();
		}
		let distinct = self.recent_witnesses.iter().collect::<BTreeSet<_>>().len();
		let active_witness_count = self.last_maintenance_schedule.witnesses.len().max(1);
		let (num, den) = self.parameters.irreversible_threshold;
		let threshold = (active_witness_count * num as usize).div_ceil(den as usize);

		if distinct >= threshold {
			self.last_irreversible_block_num = self.head_num;
			if let Some(session) = self.reversible_session.take() {
				self.store.commit(session).expect("reversible session is always the top of the undo stack here");
			}
		}
	}

	/// `spec.md` §4.E item 1: undoes the whole reversible window, replays
	/// the shared prefix up to `lca`, then applies `new_branch` — the fork
	/// switch used when a pushed block's parent is not the current head.
	fn switch_fork(&mut self, new_tip: BlockId) -> Result<(), ChainError> {
		let (lca, old_only, new_only) = self.fork_db.diverge(self.head_id, new_tip);
		let lca_num = if lca == GENESIS_PARENT { 0 } else { self.fork_db.get(&lca).map(|b| b.header.block_num).unwrap_or(0) };
		let new_branch_is_better = new_only.len() > old_only.len()
			|| (new_only.len() == old_only.len() && new_only.last() < old_only.last());
		if !new_branch_is_better {
			return Ok(());
		}
		if lca_num < self.last_irreversible_block_num {
			return Err(ChainError::UnknownParentBlock(lca));
		}

		let _span = info_span!("switch_fork", from_num = self.head_num, lca_num).entered();
		if let Some(session) = self.reversible_session.take() {
			self.store.undo(session)?;
		}
		self.head_id = lca;
		self.head_num = lca_num;
		self.pool.clear();

		let replay_common: Vec<BlockId> = self
			.fork_db
			.chain_to_genesis(lca)
			.into_iter()
			.filter(|id| self.fork_db.get(id).is_some_and(|b| b.header.block_num > self.last_irreversible_block_num))
			.collect();
		for id in &replay_common {
			let block = self.fork_db.get(id).expect("path entries are in the fork database").clone();
			self.apply_block(&block)?;
		}

		for id in &new_only {
			let block = self.fork_db.get(id).expect("just inserted or already known").clone();
			if let Err(err) = self.apply_block(&block) {
				warn!(block_id = ?id, error = %err, "fork switch aborted, restoring previous branch");
				self.rewind_to(lca, lca_num);
				self.restore_branch(&replay_common, &old_only);
				return Err(err);
			}
		}
		self.notifier.publish(ChangeNotification::UndoneBlock { id: lca, block_num: lca_num });
		Ok(())
	}

	/// Undoes whatever has accumulated in the reversible session since
	/// `block_num` and resets head bookkeeping back to it, used to unwind
	/// a partially-applied fork switch.
	fn rewind_to(&mut self, id: BlockId, block_num: u32) {
		if let Some(session) = self.reversible_session.take() {
			self.store.undo(session).expect("reversible session is always undoable here");
		}
		self.head_id = id;
		self.head_num = block_num;
		self.pool.clear();
	}

	/// Re-establishes `common` then `branch` (both oldest-first,
	/// already known-valid) on top of the current head after an attempted
	/// fork switch failed partway — the blocks were valid before, so
	/// re-applying them cannot fail for a content reason (a `panic!` here
	/// would mean the store itself is corrupt, matching `spec.md` §7's
	/// "fatal" class).
	fn restore_branch(&mut self, common: &[BlockId], branch: &[BlockId]) {
		for id in common.iter().chain(branch.iter()) {
			let block = self.fork_db.get(id).expect("restoring a previously-applied branch").clone();
			self.apply_block(&block).expect("re-applying a previously valid block must succeed");
		}
	}
}

/// The digest a witness's wallet signs to seal a block: `sha256(chain_id ||
/// header_id)`, exposed so an external signer (here, the `node` harness)
/// can produce a [`CompactSignature`] for [`Chain::seal_block`] without
/// duplicating the hashing scheme (`spec.md` §4.E, "Block generation").
pub fn witness_signing_digest(chain_id: &[u8; 32], header: &BlockHeader) -> [u8; 32] {
	use sha2::{Digest, Sha256};
	let mut hasher = Sha256::new();
	hasher.update(chain_id);
	hasher.update(header.id());
	hasher.finalize().into()
}

fn recover_signing_key(
	secp: &secp256k1::Secp256k1<secp256k1::VerifyOnly>,
	message: &secp256k1::Message,
	sig: &CompactSignature,
) -> Result<Vec<u8>, secp256k1::Error> {
	use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
	let recovery_id = ((sig.0[0] as i32) - 27).rem_euclid(4);
	let recovery_id = RecoveryId::from_i32(recovery_id)?;
	let recoverable = RecoverableSignature::from_compact(&sig.0[1..65], recovery_id)?;
	let public_key = secp.recover_ecdsa(message, &recoverable)?;
	Ok(public_key.serialize().to_vec())
}
