use std::collections::{BTreeMap, BTreeSet};

use crate::block::{BlockId, SignedBlock};

/// The synthetic "previous" id of the chain's first block — never a real
/// header hash, used as the sentinel [`ForkDatabase::chain_to_genesis`]
/// walks back to.
pub const GENESIS_PARENT: BlockId = [0u8; 32];

/// Every block the node has seen, indexed by previous-id
/// (`spec.md` §4.E, "Push block": "Places it in the fork database indexed
/// by previous-id"). Blocks that fail to apply are remembered as bad and
/// never re-attempted (`spec.md` §7: "the fork database to remember the
/// block as bad").
#[derive(Debug, Default)]
pub struct ForkDatabase {
	blocks: BTreeMap<BlockId, SignedBlock>,
	children: BTreeMap<BlockId, Vec<BlockId>>,
	bad: BTreeSet<BlockId>,
}

impl ForkDatabase {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn contains(&self, id: &BlockId) -> bool {
		self.blocks.contains_key(id)
	}

	pub fn is_bad(&self, id: &BlockId) -> bool {
		self.bad.contains(id)
	}

	pub fn mark_bad(&mut self, id: BlockId) {
		self.bad.insert(id);
	}

	pub fn get(&self, id: &BlockId) -> Option<&SignedBlock> {
		self.blocks.get(id)
	}

	pub fn insert(&mut self, block: SignedBlock) -> BlockId {
		let id = block.id();
		self.children.entry(block.header.previous).or_default().push(id);
		self.blocks.insert(id, block);
		id
	}

	/// Children of `id` currently known to the fork database, used to
	/// extend a branch past a common ancestor when several competing
	/// tips share it.
	pub fn children_of(&self, id: &BlockId) -> &[BlockId] {
		self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
	}

	/// The full ancestry of `tip`, oldest (closest to genesis) first,
	/// ending with `tip` itself. Panics if any ancestor is missing from
	/// the database — callers only pass tips whose whole branch has been
	/// `insert`ed.
	pub fn chain_to_genesis(&self, tip: BlockId) -> Vec<BlockId> {
		let mut path = Vec::new();
		let mut cursor = tip;
		while cursor != GENESIS_PARENT {
			path.push(cursor);
			let block = self.blocks.get(&cursor).expect("ancestor missing from fork database");
			cursor = block.header.previous;
		}
		path.reverse();
		path
	}

	/// Splits two tips' ancestries at their lowest common ancestor:
	/// returns `(lca, only_in_a, only_in_b)`, both suffixes oldest-first
	/// (`spec.md` §4.E, "locate the lowest common ancestor").
	pub fn diverge(&self, a_tip: BlockId, b_tip: BlockId) -> (BlockId, Vec<BlockId>, Vec<BlockId>) {
		let path_a = self.chain_to_genesis(a_tip);
		let path_b = self.chain_to_genesis(b_tip);
		let common_len = path_a.iter().zip(path_b.iter()).take_while(|(a, b)| a == b).count();
		let lca = if common_len == 0 { GENESIS_PARENT } else { path_a[common_len - 1] };
		(lca, path_a[common_len..].to_vec(), path_b[common_len..].to_vec())
	}
}
