use serde::{Deserialize, Serialize};

/// Seconds since the chain's epoch. Evaluators never read the wall clock
/// directly (`spec.md` §4.C) — every time-dependent decision is made
/// against a [`BlockTime`] supplied by the block processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockTime(pub u64);

impl BlockTime {
	pub const EPOCH: BlockTime = BlockTime(0);

	pub fn plus_seconds(self, seconds: u64) -> BlockTime {
		BlockTime(self.0.saturating_add(seconds))
	}

	pub fn seconds_since(self, earlier: BlockTime) -> u64 {
		self.0.saturating_sub(earlier.0)
	}
}

impl From<u64> for BlockTime {
	fn from(value: u64) -> Self {
		BlockTime(value)
	}
}
