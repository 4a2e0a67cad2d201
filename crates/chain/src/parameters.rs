use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Owned fields on [`crate::Chain`] rather than Store objects — Design
/// Note §9's "global mutable singletons... model as owned fields on a
/// single `Chain` root that every evaluator receives by mutable reference"
/// (`SPEC_FULL.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainParameters {
	pub max_authority_depth: u8,
	pub max_authority_membership: u16,
	pub maximum_block_size: usize,
	pub maximum_transaction_size: usize,
	pub transaction_expiration_seconds: u64,
	pub maintenance_interval_seconds: u64,
	pub min_review_period_seconds: u64,
	pub maximum_force_settlement_volume_bps: u16,
	/// Numerator/denominator of the irreversibility participation
	/// threshold (`spec.md` §4.E: "at least ⌈⅔⌉ of the active witnesses").
	pub irreversible_threshold: (u32, u32),
	/// How many of the most recently scheduled slots `Chain` tracks
	/// participation over (`spec.md` §4.E, "Recent-slots tracking").
	pub recent_slots_window: u32,
}

impl Default for ChainParameters {
	fn default() -> Self {
		Self {
			max_authority_depth: 2,
			max_authority_membership: 10,
			maximum_block_size: 2 * 1024 * 1024,
			maximum_transaction_size: 64 * 1024,
			transaction_expiration_seconds: 86_400,
			maintenance_interval_seconds: 86_400,
			min_review_period_seconds: 86_400,
			maximum_force_settlement_volume_bps: 500,
			irreversible_threshold: (2, 3),
			recent_slots_window: 128,
		}
	}
}

/// `SPEC_FULL.md` §4.C: "fee computation instead uses the flat
/// per-operation fee schedule on `Chain`" — the Open Question resolution
/// dropping `get_required_fees`'s whitelist-aware path in favor of a plain
/// lookup, recorded in `DESIGN.md`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSchedule {
	pub by_operation: BTreeMap<String, u64>,
	pub default_fee: u64,
}

impl FeeSchedule {
	pub fn fee_for(&self, operation_name: &str) -> u64 {
		self.by_operation.get(operation_name).copied().unwrap_or(self.default_fee)
	}
}

impl Default for FeeSchedule {
	fn default() -> Self {
		Self { by_operation: BTreeMap::new(), default_fee: 0 }
	}
}
