use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use primitives::ObjectId;

/// A public key or legacy address authorizer, weighted within an
/// [`Authority`]. The source distinguishes `key_auths` from `address_auths`
/// (`spec.md` §4.B item 3); both resolve to the same weighted-sum test so
/// they share one map keyed by this enum rather than two parallel maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyOrAddress {
	Key(Vec<u8>),
	Address(Vec<u8>),
}

/// Weight threshold plus three kinds of weighted authorizer: other
/// accounts (recursively resolved), raw keys, and legacy addresses
/// (`spec.md` §3, Authority entity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Authority {
	pub weight_threshold: u32,
	pub account_auths: BTreeMap<ObjectId, u32>,
	pub key_auths: BTreeMap<KeyOrAddress, u32>,
}

impl Authority {
	pub fn total_membership(&self) -> usize {
		self.account_auths.len() + self.key_auths.len()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AccountOptions {
	pub memo_key: Vec<u8>,
	pub votes: Vec<ObjectId>,
	pub voting_proxy: Option<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
	pub id: ObjectId,
	pub name: String,
	pub owner: Authority,
	pub active: Authority,
	pub options: AccountOptions,
	pub registrar: ObjectId,
	pub lifetime_member: bool,
	pub statistics: ObjectId,
}

/// Read-only bookkeeping updated by the block processor after each applied
/// operation; no evaluator reads it for validation (`SPEC_FULL.md` §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AccountStatistics {
	pub id: ObjectId,
	pub owner: ObjectId,
	pub total_ops: u64,
	pub most_recent_op: Option<ObjectId>,
}
