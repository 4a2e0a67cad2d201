use serde::{Deserialize, Serialize};

use primitives::{Amount, BlockTime, ObjectId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
	pub id: ObjectId,
	pub witness_account: ObjectId,
	pub signing_key: Vec<u8>,
	pub total_votes: u64,
	pub last_aslot: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMember {
	pub id: ObjectId,
	pub committee_member_account: ObjectId,
	pub url: String,
	pub total_votes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
	pub id: ObjectId,
	pub owner: ObjectId,
	pub name: String,
	pub work_begin: BlockTime,
	pub work_end: BlockTime,
	pub daily_pay: Amount,
	pub total_votes_for: u64,
}

impl Worker {
	pub fn is_active(&self, now: BlockTime) -> bool {
		now >= self.work_begin && now < self.work_end
	}
}
