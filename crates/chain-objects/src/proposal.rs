use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use primitives::{BlockTime, ObjectId};

use crate::operation::Transaction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
	pub id: ObjectId,
	pub proposed_transaction: Transaction,
	pub required_active_approvals: BTreeSet<ObjectId>,
	pub required_owner_approvals: BTreeSet<ObjectId>,
	pub available_active_approvals: BTreeSet<ObjectId>,
	pub available_owner_approvals: BTreeSet<ObjectId>,
	pub expiration_time: BlockTime,
	pub review_period_time: Option<BlockTime>,
}

impl Proposal {
	/// `spec.md` §3 invariant 4: authorized iff the combined available
	/// approvals satisfy both the required active and required owner sets.
	/// Owner approvals also count toward an active requirement (owner
	/// implies active, `spec.md` §4.B item 1).
	pub fn is_authorized_to_execute(&self) -> bool {
		let active_satisfied = self.required_active_approvals.iter().all(|a| {
			self.available_active_approvals.contains(a) || self.available_owner_approvals.contains(a)
		});
		let owner_satisfied =
			self.required_owner_approvals.iter().all(|a| self.available_owner_approvals.contains(a));
		active_satisfied && owner_satisfied
	}

	pub fn in_review_period(&self, head_time: BlockTime) -> bool {
		match self.review_period_time {
			Some(review_time) => head_time < review_time,
			None => false,
		}
	}
}
