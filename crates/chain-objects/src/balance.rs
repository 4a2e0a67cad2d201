use serde::{Deserialize, Serialize};

use primitives::{Amount, ObjectId};

/// Unique by `(account, asset)` (`spec.md` §3, AccountBalance entity);
/// uniqueness is enforced by [`crate::index::AccountBalanceIndex`], not by
/// this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
	pub id: ObjectId,
	pub owner: ObjectId,
	pub asset: ObjectId,
	pub amount: Amount,
}
