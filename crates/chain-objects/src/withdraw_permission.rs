use serde::{Deserialize, Serialize};

use primitives::{Amount, BlockTime, ObjectId};

/// Who may claim against a [`WithdrawPermission`]. `AllAccounts` replaces
/// the source's `restricted_enum::all_restricted` numeric wildcard with an
/// explicit variant (Open Question resolved in `SPEC_FULL.md` §4.C).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizedSpender {
	Account(ObjectId),
	AllAccounts,
}

impl AuthorizedSpender {
	pub fn permits(&self, claimant: ObjectId) -> bool {
		match self {
			AuthorizedSpender::Account(account) => *account == claimant,
			AuthorizedSpender::AllAccounts => true,
		}
	}
}

/// A standing authorization for `authorized` to pull up to `withdrawal_limit`
/// per period for a bounded number of periods (`spec.md` §4.C, Withdraw
/// permission).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawPermission {
	pub id: ObjectId,
	pub withdraw_from_account: ObjectId,
	pub authorized: AuthorizedSpender,
	pub withdrawal_limit: Amount,
	pub asset: ObjectId,
	pub withdrawal_period_sec: u64,
	pub periods_until_expiration: u32,
	pub period_start_time: BlockTime,
	pub claimed_this_period: Amount,
	pub expiration: BlockTime,
}

impl WithdrawPermission {
	/// `limit - claimed-this-period`, or zero before `period_start_time`
	/// (`spec.md` §4.C: "Claims before period-start are rejected").
	pub fn available(&self, now: BlockTime) -> Amount {
		if now < self.period_start_time {
			Amount::ZERO
		} else {
			self.withdrawal_limit.checked_sub(self.claimed_this_period).unwrap_or(Amount::ZERO)
		}
	}

	pub fn is_expired(&self, now: BlockTime) -> bool {
		now >= self.expiration
	}
}
