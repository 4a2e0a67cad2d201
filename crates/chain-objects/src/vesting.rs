use serde::{Deserialize, Serialize};

use primitives::{Amount, BlockTime, ObjectId};

/// `spec.md` §4.C: "policy = linear or coin-days-destroyed". Linear vests
/// a fixed amount per elapsed second over `vesting_seconds`, optionally
/// after a `begin_timestamp` cliff (the lockup mentioned for genesis
/// balances in §4.C's balance-claim bullet). Coin-days-destroyed vests
/// proportionally to accumulated coin-seconds since the last withdrawal,
/// capped by the total balance once `vesting_seconds` worth has
/// accumulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VestingPolicy {
	Linear { begin_timestamp: BlockTime, vesting_cliff_seconds: u64, vesting_duration_seconds: u64 },
	CoinDaysDestroyed { min_withdrawal_seconds: u64, last_deposit: BlockTime },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingBalance {
	pub id: ObjectId,
	pub owner: ObjectId,
	pub asset: ObjectId,
	pub balance: Amount,
	pub policy: VestingPolicy,
	pub last_claim: BlockTime,
}

impl VestingBalance {
	/// `get_allowed_withdraw(now)`: the portion of `balance` that has
	/// vested and not yet been claimed (`spec.md` §4.C, vesting-balance
	/// withdraw). Withdrawing more fails with *precondition*.
	pub fn get_allowed_withdraw(&self, now: BlockTime) -> Amount {
		match &self.policy {
			VestingPolicy::Linear { begin_timestamp, vesting_cliff_seconds, vesting_duration_seconds } => {
				if now < begin_timestamp.plus_seconds(*vesting_cliff_seconds) {
					return Amount::ZERO;
				}
				if *vesting_duration_seconds == 0 {
					return self.balance;
				}
				let elapsed = now.seconds_since(*begin_timestamp).min(*vesting_duration_seconds);
				self
					.balance
					.mul_ratio(elapsed as i64, *vesting_duration_seconds as i64)
					.unwrap_or(self.balance)
			}
			VestingPolicy::CoinDaysDestroyed { min_withdrawal_seconds, .. } => {
				let elapsed = now.seconds_since(self.last_claim);
				if elapsed >= *min_withdrawal_seconds && *min_withdrawal_seconds > 0 {
					self.balance
				} else if *min_withdrawal_seconds == 0 {
					self.balance
				} else {
					self
						.balance
						.mul_ratio(elapsed as i64, *min_withdrawal_seconds as i64)
						.unwrap_or(Amount::ZERO)
				}
			}
		}
	}
}
