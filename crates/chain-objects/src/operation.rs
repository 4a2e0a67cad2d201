use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use primitives::{Amount, BlockTime, ObjectId, Price};

use crate::account::{AccountOptions, Authority};
use crate::asset::{AssetOptions, FeedOptions, PriceFeed};
use crate::vesting::VestingPolicy;
use crate::withdraw_permission::AuthorizedSpender;

/// The set of accounts whose active or owner authority must be satisfied
/// for an operation, as declared by each variant (`spec.md` §4.B item 1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredAuthorities {
	pub active: BTreeSet<ObjectId>,
	pub owner: BTreeSet<ObjectId>,
}

impl RequiredAuthorities {
	pub fn active_only(accounts: impl IntoIterator<Item = ObjectId>) -> Self {
		Self { active: accounts.into_iter().collect(), owner: BTreeSet::new() }
	}

	pub fn owner_only(accounts: impl IntoIterator<Item = ObjectId>) -> Self {
		Self { active: BTreeSet::new(), owner: accounts.into_iter().collect() }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOp {
	pub from: ObjectId,
	pub to: ObjectId,
	pub asset: ObjectId,
	pub amount: Amount,
	pub memo: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreateOp {
	pub registrar: ObjectId,
	pub name: String,
	pub owner: Authority,
	pub active: Authority,
	pub options: AccountOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdateOp {
	pub account: ObjectId,
	pub owner: Option<Authority>,
	pub active: Option<Authority>,
	pub options: Option<AccountOptions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCreateOp {
	pub issuer: ObjectId,
	pub symbol: String,
	pub precision: u8,
	pub options: AssetOptions,
	pub bitasset: Option<AssetCreateBitassetOpts>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCreateBitassetOpts {
	pub backing_asset: ObjectId,
	pub feed_options: FeedOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUpdateOp {
	pub issuer: ObjectId,
	pub asset: ObjectId,
	pub new_issuer: Option<ObjectId>,
	pub new_options: AssetOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetIssueOp {
	pub issuer: ObjectId,
	pub asset: ObjectId,
	pub amount: Amount,
	pub issue_to: ObjectId,
	pub memo: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReserveOp {
	pub payer: ObjectId,
	pub asset: ObjectId,
	pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderCreateOp {
	pub seller: ObjectId,
	pub amount_to_sell: Amount,
	pub sell_asset: ObjectId,
	pub min_to_receive: Amount,
	pub receive_asset: ObjectId,
	pub expiration: BlockTime,
	pub fill_or_kill: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderCancelOp {
	pub fee_paying_account: ObjectId,
	pub order: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOrderUpdateOp {
	pub funding_account: ObjectId,
	pub delta_collateral: Amount,
	pub collateral_asset: ObjectId,
	pub delta_debt: Amount,
	pub debt_asset: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetForceSettleOp {
	pub account: ObjectId,
	pub asset: ObjectId,
	pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetGlobalSettleOp {
	pub issuer: ObjectId,
	pub asset: ObjectId,
	pub settle_price: Price,
}

/// `spec.md` §4.D, "Global settlement revival": issuer-initiated, fills
/// every queued [`CollateralBid`](crate::CollateralBid) against the
/// globally-settled supply of `asset` and clears its settlement state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReviveOp {
	pub issuer: ObjectId,
	pub asset: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidCollateralOp {
	pub bidder: ObjectId,
	pub asset: ObjectId,
	pub additional_collateral: Amount,
	pub debt_covered: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPublishFeedOp {
	pub publisher: ObjectId,
	pub asset: ObjectId,
	pub feed: PriceFeed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCreateOp {
	pub fee_paying_account: ObjectId,
	pub expiration_time: BlockTime,
	pub proposed_ops: Vec<Operation>,
	pub review_period_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalUpdateOp {
	pub fee_paying_account: ObjectId,
	pub proposal: ObjectId,
	pub active_approvals_to_add: Vec<ObjectId>,
	pub active_approvals_to_remove: Vec<ObjectId>,
	pub owner_approvals_to_add: Vec<ObjectId>,
	pub owner_approvals_to_remove: Vec<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDeleteOp {
	pub fee_paying_account: ObjectId,
	pub using_owner_authority: bool,
	pub proposal: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessCreateOp {
	pub witness_account: ObjectId,
	pub signing_key: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessUpdateOp {
	pub witness: ObjectId,
	pub new_signing_key: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMemberCreateOp {
	pub committee_member_account: ObjectId,
	pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMemberUpdateOp {
	pub committee_member: ObjectId,
	pub new_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCreateOp {
	pub owner: ObjectId,
	pub work_begin: BlockTime,
	pub work_end: BlockTime,
	pub daily_pay: Amount,
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingBalanceCreateOp {
	pub creator: ObjectId,
	pub owner: ObjectId,
	pub amount: Amount,
	pub asset: ObjectId,
	pub policy: VestingPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingBalanceWithdrawOp {
	pub vesting_balance: ObjectId,
	pub owner: ObjectId,
	pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceClaimOp {
	pub deposit_to_account: ObjectId,
	pub balance_owner_key: Vec<u8>,
	pub balance_id: ObjectId,
	pub total_claimed: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawPermissionCreateOp {
	pub withdraw_from_account: ObjectId,
	pub authorized_account: AuthorizedSpender,
	pub withdrawal_limit: Amount,
	pub asset: ObjectId,
	pub withdrawal_period_sec: u64,
	pub periods_until_expiration: u32,
	pub period_start_time: BlockTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawPermissionUpdateOp {
	pub withdraw_from_account: ObjectId,
	pub permission_to_update: ObjectId,
	pub authorized_account: AuthorizedSpender,
	pub withdrawal_limit: Amount,
	pub withdrawal_period_sec: u64,
	pub periods_until_expiration: u32,
	pub period_start_time: BlockTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawPermissionClaimOp {
	pub withdraw_permission: ObjectId,
	pub withdraw_from_account: ObjectId,
	pub withdraw_to_account: ObjectId,
	pub amount_to_withdraw: Amount,
	pub asset: ObjectId,
	pub memo: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawPermissionDeleteOp {
	pub withdraw_from_account: ObjectId,
	pub withdraw_permission: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
	Transfer(TransferOp),
	AccountCreate(AccountCreateOp),
	AccountUpdate(AccountUpdateOp),
	AssetCreate(AssetCreateOp),
	AssetUpdate(AssetUpdateOp),
	AssetIssue(AssetIssueOp),
	AssetReserve(AssetReserveOp),
	LimitOrderCreate(LimitOrderCreateOp),
	LimitOrderCancel(LimitOrderCancelOp),
	CallOrderUpdate(CallOrderUpdateOp),
	AssetForceSettle(AssetForceSettleOp),
	AssetGlobalSettle(AssetGlobalSettleOp),
	AssetRevive(AssetReviveOp),
	BidCollateral(BidCollateralOp),
	AssetPublishFeed(AssetPublishFeedOp),
	ProposalCreate(ProposalCreateOp),
	ProposalUpdate(ProposalUpdateOp),
	ProposalDelete(ProposalDeleteOp),
	WitnessCreate(WitnessCreateOp),
	WitnessUpdate(WitnessUpdateOp),
	CommitteeMemberCreate(CommitteeMemberCreateOp),
	CommitteeMemberUpdate(CommitteeMemberUpdateOp),
	WorkerCreate(WorkerCreateOp),
	VestingBalanceCreate(VestingBalanceCreateOp),
	VestingBalanceWithdraw(VestingBalanceWithdrawOp),
	BalanceClaim(BalanceClaimOp),
	WithdrawPermissionCreate(WithdrawPermissionCreateOp),
	WithdrawPermissionUpdate(WithdrawPermissionUpdateOp),
	WithdrawPermissionClaim(WithdrawPermissionClaimOp),
	WithdrawPermissionDelete(WithdrawPermissionDeleteOp),
}

impl Operation {
	/// The accounts whose authority this operation requires, per the
	/// per-variant declarations `spec.md` §4.B item 1 asks for. Owner-only
	/// operations (account owner update) are the exception; everything
	/// else is active-authority.
	pub fn required_authorities(&self) -> RequiredAuthorities {
		match self {
			Operation::Transfer(op) => RequiredAuthorities::active_only([op.from]),
			Operation::AccountCreate(op) => RequiredAuthorities::active_only([op.registrar]),
			Operation::AccountUpdate(op) => RequiredAuthorities::owner_only([op.account]),
			Operation::AssetCreate(op) => RequiredAuthorities::active_only([op.issuer]),
			Operation::AssetUpdate(op) => RequiredAuthorities::active_only([op.issuer]),
			Operation::AssetIssue(op) => RequiredAuthorities::active_only([op.issuer]),
			Operation::AssetReserve(op) => RequiredAuthorities::active_only([op.payer]),
			Operation::LimitOrderCreate(op) => RequiredAuthorities::active_only([op.seller]),
			Operation::LimitOrderCancel(op) => {
				RequiredAuthorities::active_only([op.fee_paying_account])
			}
			Operation::CallOrderUpdate(op) => {
				RequiredAuthorities::active_only([op.funding_account])
			}
			Operation::AssetForceSettle(op) => RequiredAuthorities::active_only([op.account]),
			Operation::AssetGlobalSettle(op) => RequiredAuthorities::active_only([op.issuer]),
			Operation::AssetRevive(op) => RequiredAuthorities::active_only([op.issuer]),
			Operation::BidCollateral(op) => RequiredAuthorities::active_only([op.bidder]),
			Operation::AssetPublishFeed(op) => RequiredAuthorities::active_only([op.publisher]),
			Operation::ProposalCreate(op) => {
				RequiredAuthorities::active_only([op.fee_paying_account])
			}
			Operation::ProposalUpdate(op) => {
				RequiredAuthorities::active_only([op.fee_paying_account])
			}
			Operation::ProposalDelete(op) => {
				if op.using_owner_authority {
					RequiredAuthorities::owner_only([op.fee_paying_account])
				} else {
					RequiredAuthorities::active_only([op.fee_paying_account])
				}
			}
			Operation::WitnessCreate(op) => RequiredAuthorities::active_only([op.witness_account]),
			Operation::WitnessUpdate(_) => {
				RequiredAuthorities::active_only([crate::ids::committee_account()])
			}
			Operation::CommitteeMemberCreate(op) => {
				RequiredAuthorities::active_only([op.committee_member_account])
			}
			Operation::CommitteeMemberUpdate(_) => {
				RequiredAuthorities::active_only([crate::ids::committee_account()])
			}
			Operation::WorkerCreate(op) => RequiredAuthorities::active_only([op.owner]),
			Operation::VestingBalanceCreate(op) => RequiredAuthorities::active_only([op.creator]),
			Operation::VestingBalanceWithdraw(op) => {
				RequiredAuthorities::active_only([op.owner])
			}
			Operation::BalanceClaim(op) => {
				RequiredAuthorities::active_only([op.deposit_to_account])
			}
			Operation::WithdrawPermissionCreate(op) => {
				RequiredAuthorities::active_only([op.withdraw_from_account])
			}
			Operation::WithdrawPermissionUpdate(op) => {
				RequiredAuthorities::active_only([op.withdraw_from_account])
			}
			Operation::WithdrawPermissionClaim(op) => {
				RequiredAuthorities::active_only([op.withdraw_to_account])
			}
			Operation::WithdrawPermissionDelete(op) => {
				RequiredAuthorities::active_only([op.withdraw_from_account])
			}
		}
	}
}

/// A public key or legacy-address signature over a transaction's digest,
/// 65 bytes compact-recoverable ECDSA per `spec.md` §6. Kept as raw bytes
/// here; recovery lives in the `authority` crate, the only place that
/// needs `secp256k1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactSignature(pub [u8; 65]);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
	pub reference_block_num: u16,
	pub reference_block_prefix: u32,
	pub expiration: BlockTime,
	pub operations: Vec<Operation>,
	pub signatures: Vec<CompactSignature>,
}

impl Transaction {
	pub fn required_authorities(&self) -> RequiredAuthorities {
		let mut combined = RequiredAuthorities::default();
		for op in &self.operations {
			let req = op.required_authorities();
			combined.active.extend(req.active);
			combined.owner.extend(req.owner);
		}
		combined
	}
}
