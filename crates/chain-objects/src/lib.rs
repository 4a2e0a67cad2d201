//! Entity definitions for every object the chain core's store can hold
//! (`spec.md` §3), plus the `Operation`/`Transaction` wire model the
//! authority resolver and evaluators both operate over.

pub mod account;
pub mod asset;
pub mod balance;
pub mod block;
pub mod ids;
pub mod market;
pub mod object;
pub mod operation;
pub mod proposal;
pub mod vesting;
pub mod virtual_op;
pub mod withdraw_permission;
pub mod witness;

pub use account::{Account, AccountOptions, AccountStatistics, Authority, KeyOrAddress};
pub use asset::{
	Asset, AssetDynamicData, AssetFlags, AssetOptions, BitassetData, FeedOptions, PriceFeed,
};
pub use balance::AccountBalance;
pub use block::BlockSummary;
pub use market::{CallOrder, CollateralBid, ForceSettlement, LimitOrder};
pub use object::Object;
pub use operation::{
	AccountCreateOp, AccountUpdateOp, AssetCreateBitassetOpts, AssetCreateOp, AssetForceSettleOp,
	AssetGlobalSettleOp, AssetIssueOp, AssetPublishFeedOp, AssetReserveOp, AssetReviveOp, AssetUpdateOp,
	BalanceClaimOp, BidCollateralOp, CallOrderUpdateOp, CommitteeMemberCreateOp,
	CommitteeMemberUpdateOp, CompactSignature, LimitOrderCancelOp, LimitOrderCreateOp, Operation,
	ProposalCreateOp, ProposalDeleteOp, ProposalUpdateOp, RequiredAuthorities, Transaction,
	TransferOp, VestingBalanceCreateOp, VestingBalanceWithdrawOp, WithdrawPermissionClaimOp,
	WithdrawPermissionCreateOp, WithdrawPermissionDeleteOp, WithdrawPermissionUpdateOp,
	WitnessCreateOp, WitnessUpdateOp, WorkerCreateOp,
};
pub use proposal::Proposal;
pub use vesting::{VestingBalance, VestingPolicy};
pub use virtual_op::VirtualOp;
pub use withdraw_permission::{AuthorizedSpender, WithdrawPermission};
pub use witness::{CommitteeMember, Witness, Worker};
