use primitives::{NameError, ObjectId, OverflowError, PriceError};
use thiserror::Error;

/// Every way `validate`/`do_evaluate`/`do_apply` can reject an operation
/// (`spec.md` §4.C). Named, structured variants in the style of
/// `engine/multisig`'s `SigningFailureReason`/`KeygenFailureReason`, rather
/// than one untyped string — callers match on the kind, not the message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvaluatorError {
	#[error(transparent)]
	Store(#[from] object_store::StoreError),
	#[error(transparent)]
	Market(#[from] market_engine::MarketError),
	#[error(transparent)]
	Price(#[from] PriceError),
	#[error(transparent)]
	Overflow(#[from] OverflowError),
	#[error(transparent)]
	Name(#[from] NameError),

	#[error("object {0} is not the expected type for this operation")]
	WrongObjectType(ObjectId),
	#[error("insufficient balance for account {0}")]
	InsufficientBalance(ObjectId),
	#[error("asset {0} is not authorized to transfer to or from account {1} (whitelist)")]
	NotWhitelisted(ObjectId, ObjectId),
	#[error("asset {0} is transfer-restricted and neither party is the issuer")]
	TransferRestricted(ObjectId),
	#[error("account authority exceeds the maximum membership of {0} (has {1})")]
	AuthorityTooLarge(u16, usize),
	#[error("issuer permissions for asset {0} must be a superset of its flags")]
	IssuerPermissionsNotSuperset(ObjectId),
	#[error("asset {0} may not widen issuer_permissions after creation")]
	IssuerPermissionsWidened(ObjectId),
	#[error("asset {0} is market-issued and cannot be reserved")]
	ReserveOfMarketIssued(ObjectId),
	#[error("issuing {1} of asset {0} would exceed max_supply")]
	ExceedsMaxSupply(ObjectId, i64),
	#[error("asset {0} does not have the bitasset flag / backing required for this operation")]
	NotMarketIssued(ObjectId),
	#[error("asset {0} does not have global_settle enabled")]
	GlobalSettleDisabled(ObjectId),
	#[error("asset {0} is already globally settled")]
	AlreadyGloballySettled(ObjectId),
	#[error("asset {0} is not globally settled")]
	NotGloballySettled(ObjectId),
	#[error("asset {0} has force-settlement disabled")]
	ForceSettleDisabled(ObjectId),
	#[error("the resulting call-order position for account {0} is under-collateralized")]
	InsufficientCollateral(ObjectId),
	#[error("proposal {0}'s nested operations require committee/witness authority but review_period_seconds is below the chain minimum")]
	ReviewPeriodTooShort(ObjectId),
	#[error("approval for account {0} rejected: not in the proposed transaction's required authority set")]
	NotARequiredApprover(ObjectId),
	#[error("proposal {0} is past its review-period-time; approvals may no longer be updated")]
	ProposalInReview(ObjectId),
	#[error("operation requires committee authority and may only run through the proposal mechanism")]
	CommitteeAuthorityRequiresProposal,
	#[error("vesting balance {0}: withdrawal of {1} exceeds the allowed vested amount")]
	ExceedsAllowedWithdraw(ObjectId, i64),
	#[error("balance claim for key does not match balance object {0}'s owning key")]
	KeyMismatch(ObjectId),
	#[error("vesting genesis balance {0} is still within its lockup period")]
	StillLockedUp(ObjectId),
	#[error("withdraw permission {0} does not authorize claimant {1}")]
	NotAuthorizedSpender(ObjectId, ObjectId),
	#[error("withdraw permission {0} claim attempted before its period start")]
	ClaimBeforePeriodStart(ObjectId),
	#[error("withdraw permission {0} claim of {1} exceeds the period's remaining allowance")]
	ExceedsPeriodAllowance(ObjectId, i64),
	#[error("withdraw permission {0} has expired")]
	PermissionExpired(ObjectId),
	#[error("transfer amount must be non-zero")]
	ZeroAmount,
	#[error("transfer from and to must be distinct accounts")]
	SelfTransfer,
}
