use primitives::{ObjectId, OverflowError, PriceError};
use thiserror::Error;

/// The *Order-book* error kind of `spec.md` §7, plus the store/arithmetic
/// failures matching can surface while it walks the books.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarketError {
	#[error(transparent)]
	Store(#[from] object_store::StoreError),
	#[error(transparent)]
	Price(#[from] PriceError),
	#[error(transparent)]
	Overflow(#[from] OverflowError),
	#[error("object {0} is not the expected type for this market operation")]
	WrongObjectType(ObjectId),
	#[error("asset {0} is not a market-issued asset")]
	NotMarketIssued(ObjectId),
	#[error("asset {0} has no usable current price feed")]
	NoCurrentFeed(ObjectId),
	#[error("asset {0} is already globally settled")]
	AlreadyGloballySettled(ObjectId),
	#[error("asset {0} is not globally settled")]
	NotGloballySettled(ObjectId),
	#[error("asset {0} has force-settlement disabled")]
	ForceSettleDisabled(ObjectId),
	#[error("call order {0} would remain open but unfilled with no matching bid to cover it")]
	CallOrderUnfillable(ObjectId),
	#[error("insufficient balance for account {0}")]
	InsufficientBalance(ObjectId),
	#[error("collateral bids for asset {0} do not cover the full supply; revival aborted")]
	RevivalIncomplete(ObjectId),
}
