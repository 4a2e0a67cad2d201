//! The in-memory object store (`spec.md` §4.A): typed, multi-indexed
//! storage with O(log n) lookups on any declared index and nested undo
//! sessions for rollback and fork-switching.

mod error;
mod index;
mod price_key;
mod session;
mod store;

pub use chain_objects::Object;
pub use error::StoreError;
pub use index::{
	AccountBalanceIndex, AccountIndex, AssetIndex, CallOrderIndex, CollateralBidIndex,
	ForceSettlementIndex, Indices, LimitOrderIndex, ProposalIndex, WithdrawPermissionIndex,
};
pub use price_key::{PriceKey, PriceKeyDesc, RatioKeyDesc};
pub use session::SessionId;
pub use store::Store;
