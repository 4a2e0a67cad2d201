//! Limit order book matching, margin calls, force settlement and global
//! settlement/revival for market-issued assets (`spec.md` §4.D, *Market
//! Engine*). Every function here takes a `&mut object_store::Store` and
//! returns the [`chain_objects::VirtualOp`]s it emitted; none of them open
//! their own undo session — a caller that needs all-or-nothing semantics
//! across several of these calls wraps them in one
//! `Store::start_undo_session`/`undo` pair itself (`spec.md` §4.A).

pub mod book;
pub mod error;
pub mod fees;
pub mod force_settlement;
pub mod fund;
pub mod margin;
pub mod revival;

pub use book::{apply_order, cancel_and_refund};
pub use error::MarketError;
pub use force_settlement::process_matured_settlements;
pub use margin::{check_call_orders, check_call_orders_for_pair, settle_market};
pub use revival::revive_market;
