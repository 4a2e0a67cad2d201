//! The block processor (`spec.md` §4.E, *Block Processor*): pending
//! transaction pool, block assembly and sealing, the fork database and
//! reorg logic, and the periodic maintenance interval. [`Chain`] is the
//! single root every other crate's state hangs off of, per Design Note
//! §9's "model global mutable singletons as owned fields on a single
//! `Chain` root".

mod block;
mod chain;
mod error;
mod fork_db;
mod maintenance;
mod merkle;
mod notifications;
mod parameters;
mod pool;

pub use block::{compute_merkle_root, BlockHeader, BlockId, SignedBlock};
pub use chain::{witness_signing_digest, Chain};
pub use error::ChainError;
pub use fork_db::{ForkDatabase, GENESIS_PARENT};
pub use maintenance::MaintenanceSchedule;
pub use notifications::{ChangeNotification, Notifier};
pub use parameters::{ChainParameters, FeeSchedule};
pub use pool::{PendingPool, PendingTransaction};
