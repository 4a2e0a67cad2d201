use primitives::ObjectId;
use thiserror::Error;

use crate::session::SessionId;

/// Deterministic store errors (`spec.md` §4.A: "all store errors are
/// deterministic (duplicate key, absent id, invariant violation). No I/O.").
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
	#[error("object {0} not found")]
	NotFound(ObjectId),
	#[error("create would duplicate an existing unique index key (candidate id {0})")]
	DuplicateKey(ObjectId),
	#[error("modify callback changed the object's id from {0}")]
	IdentityChanged(ObjectId),
	#[error("session {0:?} is not the current top of the undo stack")]
	NotTopSession(SessionId),
	#[error("no parent session to merge {0:?} into")]
	NoParentSession(SessionId),
}
