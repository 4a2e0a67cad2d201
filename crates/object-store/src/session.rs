use chain_objects::Object;
use primitives::ObjectId;

/// A single recorded mutation, sufficient to reverse it exactly
/// (`spec.md` §4.A: "the Store records: created ids ..., removed objects
/// ..., and before-images of modified objects").
#[derive(Debug, Clone)]
pub(crate) enum UndoAction {
	Created(ObjectId),
	Removed(Object),
	Modified(Object),
}

/// Identifies a session returned by `start_undo_session`; every subsequent
/// call that touches it (`commit`, `undo`, `merge`) must name the current
/// top of the stack, enforcing the nested-stack discipline `spec.md` §4.A
/// describes without needing a borrow-holding RAII guard (the store is the
/// sole owner of the stack; sessions are plain tokens).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub(crate) usize);

pub(crate) type Session = Vec<UndoAction>;
