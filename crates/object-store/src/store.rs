use std::collections::BTreeMap;

use chain_objects::Object;
use primitives::{Instance, ObjectId, Space};

use crate::error::StoreError;
use crate::index::Indices;
use crate::session::{Session, SessionId, UndoAction};
use tracing::warn;

/// Typed, id-addressed, multi-indexed in-memory store with nested undo
/// sessions (`spec.md` §4.A). Not thread-safe: exactly one writer at a
/// time, matching the single-writer concurrency model of `spec.md` §5 —
/// callers are expected to guard a `Store` behind the `RwLock` described
/// there rather than share `&mut Store` across tasks.
#[derive(Debug, Default)]
pub struct Store {
	objects: BTreeMap<ObjectId, Object>,
	next_instance: BTreeMap<(Space, u8), Instance>,
	indices: Indices,
	undo_stack: Vec<Session>,
}

impl Store {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn indices(&self) -> &Indices {
		&self.indices
	}

	/// The instance that the next object of `(space, type_id)` will
	/// receive, without allocating it — used by evaluators that must embed
	/// a not-yet-created id inside a sibling object (e.g. an account
	/// referencing its own not-yet-created statistics object).
	pub fn peek_next_instance(&self, space: Space, type_id: u8) -> Instance {
		*self.next_instance.get(&(space, type_id)).unwrap_or(&0)
	}

	pub fn find(&self, id: ObjectId) -> Option<&Object> {
		self.objects.get(&id)
	}

	pub fn get(&self, id: ObjectId) -> Result<&Object, StoreError> {
		self.find(id).ok_or(StoreError::NotFound(id))
	}

	/// Allocates the next `(space, type_id)` instance, builds the object
	/// from it, and inserts it — failing without allocating the instance
	/// if doing so would duplicate an existing unique index key, so a
	/// failed create never leaves a gap in the dense instance sequence
	/// (`spec.md` §3 invariant 6).
	pub fn create(
		&mut self,
		space: Space,
		type_id: u8,
		build: impl FnOnce(ObjectId) -> Object,
	) -> Result<ObjectId, StoreError> {
		let instance = self.peek_next_instance(space, type_id);
		let id = ObjectId::new(space, type_id, instance);
		let object = build(id);
		assert_eq!(object.id(), id, "create callback must build an object carrying the allocated id");
		if self.indices.would_conflict(&object) {
			return Err(StoreError::DuplicateKey(id));
		}
		self.next_instance.insert((space, type_id), instance + 1);
		self.indices.insert(&object);
		self.objects.insert(id, object);
		self.record(UndoAction::Created(id));
		Ok(id)
	}

	/// Removes the old index keys, applies `f` to a mutable copy, checks
	/// the new keys don't conflict, then installs the result and records
	/// the before-image for undo (`spec.md` §4.A, `modify` primitive).
	pub fn modify(&mut self, id: ObjectId, f: impl FnOnce(&mut Object)) -> Result<(), StoreError> {
		let before = self.get(id)?.clone();
		let mut after = before.clone();
		f(&mut after);
		assert_eq!(after.id(), id, "modify callback must not change the object's id");
		self.indices.reindex(&before, &after);
		self.objects.insert(id, after);
		self.record(UndoAction::Modified(before));
		Ok(())
	}

	pub fn remove(&mut self, id: ObjectId) -> Result<Object, StoreError> {
		let object = self.objects.remove(&id).ok_or(StoreError::NotFound(id))?;
		self.indices.remove(&object);
		self.record(UndoAction::Removed(object.clone()));
		Ok(object)
	}

	fn record(&mut self, action: UndoAction) {
		if let Some(session) = self.undo_stack.last_mut() {
			session.push(action);
		}
	}

	pub fn start_undo_session(&mut self) -> SessionId {
		self.undo_stack.push(Vec::new());
		SessionId(self.undo_stack.len() - 1)
	}

	fn expect_top(&self, session: SessionId) -> Result<(), StoreError> {
		if self.undo_stack.len().checked_sub(1) == Some(session.0) {
			Ok(())
		} else {
			warn!(?session, depth = self.undo_stack.len(), "commit/undo called on a session that is not the top of the undo stack");
			Err(StoreError::NotTopSession(session))
		}
	}

	/// Pops the session and discards its before-images: the mutations
	/// become visible to whatever session (if any) is now on top.
	pub fn commit(&mut self, session: SessionId) -> Result<(), StoreError> {
		self.expect_top(session)?;
		self.undo_stack.pop();
		Ok(())
	}

	/// Pops the session and replays its actions in reverse, returning the
	/// store to exactly the state before the session started
	/// (`spec.md` §8, "Undo correctness").
	pub fn undo(&mut self, session: SessionId) -> Result<(), StoreError> {
		self.expect_top(session)?;
		let actions = self.undo_stack.pop().expect("checked top above");
		for action in actions.into_iter().rev() {
			self.reverse(action);
		}
		Ok(())
	}

	fn reverse(&mut self, action: UndoAction) {
		match action {
			UndoAction::Created(id) => {
				if let Some(object) = self.objects.remove(&id) {
					self.indices.remove(&object);
				}
			}
			UndoAction::Removed(object) => {
				self.indices.insert(&object);
				self.objects.insert(object.id(), object);
			}
			UndoAction::Modified(prior) => {
				let id = prior.id();
				if let Some(current) = self.objects.get(&id) {
					self.indices.reindex(current, &prior);
				} else {
					self.indices.insert(&prior);
				}
				self.objects.insert(id, prior);
			}
		}
	}

	/// Collapses the top session's before-images into the one beneath it,
	/// oldest-first, so that undoing the combined session still reverses
	/// correctly (`spec.md` §4.A) — needed when a fork-switch or block
	/// commit wants to keep a block's mutations reversible while folding
	/// its session into the enclosing one.
	pub fn merge(&mut self, session: SessionId) -> Result<(), StoreError> {
		self.expect_top(session)?;
		if self.undo_stack.len() < 2 {
			return Err(StoreError::NoParentSession(session));
		}
		let top = self.undo_stack.pop().expect("checked top above");
		let below = self.undo_stack.last_mut().expect("checked len >= 2 above");
		below.extend(top);
		Ok(())
	}

	pub fn undo_depth(&self) -> usize {
		self.undo_stack.len()
	}

	/// Every object of `(space, type_id)`, in ascending instance order.
	/// `ObjectId`'s derived `Ord` sorts by `(space, type_id, instance)`, so
	/// this is a single contiguous `BTreeMap` range rather than a
	/// dedicated secondary index — used by maintenance sweeps that have no
	/// other reason to be indexed (witnesses, committee members, workers,
	/// vesting balances).
	pub fn objects_of_type(&self, space: Space, type_id: u8) -> impl Iterator<Item = &Object> {
		let start = ObjectId::new(space, type_id, 0);
		let end = ObjectId::new(space, type_id, Instance::MAX);
		self.objects.range(start..=end).map(|(_, object)| object)
	}
}
