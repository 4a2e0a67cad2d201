use chain_objects::VirtualOp;
use primitives::ObjectId;
use tokio::sync::broadcast;

use crate::block::BlockId;

/// Everything the block processor publishes for external subscribers —
/// wallets, indexers, the `node` binary's own logging (`spec.md` §6,
/// "Callbacks": "notifies registered callbacks of created/changed/removed
/// object ids and of newly applied/undone blocks").
#[derive(Debug, Clone)]
pub enum ChangeNotification {
	ObjectCreated(ObjectId),
	ObjectChanged(ObjectId),
	ObjectRemoved(ObjectId),
	VirtualOp(VirtualOp),
	AppliedBlock { id: BlockId, block_num: u32 },
	UndoneBlock { id: BlockId, block_num: u32 },
}

/// Thin wrapper over a [`broadcast::Sender`] so `Chain` owns one channel
/// and callers subscribe without reaching into `tokio` themselves
/// (`SPEC_FULL.md` §3: "modeled with `tokio::sync::broadcast`... a lagging
/// subscriber misses notifications rather than blocking the writer").
#[derive(Debug, Clone)]
pub struct Notifier {
	sender: broadcast::Sender<ChangeNotification>,
}

impl Notifier {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotification> {
		self.sender.subscribe()
	}

	/// Broadcasts `notification`; a channel with no subscribers (or one
	/// where every receiver has been dropped) is not an error — the send
	/// result is simply discarded.
	pub fn publish(&self, notification: ChangeNotification) {
		let _ = self.sender.send(notification);
	}
}

impl Default for Notifier {
	fn default() -> Self {
		Self::new(1024)
	}
}
