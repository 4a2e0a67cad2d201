use primitives::{ObjectId, Space};

/// Per-type discriminants within [`Space::Protocol`], assigned densely
/// starting at zero the way the source protocol numbers its object types
/// (`spec.md` §3: `(space, type, instance)`).
pub mod protocol {
	pub const ACCOUNT: u8 = 1;
	pub const ASSET: u8 = 2;
	pub const COMMITTEE_MEMBER: u8 = 3;
	pub const WITNESS: u8 = 4;
	pub const LIMIT_ORDER: u8 = 5;
	pub const CALL_ORDER: u8 = 6;
	pub const PROPOSAL: u8 = 7;
	pub const WITHDRAW_PERMISSION: u8 = 8;
	pub const VESTING_BALANCE: u8 = 9;
	pub const WORKER: u8 = 10;
}

/// Per-type discriminants within [`Space::Implementation`]: companion
/// objects that are never directly user-addressed as "the object", only
/// reached via a pointer on a protocol object.
pub mod implementation {
	pub const ASSET_DYNAMIC_DATA: u8 = 1;
	pub const BITASSET_DATA: u8 = 2;
	pub const ACCOUNT_BALANCE: u8 = 3;
	pub const ACCOUNT_STATISTICS: u8 = 4;
	pub const FORCE_SETTLEMENT: u8 = 5;
	pub const COLLATERAL_BID: u8 = 6;
	pub const BLOCK_SUMMARY: u8 = 7;
}

pub const fn protocol_id(type_id: u8, instance: u64) -> ObjectId {
	ObjectId::new(Space::Protocol, type_id, instance)
}

/// The committee account (`spec.md` §4.B): reserved at instance zero of
/// [`protocol::ACCOUNT`], created before any other account at genesis.
/// `WitnessUpdate`/`CommitteeMemberUpdate` name it as their required
/// active authority rather than any particular user account, since
/// nobody signs for it directly — it is only ever exercised through the
/// proposal mechanism.
pub const fn committee_account() -> ObjectId {
	protocol_id(protocol::ACCOUNT, 0)
}

pub const fn implementation_id(type_id: u8, instance: u64) -> ObjectId {
	ObjectId::new(Space::Implementation, type_id, instance)
}
