use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Instance;

/// Partitions protocol-visible objects (accounts, assets, orders, ...) from
/// implementation-detail objects (dynamic-data companions, history, ...).
///
/// Mirrors the `protocol_ids`/`implementation_ids` split `spec.md` §3
/// describes; kept as an explicit two-variant enum rather than a raw `u8` so
/// that an out-of-range space is a compile error, not a runtime one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Space {
	Protocol = 1,
	Implementation = 2,
}

impl Space {
	pub fn as_u8(self) -> u8 {
		self as u8
	}
}

impl TryFrom<u8> for Space {
	type Error = IdParseError;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			1 => Ok(Space::Protocol),
			2 => Ok(Space::Implementation),
			other => Err(IdParseError::UnknownSpace(other)),
		}
	}
}

/// `(space, type, instance)` — the globally unique, stable identity of every
/// object in the store. Identity never changes across an object's lifetime;
/// all cross-object references go through this id, never through a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId {
	pub space: Space,
	pub type_id: u8,
	pub instance: Instance,
}

impl ObjectId {
	pub const fn new(space: Space, type_id: u8, instance: Instance) -> Self {
		Self { space, type_id, instance }
	}

	/// The id immediately preceding this one within the same `(space, type)`,
	/// used by the store to find "the last object of this type" without a
	/// dedicated cursor.
	pub fn with_instance(self, instance: Instance) -> Self {
		Self { instance, ..self }
	}
}

impl fmt::Display for ObjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}.{}", self.space.as_u8(), self.type_id, self.instance)
	}
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdParseError {
	#[error("malformed object id (expected space.type.instance): {0}")]
	Malformed(String),
	#[error("unknown object space {0}")]
	UnknownSpace(u8),
	#[error("invalid integer component in object id: {0}")]
	BadInteger(String),
}

impl FromStr for ObjectId {
	type Err = IdParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut parts = s.split('.');
		let (Some(space), Some(type_id), Some(instance), None) =
			(parts.next(), parts.next(), parts.next(), parts.next())
		else {
			return Err(IdParseError::Malformed(s.to_string()));
		};
		let space: u8 =
			space.parse().map_err(|_| IdParseError::BadInteger(space.to_string()))?;
		let type_id: u8 =
			type_id.parse().map_err(|_| IdParseError::BadInteger(type_id.to_string()))?;
		let instance: Instance =
			instance.parse().map_err(|_| IdParseError::BadInteger(instance.to_string()))?;
		Ok(ObjectId { space: Space::try_from(space)?, type_id, instance })
	}
}
