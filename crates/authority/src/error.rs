use primitives::ObjectId;
use thiserror::Error;

/// The closed set of authority-resolution failure kinds named in
/// `spec.md` §4.B.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorityError {
	#[error("missing active authority for account {0}")]
	MissingActiveAuth(ObjectId),
	#[error("missing owner authority for account {0}")]
	MissingOwnerAuth(ObjectId),
	#[error("signature belongs to no authority referenced by the transaction")]
	IrrelevantSignature,
	#[error("duplicate signature in transaction")]
	DuplicateSignature,
	#[error("authority recursion exceeded max_authority_depth for account {0}")]
	RecursionExceeded(ObjectId),
	#[error("referenced account {0} does not exist")]
	AccountNotFound(ObjectId),
	#[error("malformed or unrecoverable signature")]
	InvalidSignature,
}
