//! Recursive multi-sig authority resolution (`spec.md` §4.B): given a
//! signed transaction and a set of available keys, compute the minimal
//! signing set that satisfies every required authority, and verify
//! supplied signatures against the chain's secp256k1 wire format.

mod digest;
mod error;
mod resolver;

pub use digest::signing_digest;
pub use error::AuthorityError;
pub use resolver::{AuthorityResolver, KeyBytes};
