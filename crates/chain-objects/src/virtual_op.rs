use serde::{Deserialize, Serialize};

use primitives::{AssetAmount, ObjectId};

/// A side-effect emitted by an evaluator or by the market engine that is
/// not itself a top-level [`crate::Operation`] but is recorded alongside
/// the transaction for introspection (`spec.md` §4.C: "emits operation
/// results and virtual operations"; GLOSSARY: "Operation result").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VirtualOp {
	FillOrder {
		order: ObjectId,
		account: ObjectId,
		pays: AssetAmount,
		receives: AssetAmount,
		fee: AssetAmount,
		is_maker: bool,
	},
	AssetSettle {
		settlement: ObjectId,
		account: ObjectId,
		paid: AssetAmount,
	},
	CallOrderClosed {
		order: ObjectId,
		borrower: ObjectId,
	},
	GlobalSettle {
		asset: ObjectId,
		settle_price: primitives::Price,
	},
	Revived {
		asset: ObjectId,
	},
}
