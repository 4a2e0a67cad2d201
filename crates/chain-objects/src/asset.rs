use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use primitives::{Amount, ObjectId, Price};

/// A tiny, dependency-free bitmask macro matching the "bitmask over a
/// handful of named flags" shape used throughout the Market Engine and
/// Asset evaluators, without pulling in the `bitflags` crate for a single
/// enum's worth of bits.
macro_rules! bitflags_like {
	(
		$(#[$meta:meta])*
		pub struct $name:ident: $repr:ty {
			$(const $variant:ident = $value:expr;)*
		}
	) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
		pub struct $name(pub $repr);

		impl $name {
			$(pub const $variant: $name = $name($value);)*

			pub const NONE: $name = $name(0);

			pub fn contains(self, other: $name) -> bool {
				self.0 & other.0 == other.0
			}

			pub fn union(self, other: $name) -> $name {
				$name(self.0 | other.0)
			}

			pub fn is_subset_of(self, other: $name) -> bool {
				self.0 & !other.0 == 0
			}
		}

		impl std::ops::BitOr for $name {
			type Output = $name;
			fn bitor(self, rhs: $name) -> $name {
				self.union(rhs)
			}
		}
	};
}

bitflags_like! {
	/// Bitmask over the asset behaviours named in `spec.md` §4.C. Modeled
	/// as a plain `u16` bitmask (rather than pulling in the `bitflags`
	/// crate) with named `const`s, mirroring how the source treats these
	/// as a raw integer with symbolic bit positions.
	pub struct AssetFlags: u16 {
		const CHARGE_MARKET_FEE    = 1 << 0;
		const WHITE_LIST           = 1 << 1;
		const OVERRIDE_AUTHORITY   = 1 << 2;
		const TRANSFER_RESTRICTED  = 1 << 3;
		const DISABLE_FORCE_SETTLE = 1 << 4;
		const GLOBAL_SETTLE        = 1 << 5;
		const WITNESS_FED_ASSET    = 1 << 6;
		const COMMITTEE_FED_ASSET  = 1 << 7;
		const MARKET_ISSUED        = 1 << 8;
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetOptions {
	pub max_supply: Amount,
	pub flags: AssetFlags,
	pub issuer_permissions: AssetFlags,
	pub market_fee_percent: u16,
	pub max_market_fee: Amount,
	pub core_exchange_rate: Option<Price>,
	pub whitelist_authorities: Vec<ObjectId>,
	pub blacklist_authorities: Vec<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
	pub id: ObjectId,
	pub symbol: String,
	pub precision: u8,
	pub issuer: ObjectId,
	pub options: AssetOptions,
	pub dynamic_data: ObjectId,
	pub bitasset_data: Option<ObjectId>,
}

impl Asset {
	pub fn is_market_issued(&self) -> bool {
		self.bitasset_data.is_some()
	}

	pub fn charges_market_fee(&self) -> bool {
		self.options.flags.contains(AssetFlags::CHARGE_MARKET_FEE)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AssetDynamicData {
	pub id: ObjectId,
	pub asset: ObjectId,
	pub current_supply: Amount,
	pub accumulated_fees: Amount,
}

/// One producer's feed submission: the raw input to the median aggregation
/// in [`BitassetData::current_feed`] (`spec.md` §4.C, Publish price feed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFeed {
	pub settlement_price: Price,
	pub maintenance_collateral_ratio_bps: u16,
	pub max_short_squeeze_ratio_bps: u16,
}

impl PriceFeed {
	/// The price above which a call order is protected from a margin call
	/// (`spec.md` §4.D, `check_call_orders` step 4): the settlement price
	/// scaled by the max short-squeeze ratio.
	pub fn max_short_squeeze_price(&self) -> Result<Price, primitives::PriceError> {
		let base = self.settlement_price.base;
		let scaled_quote_amount = (self.settlement_price.quote.amount.0 as i128)
			* (self.max_short_squeeze_ratio_bps as i128)
			/ 1000;
		let quote_amount = i64::try_from(scaled_quote_amount)
			.map_err(|_| primitives::PriceError::Overflow)?;
		Price::new(
			base,
			primitives::AssetAmount::new(self.settlement_price.quote.asset_id, Amount(quote_amount)),
		)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedOptions {
	pub force_settle_offset_percent: u16,
	pub force_settle_delay_seconds: u64,
	pub minimum_feeds: u8,
}

/// Backing data for a market-issued asset (`spec.md` §3, BitassetData
/// entity). `settlement_price` is `Some` iff the asset is globally settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitassetData {
	pub id: ObjectId,
	pub asset: ObjectId,
	pub backing_asset: ObjectId,
	pub feeds: BTreeMap<ObjectId, (primitives::BlockTime, PriceFeed)>,
	pub current_feed: Option<PriceFeed>,
	pub options: FeedOptions,
	pub settlement_price: Option<Price>,
	pub settlement_fund: Amount,
}

impl BitassetData {
	pub fn is_globally_settled(&self) -> bool {
		self.settlement_price.is_some()
	}
}
