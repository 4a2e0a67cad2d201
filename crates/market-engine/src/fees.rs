use chain_objects::Asset;
use primitives::Amount;

/// `trade_asset.market_fee_percent * received`, capped at `max_market_fee`,
/// charged only when `charge_market_fee` is set (`spec.md` §4.D, Market
/// fees). `market_fee_percent` is expressed in basis points of 1% (i.e.
/// out of 10_000) to match the precision `max_market_fee` and
/// `core_exchange_rate` are already carried at.
pub fn market_fee(asset: &Asset, received: Amount) -> Amount {
	if !asset.charges_market_fee() || received.is_zero() {
		return Amount::ZERO;
	}
	let fee = received
		.mul_ratio(asset.options.market_fee_percent as i64, 10_000)
		.unwrap_or(asset.options.max_market_fee);
	if fee.0 > asset.options.max_market_fee.0 {
		asset.options.max_market_fee
	} else {
		fee
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chain_objects::{AssetFlags, AssetOptions};
	use primitives::{ObjectId, Space};

	fn asset_with_fee(percent: u16, max_fee: i64) -> Asset {
		Asset {
			id: ObjectId::new(Space::Protocol, 2, 0),
			symbol: "USD".to_string(),
			precision: 4,
			issuer: ObjectId::new(Space::Protocol, 1, 0),
			options: AssetOptions {
				max_supply: Amount(1_000_000),
				flags: AssetFlags::CHARGE_MARKET_FEE,
				issuer_permissions: AssetFlags::CHARGE_MARKET_FEE,
				market_fee_percent: percent,
				max_market_fee: Amount(max_fee),
				core_exchange_rate: None,
				whitelist_authorities: vec![],
				blacklist_authorities: vec![],
			},
			dynamic_data: ObjectId::new(Space::Implementation, 1, 0),
			bitasset_data: None,
		}
	}

	#[test]
	fn charges_percent_of_received_capped_at_max() {
		let asset = asset_with_fee(100, 5); // 1%, capped at 5
		assert_eq!(market_fee(&asset, Amount(100)), Amount(1));
		assert_eq!(market_fee(&asset, Amount(10_000)), Amount(5));
	}

	#[test]
	fn no_fee_when_flag_unset() {
		let mut asset = asset_with_fee(100, 1000);
		asset.options.flags = primitives_flags_none();
		assert_eq!(market_fee(&asset, Amount(100)), Amount::ZERO);
	}

	fn primitives_flags_none() -> AssetFlags {
		AssetFlags::NONE
	}
}
