//! Builds a genesis [`Store`] directly from a JSON description, bypassing
//! the evaluator pipeline entirely — genesis objects have no signing
//! transaction to validate against, so there is no `Transaction` for
//! `authority`/`evaluators` to act on (`spec.md` §1, Non-goals:
//! bootstrapping is the node's job, not the core's). Each object is built
//! the same way the corresponding evaluator's `do_apply_create` does
//! (`evaluators::account::do_apply_create`, `evaluators::asset::do_apply_create`),
//! just without the authority/existence checks those evaluators run against
//! a store that doesn't exist yet.

use std::collections::BTreeMap;

use anyhow::{bail, Context};
use chain_objects::{
	ids, Account, AccountOptions, AccountStatistics, Asset, AssetDynamicData, AssetFlags,
	AssetOptions, Authority, KeyOrAddress, Object, Witness,
};
use object_store::Store;
use primitives::{Amount, BlockTime, ObjectId, Space};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GenesisAccount {
	pub name: String,
	/// Hex-encoded compressed secp256k1 public key.
	pub owner_key: String,
	pub active_key: String,
}

#[derive(Debug, Deserialize)]
pub struct GenesisAsset {
	pub symbol: String,
	pub precision: u8,
	pub issuer: String,
	pub max_supply: i64,
	#[serde(default)]
	pub initial_supply: i64,
}

#[derive(Debug, Deserialize)]
pub struct GenesisWitness {
	pub account: String,
	/// Hex-encoded compressed secp256k1 public key. The first entry is the
	/// witness this harness seals every block as (`SPEC_FULL.md` §6: no
	/// witness-scheduling surface is in scope beyond what the core needs).
	pub signing_key: String,
}

#[derive(Debug, Deserialize)]
pub struct GenesisConfig {
	/// Hex-encoded 32-byte chain id, mixed into every authority and
	/// witness signing digest (`spec.md` §4.B/§4.E).
	pub chain_id: String,
	pub genesis_time: u64,
	pub core_asset_symbol: String,
	pub accounts: Vec<GenesisAccount>,
	pub assets: Vec<GenesisAsset>,
	pub witnesses: Vec<GenesisWitness>,
}

pub struct Genesis {
	pub store: Store,
	pub chain_id: [u8; 32],
	pub genesis_time: BlockTime,
	pub core_asset: ObjectId,
	pub sealing_witness: ObjectId,
	pub sealing_witness_signing_key: Vec<u8>,
}

pub fn build(config: &GenesisConfig) -> anyhow::Result<Genesis> {
	let chain_id = parse_chain_id(&config.chain_id)?;
	let mut store = Store::new();
	let mut accounts_by_name: BTreeMap<&str, ObjectId> = BTreeMap::new();

	// The committee account must be the very first `Account` object so it
	// lands at the reserved instance `ids::committee_account()` names
	// (`spec.md` §4.B). It starts with no authority at all — nobody signs
	// for it directly — and gains one only once a first committee exists
	// to back it (`maintenance::run_maintenance` recomputes it every pass).
	let committee_statistics = store.create(Space::Implementation, ids::implementation::ACCOUNT_STATISTICS, |id| {
		Object::AccountStatistics(AccountStatistics { id, owner: id, total_ops: 0, most_recent_op: None })
	})?;
	let committee_account_id = store.create(Space::Protocol, ids::protocol::ACCOUNT, |id| {
		Object::Account(Account {
			id,
			name: "committee-account".to_string(),
			owner: Authority::default(),
			active: Authority::default(),
			options: AccountOptions::default(),
			registrar: id,
			lifetime_member: true,
			statistics: committee_statistics,
		})
	})?;
	store.modify(committee_statistics, |o| o.as_account_statistics_mut().unwrap().owner = committee_account_id)?;
	assert_eq!(committee_account_id, ids::committee_account(), "committee account must be the first account created");

	for account in &config.accounts {
		let owner_key = hex::decode(&account.owner_key)
			.with_context(|| format!("account {}: owner_key is not valid hex", account.name))?;
		let active_key = hex::decode(&account.active_key)
			.with_context(|| format!("account {}: active_key is not valid hex", account.name))?;

		let statistics = store.create(Space::Implementation, ids::implementation::ACCOUNT_STATISTICS, |id| {
			Object::AccountStatistics(AccountStatistics { id, owner: id, total_ops: 0, most_recent_op: None })
		})?;
		let owner = single_key_authority(owner_key);
		let active = single_key_authority(active_key);
		let account_id = store.create(Space::Protocol, ids::protocol::ACCOUNT, |id| {
			Object::Account(Account {
				id,
				name: account.name.clone(),
				owner,
				active,
				options: AccountOptions::default(),
				registrar: id,
				lifetime_member: true,
				statistics,
			})
		})?;
		store.modify(statistics, |o| o.as_account_statistics_mut().unwrap().owner = account_id)?;
		accounts_by_name.insert(&account.name, account_id);
	}

	let mut core_asset = None;
	for asset in &config.assets {
		let issuer = *accounts_by_name
			.get(asset.issuer.as_str())
			.with_context(|| format!("asset {}: issuer {} is not a genesis account", asset.symbol, asset.issuer))?;

		let dynamic_data = store.create(Space::Implementation, ids::implementation::ASSET_DYNAMIC_DATA, |id| {
			Object::AssetDynamicData(AssetDynamicData {
				id,
				asset: ObjectId::new(Space::Protocol, 0, 0),
				current_supply: Amount(asset.initial_supply),
				accumulated_fees: Amount::ZERO,
			})
		})?;
		let asset_id = store.create(Space::Protocol, ids::protocol::ASSET, |id| {
			Object::Asset(Asset {
				id,
				symbol: asset.symbol.clone(),
				precision: asset.precision,
				issuer,
				options: AssetOptions {
					max_supply: Amount(asset.max_supply),
					flags: AssetFlags::NONE,
					issuer_permissions: AssetFlags::NONE,
					market_fee_percent: 0,
					max_market_fee: Amount::ZERO,
					core_exchange_rate: None,
					whitelist_authorities: Vec::new(),
					blacklist_authorities: Vec::new(),
				},
				dynamic_data,
				bitasset_data: None,
			})
		})?;
		store.modify(dynamic_data, |o| o.as_asset_dynamic_data_mut().unwrap().asset = asset_id)?;

		if asset.initial_supply != 0 {
			market_engine::fund::credit_balance(&mut store, issuer, asset_id, Amount(asset.initial_supply))?;
		}
		if asset.symbol == config.core_asset_symbol {
			core_asset = Some(asset_id);
		}
	}
	let core_asset = core_asset
		.with_context(|| format!("core_asset_symbol {} does not name a genesis asset", config.core_asset_symbol))?;

	if config.witnesses.is_empty() {
		bail!("genesis must name at least one witness");
	}
	let mut sealing_witness = None;
	let mut sealing_witness_signing_key = Vec::new();
	for (index, witness) in config.witnesses.iter().enumerate() {
		let witness_account = *accounts_by_name
			.get(witness.account.as_str())
			.with_context(|| format!("witness account {} is not a genesis account", witness.account))?;
		let signing_key = hex::decode(&witness.signing_key)
			.with_context(|| format!("witness {}: signing_key is not valid hex", witness.account))?;
		let witness_id = store.create(Space::Protocol, ids::protocol::WITNESS, |id| {
			Object::Witness(Witness { id, witness_account, signing_key: signing_key.clone(), total_votes: 0, last_aslot: 0 })
		})?;
		if index == 0 {
			sealing_witness = Some(witness_id);
			sealing_witness_signing_key = signing_key;
		}
	}

	Ok(Genesis {
		store,
		chain_id,
		genesis_time: BlockTime(config.genesis_time),
		core_asset,
		sealing_witness: sealing_witness.expect("checked non-empty above"),
		sealing_witness_signing_key,
	})
}

fn single_key_authority(key: Vec<u8>) -> Authority {
	let mut authority = Authority { weight_threshold: 1, ..Authority::default() };
	authority.key_auths.insert(KeyOrAddress::Key(key), 1);
	authority
}

fn parse_chain_id(s: &str) -> anyhow::Result<[u8; 32]> {
	let bytes = hex::decode(s).context("chain_id is not valid hex")?;
	<[u8; 32]>::try_from(bytes.as_slice())
		.map_err(|_| anyhow::anyhow!("chain_id must decode to exactly 32 bytes, got {}", bytes.len()))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> GenesisConfig {
		serde_json::from_str(
			r#"{
				"chain_id": "00000000000000000000000000000000000000000000000000000000000001",
				"genesis_time": 1700000000,
				"core_asset_symbol": "CORE",
				"accounts": [
					{"name": "alice", "owner_key": "02aa", "active_key": "02aa"}
				],
				"assets": [
					{"symbol": "CORE", "precision": 5, "issuer": "alice", "max_supply": 1000000000, "initial_supply": 500}
				],
				"witnesses": [
					{"account": "alice", "signing_key": "02aa"}
				]
			}"#,
		)
		.unwrap()
	}

	#[test]
	fn builds_accounts_assets_and_witness() {
		let genesis = build(&sample()).unwrap();
		// One configured account (alice) plus the reserved committee account.
		assert_eq!(genesis.store.indices().accounts.by_name.len(), 2);
		let core = genesis.store.get(genesis.core_asset).unwrap().as_asset().unwrap();
		assert_eq!(core.symbol, "CORE");
		assert_eq!(genesis.sealing_witness_signing_key, hex::decode("02aa").unwrap());
	}

	#[test]
	fn committee_account_lands_at_the_reserved_instance() {
		let genesis = build(&sample()).unwrap();
		let committee = genesis.store.get(chain_objects::ids::committee_account()).unwrap().as_account().unwrap();
		assert_eq!(committee.name, "committee-account");
		assert_eq!(committee.active, chain_objects::Authority::default());
	}

	#[test]
	fn rejects_unknown_issuer() {
		let mut config = sample();
		config.assets[0].issuer = "bob".to_string();
		assert!(build(&config).is_err());
	}
}
