//! Minimal in-process harness wiring [`chain::Chain`] end to end
//! (`SPEC_FULL.md` §6): reads a JSON genesis description and a JSON log of
//! already-signed transactions from disk, applies the transactions in
//! batches of `transactions_per_block` (each batch sealed into its own
//! block by the genesis witness named first in the genesis file), and logs
//! `applied_block` for every block the core accepts. Not a network-facing
//! binary — there is no P2P, RPC, or wallet surface here, per `spec.md`
//! §1's Non-goals.

mod config;
mod genesis;

use std::fs;

use anyhow::Context;
use chain::{BlockHeader, Chain, ChainParameters, ChangeNotification, FeeSchedule};
use chain_objects::{CompactSignature, Transaction};
use clap::Parser;
use primitives::ObjectId;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
	let cli = config::CommandLineOptions::parse();
	let settings = config::Settings::new(&cli).context("loading node configuration")?;
	init_logging(&settings.log_level);

	let genesis_config: genesis::GenesisConfig = serde_json::from_str(
		&fs::read_to_string(&settings.genesis_path)
			.with_context(|| format!("reading genesis file {}", settings.genesis_path))?,
	)
	.context("parsing genesis file")?;
	let genesis = genesis::build(&genesis_config).context("building genesis store")?;

	let witness_secret_key = hex::decode(
		fs::read_to_string(&settings.witness_secret_key_file)
			.with_context(|| format!("reading witness secret key file {}", settings.witness_secret_key_file))?
			.trim(),
	)
	.context("witness secret key file does not contain valid hex")?;
	verify_sealing_key(&witness_secret_key, &genesis.sealing_witness_signing_key)
		.context("witness_secret_key_file does not match the genesis sealing witness")?;

	let mut chain = Chain::new(
		genesis.store,
		genesis.chain_id,
		ChainParameters::default(),
		FeeSchedule::default(),
		genesis.core_asset,
		genesis.genesis_time,
	);

	let mut notifications = chain.subscribe();

	let transactions: Vec<Transaction> = serde_json::from_str(
		&fs::read_to_string(&settings.transactions_path)
			.with_context(|| format!("reading transactions file {}", settings.transactions_path))?,
	)
	.context("parsing transactions file")?;
	info!(count = transactions.len(), "loaded transaction log");

	let batch_size = settings.transactions_per_block.max(1);
	for batch in transactions.chunks(batch_size) {
		for transaction in batch {
			if let Err(err) = chain.push_transaction(transaction.clone()) {
				warn!(error = %err, "rejected transaction, continuing with the rest of the batch");
			}
		}
		seal_and_push(&mut chain, &witness_secret_key, genesis.chain_id, genesis.sealing_witness)
			.context("sealing and pushing block")?;
		drain_notifications(&mut notifications);
	}

	Ok(())
}

fn init_logging(log_level: &str) {
	tracing_subscriber::fmt()
		.json()
		.with_env_filter(EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info")))
		.init();
}

fn verify_sealing_key(secret_key_bytes: &[u8], expected_public_key: &[u8]) -> anyhow::Result<()> {
	let secp = secp256k1::Secp256k1::signing_only();
	let secret_key = secp256k1::SecretKey::from_slice(secret_key_bytes).context("invalid witness secret key")?;
	let public_key = secp256k1::PublicKey::from_secret_key(&secp, &secret_key);
	if public_key.serialize().as_slice() != expected_public_key {
		anyhow::bail!("derived public key does not match the genesis witness's signing_key");
	}
	Ok(())
}

fn seal_and_push(
	chain: &mut Chain,
	witness_secret_key: &[u8],
	chain_id: [u8; 32],
	witness: ObjectId,
) -> anyhow::Result<()> {
	let (header, transactions) = chain.assemble_block(witness);
	let signature = sign_header(witness_secret_key, &chain_id, &header)?;
	let block = Chain::seal_block(header, transactions, signature);
	chain.push_block(block)?;
	Ok(())
}

fn sign_header(secret_key_bytes: &[u8], chain_id: &[u8; 32], header: &BlockHeader) -> anyhow::Result<CompactSignature> {
	let digest = chain::witness_signing_digest(chain_id, header);
	let message = secp256k1::Message::from_digest_slice(&digest).context("block header digest is malformed")?;
	let secp = secp256k1::Secp256k1::signing_only();
	let secret_key = secp256k1::SecretKey::from_slice(secret_key_bytes).context("invalid witness secret key")?;
	let recoverable = secp.sign_ecdsa_recoverable(&message, &secret_key);
	let (recovery_id, compact) = recoverable.serialize_compact();
	let mut out = [0u8; 65];
	out[0] = 27 + recovery_id.to_i32() as u8;
	out[1..].copy_from_slice(&compact);
	Ok(CompactSignature(out))
}

fn drain_notifications(receiver: &mut tokio::sync::broadcast::Receiver<ChangeNotification>) {
	use tokio::sync::broadcast::error::TryRecvError;
	loop {
		match receiver.try_recv() {
			Ok(ChangeNotification::AppliedBlock { id, block_num }) => {
				info!(block_num, block_id = %hex::encode(id), "applied_block");
			}
			Ok(_) => {}
			Err(TryRecvError::Lagged(skipped)) => {
				warn!(skipped, "notification receiver lagged, some change notifications were dropped");
			}
			Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
		}
	}
}
