//! CLI + file + env configuration, layered with `config` the way
//! `chainflip-engine`'s settings loader does (`SPEC_FULL.md` §1,
//! *Configuration*): a `clap`-derived command line overlays a TOML/JSON
//! config file, which overlays built-in defaults.

use std::path::PathBuf;

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Parser, Debug, Clone)]
#[command(name = "node", about = "Drives a Chain from a genesis file and a transaction log, printing applied_block notifications")]
pub struct CommandLineOptions {
	/// Path to a config file (TOML/JSON/YAML, detected by extension) layered under the CLI options.
	#[arg(long, env = "NODE_CONFIG_PATH")]
	pub config_path: Option<PathBuf>,

	#[arg(long, env = "NODE_GENESIS_PATH")]
	pub genesis_path: Option<PathBuf>,

	#[arg(long, env = "NODE_TRANSACTIONS_PATH")]
	pub transactions_path: Option<PathBuf>,

	/// Path to a file holding the hex-encoded secp256k1 secret key of the
	/// genesis witness this harness seals every block as, mirroring
	/// `chainflip-engine`'s `*_private_key_file` options rather than
	/// accepting the secret on the command line directly.
	#[arg(long, env = "NODE_WITNESS_SECRET_KEY_FILE")]
	pub witness_secret_key_file: Option<PathBuf>,

	/// How many pending transactions to batch into each sealed block.
	#[arg(long)]
	pub transactions_per_block: Option<usize>,

	#[arg(long, env = "NODE_LOG_LEVEL")]
	pub log_level: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
	pub genesis_path: String,
	pub transactions_path: String,
	pub witness_secret_key_file: String,
	#[serde(default = "default_transactions_per_block")]
	pub transactions_per_block: usize,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

fn default_transactions_per_block() -> usize {
	1
}

fn default_log_level() -> String {
	"info".to_string()
}

impl Settings {
	pub fn new(cli: &CommandLineOptions) -> Result<Self, ConfigError> {
		let mut builder = match &cli.config_path {
			Some(path) => Config::builder().add_source(File::from(path.clone()).required(true)),
			None => Config::builder().add_source(File::with_name("config/node").required(false)),
		};
		builder = builder.add_source(Environment::with_prefix("NODE").separator("__"));

		if let Some(genesis_path) = &cli.genesis_path {
			builder = builder.set_override("genesis_path", path_to_string(genesis_path))?;
		}
		if let Some(transactions_path) = &cli.transactions_path {
			builder = builder.set_override("transactions_path", path_to_string(transactions_path))?;
		}
		if let Some(witness_secret_key_file) = &cli.witness_secret_key_file {
			builder = builder.set_override("witness_secret_key_file", path_to_string(witness_secret_key_file))?;
		}
		if let Some(transactions_per_block) = cli.transactions_per_block {
			builder = builder.set_override("transactions_per_block", transactions_per_block as i64)?;
		}
		if let Some(log_level) = &cli.log_level {
			builder = builder.set_override("log_level", log_level.clone())?;
		}

		builder.build()?.try_deserialize()
	}
}

fn path_to_string(path: &PathBuf) -> String {
	path.to_string_lossy().into_owned()
}
