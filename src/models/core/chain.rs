use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{models::ChainKind, utils::BackoffConfig};

const DEFAULT_CONNECT_RETRY_MS: u64 = 10_000;
const DEFAULT_ADDRESS_REFRESH_MS: u64 = 60_000;
const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 5;
const DEFAULT_BLOCK_VERBOSITY: u8 = 2;

/// How a watcher learns about new blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum DiscoveryMode {
	/// Compare the stored watermark with the chain head every `interval_ms`
	Poll { interval_ms: u64 },
	/// Follow `newHeads` over the chain's WebSocket endpoint
	Subscribe,
}

/// Backoff used while (re)connecting to the chain endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRetry {
	pub initial_delay_ms: u64,
	pub max_delay_ms: u64,
	#[serde(default = "default_multiplier")]
	pub multiplier: u32,
}

fn default_multiplier() -> u32 {
	1
}

impl Default for ConnectRetry {
	fn default() -> Self {
		Self {
			initial_delay_ms: DEFAULT_CONNECT_RETRY_MS,
			max_delay_ms: DEFAULT_CONNECT_RETRY_MS,
			multiplier: default_multiplier(),
		}
	}
}

impl ConnectRetry {
	pub fn backoff(&self) -> BackoffConfig {
		BackoffConfig {
			initial_delay: Duration::from_millis(self.initial_delay_ms),
			max_delay: Duration::from_millis(self.max_delay_ms.max(self.initial_delay_ms)),
			multiplier: self.multiplier,
		}
	}
}

/// A watched chain and the parameters of its watcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
	/// Identifier used in subscriptions and events, e.g. `ethereum`
	pub slug: String,
	pub name: String,
	pub chain_type: ChainKind,
	/// Display currency symbol
	pub currency: String,
	/// Fractional digits of the display unit (18 for ETH, 8 for BTC)
	pub decimals: u32,
	pub rpc_url: String,
	#[serde(default)]
	pub ws_url: Option<String>,
	#[serde(default)]
	pub rpc_username: Option<String>,
	#[serde(default)]
	pub rpc_password: Option<String>,
	pub discovery: DiscoveryMode,
	#[serde(default)]
	pub connect_retry: ConnectRetry,
	#[serde(default)]
	pub confirmation_blocks: u64,
	/// Upper bound on the catch-up window after a restart
	#[serde(default)]
	pub max_past_blocks: Option<u64>,
	#[serde(default = "default_address_refresh_ms")]
	pub address_refresh_interval_ms: u64,
	#[serde(default = "default_lookup_timeout_ms")]
	pub lookup_timeout_ms: u64,
	/// Consecutive failed head lookups before a polling watcher reconnects
	#[serde(default = "default_max_consecutive_failures")]
	pub max_consecutive_failures: u32,
	/// `getblock` verbosity for Bitcoin nodes; 3 adds spent outputs to inputs
	#[serde(default = "default_block_verbosity")]
	pub block_verbosity: u8,
}

fn default_address_refresh_ms() -> u64 {
	DEFAULT_ADDRESS_REFRESH_MS
}

fn default_lookup_timeout_ms() -> u64 {
	DEFAULT_LOOKUP_TIMEOUT_MS
}

fn default_max_consecutive_failures() -> u32 {
	DEFAULT_MAX_CONSECUTIVE_FAILURES
}

fn default_block_verbosity() -> u8 {
	DEFAULT_BLOCK_VERBOSITY
}

impl ChainConfig {
	pub fn address_refresh_interval(&self) -> Duration {
		Duration::from_millis(self.address_refresh_interval_ms)
	}

	pub fn lookup_timeout(&self) -> Duration {
		Duration::from_millis(self.lookup_timeout_ms)
	}
}
