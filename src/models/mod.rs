//! Domain models and data structures for wallet monitoring.
//!
//! - `blockchain`: chain-family block and transaction shapes (EVM, Bitcoin)
//! - `config`: configuration loading and validation
//! - `core`: events, subscriptions, notifications and chain definitions

mod blockchain;
mod config;
mod core;

pub use blockchain::{BlockType, ChainKind};

pub use blockchain::evm::{EvmBlock, EvmTransaction};

pub use blockchain::bitcoin::{
	BitcoinBlock, BitcoinInput, BitcoinOutput, BitcoinPrevout, BitcoinTransaction, ScriptPubKey,
};

pub use core::{
	normalize_address, ChainConfig, ConnectRetry, Direction, DiscoveryMode, Notification,
	Subscription, TransactionEvent,
};

pub use config::{ConfigError, ConfigLoader};
