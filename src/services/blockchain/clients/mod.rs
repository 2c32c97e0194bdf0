//! Blockchain client implementations.
//!
//! - EVM client for Ethereum-compatible chains
//! - Bitcoin client for Bitcoin Core nodes

mod bitcoin;
mod evm;

pub use bitcoin::{BitcoinClient, BitcoinConnector};
pub use evm::{EvmClient, EvmConnector};
