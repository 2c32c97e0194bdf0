//! Blockchain-specific model implementations.
//!
//! Each submodule holds the block and transaction shapes returned by one chain
//! family's JSON-RPC interface. Transactions are kept as raw JSON inside a block so
//! that a malformed entry only fails its own decode.

use serde::{Deserialize, Serialize};

pub mod bitcoin;
pub mod evm;

/// Supported chain families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainKind {
	/// Account-based chains speaking the Ethereum JSON-RPC API
	EVM,
	/// UTXO chains speaking the Bitcoin Core JSON-RPC API
	Bitcoin,
}

/// Block data from different chain families
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockType {
	EVM(Box<evm::EvmBlock>),
	Bitcoin(Box<bitcoin::BitcoinBlock>),
}

impl BlockType {
	pub fn number(&self) -> u64 {
		match self {
			Self::EVM(block) => block.number(),
			Self::Bitcoin(block) => block.height,
		}
	}

	/// Block timestamp in epoch seconds
	pub fn timestamp(&self) -> i64 {
		match self {
			Self::EVM(block) => block.timestamp(),
			Self::Bitcoin(block) => block.time,
		}
	}

	pub fn transaction_count(&self) -> usize {
		match self {
			Self::EVM(block) => block.transactions.len(),
			Self::Bitcoin(block) => block.tx.len(),
		}
	}
}
