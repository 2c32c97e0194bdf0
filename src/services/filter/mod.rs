//! Transaction extraction.
//!
//! Turns a fetched block into [`TransactionEvent`]s for the addresses a watcher
//! currently tracks:
//! - EVM native value transfers
//! - Bitcoin outputs and spent inputs
//!
//! Each transaction is decoded on its own, so a malformed entry yields an error
//! for that transaction only.

mod bitcoin;
mod error;
mod evm;

pub use bitcoin::extract_bitcoin_transactions;
pub use error::FilterError;
pub use evm::extract_evm_transactions;

use crate::{
	models::{BlockType, ChainConfig, TransactionEvent},
	services::blockwatcher::AddressSet,
};

/// Extracts events from `block`, returning one result per transaction in block order
pub fn extract_transactions_for_block(
	chain: &ChainConfig,
	block: &BlockType,
	addresses: &AddressSet,
) -> Vec<Result<Vec<TransactionEvent>, FilterError>> {
	match block {
		BlockType::EVM(block) => extract_evm_transactions(chain, block, addresses),
		BlockType::Bitcoin(block) => extract_bitcoin_transactions(chain, block, addresses),
	}
}
