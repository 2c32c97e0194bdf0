//! EVM block and transaction data structures.

use alloy::primitives::{hex, Address, B256, U256, U64};
use serde::{Deserialize, Serialize};

/// Block returned by `eth_getBlockByNumber` with full transaction objects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmBlock {
	pub number: U64,
	#[serde(default)]
	pub hash: Option<B256>,
	pub timestamp: U64,
	/// Raw transaction objects, decoded one at a time by the filter
	#[serde(default)]
	pub transactions: Vec<serde_json::Value>,
}

impl EvmBlock {
	pub fn number(&self) -> u64 {
		self.number.to::<u64>()
	}

	pub fn timestamp(&self) -> i64 {
		i64::try_from(self.timestamp.to::<u64>()).unwrap_or(i64::MAX)
	}
}

/// The fields of an EVM transaction needed to detect native value transfers.
///
/// `from` is the sender the node recovered from the transaction signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmTransaction {
	pub hash: B256,
	pub from: Address,
	/// Receiver; absent for contract creation
	#[serde(default)]
	pub to: Option<Address>,
	pub value: U256,
}

impl EvmTransaction {
	/// Lower-case `0x` hex form of an address
	pub fn format_address(address: &Address) -> String {
		format!("0x{}", hex::encode(address))
	}

	pub fn sender(&self) -> String {
		Self::format_address(&self.from)
	}

	pub fn receiver(&self) -> Option<String> {
		self.to.as_ref().map(Self::format_address)
	}

	pub fn hash(&self) -> String {
		format!("0x{}", hex::encode(self.hash))
	}
}
