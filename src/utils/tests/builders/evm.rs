//! Test helper utilities for EVM blocks and transactions
//!
//! - `EvmTransactionBuilder`: Builder for raw `eth_getBlockByNumber` transaction objects
//! - `EvmBlockBuilder`: Builder for EVM blocks

use alloy::primitives::{B256, U256, U64};
use serde_json::{json, Value};

use crate::models::{BlockType, EvmBlock};

/// Builder for transaction objects as returned inside a full EVM block
pub struct EvmTransactionBuilder {
	hash: B256,
	from: String,
	to: Option<String>,
	value: U256,
}

impl Default for EvmTransactionBuilder {
	fn default() -> Self {
		Self {
			hash: B256::with_last_byte(1),
			from: "0x0000000000000000000000000000000000000001".to_string(),
			to: Some("0x0000000000000000000000000000000000000002".to_string()),
			value: U256::ZERO,
		}
	}
}

impl EvmTransactionBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn hash(mut self, hash: B256) -> Self {
		self.hash = hash;
		self
	}

	pub fn from(mut self, address: &str) -> Self {
		self.from = address.to_string();
		self
	}

	pub fn to(mut self, address: &str) -> Self {
		self.to = Some(address.to_string());
		self
	}

	pub fn contract_creation(mut self) -> Self {
		self.to = None;
		self
	}

	pub fn value(mut self, value: U256) -> Self {
		self.value = value;
		self
	}

	pub fn value_wei(self, wei: u128) -> Self {
		self.value(U256::from(wei))
	}

	pub fn build(self) -> Value {
		json!({
			"hash": self.hash,
			"from": self.from,
			"to": self.to,
			"value": format!("0x{:x}", self.value),
			"nonce": "0x0",
			"gas": "0x5208",
			"input": "0x",
		})
	}
}

/// Builder for EVM blocks
pub struct EvmBlockBuilder {
	number: u64,
	timestamp: u64,
	transactions: Vec<Value>,
}

impl Default for EvmBlockBuilder {
	fn default() -> Self {
		Self {
			number: 1,
			timestamp: 1_700_000_000,
			transactions: Vec::new(),
		}
	}
}

impl EvmBlockBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn number(mut self, number: u64) -> Self {
		self.number = number;
		self
	}

	pub fn timestamp(mut self, timestamp: u64) -> Self {
		self.timestamp = timestamp;
		self
	}

	pub fn transaction(mut self, transaction: Value) -> Self {
		self.transactions.push(transaction);
		self
	}

	pub fn transactions(mut self, transactions: Vec<Value>) -> Self {
		self.transactions = transactions;
		self
	}

	pub fn build(self) -> EvmBlock {
		EvmBlock {
			number: U64::from(self.number),
			hash: Some(B256::with_last_byte((self.number % 256) as u8)),
			timestamp: U64::from(self.timestamp),
			transactions: self.transactions,
		}
	}

	pub fn build_block(self) -> BlockType {
		BlockType::EVM(Box::new(self.build()))
	}

	/// JSON body of an `eth_getBlockByNumber` result
	pub fn build_json(self) -> Value {
		json!({
			"number": format!("0x{:x}", self.number),
			"hash": B256::with_last_byte((self.number % 256) as u8),
			"timestamp": format!("0x{:x}", self.timestamp),
			"transactions": self.transactions,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::EvmTransaction;

	#[test]
	fn test_transaction_json_decodes() {
		let raw = EvmTransactionBuilder::new()
			.from("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA")
			.value_wei(1_000)
			.build();
		let tx: EvmTransaction = serde_json::from_value(raw).unwrap();
		assert_eq!(tx.sender(), "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
		assert_eq!(tx.value, U256::from(1_000u64));
	}

	#[test]
	fn test_contract_creation_has_no_receiver() {
		let raw = EvmTransactionBuilder::new().contract_creation().build();
		let tx: EvmTransaction = serde_json::from_value(raw).unwrap();
		assert!(tx.receiver().is_none());
	}

	#[test]
	fn test_block_json_decodes() {
		let json = EvmBlockBuilder::new()
			.number(255)
			.timestamp(42)
			.transaction(EvmTransactionBuilder::new().build())
			.build_json();
		let block: EvmBlock = serde_json::from_value(json).unwrap();
		assert_eq!(block.number(), 255);
		assert_eq!(block.timestamp(), 42);
		assert_eq!(block.transactions.len(), 1);
	}
}
