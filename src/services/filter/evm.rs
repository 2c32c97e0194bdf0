//! Native value transfer detection for EVM blocks.

use serde_json::Value;
use std::collections::HashMap;

use crate::{
	models::{ChainConfig, Direction, EvmBlock, EvmTransaction, TransactionEvent},
	services::{blockwatcher::AddressSet, filter::FilterError},
	utils::to_display_units,
};

/// Extracts events for every transaction in `block`, one result per transaction
pub fn extract_evm_transactions(
	chain: &ChainConfig,
	block: &EvmBlock,
	addresses: &AddressSet,
) -> Vec<Result<Vec<TransactionEvent>, FilterError>> {
	let timestamp = block.timestamp();
	block
		.transactions
		.iter()
		.enumerate()
		.map(|(index, raw)| transaction_events(chain, raw, timestamp, addresses, index))
		.collect()
}

fn transaction_events(
	chain: &ChainConfig,
	raw: &Value,
	timestamp: i64,
	addresses: &AddressSet,
	index: usize,
) -> Result<Vec<TransactionEvent>, FilterError> {
	let tx: EvmTransaction = serde_json::from_value(raw.clone()).map_err(|e| {
		FilterError::decode_error(
			"Failed to decode EVM transaction",
			Some(Box::new(e)),
			Some(HashMap::from([
				("chain".to_string(), chain.slug.clone()),
				("tx_index".to_string(), index.to_string()),
			])),
		)
	})?;

	let receiver = tx.receiver();
	let sender = tx.sender();

	// A self-transfer is reported once, as incoming.
	let (address, direction) = match receiver {
		Some(to) if addresses.contains(&to) => (to, Direction::Incoming),
		_ if addresses.contains(&sender) => (sender, Direction::Outgoing),
		_ => return Ok(Vec::new()),
	};

	let tx_hash = tx.hash();
	let wei = u128::try_from(tx.value).map_err(|_| {
		FilterError::conversion_error(
			format!("Value {} exceeds 128 bits", tx.value),
			None,
			Some(HashMap::from([("tx_hash".to_string(), tx_hash.clone())])),
		)
	})?;
	let amount = to_display_units(wei, chain.decimals).map_err(|e| {
		FilterError::conversion_error(
			"Failed to scale transaction value",
			Some(Box::new(e)),
			Some(HashMap::from([("tx_hash".to_string(), tx_hash.clone())])),
		)
	})?;

	Ok(vec![TransactionEvent::new(
		&address,
		chain.slug.clone(),
		tx_hash,
		direction,
		amount,
		chain.currency.clone(),
		timestamp,
	)])
}
