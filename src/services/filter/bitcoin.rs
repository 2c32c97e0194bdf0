//! Payment detection for Bitcoin blocks.
//!
//! Outputs paying a watched address produce one incoming event per address with
//! the summed value. A watched address that only appears among spent inputs
//! produces an outgoing event with a zero amount, since the amount it sent cannot
//! be told apart from change without wallet context.

use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;

use crate::{
	models::{
		normalize_address, BitcoinBlock, BitcoinTransaction, ChainConfig, Direction,
		TransactionEvent,
	},
	services::{blockwatcher::AddressSet, filter::FilterError},
	utils::{amount::parse_decimal_literal, to_display_units, to_smallest_units},
};

/// Extracts events for every transaction in `block`, one result per transaction
pub fn extract_bitcoin_transactions(
	chain: &ChainConfig,
	block: &BitcoinBlock,
	addresses: &AddressSet,
) -> Vec<Result<Vec<TransactionEvent>, FilterError>> {
	block
		.tx
		.iter()
		.enumerate()
		.map(|(index, raw)| transaction_events(chain, raw, block.time, addresses, index))
		.collect()
}

fn transaction_events(
	chain: &ChainConfig,
	raw: &Value,
	timestamp: i64,
	addresses: &AddressSet,
	index: usize,
) -> Result<Vec<TransactionEvent>, FilterError> {
	let tx: BitcoinTransaction = serde_json::from_value(raw.clone()).map_err(|e| {
		FilterError::decode_error(
			"Failed to decode Bitcoin transaction",
			Some(Box::new(e)),
			Some(HashMap::from([
				("chain".to_string(), chain.slug.clone()),
				("tx_index".to_string(), index.to_string()),
			])),
		)
	})?;

	// (address, summed smallest units), in first-appearance order
	let mut received: Vec<(String, u128)> = Vec::new();
	for output in &tx.vout {
		let Some(address) = output.script_pub_key.address().map(normalize_address) else {
			continue;
		};
		if !addresses.contains(&address) {
			continue;
		}

		let units = output_units(&tx.txid, &output.value, chain.decimals)?;
		match received.iter_mut().find(|(seen, _)| *seen == address) {
			Some((_, total)) => {
				*total = total.checked_add(units).ok_or_else(|| {
					FilterError::conversion_error(
						"Output total overflows",
						None,
						Some(HashMap::from([("tx_hash".to_string(), tx.txid.clone())])),
					)
				})?;
			}
			None => received.push((address, units)),
		}
	}

	let mut sent: Vec<String> = Vec::new();
	for input in &tx.vin {
		let Some(address) = input
			.prevout
			.as_ref()
			.and_then(|prevout| prevout.script_pub_key.address())
			.map(normalize_address)
		else {
			continue;
		};
		if addresses.contains(&address)
			&& !received.iter().any(|(seen, _)| *seen == address)
			&& !sent.contains(&address)
		{
			sent.push(address);
		}
	}

	let mut events = Vec::with_capacity(received.len() + sent.len());
	for (address, units) in received {
		let amount = to_display_units(units, chain.decimals).map_err(|e| {
			FilterError::conversion_error(
				"Failed to scale output total",
				Some(Box::new(e)),
				Some(HashMap::from([("tx_hash".to_string(), tx.txid.clone())])),
			)
		})?;
		events.push(TransactionEvent::new(
			&address,
			chain.slug.clone(),
			tx.txid.clone(),
			Direction::Incoming,
			amount,
			chain.currency.clone(),
			timestamp,
		));
	}
	for address in sent {
		events.push(TransactionEvent::new(
			&address,
			chain.slug.clone(),
			tx.txid.clone(),
			Direction::Outgoing,
			Decimal::ZERO,
			chain.currency.clone(),
			timestamp,
		));
	}

	Ok(events)
}

fn output_units(txid: &str, value: &serde_json::Number, decimals: u32) -> Result<u128, FilterError> {
	let literal = value.to_string();
	parse_decimal_literal(&literal)
		.and_then(|amount| to_smallest_units(amount, decimals))
		.map_err(|e| {
			FilterError::conversion_error(
				format!("Invalid output value {}", literal),
				Some(Box::new(e)),
				Some(HashMap::from([("tx_hash".to_string(), txid.to_string())])),
			)
		})
}
