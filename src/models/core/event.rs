use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::normalize_address;

/// Direction of a transfer relative to the matched monitored address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
	/// The monitored address received value
	Incoming,
	/// The monitored address sent value
	Outgoing,
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Incoming => write!(f, "incoming"),
			Self::Outgoing => write!(f, "outgoing"),
		}
	}
}

/// A transaction touching a monitored address, normalized across chain families.
///
/// Produced by a chain watcher and consumed by the dispatch service. `amount` is in the
/// chain's display unit and is never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEvent {
	/// Matched monitored address, lower-case
	pub address: String,
	/// Chain slug the transaction was observed on
	pub chain: String,
	/// Chain-native transaction hash
	pub tx_hash: String,
	pub direction: Direction,
	pub amount: Decimal,
	/// Currency symbol such as `ETH` or `BTC`
	pub currency: String,
	/// Epoch seconds of the containing block
	pub timestamp: i64,
}

impl TransactionEvent {
	pub fn new(
		address: &str,
		chain: impl Into<String>,
		tx_hash: impl Into<String>,
		direction: Direction,
		amount: Decimal,
		currency: impl Into<String>,
		timestamp: i64,
	) -> Self {
		Self {
			address: normalize_address(address),
			chain: chain.into(),
			tx_hash: tx_hash.into(),
			direction,
			amount: amount.abs(),
			currency: currency.into(),
			timestamp,
		}
	}
}
