use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{normalize_address, Direction, TransactionEvent};

/// A subscriber's interest in one address on one chain.
///
/// Unique per `(subscriber_id, chain, address)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscription {
	/// Identifier of the subscriber's outbound channel (a Telegram chat id)
	pub subscriber_id: String,
	pub chain: String,
	pub address: String,
}

impl Subscription {
	pub fn new(
		subscriber_id: impl Into<String>,
		chain: impl Into<String>,
		address: &str,
	) -> Self {
		Self {
			subscriber_id: subscriber_id.into(),
			chain: chain.into(),
			address: normalize_address(address),
		}
	}
}

/// Append-only record of one attempted delivery of an event to one subscriber
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
	pub subscriber_id: String,
	pub chain: String,
	pub address: String,
	pub tx_hash: String,
	pub direction: Direction,
	pub amount: Decimal,
	pub currency: String,
	pub timestamp: i64,
}

impl Notification {
	/// Builds the record for `subscriber_id`, copying every event field unchanged
	pub fn from_event(subscriber_id: impl Into<String>, event: &TransactionEvent) -> Self {
		Self {
			subscriber_id: subscriber_id.into(),
			chain: event.chain.clone(),
			address: event.address.clone(),
			tx_hash: event.tx_hash.clone(),
			direction: event.direction,
			amount: event.amount,
			currency: event.currency.clone(),
			timestamp: event.timestamp,
		}
	}
}
