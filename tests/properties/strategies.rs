use proptest::{collection, prelude::*};
use rust_decimal::Decimal;

use wallet_notifier::models::{Direction, TransactionEvent};

pub const MAX_ADDRESSES: usize = 10;

/// Largest value a 96-bit decimal mantissa can carry
pub const MAX_MANTISSA: u128 = (1u128 << 96) - 1;

pub fn evm_address_strategy() -> impl Strategy<Value = String> {
	"[0-9a-fA-F]{40}".prop_map(|hex| format!("0x{}", hex))
}

pub fn address_list_strategy() -> impl Strategy<Value = Vec<String>> {
	collection::vec(evm_address_strategy(), 0..MAX_ADDRESSES)
}

pub fn direction_strategy() -> impl Strategy<Value = Direction> {
	prop_oneof![Just(Direction::Incoming), Just(Direction::Outgoing)]
}

pub fn transaction_event_strategy() -> impl Strategy<Value = TransactionEvent> {
	(
		evm_address_strategy(),
		"[a-z]{3,10}",
		"0x[0-9a-f]{64}",
		direction_strategy(),
		any::<u64>(),
		0i64..4_102_444_800,
	)
		.prop_map(|(address, chain, tx_hash, direction, raw, timestamp)| {
			TransactionEvent::new(
				&address,
				chain,
				tx_hash,
				direction,
				Decimal::from(raw),
				"ETH",
				timestamp,
			)
		})
}
