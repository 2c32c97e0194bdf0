use crate::properties::strategies::transaction_event_strategy;

use proptest::{collection, prelude::*, test_runner::Config};
use wallet_notifier::services::eventbus::{EventBus, DEFAULT_BUS_CAPACITY};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_stalled_subscriber_keeps_oldest_events(
		events in collection::vec(transaction_event_strategy(), 0..80),
		capacity in 1usize..64,
	) {
		let bus = EventBus::with_capacity(capacity);
		let (mut receiver, _subscription) = bus.subscribe();

		let delivered: usize = events.iter().cloned().map(|event| bus.publish(event)).sum();
		prop_assert_eq!(delivered, events.len().min(capacity));

		let mut received = Vec::new();
		while let Ok(event) = receiver.try_recv() {
			received.push(event);
		}
		prop_assert_eq!(&received[..], &events[..events.len().min(capacity)]);
	}

	#[test]
	fn test_default_capacity_drops_beyond_limit(
		events in collection::vec(transaction_event_strategy(), 40..=40),
	) {
		let bus = EventBus::new();
		let (mut receiver, _subscription) = bus.subscribe();
		for event in events.iter().cloned() {
			bus.publish(event);
		}

		let mut received = Vec::new();
		while let Ok(event) = receiver.try_recv() {
			received.push(event);
		}
		prop_assert_eq!(received.len(), DEFAULT_BUS_CAPACITY);
		prop_assert_eq!(&received[..], &events[..DEFAULT_BUS_CAPACITY]);
	}

	#[test]
	fn test_unsubscribed_receivers_get_nothing_more(
		before in collection::vec(transaction_event_strategy(), 0..10),
		after in collection::vec(transaction_event_strategy(), 1..10),
	) {
		let bus = EventBus::new();
		let (mut kept, _kept_subscription) = bus.subscribe();
		let (mut dropped, dropped_subscription) = bus.subscribe();

		for event in before.iter().cloned() {
			prop_assert_eq!(bus.publish(event), 2);
		}
		dropped_subscription.unsubscribe();
		for event in after.iter().cloned() {
			prop_assert_eq!(bus.publish(event), 1);
		}

		let mut drained = Vec::new();
		while let Ok(event) = dropped.try_recv() {
			drained.push(event);
		}
		prop_assert_eq!(drained, before.clone());

		let mut received = 0;
		while kept.try_recv().is_ok() {
			received += 1;
		}
		prop_assert_eq!(received, before.len() + after.len());
	}
}
