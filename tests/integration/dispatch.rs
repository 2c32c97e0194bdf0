use mockall::predicate;
use rust_decimal::Decimal;
use std::{str::FromStr, sync::Arc, time::Duration};
use tokio::sync::watch;

use crate::integration::mocks::{
	MockNotificationRepository, MockNotifier, MockSubscriptionRepository,
};
use wallet_notifier::{
	models::{Direction, Subscription, TransactionEvent},
	repositories::{
		InMemoryNotificationRepository, InMemorySubscriptionRepository, RepositoryError,
		SubscriptionRepositoryTrait,
	},
	services::{
		dispatch::{DispatchService, DispatchSummary},
		eventbus::EventBus,
		notification::{LogNotifier, NotificationError},
	},
};

const ADDRESS: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

fn create_test_event() -> TransactionEvent {
	TransactionEvent::new(
		ADDRESS,
		"ethereum",
		"0xfeed",
		Direction::Outgoing,
		Decimal::from_str("2.5").unwrap(),
		"ETH",
		1_700_000_000,
	)
}

fn subscribers(ids: &[&str]) -> Vec<Subscription> {
	ids.iter()
		.map(|id| Subscription::new(*id, "ethereum", ADDRESS))
		.collect()
}

fn subscription_repository(ids: &'static [&'static str]) -> MockSubscriptionRepository {
	let mut repository = MockSubscriptionRepository::new();
	repository
		.expect_list_subscribers_by_address()
		.with(predicate::eq("ethereum"), predicate::eq(ADDRESS))
		.times(1)
		.returning(move |_, _| Ok(subscribers(ids)));
	repository
}

#[tokio::test]
async fn test_every_subscriber_gets_a_record_and_an_alert() {
	let subscriptions = subscription_repository(&["1", "2", "3"]);

	let mut notifications = MockNotificationRepository::new();
	notifications
		.expect_save()
		.withf(|n| n.tx_hash == "0xfeed" && n.amount == Decimal::from_str("2.5").unwrap())
		.times(3)
		.returning(|_| Ok(()));

	let mut notifier = MockNotifier::new();
	notifier
		.expect_send_alert()
		.withf(|_, event| event.direction == Direction::Outgoing)
		.times(3)
		.returning(|_, _| Ok(()));

	let service = DispatchService::new(
		Arc::new(subscriptions),
		Arc::new(notifications),
		vec![Arc::new(notifier)],
	);
	let summary = service.dispatch(&create_test_event()).await;

	assert_eq!(
		summary,
		DispatchSummary {
			subscribers: 3,
			saved: 3,
			delivered: 3,
			..Default::default()
		}
	);
}

#[tokio::test]
async fn test_store_failure_still_notifies() {
	let subscriptions = subscription_repository(&["1", "2"]);

	let mut notifications = MockNotificationRepository::new();
	notifications
		.expect_save()
		.times(2)
		.returning(|_| Err(RepositoryError::internal_error("store unavailable", None, None)));

	let mut notifier = MockNotifier::new();
	notifier
		.expect_send_alert()
		.times(2)
		.returning(|_, _| Ok(()));

	let service = DispatchService::new(
		Arc::new(subscriptions),
		Arc::new(notifications),
		vec![Arc::new(notifier)],
	);
	let summary = service.dispatch(&create_test_event()).await;

	assert_eq!(summary.failed_saves, 2);
	assert_eq!(summary.delivered, 2);
}

#[tokio::test]
async fn test_notifier_failure_does_not_block_next_subscriber() {
	let subscriptions = subscription_repository(&["1", "2"]);

	let mut notifications = MockNotificationRepository::new();
	notifications.expect_save().times(2).returning(|_| Ok(()));

	let mut notifier = MockNotifier::new();
	notifier
		.expect_send_alert()
		.with(predicate::eq("1"), predicate::always())
		.times(1)
		.returning(|_, _| Err(NotificationError::notify_failed("chat not found", None, None)));
	notifier
		.expect_send_alert()
		.with(predicate::eq("2"), predicate::always())
		.times(1)
		.returning(|_, _| Ok(()));

	let service = DispatchService::new(
		Arc::new(subscriptions),
		Arc::new(notifications),
		vec![Arc::new(notifier)],
	);
	let summary = service.dispatch(&create_test_event()).await;

	assert_eq!(summary.saved, 2);
	assert_eq!(summary.delivered, 1);
	assert_eq!(summary.failed_deliveries, 1);
}

#[tokio::test]
async fn test_lookup_failure_skips_event() {
	let mut subscriptions = MockSubscriptionRepository::new();
	subscriptions
		.expect_list_subscribers_by_address()
		.times(1)
		.returning(|_, _| Err(RepositoryError::load_error("store unavailable", None, None)));

	let mut notifications = MockNotificationRepository::new();
	notifications.expect_save().times(0);
	let mut notifier = MockNotifier::new();
	notifier.expect_send_alert().times(0);

	let service = DispatchService::new(
		Arc::new(subscriptions),
		Arc::new(notifications),
		vec![Arc::new(notifier)],
	);
	let summary = service.dispatch(&create_test_event()).await;

	assert!(summary.lookup_failed);
	assert_eq!(summary.subscribers, 0);
}

#[tokio::test]
async fn test_every_notifier_is_called_per_subscriber() {
	let subscriptions = subscription_repository(&["1"]);

	let mut notifications = MockNotificationRepository::new();
	notifications.expect_save().times(1).returning(|_| Ok(()));

	let mut first = MockNotifier::new();
	first
		.expect_send_alert()
		.times(1)
		.returning(|_, _| Err(NotificationError::network_error("timeout", None, None)));
	let mut second = MockNotifier::new();
	second.expect_send_alert().times(1).returning(|_, _| Ok(()));

	let service = DispatchService::new(
		Arc::new(subscriptions),
		Arc::new(notifications),
		vec![Arc::new(first), Arc::new(second)],
	);
	let summary = service.dispatch(&create_test_event()).await;

	assert_eq!(summary.delivered, 1);
	assert_eq!(summary.failed_deliveries, 1);
}

#[tokio::test]
async fn test_run_delivers_bus_events_and_unsubscribes_on_shutdown() {
	let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
	subscriptions
		.add_subscription(Subscription::new("42", "ethereum", ADDRESS))
		.await
		.unwrap();
	let notifications = Arc::new(InMemoryNotificationRepository::new());
	let service = Arc::new(DispatchService::new(
		subscriptions,
		notifications.clone(),
		vec![Arc::new(LogNotifier::default())],
	));

	let bus = EventBus::new();
	let (events, subscription) = bus.subscribe();
	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	let runner = service.clone();
	let handle = tokio::spawn(async move { runner.run(events, subscription, shutdown_rx).await });

	assert_eq!(bus.publish(create_test_event()), 1);

	let mut delivered = false;
	for _ in 0..500 {
		if notifications.len().await == 1 {
			delivered = true;
			break;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	assert!(delivered);

	shutdown_tx.send(true).unwrap();
	tokio::time::timeout(Duration::from_secs(5), handle)
		.await
		.expect("dispatch did not stop")
		.unwrap();

	assert_eq!(bus.subscriber_count(), 0);
	assert_eq!(bus.publish(create_test_event()), 0);
}

#[tokio::test]
async fn test_run_stops_when_already_cancelled() {
	let service = DispatchService::new(
		Arc::new(InMemorySubscriptionRepository::new()),
		Arc::new(InMemoryNotificationRepository::new()),
		vec![],
	);
	let bus = EventBus::new();
	let (events, subscription) = bus.subscribe();
	let (_shutdown_tx, shutdown_rx) = watch::channel(true);

	tokio::time::timeout(
		Duration::from_secs(1),
		service.run(events, subscription, shutdown_rx),
	)
	.await
	.expect("dispatch ignored shutdown");

	assert_eq!(bus.subscriber_count(), 0);
}
