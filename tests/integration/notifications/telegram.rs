use mockito::Matcher;
use rust_decimal::Decimal;
use serde_json::json;
use std::{str::FromStr, sync::Arc};

use wallet_notifier::{
	models::{Direction, Subscription, TransactionEvent},
	repositories::{
		InMemoryNotificationRepository, InMemorySubscriptionRepository,
		NotificationRepositoryTrait, SubscriptionRepositoryTrait,
	},
	services::{
		dispatch::DispatchService,
		notification::{AlertTemplate, NotificationError, Notifier, TelegramNotifier},
	},
	utils::{create_retryable_http_client, HttpRetryConfig},
};

const ADDRESS: &str = "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq";

fn create_test_event() -> TransactionEvent {
	TransactionEvent::new(
		ADDRESS,
		"bitcoin",
		"4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b",
		Direction::Incoming,
		Decimal::from_str("0.015").unwrap(),
		"BTC",
		1_700_000_000,
	)
}

fn create_notifier(base_url: &str, template: AlertTemplate) -> TelegramNotifier {
	let client = create_retryable_http_client(&HttpRetryConfig::no_retries()).unwrap();
	TelegramNotifier::new(
		Some(base_url.to_string()),
		"123:abc".to_string(),
		template,
		Arc::new(client),
	)
	.unwrap()
}

#[tokio::test]
async fn test_default_template_message() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("POST", "/bot123:abc/sendMessage")
		.match_body(Matcher::PartialJson(json!({
			"chat_id": "777",
			"text": "*Incoming BTC transaction* \n\n0.015 BTC incoming on bitcoin\n\nAddress: `bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq`\nTx: `4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b`\nTime: 2023-11-14T22:13:20+00:00",
		})))
		.with_status(200)
		.with_body(r#"{"ok":true,"result":{}}"#)
		.create_async()
		.await;

	let notifier = create_notifier(&server.url(), AlertTemplate::default());
	notifier.send_alert("777", &create_test_event()).await.unwrap();
	mock.assert();
}

#[tokio::test]
async fn test_underscore_chain_slug_is_escaped() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("POST", "/bot123:abc/sendMessage")
		.match_body(Matcher::PartialJson(json!({
			"chat_id": "777",
			"text": "*Incoming MATIC transaction* \n\n1 MATIC incoming on polygon\\_pos\n\nAddress: `0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa`\nTx: `0xdeadbeef`\nTime: 2023-11-14T22:13:20+00:00",
			"parse_mode": "markdown",
		})))
		.with_status(200)
		.with_body(r#"{"ok":true,"result":{}}"#)
		.expect(1)
		.create_async()
		.await;

	let event = TransactionEvent::new(
		"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
		"polygon_pos",
		"0xdeadbeef",
		Direction::Incoming,
		Decimal::ONE,
		"MATIC",
		1_700_000_000,
	);
	let notifier = create_notifier(&server.url(), AlertTemplate::default());
	notifier.send_alert("777", &event).await.unwrap();
	mock.assert();
}

#[tokio::test]
async fn test_error_does_not_leak_token() {
	let client = create_retryable_http_client(&HttpRetryConfig::no_retries()).unwrap();
	let notifier = TelegramNotifier::new(
		Some("http://127.0.0.1:1".to_string()),
		"123:secret-token".to_string(),
		AlertTemplate::default(),
		Arc::new(client),
	)
	.unwrap();

	let error = notifier
		.send_alert("777", &create_test_event())
		.await
		.unwrap_err();

	assert!(matches!(error, NotificationError::NetworkError(_)));
	let mut chain = format!("{}", error);
	let mut source = std::error::Error::source(&error);
	while let Some(inner) = source {
		chain.push_str(&inner.to_string());
		source = inner.source();
	}
	assert!(!chain.contains("secret-token"));
}

#[tokio::test]
async fn test_dispatch_sends_one_message_per_subscriber() {
	let mut server = mockito::Server::new_async().await;
	let first = server
		.mock("POST", "/bot123:abc/sendMessage")
		.match_body(Matcher::PartialJson(json!({ "chat_id": "1" })))
		.with_status(200)
		.with_body(r#"{"ok":true,"result":{}}"#)
		.expect(1)
		.create_async()
		.await;
	let second = server
		.mock("POST", "/bot123:abc/sendMessage")
		.match_body(Matcher::PartialJson(json!({ "chat_id": "2" })))
		.with_status(400)
		.with_body(r#"{"ok":false,"description":"Bad Request: chat not found"}"#)
		.expect(1)
		.create_async()
		.await;

	let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
	for subscriber in ["1", "2"] {
		subscriptions
			.add_subscription(Subscription::new(subscriber, "bitcoin", ADDRESS))
			.await
			.unwrap();
	}
	let notifications = Arc::new(InMemoryNotificationRepository::new());
	let service = DispatchService::new(
		subscriptions,
		notifications.clone(),
		vec![Arc::new(create_notifier(
			&server.url(),
			AlertTemplate::new("${direction_label}", "${amount} ${currency}"),
		))],
	);

	let summary = service.dispatch(&create_test_event()).await;

	assert_eq!(summary.saved, 2);
	assert_eq!(summary.delivered, 1);
	assert_eq!(summary.failed_deliveries, 1);
	first.assert();
	second.assert();

	let stored = notifications
		.list_by_address("2", "bitcoin", ADDRESS, 10)
		.await
		.unwrap();
	assert_eq!(stored.len(), 1);
	assert_eq!(stored[0].amount, Decimal::from_str("0.015").unwrap());
}
