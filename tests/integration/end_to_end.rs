//! Full pipeline: JSON-RPC node, chain watcher, event bus, dispatch and Telegram.

use mockito::Matcher;
use rust_decimal::Decimal;
use serde_json::json;
use std::{collections::HashMap, str::FromStr, sync::Arc, time::Duration};
use tokio::sync::watch;

use wallet_notifier::{
	models::{ChainKind, Direction},
	repositories::{
		InMemoryNotificationRepository, InMemorySubscriptionRepository,
		NotificationRepositoryTrait, SubscriptionService,
	},
	services::{
		blockchain::EvmConnector,
		blockwatcher::{BlockStorage, ChainWatcher, FileBlockStorage},
		dispatch::DispatchService,
		eventbus::EventBus,
		notification::{AlertTemplate, TelegramNotifier},
	},
	utils::{
		create_retryable_http_client,
		tests::{
			chain::ChainConfigBuilder,
			evm::{EvmBlockBuilder, EvmTransactionBuilder},
		},
		HttpRetryConfig,
	},
};

const SENDER: &str = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
const RECEIVER: &str = "0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

#[tokio::test]
async fn test_outgoing_transfer_reaches_subscriber() {
	let mut node = mockito::Server::new_async().await;
	let _head = node
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({ "method": "eth_blockNumber" })))
		.with_status(200)
		.with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": "0x64" }).to_string())
		.expect_at_least(2)
		.create_async()
		.await;
	let block = EvmBlockBuilder::new()
		.number(100)
		.timestamp(1_700_000_000)
		.transaction(
			EvmTransactionBuilder::new()
				.from(SENDER)
				.to(RECEIVER)
				.value_wei(2_500_000_000_000_000_000)
				.build(),
		)
		.build_json();
	let block_mock = node
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({
			"method": "eth_getBlockByNumber",
			"params": ["0x64", true],
		})))
		.with_status(200)
		.with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": block }).to_string())
		.expect(1)
		.create_async()
		.await;

	let mut telegram = mockito::Server::new_async().await;
	let alert = telegram
		.mock("POST", "/bottoken/sendMessage")
		.match_body(Matcher::PartialJson(json!({
			"chat_id": "42",
			"text": "*Outgoing ETH* \n\n2.5 ETH outgoing",
		})))
		.with_status(200)
		.with_body(r#"{"ok":true,"result":{}}"#)
		.expect(1)
		.create_async()
		.await;

	let chain = ChainConfigBuilder::new()
		.rpc_url(&node.url())
		.poll_interval_ms(100)
		.connect_retry_ms(50, 50)
		.build();

	let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
	let notifications = Arc::new(InMemoryNotificationRepository::new());
	let bus = EventBus::new();
	let temp_dir = tempfile::tempdir().unwrap();
	let storage = Arc::new(FileBlockStorage::new(temp_dir.path().to_path_buf()));

	let mut watcher = ChainWatcher::new(
		chain.clone(),
		EvmConnector::new(chain, HttpRetryConfig::no_retries()),
		subscriptions.clone(),
		storage.clone(),
		bus.clone(),
	);
	let subscription_service = SubscriptionService::new(
		subscriptions.clone(),
		HashMap::from([("ethereum".to_string(), ChainKind::EVM)]),
	)
	.with_refresh_handle("ethereum", watcher.refresh_handle());
	assert!(subscription_service
		.subscribe("42", "ethereum", SENDER)
		.await
		.unwrap());

	let http = create_retryable_http_client(&HttpRetryConfig::no_retries()).unwrap();
	let notifier = TelegramNotifier::new(
		Some(telegram.url()),
		"token".to_string(),
		AlertTemplate::new("${direction_label} ${currency}", "${amount} ${currency} ${direction}"),
		Arc::new(http),
	)
	.unwrap();
	let dispatch = Arc::new(DispatchService::new(
		subscriptions,
		notifications.clone(),
		vec![Arc::new(notifier)],
	));

	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	let (events, bus_subscription) = bus.subscribe();
	let dispatcher = dispatch.clone();
	let dispatch_shutdown = shutdown_rx.clone();
	let dispatch_task = tokio::spawn(async move {
		dispatcher
			.run(events, bus_subscription, dispatch_shutdown)
			.await
	});
	let watcher_task = tokio::spawn(async move { watcher.run(shutdown_rx).await });

	let mut stored = Vec::new();
	for _ in 0..500 {
		stored = notifications
			.list_by_address("42", "ethereum", SENDER, 10)
			.await
			.unwrap();
		if !stored.is_empty() {
			break;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}

	// Let a few more polls pass to show the block is not processed twice
	tokio::time::sleep(Duration::from_millis(300)).await;

	shutdown_tx.send(true).unwrap();
	tokio::time::timeout(Duration::from_secs(5), async {
		watcher_task.await.unwrap();
		dispatch_task.await.unwrap();
	})
	.await
	.expect("tasks did not stop");

	assert_eq!(stored.len(), 1);
	let notification = &stored[0];
	assert_eq!(notification.address, SENDER.to_lowercase());
	assert_eq!(notification.direction, Direction::Outgoing);
	assert_eq!(notification.amount, Decimal::from_str("2.5").unwrap());
	assert_eq!(notification.currency, "ETH");

	block_mock.assert();
	alert.assert();
	assert_eq!(
		storage.get_last_processed_block("ethereum").await.unwrap(),
		Some(100)
	);
}
