use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};

use wallet_notifier::{
	models::BlockType,
	services::blockchain::{
		BlockChainClient, BlockChainError, ChainConnector, EvmClient, EvmConnector,
		HttpTransportClient,
	},
	utils::{
		tests::{
			chain::ChainConfigBuilder,
			evm::{EvmBlockBuilder, EvmTransactionBuilder},
		},
		HttpRetryConfig,
	},
};

async fn mock_rpc(server: &mut ServerGuard, method: &str, result: Value) -> Mock {
	server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({ "method": method })))
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string())
		.create_async()
		.await
}

fn client_for(server: &ServerGuard) -> EvmClient {
	let transport =
		HttpTransportClient::new(&server.url(), None, &HttpRetryConfig::no_retries()).unwrap();
	EvmClient::new_with_transport(transport, None)
}

#[tokio::test]
async fn test_get_latest_block_number() {
	let mut server = mockito::Server::new_async().await;
	let mock = mock_rpc(&mut server, "eth_blockNumber", json!("0x12d687")).await;

	let client = client_for(&server);
	assert_eq!(client.get_latest_block_number().await.unwrap(), 1_234_567);
	mock.assert();
}

#[tokio::test]
async fn test_get_block_requests_full_transactions() {
	let mut server = mockito::Server::new_async().await;
	let block = EvmBlockBuilder::new()
		.number(100)
		.transaction(
			EvmTransactionBuilder::new()
				.from("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA")
				.value_wei(42)
				.build(),
		)
		.build_json();
	let mock = server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({
			"method": "eth_getBlockByNumber",
			"params": ["0x64", true],
		})))
		.with_status(200)
		.with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": block }).to_string())
		.create_async()
		.await;

	let client = client_for(&server);
	match client.get_block(100).await.unwrap() {
		BlockType::EVM(block) => {
			assert_eq!(block.number(), 100);
			assert_eq!(block.transactions.len(), 1);
		}
		other => panic!("expected EVM block, got {:?}", other),
	}
	mock.assert();
}

#[tokio::test]
async fn test_missing_block_is_not_found() {
	let mut server = mockito::Server::new_async().await;
	let _mock = mock_rpc(&mut server, "eth_getBlockByNumber", Value::Null).await;

	let client = client_for(&server);
	let result = client.get_block(999).await;
	match result {
		Err(e @ BlockChainError::BlockNotFound(_)) => assert!(e.is_transient()),
		other => panic!("expected BlockNotFound, got {:?}", other),
	}
}

#[tokio::test]
async fn test_malformed_block_is_decode_error() {
	let mut server = mockito::Server::new_async().await;
	let _mock = mock_rpc(
		&mut server,
		"eth_getBlockByNumber",
		json!({ "number": "not-hex", "transactions": [] }),
	)
	.await;

	let client = client_for(&server);
	let result = client.get_block(1).await;
	match result {
		Err(e @ BlockChainError::DecodeError(_)) => assert!(!e.is_transient()),
		other => panic!("expected DecodeError, got {:?}", other),
	}
}

#[tokio::test]
async fn test_subscribe_without_ws_url_fails() {
	let server = mockito::Server::new_async().await;
	let client = client_for(&server);

	assert!(matches!(
		client.subscribe_new_heads().await,
		Err(BlockChainError::SubscriptionError(_))
	));
}

#[tokio::test]
async fn test_connector_checks_head() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({ "method": "eth_blockNumber" })))
		.with_status(200)
		.with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": "0x1" }).to_string())
		.expect(2)
		.create_async()
		.await;

	let chain = ChainConfigBuilder::new().rpc_url(&server.url()).build();
	let connector = EvmConnector::new(chain, HttpRetryConfig::no_retries());

	let client = connector.connect().await.unwrap();
	assert_eq!(client.get_latest_block_number().await.unwrap(), 1);
	assert_eq!(connector.endpoint(), server.url());
	mock.assert();
}

#[tokio::test]
async fn test_connector_fails_when_node_errors() {
	let mut server = mockito::Server::new_async().await;
	let _mock = server
		.mock("POST", "/")
		.with_status(503)
		.with_body("unavailable")
		.create_async()
		.await;

	let chain = ChainConfigBuilder::new().rpc_url(&server.url()).build();
	let connector = EvmConnector::new(chain, HttpRetryConfig::no_retries());

	assert!(matches!(
		connector.connect().await,
		Err(BlockChainError::RequestError(_))
	));
}
