//! EVM client over the Ethereum JSON-RPC API.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;

use crate::{
	models::{BlockType, ChainConfig, EvmBlock},
	services::blockchain::{
		client::{BlockChainClient, ChainConnector, HeadStream},
		transports::{parse_hex_quantity, BlockchainTransport, HttpTransportClient, WsHeadSubscriber},
		BlockChainError,
	},
	utils::HttpRetryConfig,
};

/// Client for EVM-compatible chains
pub struct EvmClient<T: BlockchainTransport = HttpTransportClient> {
	transport: T,
	heads: Option<WsHeadSubscriber>,
}

impl<T: BlockchainTransport> EvmClient<T> {
	pub fn new_with_transport(transport: T, heads: Option<WsHeadSubscriber>) -> Self {
		Self { transport, heads }
	}
}

#[async_trait]
impl<T: BlockchainTransport> BlockChainClient for EvmClient<T> {
	async fn get_latest_block_number(&self) -> Result<u64, BlockChainError> {
		let result = self
			.transport
			.send_raw_request("eth_blockNumber", json!([]))
			.await?;
		parse_hex_quantity(&result)
	}

	async fn get_block(&self, number: u64) -> Result<BlockType, BlockChainError> {
		let result = self
			.transport
			.send_raw_request("eth_getBlockByNumber", json!([format!("0x{:x}", number), true]))
			.await?;

		if result.is_null() {
			return Err(BlockChainError::block_not_found(
				number,
				None,
				Some(HashMap::from([("url".to_string(), self.transport.url())])),
			));
		}

		let block: EvmBlock = serde_json::from_value(result).map_err(|e| {
			BlockChainError::decode_error(
				format!("Failed to decode block {}", number),
				Some(Box::new(e)),
				None,
			)
		})?;
		Ok(BlockType::EVM(Box::new(block)))
	}

	async fn subscribe_new_heads(&self) -> Result<HeadStream, BlockChainError> {
		match &self.heads {
			Some(subscriber) => subscriber.subscribe().await,
			None => Err(BlockChainError::subscription_error(
				"No WebSocket URL configured",
				None,
				None,
			)),
		}
	}
}

/// Connects [`EvmClient`]s for one chain configuration
pub struct EvmConnector {
	chain: ChainConfig,
	retry: HttpRetryConfig,
}

impl EvmConnector {
	pub fn new(chain: ChainConfig, retry: HttpRetryConfig) -> Self {
		Self { chain, retry }
	}
}

#[async_trait]
impl ChainConnector for EvmConnector {
	type Client = EvmClient;

	async fn connect(&self) -> Result<Self::Client, BlockChainError> {
		let transport = HttpTransportClient::new(&self.chain.rpc_url, None, &self.retry)?;
		let heads = self.chain.ws_url.as_deref().map(WsHeadSubscriber::new);
		let client = EvmClient::new_with_transport(transport, heads);

		let head = client.get_latest_block_number().await?;
		tracing::debug!(chain = %self.chain.slug, head, "EVM endpoint answered");
		Ok(client)
	}

	fn endpoint(&self) -> String {
		self.chain.rpc_url.clone()
	}
}
