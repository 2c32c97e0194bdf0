//! Bitcoin client over the Bitcoin Core JSON-RPC API.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::{
	models::{BitcoinBlock, BlockType, ChainConfig},
	services::blockchain::{
		client::{BlockChainClient, ChainConnector},
		transports::{BlockchainTransport, HttpTransportClient, RpcCredentials},
		BlockChainError,
	},
	utils::HttpRetryConfig,
};

/// Client for Bitcoin Core compatible nodes
pub struct BitcoinClient<T: BlockchainTransport = HttpTransportClient> {
	transport: T,
	verbosity: u8,
}

impl<T: BlockchainTransport> BitcoinClient<T> {
	pub fn new_with_transport(transport: T, verbosity: u8) -> Self {
		Self {
			transport,
			verbosity,
		}
	}

	async fn get_block_hash(&self, number: u64) -> Result<String, BlockChainError> {
		let result = self
			.transport
			.send_raw_request("getblockhash", json!([number]))
			.await?;
		match result {
			Value::String(hash) => Ok(hash),
			Value::Null => Err(BlockChainError::block_not_found(number, None, None)),
			other => Err(BlockChainError::decode_error(
				format!("Unexpected getblockhash result: {}", other),
				None,
				None,
			)),
		}
	}
}

#[async_trait]
impl<T: BlockchainTransport> BlockChainClient for BitcoinClient<T> {
	async fn get_latest_block_number(&self) -> Result<u64, BlockChainError> {
		let result = self
			.transport
			.send_raw_request("getblockcount", json!([]))
			.await?;
		result.as_u64().ok_or_else(|| {
			BlockChainError::decode_error(
				format!("Unexpected getblockcount result: {}", result),
				None,
				None,
			)
		})
	}

	async fn get_block(&self, number: u64) -> Result<BlockType, BlockChainError> {
		let hash = self.get_block_hash(number).await?;
		let result = self
			.transport
			.send_raw_request("getblock", json!([hash, self.verbosity]))
			.await?;

		if result.is_null() {
			return Err(BlockChainError::block_not_found(
				number,
				None,
				Some(HashMap::from([("hash".to_string(), hash)])),
			));
		}

		let block: BitcoinBlock = serde_json::from_value(result).map_err(|e| {
			BlockChainError::decode_error(
				format!("Failed to decode block {}", number),
				Some(Box::new(e)),
				None,
			)
		})?;
		Ok(BlockType::Bitcoin(Box::new(block)))
	}
}

/// Connects [`BitcoinClient`]s for one chain configuration
pub struct BitcoinConnector {
	chain: ChainConfig,
	retry: HttpRetryConfig,
}

impl BitcoinConnector {
	pub fn new(chain: ChainConfig, retry: HttpRetryConfig) -> Self {
		Self { chain, retry }
	}
}

#[async_trait]
impl ChainConnector for BitcoinConnector {
	type Client = BitcoinClient;

	async fn connect(&self) -> Result<Self::Client, BlockChainError> {
		let credentials = self.chain.rpc_username.as_ref().map(|username| RpcCredentials {
			username: username.clone(),
			password: self.chain.rpc_password.clone(),
		});
		let transport = HttpTransportClient::new(&self.chain.rpc_url, credentials, &self.retry)?;
		let client = BitcoinClient::new_with_transport(transport, self.chain.block_verbosity);

		let head = client.get_latest_block_number().await?;
		tracing::debug!(chain = %self.chain.slug, head, "Bitcoin endpoint answered");
		Ok(client)
	}

	fn endpoint(&self) -> String {
		self.chain.rpc_url.clone()
	}
}
