//! Core blockchain client interface and traits.
//!
//! [`BlockChainClient`] is what a chain watcher needs from a connected node.
//! [`ChainConnector`] produces connected clients and is what the watcher retries.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::{models::BlockType, services::blockchain::BlockChainError};

/// Stream of new head block numbers
pub type HeadStream = BoxStream<'static, Result<u64, BlockChainError>>;

/// Defines the core interface for blockchain clients
#[async_trait]
pub trait BlockChainClient: Send + Sync {
	/// Retrieves the latest block number from the blockchain
	async fn get_latest_block_number(&self) -> Result<u64, BlockChainError>;

	/// Retrieves one block with its full transactions
	async fn get_block(&self, number: u64) -> Result<BlockType, BlockChainError>;

	/// Subscribes to new block headers. Chains without push support return an error.
	async fn subscribe_new_heads(&self) -> Result<HeadStream, BlockChainError> {
		Err(BlockChainError::subscription_error(
			"Head subscription is not supported by this client",
			None,
			None,
		))
	}
}

/// Establishes connections to a chain endpoint
#[async_trait]
pub trait ChainConnector: Send + Sync {
	type Client: BlockChainClient + 'static;

	/// Opens a connection and verifies that the node answers
	async fn connect(&self) -> Result<Self::Client, BlockChainError>;

	/// Endpoint description used in logs
	fn endpoint(&self) -> String;
}
