//! Network transport implementations for blockchain clients.
//!
//! - HTTP JSON-RPC transport shared by EVM and Bitcoin clients
//! - WebSocket `newHeads` subscription for EVM nodes

mod http;
mod ws;

pub use http::{HttpTransportClient, RpcCredentials};
pub use ws::WsHeadSubscriber;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::services::blockchain::BlockChainError;

/// Base trait for JSON-RPC transports
#[async_trait]
pub trait BlockchainTransport: Send + Sync {
	/// URL requests are sent to
	fn url(&self) -> String;

	/// Sends a JSON-RPC call and returns its `result` member
	async fn send_raw_request(&self, method: &str, params: Value)
		-> Result<Value, BlockChainError>;
}

/// Builds a JSON-RPC 2.0 request body
pub fn rpc_request(id: u64, method: &str, params: Value) -> Value {
	json!({
		"jsonrpc": "2.0",
		"id": id,
		"method": method,
		"params": params,
	})
}

/// Parses a `0x`-prefixed hex quantity as returned by Ethereum nodes
pub fn parse_hex_quantity(value: &Value) -> Result<u64, BlockChainError> {
	let raw = value.as_str().ok_or_else(|| {
		BlockChainError::decode_error(format!("Expected hex string, got {}", value), None, None)
	})?;
	u64::from_str_radix(raw.trim_start_matches("0x"), 16).map_err(|e| {
		BlockChainError::decode_error(
			format!("Invalid hex quantity {}", raw),
			Some(Box::new(e)),
			None,
		)
	})
}
