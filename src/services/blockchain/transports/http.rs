//! HTTP transport implementation for JSON-RPC nodes.
//!
//! One endpoint per client, optional basic authentication (Bitcoin Core), and a
//! transient-error retry middleware around every request.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use std::{
	collections::HashMap,
	sync::atomic::{AtomicU64, Ordering},
};
use url::Url;

use crate::{
	services::blockchain::{
		transports::{rpc_request, BlockchainTransport},
		BlockChainError,
	},
	utils::{create_retryable_http_client, HttpRetryConfig},
};

/// Basic-auth credentials for RPC endpoints that require them
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcCredentials {
	pub username: String,
	pub password: Option<String>,
}

/// JSON-RPC over HTTP
#[derive(Debug)]
pub struct HttpTransportClient {
	client: ClientWithMiddleware,
	url: Url,
	credentials: Option<RpcCredentials>,
	next_id: AtomicU64,
}

impl HttpTransportClient {
	/// Creates a transport for `url`. No request is sent.
	pub fn new(
		url: &str,
		credentials: Option<RpcCredentials>,
		retry: &HttpRetryConfig,
	) -> Result<Self, BlockChainError> {
		let url = Url::parse(url).map_err(|e| {
			BlockChainError::connection_error(
				"Invalid RPC URL",
				Some(Box::new(e)),
				Some(HashMap::from([("url".to_string(), url.to_string())])),
			)
		})?;

		let client = create_retryable_http_client(retry).map_err(|e| {
			BlockChainError::internal_error("Failed to create HTTP client", Some(Box::new(e)), None)
		})?;

		Ok(Self {
			client,
			url,
			credentials,
			next_id: AtomicU64::new(1),
		})
	}

	fn metadata(&self, method: &str) -> Option<HashMap<String, String>> {
		Some(HashMap::from([
			("url".to_string(), self.url.to_string()),
			("method".to_string(), method.to_string()),
		]))
	}
}

#[async_trait]
impl BlockchainTransport for HttpTransportClient {
	fn url(&self) -> String {
		self.url.to_string()
	}

	async fn send_raw_request(
		&self,
		method: &str,
		params: Value,
	) -> Result<Value, BlockChainError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let mut request = self
			.client
			.post(self.url.clone())
			.json(&rpc_request(id, method, params));
		if let Some(credentials) = &self.credentials {
			request = request.basic_auth(&credentials.username, credentials.password.as_ref());
		}

		let response = request.send().await.map_err(|e| {
			BlockChainError::connection_error(
				"Failed to send JSON-RPC request",
				Some(Box::new(e)),
				self.metadata(method),
			)
		})?;

		let status = response.status();
		let body = response.text().await.map_err(|e| {
			BlockChainError::connection_error(
				"Failed to read JSON-RPC response",
				Some(Box::new(e)),
				self.metadata(method),
			)
		})?;

		// Bitcoin Core reports RPC errors with a 500 status and a JSON body
		let json: Value = match serde_json::from_str(&body) {
			Ok(json) => json,
			Err(e) if status.is_success() => {
				return Err(BlockChainError::decode_error(
					"Invalid JSON-RPC response body",
					Some(Box::new(e)),
					self.metadata(method),
				));
			}
			Err(_) => {
				return Err(BlockChainError::request_error(
					format!("HTTP error status {}", status.as_u16()),
					None,
					self.metadata(method),
				));
			}
		};

		if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
			let message = error
				.get("message")
				.and_then(Value::as_str)
				.unwrap_or("unknown error");
			return Err(BlockChainError::request_error(
				format!("JSON-RPC error: {}", message),
				None,
				self.metadata(method),
			));
		}

		if !status.is_success() {
			return Err(BlockChainError::request_error(
				format!("HTTP error status {}", status.as_u16()),
				None,
				self.metadata(method),
			));
		}

		Ok(json.get("result").cloned().unwrap_or(Value::Null))
	}
}
