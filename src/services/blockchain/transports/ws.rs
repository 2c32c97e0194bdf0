//! WebSocket subscription to new block headers.
//!
//! Opens a socket, issues `eth_subscribe("newHeads")`, waits for the subscription id
//! and then exposes the stream of head numbers. The stream yields an error when the
//! socket errors or is closed by the node; the caller decides how to reconnect.

use futures_util::{stream::BoxStream, SinkExt, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::services::blockchain::{
	transports::{parse_hex_quantity, rpc_request},
	BlockChainError,
};

const SUBSCRIBE_REQUEST_ID: u64 = 1;

/// Subscribes to `newHeads` on an Ethereum WebSocket endpoint
#[derive(Clone, Debug)]
pub struct WsHeadSubscriber {
	url: String,
}

impl WsHeadSubscriber {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into() }
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	fn metadata(&self) -> Option<HashMap<String, String>> {
		Some(HashMap::from([("url".to_string(), self.url.clone())]))
	}

	/// Opens the socket and returns a stream of new head block numbers
	pub async fn subscribe(
		&self,
	) -> Result<BoxStream<'static, Result<u64, BlockChainError>>, BlockChainError> {
		let (mut socket, _) = connect_async(self.url.as_str()).await.map_err(|e| {
			BlockChainError::connection_error(
				"Failed to open WebSocket",
				Some(Box::new(e)),
				self.metadata(),
			)
		})?;

		let request = rpc_request(SUBSCRIBE_REQUEST_ID, "eth_subscribe", json!(["newHeads"]));
		socket
			.send(Message::Text(request.to_string().into()))
			.await
			.map_err(|e| {
				BlockChainError::subscription_error(
					"Failed to send eth_subscribe",
					Some(Box::new(e)),
					self.metadata(),
				)
			})?;

		let subscription_id = loop {
			let message = match socket.next().await {
				Some(Ok(message)) => message,
				Some(Err(e)) => {
					return Err(BlockChainError::subscription_error(
						"WebSocket error while awaiting subscription",
						Some(Box::new(e)),
						self.metadata(),
					));
				}
				None => {
					return Err(BlockChainError::subscription_error(
						"WebSocket closed before subscription was confirmed",
						None,
						self.metadata(),
					));
				}
			};

			let Message::Text(text) = message else {
				continue;
			};
			let Ok(reply) = serde_json::from_str::<Value>(text.as_str()) else {
				continue;
			};
			if reply.get("id").and_then(Value::as_u64) != Some(SUBSCRIBE_REQUEST_ID) {
				continue;
			}
			match reply.get("result").and_then(Value::as_str) {
				Some(id) => break id.to_string(),
				None => {
					return Err(BlockChainError::subscription_error(
						format!("eth_subscribe rejected: {}", reply),
						None,
						self.metadata(),
					));
				}
			}
		};

		tracing::debug!(url = %self.url, subscription = %subscription_id, "Subscribed to new heads");

		let heads = socket.filter_map(move |message| {
			let outcome = match message {
				Ok(Message::Text(text)) => parse_head_notification(text.as_str(), &subscription_id),
				Ok(Message::Close(frame)) => Some(Err(BlockChainError::subscription_error(
					format!("WebSocket closed by peer: {:?}", frame),
					None,
					None,
				))),
				Ok(_) => None,
				Err(e) => Some(Err(BlockChainError::subscription_error(
					"WebSocket stream error",
					Some(Box::new(e)),
					None,
				))),
			};
			futures_util::future::ready(outcome)
		});

		Ok(heads.boxed())
	}
}

/// Extracts the block number from an `eth_subscription` notification for `subscription_id`
fn parse_head_notification(
	text: &str,
	subscription_id: &str,
) -> Option<Result<u64, BlockChainError>> {
	let notification: Value = serde_json::from_str(text).ok()?;
	if notification.get("method").and_then(Value::as_str) != Some("eth_subscription") {
		return None;
	}
	let params = notification.get("params")?;
	if params.get("subscription").and_then(Value::as_str) != Some(subscription_id) {
		return None;
	}
	let number = params.get("result").and_then(|head| head.get("number"))?;
	Some(parse_hex_quantity(number))
}
