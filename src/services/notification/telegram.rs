//! Telegram notification implementation.
//!
//! Sends alerts through the Bot API `sendMessage` method. The subscriber id is
//! the Telegram chat id.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::json;
use std::{collections::HashMap, sync::Arc};

use crate::{
	models::TransactionEvent,
	services::notification::{AlertTemplate, NotificationError, Notifier},
};

/// Bot API endpoint used when none is configured
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Implementation of Telegram notifications via the Bot API
pub struct TelegramNotifier {
	/// HTTP client with retry middleware
	client: Arc<ClientWithMiddleware>,
	/// Bot API base URL
	base_url: String,
	/// Telegram bot token
	token: String,
	/// Message template
	template: AlertTemplate,
	/// Disable web preview
	disable_web_preview: bool,
}

impl TelegramNotifier {
	/// Creates a new Telegram notifier instance
	///
	/// # Arguments
	/// * `base_url` - Bot API URL, defaults to the public Telegram endpoint
	/// * `token` - Telegram bot token
	/// * `template` - Alert title and body template
	/// * `http_client` - HTTP client with middleware for retries
	pub fn new(
		base_url: Option<String>,
		token: String,
		template: AlertTemplate,
		http_client: Arc<ClientWithMiddleware>,
	) -> Result<Self, NotificationError> {
		if token.trim().is_empty() {
			return Err(NotificationError::config_error(
				"Telegram bot token is empty",
				None,
				None,
			));
		}
		Ok(Self {
			client: http_client,
			base_url: base_url
				.unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string())
				.trim_end_matches('/')
				.to_string(),
			token,
			template,
			disable_web_preview: true,
		})
	}

	pub fn with_web_preview(mut self, enabled: bool) -> Self {
		self.disable_web_preview = !enabled;
		self
	}

	/// Renders `event` into the Markdown message text
	pub fn format_message(&self, event: &TransactionEvent) -> String {
		let (title, body) = self.template.render_markdown(event);
		format!("*{}* \n\n{}", title, body)
	}

	fn send_message_url(&self) -> String {
		format!("{}/bot{}/sendMessage", self.base_url, self.token)
	}
}

#[async_trait]
impl Notifier for TelegramNotifier {
	/// Sends the rendered alert to the subscriber's chat
	async fn send_alert(
		&self,
		subscriber_id: &str,
		event: &TransactionEvent,
	) -> Result<(), NotificationError> {
		let metadata = HashMap::from([
			("subscriber".to_string(), subscriber_id.to_string()),
			("tx_hash".to_string(), event.tx_hash.clone()),
		]);
		let payload = json!({
			"chat_id": subscriber_id,
			"text": self.format_message(event),
			"parse_mode": "markdown",
			"disable_web_page_preview": self.disable_web_preview,
		});

		let response = self
			.client
			.post(self.send_message_url())
			.json(&payload)
			.send()
			.await
			.map_err(|e| {
				// The request URL carries the bot token
				let source: Box<dyn std::error::Error + Send + Sync> = match e {
					reqwest_middleware::Error::Reqwest(e) => Box::new(e.without_url()),
					other => Box::new(other),
				};
				NotificationError::network_error(
					"Failed to send Telegram notification",
					Some(source),
					Some(metadata.clone()),
				)
			})?;

		let status = response.status();
		let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);

		if !status.is_success() {
			let mut metadata = metadata;
			metadata.insert("status".to_string(), status.as_u16().to_string());
			if let Some(description) = body.get("description").and_then(|d| d.as_str()) {
				metadata.insert("description".to_string(), description.to_string());
			}
			return Err(NotificationError::notify_failed(
				"Telegram API returned error status",
				None,
				Some(metadata),
			));
		}

		if body.get("ok").and_then(|ok| ok.as_bool()) == Some(false) {
			return Err(NotificationError::notify_failed(
				"Telegram API rejected the message",
				None,
				Some(metadata),
			));
		}

		Ok(())
	}
}
