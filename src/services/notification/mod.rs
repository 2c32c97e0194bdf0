//! Notification service implementation.
//!
//! - `Notifier`: delivery of one alert to one subscriber
//! - Telegram Bot API notifier
//! - Log notifier used when no channel is configured
//! - Alert templates with `${...}` variables

use async_trait::async_trait;

mod error;
mod log;
mod telegram;
mod template;

pub use error::NotificationError;
pub use log::LogNotifier;
pub use telegram::{TelegramNotifier, DEFAULT_TELEGRAM_API_URL};
pub use template::{event_variables, format_template, AlertTemplate};

use crate::models::TransactionEvent;

/// Interface for notification implementations
#[async_trait]
pub trait Notifier: Send + Sync {
	/// Delivers an alert about `event` to `subscriber_id`
	///
	/// # Arguments
	/// * `subscriber_id` - Destination of the alert (a chat id for Telegram)
	/// * `event` - The transaction to report
	///
	/// # Returns
	/// * `Result<(), NotificationError>` - Success or error
	async fn send_alert(
		&self,
		subscriber_id: &str,
		event: &TransactionEvent,
	) -> Result<(), NotificationError>;
}
