//! Notifier that writes alerts to the application log.
//!
//! Used when no external channel is configured, so events remain visible.

use async_trait::async_trait;

use crate::{
	models::TransactionEvent,
	services::notification::{AlertTemplate, NotificationError, Notifier},
};

#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
	template: AlertTemplate,
}

impl LogNotifier {
	pub fn new(template: AlertTemplate) -> Self {
		Self { template }
	}
}

#[async_trait]
impl Notifier for LogNotifier {
	async fn send_alert(
		&self,
		subscriber_id: &str,
		event: &TransactionEvent,
	) -> Result<(), NotificationError> {
		let (title, body) = self.template.render(event);
		tracing::info!(
			subscriber = subscriber_id,
			chain = %event.chain,
			tx_hash = %event.tx_hash,
			title = %title,
			"{}",
			body
		);
		Ok(())
	}
}
