//! Fan-out of transaction events to subscribers.
//!
//! For each event received from the bus the dispatch service looks up who
//! subscribed to the event's `(chain, address)`, records a notification for each
//! of them and hands the event to every configured notifier. Failures are
//! contained to the subscriber (or notifier) they happened for.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::{
	models::{Notification, TransactionEvent},
	repositories::{NotificationRepositoryTrait, SubscriptionRepositoryTrait},
	services::{eventbus::BusSubscription, notification::Notifier},
	utils::wait_for_shutdown,
};

/// Outcome of dispatching a single event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
	/// Subscribers found for the event's address
	pub subscribers: usize,
	/// Notifications stored
	pub saved: usize,
	/// Successful notifier calls
	pub delivered: usize,
	pub failed_saves: usize,
	pub failed_deliveries: usize,
	/// True when the subscriber lookup itself failed and nothing was attempted
	pub lookup_failed: bool,
}

/// Delivers events from the bus to subscribers
pub struct DispatchService {
	subscriptions: Arc<dyn SubscriptionRepositoryTrait>,
	notifications: Arc<dyn NotificationRepositoryTrait>,
	notifiers: Vec<Arc<dyn Notifier>>,
}

impl DispatchService {
	pub fn new(
		subscriptions: Arc<dyn SubscriptionRepositoryTrait>,
		notifications: Arc<dyn NotificationRepositoryTrait>,
		notifiers: Vec<Arc<dyn Notifier>>,
	) -> Self {
		Self {
			subscriptions,
			notifications,
			notifiers,
		}
	}

	/// Consumes `events` until shutdown or until the bus closes the channel.
	///
	/// An event whose fan-out is still in flight when shutdown fires is abandoned.
	/// The bus subscription is released on return.
	pub async fn run(
		&self,
		mut events: mpsc::Receiver<TransactionEvent>,
		subscription: BusSubscription,
		mut shutdown: watch::Receiver<bool>,
	) {
		tracing::info!(notifiers = self.notifiers.len(), "Dispatch service started");

		loop {
			let event = tokio::select! {
				biased;
				_ = wait_for_shutdown(&mut shutdown) => break,
				event = events.recv() => match event {
					Some(event) => event,
					None => {
						tracing::info!("Event bus closed");
						break;
					}
				},
			};

			tokio::select! {
				biased;
				_ = wait_for_shutdown(&mut shutdown) => {
					tracing::info!(tx_hash = %event.tx_hash, "Shutdown during fan-out, abandoning event");
					break;
				}
				_ = self.dispatch(&event) => {}
			}
		}

		subscription.unsubscribe();
		tracing::info!("Dispatch service stopped");
	}

	/// Fans one event out to its subscribers
	pub async fn dispatch(&self, event: &TransactionEvent) -> DispatchSummary {
		let mut summary = DispatchSummary::default();

		let subscribers = match self
			.subscriptions
			.list_subscribers_by_address(&event.chain, &event.address)
			.await
		{
			Ok(subscribers) => subscribers,
			Err(e) => {
				tracing::warn!(
					chain = %event.chain,
					address = %event.address,
					tx_hash = %event.tx_hash,
					error = %e,
					"Subscriber lookup failed, skipping event"
				);
				summary.lookup_failed = true;
				return summary;
			}
		};
		summary.subscribers = subscribers.len();

		for subscription in subscribers {
			let subscriber = subscription.subscriber_id.as_str();

			let notification = Notification::from_event(subscriber, event);
			match self.notifications.save(notification).await {
				Ok(()) => summary.saved += 1,
				Err(e) => {
					summary.failed_saves += 1;
					tracing::warn!(
						subscriber,
						tx_hash = %event.tx_hash,
						error = %e,
						"Failed to store notification"
					);
				}
			}

			for notifier in &self.notifiers {
				match notifier.send_alert(subscriber, event).await {
					Ok(()) => summary.delivered += 1,
					Err(e) => {
						summary.failed_deliveries += 1;
						tracing::warn!(
							subscriber,
							tx_hash = %event.tx_hash,
							error = %e,
							"Failed to deliver alert"
						);
					}
				}
			}
		}

		tracing::debug!(
			chain = %event.chain,
			tx_hash = %event.tx_hash,
			subscribers = summary.subscribers,
			saved = summary.saved,
			delivered = summary.delivered,
			"Event dispatched"
		);
		summary
	}
}
