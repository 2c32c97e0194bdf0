//! Notification log repository.

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::RwLock;

use crate::{
	models::{normalize_address, Notification},
	repositories::error::RepositoryError,
};

/// Interface for the append-only notification log
#[async_trait]
pub trait NotificationRepositoryTrait: Send + Sync {
	async fn save(&self, notification: Notification) -> Result<(), RepositoryError>;

	/// Most recent notifications for one subscriber and address, newest first
	async fn list_by_address(
		&self,
		subscriber_id: &str,
		chain: &str,
		address: &str,
		limit: usize,
	) -> Result<Vec<Notification>, RepositoryError>;
}

/// Entries kept by [`InMemoryNotificationRepository::new`]
pub const DEFAULT_MAX_NOTIFICATIONS: usize = 10_000;

/// Process-local notification log.
///
/// Stands in for a persistent store: history is lost on restart and only the
/// newest `max_entries` notifications are kept, oldest evicted first.
#[derive(Debug)]
pub struct InMemoryNotificationRepository {
	notifications: RwLock<VecDeque<Notification>>,
	max_entries: usize,
}

impl Default for InMemoryNotificationRepository {
	fn default() -> Self {
		Self::with_max_entries(DEFAULT_MAX_NOTIFICATIONS)
	}
}

impl InMemoryNotificationRepository {
	pub fn new() -> Self {
		Self::default()
	}

	/// Keeps at most `max_entries` notifications (at least one)
	pub fn with_max_entries(max_entries: usize) -> Self {
		Self {
			notifications: RwLock::new(VecDeque::new()),
			max_entries: max_entries.max(1),
		}
	}

	pub async fn len(&self) -> usize {
		self.notifications.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}
}

#[async_trait]
impl NotificationRepositoryTrait for InMemoryNotificationRepository {
	async fn save(&self, notification: Notification) -> Result<(), RepositoryError> {
		let mut notifications = self.notifications.write().await;
		if notifications.len() >= self.max_entries {
			notifications.pop_front();
		}
		notifications.push_back(notification);
		Ok(())
	}

	async fn list_by_address(
		&self,
		subscriber_id: &str,
		chain: &str,
		address: &str,
		limit: usize,
	) -> Result<Vec<Notification>, RepositoryError> {
		let address = normalize_address(address);
		Ok(self
			.notifications
			.read()
			.await
			.iter()
			.rev()
			.filter(|n| n.subscriber_id == subscriber_id && n.chain == chain && n.address == address)
			.take(limit)
			.cloned()
			.collect())
	}
}
