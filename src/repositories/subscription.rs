//! Subscription repository and service.
//!
//! The repository stores `(subscriber, chain, address)` triples. The service layer
//! validates and normalizes user input, then asks the affected chain watcher to
//! reload its address set.

use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use crate::{
	models::{normalize_address, ChainKind, Subscription},
	repositories::error::RepositoryError,
	services::blockwatcher::AddressRefreshHandle,
};

/// Interface for subscription storage
#[async_trait]
pub trait SubscriptionRepositoryTrait: Send + Sync {
	/// Stores a subscription. Returns `false` if the triple already existed.
	async fn add_subscription(&self, subscription: Subscription) -> Result<bool, RepositoryError>;

	/// Deletes a subscription. Returns `false` if it did not exist.
	async fn remove_subscription(
		&self,
		subscription: &Subscription,
	) -> Result<bool, RepositoryError>;

	/// All subscriptions of one subscriber on one chain
	async fn list_subscriptions(
		&self,
		subscriber_id: &str,
		chain: &str,
	) -> Result<Vec<Subscription>, RepositoryError>;

	/// All subscriptions for `(chain, address)`, used for fan-out
	async fn list_subscribers_by_address(
		&self,
		chain: &str,
		address: &str,
	) -> Result<Vec<Subscription>, RepositoryError>;

	/// Distinct monitored addresses on a chain
	async fn get_unique_addresses(&self, chain: &str) -> Result<Vec<String>, RepositoryError>;
}

/// Process-local subscription store preserving insertion order
#[derive(Debug, Default)]
pub struct InMemorySubscriptionRepository {
	subscriptions: RwLock<Vec<Subscription>>,
}

impl InMemorySubscriptionRepository {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl SubscriptionRepositoryTrait for InMemorySubscriptionRepository {
	async fn add_subscription(&self, subscription: Subscription) -> Result<bool, RepositoryError> {
		let mut subscriptions = self.subscriptions.write().await;
		if subscriptions.contains(&subscription) {
			return Ok(false);
		}
		subscriptions.push(subscription);
		Ok(true)
	}

	async fn remove_subscription(
		&self,
		subscription: &Subscription,
	) -> Result<bool, RepositoryError> {
		let mut subscriptions = self.subscriptions.write().await;
		let before = subscriptions.len();
		subscriptions.retain(|s| s != subscription);
		Ok(subscriptions.len() != before)
	}

	async fn list_subscriptions(
		&self,
		subscriber_id: &str,
		chain: &str,
	) -> Result<Vec<Subscription>, RepositoryError> {
		Ok(self
			.subscriptions
			.read()
			.await
			.iter()
			.filter(|s| s.subscriber_id == subscriber_id && s.chain == chain)
			.cloned()
			.collect())
	}

	async fn list_subscribers_by_address(
		&self,
		chain: &str,
		address: &str,
	) -> Result<Vec<Subscription>, RepositoryError> {
		let address = normalize_address(address);
		Ok(self
			.subscriptions
			.read()
			.await
			.iter()
			.filter(|s| s.chain == chain && s.address == address)
			.cloned()
			.collect())
	}

	async fn get_unique_addresses(&self, chain: &str) -> Result<Vec<String>, RepositoryError> {
		let subscriptions = self.subscriptions.read().await;
		let mut addresses: Vec<String> = Vec::new();
		for subscription in subscriptions.iter().filter(|s| s.chain == chain) {
			if !addresses.contains(&subscription.address) {
				addresses.push(subscription.address.clone());
			}
		}
		Ok(addresses)
	}
}

/// Checks the textual shape of an address for a chain family.
///
/// EVM addresses are `0x` followed by 40 hex digits. Bitcoin addresses are 26 to 62
/// alphanumeric characters, which covers base58 and bech32/bech32m encodings.
pub fn is_valid_address(kind: ChainKind, address: &str) -> bool {
	let address = address.trim();
	match kind {
		ChainKind::EVM => {
			address.len() == 42
				&& (address.starts_with("0x") || address.starts_with("0X"))
				&& address[2..].chars().all(|c| c.is_ascii_hexdigit())
		}
		ChainKind::Bitcoin => {
			(26..=62).contains(&address.len()) && address.chars().all(|c| c.is_ascii_alphanumeric())
		}
	}
}

/// Validating front for a subscription repository.
///
/// Every successful mutation fires the refresh handle of the affected chain so its
/// watcher picks up the new address set without waiting for the periodic refresh.
pub struct SubscriptionService<T: SubscriptionRepositoryTrait> {
	repository: Arc<T>,
	chains: HashMap<String, ChainKind>,
	refresh_handles: HashMap<String, AddressRefreshHandle>,
}

impl<T: SubscriptionRepositoryTrait> SubscriptionService<T> {
	pub fn new(repository: Arc<T>, chains: HashMap<String, ChainKind>) -> Self {
		Self {
			repository,
			chains,
			refresh_handles: HashMap::new(),
		}
	}

	/// Registers the handle used to wake the watcher of `chain`
	pub fn with_refresh_handle(
		mut self,
		chain: impl Into<String>,
		handle: AddressRefreshHandle,
	) -> Self {
		self.refresh_handles.insert(chain.into(), handle);
		self
	}

	pub fn repository(&self) -> Arc<T> {
		self.repository.clone()
	}

	fn validate(&self, chain: &str, address: &str) -> Result<(), RepositoryError> {
		let metadata = || {
			Some(HashMap::from([
				("chain".to_string(), chain.to_string()),
				("address".to_string(), address.to_string()),
			]))
		};

		let Some(kind) = self.chains.get(chain) else {
			return Err(RepositoryError::validation_error(
				"Unknown chain",
				None,
				metadata(),
			));
		};

		if !is_valid_address(*kind, address) {
			return Err(RepositoryError::validation_error(
				"Invalid address format",
				None,
				metadata(),
			));
		}

		Ok(())
	}

	fn trigger_refresh(&self, chain: &str) {
		if let Some(handle) = self.refresh_handles.get(chain) {
			handle.trigger();
		}
	}

	/// Adds a subscription. Returns `false` if it already existed.
	pub async fn subscribe(
		&self,
		subscriber_id: &str,
		chain: &str,
		address: &str,
	) -> Result<bool, RepositoryError> {
		self.validate(chain, address)?;
		let subscription = Subscription::new(subscriber_id, chain, address);
		let added = self.repository.add_subscription(subscription).await?;
		if added {
			tracing::info!(subscriber = subscriber_id, chain, address, "Subscription added");
			self.trigger_refresh(chain);
		}
		Ok(added)
	}

	/// Removes a subscription. Returns `false` if it did not exist.
	pub async fn unsubscribe(
		&self,
		subscriber_id: &str,
		chain: &str,
		address: &str,
	) -> Result<bool, RepositoryError> {
		let subscription = Subscription::new(subscriber_id, chain, address);
		let removed = self.repository.remove_subscription(&subscription).await?;
		if removed {
			tracing::info!(subscriber = subscriber_id, chain, address, "Subscription removed");
			self.trigger_refresh(chain);
		}
		Ok(removed)
	}

	pub async fn list(
		&self,
		subscriber_id: &str,
		chain: &str,
	) -> Result<Vec<Subscription>, RepositoryError> {
		self.repository.list_subscriptions(subscriber_id, chain).await
	}
}
