//! Chain watcher implementation.
//!
//! A [`ChainWatcher`] owns everything one chain needs: its connector and client,
//! its address book and its watermark. It connects with backoff, discovers new
//! blocks either by polling or by following `newHeads`, and publishes one
//! [`TransactionEvent`](crate::models::TransactionEvent) per matching transaction
//! to the event bus. Losing the connection tears the session down and the outer
//! loop starts a new one.

use futures_util::StreamExt;
use std::{collections::HashMap, ops::RangeInclusive, sync::Arc, time::Duration};
use tokio::{
	sync::watch,
	time::{Instant, Interval, MissedTickBehavior},
};

use crate::{
	models::{BlockType, ChainConfig, DiscoveryMode},
	repositories::SubscriptionRepositoryTrait,
	services::{
		blockchain::{BlockChainClient, ChainConnector},
		blockwatcher::{
			address_set::{AddressBook, AddressRefreshHandle, AddressSet},
			error::BlockWatcherError,
			storage::BlockStorage,
		},
		eventbus::EventBus,
		filter::extract_transactions_for_block,
	},
	utils::{logging::error::TraceableError, retry_until_cancelled, wait_for_shutdown},
};

/// Catch-up window used when a chain does not set `max_past_blocks`
pub const DEFAULT_MAX_PAST_BLOCKS: u64 = 10;

/// Why a connected session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
	Shutdown,
	Reconnect,
}

/// Computes the blocks to process given the stored watermark and the confirmed head.
///
/// Without a watermark only the confirmed head is processed. With one, at most
/// `max_past_blocks` of the most recent unprocessed blocks are processed.
pub fn block_range(
	last_processed: Option<u64>,
	confirmed_head: u64,
	max_past_blocks: u64,
) -> Option<RangeInclusive<u64>> {
	let Some(last) = last_processed else {
		return Some(confirmed_head..=confirmed_head);
	};
	if last >= confirmed_head {
		return None;
	}
	let window_start = confirmed_head.saturating_sub(max_past_blocks.max(1) - 1);
	Some(std::cmp::max(last + 1, window_start)..=confirmed_head)
}

/// Watches a single chain and publishes matching transactions
pub struct ChainWatcher<C: ChainConnector> {
	chain: ChainConfig,
	connector: C,
	subscriptions: Arc<dyn SubscriptionRepositoryTrait>,
	block_storage: Arc<dyn BlockStorage>,
	bus: EventBus,
	address_book: AddressBook,
	refresh: AddressRefreshHandle,
	last_processed: Option<u64>,
}

impl<C: ChainConnector> ChainWatcher<C> {
	/// Creates a watcher for `chain`
	///
	/// # Arguments
	/// * `chain` - Chain configuration
	/// * `connector` - Opens connections to the chain endpoint
	/// * `subscriptions` - Source of the addresses to watch
	/// * `block_storage` - Watermark persistence
	/// * `bus` - Destination of matching transaction events
	pub fn new(
		chain: ChainConfig,
		connector: C,
		subscriptions: Arc<dyn SubscriptionRepositoryTrait>,
		block_storage: Arc<dyn BlockStorage>,
		bus: EventBus,
	) -> Self {
		Self {
			chain,
			connector,
			subscriptions,
			block_storage,
			bus,
			address_book: AddressBook::default(),
			refresh: AddressRefreshHandle::new(),
			last_processed: None,
		}
	}

	/// Uses an existing refresh handle, e.g. one already registered with the subscription service
	pub fn with_refresh_handle(mut self, refresh: AddressRefreshHandle) -> Self {
		self.refresh = refresh;
		self
	}

	pub fn chain(&self) -> &ChainConfig {
		&self.chain
	}

	pub fn refresh_handle(&self) -> AddressRefreshHandle {
		self.refresh.clone()
	}

	/// Current address set snapshot
	pub fn addresses(&self) -> Arc<AddressSet> {
		self.address_book.snapshot()
	}

	pub fn last_processed_block(&self) -> Option<u64> {
		self.last_processed
	}

	fn error_metadata(&self, block: Option<u64>) -> HashMap<String, String> {
		let mut metadata = HashMap::from([("chain".to_string(), self.chain.slug.clone())]);
		if let Some(block) = block {
			metadata.insert("block".to_string(), block.to_string());
		}
		metadata
	}

	/// Runs the watcher until `shutdown` fires
	pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
		tracing::info!(chain = %self.chain.slug, endpoint = %self.connector.endpoint(), "Starting chain watcher");
		self.last_processed = self.load_watermark().await;

		let backoff = self.chain.connect_retry.backoff();
		let label = format!("connect {}", self.chain.slug);

		loop {
			let connector = &self.connector;
			let Some(client) =
				retry_until_cancelled(&backoff, &mut shutdown, &label, || connector.connect())
					.await
			else {
				break;
			};
			tracing::info!(chain = %self.chain.slug, "Connected to chain endpoint");

			self.refresh_addresses().await;

			let end = match self.chain.discovery {
				DiscoveryMode::Poll { interval_ms } => {
					self.poll_blocks(&client, Duration::from_millis(interval_ms), &mut shutdown)
						.await
				}
				DiscoveryMode::Subscribe => self.follow_new_heads(&client, &mut shutdown).await,
			};
			drop(client);

			if end == SessionEnd::Shutdown {
				break;
			}

			tracing::warn!(
				chain = %self.chain.slug,
				retry_in_ms = backoff.initial_delay.as_millis() as u64,
				"Session ended, reconnecting"
			);
			tokio::select! {
				biased;
				_ = wait_for_shutdown(&mut shutdown) => break,
				_ = tokio::time::sleep(backoff.initial_delay) => {}
			}
		}

		tracing::info!(chain = %self.chain.slug, "Chain watcher stopped");
	}

	/// Replaces the address set with the repository's current view.
	///
	/// On failure or timeout the previous set stays in place.
	pub async fn refresh_addresses(&self) {
		let lookup = self.subscriptions.get_unique_addresses(&self.chain.slug);
		match tokio::time::timeout(self.chain.lookup_timeout(), lookup).await {
			Ok(Ok(addresses)) => {
				let count = self.address_book.replace(addresses.into_iter().collect());
				tracing::debug!(chain = %self.chain.slug, addresses = count, "Address set refreshed");
			}
			Ok(Err(e)) => {
				tracing::warn!(
					chain = %self.chain.slug,
					error = %e,
					"Failed to load addresses, keeping current set"
				);
			}
			Err(_) => {
				tracing::warn!(
					chain = %self.chain.slug,
					timeout_ms = self.chain.lookup_timeout_ms,
					"Address lookup timed out, keeping current set"
				);
			}
		}
	}

	fn refresh_ticker(&self) -> Interval {
		let every = self.chain.address_refresh_interval();
		let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
		ticker
	}

	async fn poll_blocks(
		&mut self,
		client: &C::Client,
		interval: Duration,
		shutdown: &mut watch::Receiver<bool>,
	) -> SessionEnd {
		let mut ticker = tokio::time::interval(interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
		let mut refresh_ticker = self.refresh_ticker();
		let refresh = self.refresh.clone();
		let max_failures = self.chain.max_consecutive_failures.max(1);
		let mut failures = 0u32;

		loop {
			tokio::select! {
				biased;
				_ = wait_for_shutdown(shutdown) => return SessionEnd::Shutdown,
				_ = refresh.notified() => self.refresh_addresses().await,
				_ = refresh_ticker.tick() => self.refresh_addresses().await,
				_ = ticker.tick() => {
					let outcome = tokio::select! {
						biased;
						_ = wait_for_shutdown(shutdown) => return SessionEnd::Shutdown,
						outcome = self.poll_once(client) => outcome,
					};
					match outcome {
						Ok(()) => failures = 0,
						Err(e) => {
							failures += 1;
							tracing::warn!(
								chain = %self.chain.slug,
								failures,
								max_failures,
								trace_id = %e.trace_id(),
								"Polling failed"
							);
							if failures >= max_failures {
								return SessionEnd::Reconnect;
							}
						}
					}
				}
			}
		}
	}

	async fn poll_once(&mut self, client: &C::Client) -> Result<(), BlockWatcherError> {
		let head = client.get_latest_block_number().await.map_err(|e| {
			BlockWatcherError::network_error(
				"Failed to get latest block number",
				Some(Box::new(e)),
				Some(self.error_metadata(None)),
			)
		})?;
		self.process_new_blocks(client, head).await
	}

	async fn follow_new_heads(
		&mut self,
		client: &C::Client,
		shutdown: &mut watch::Receiver<bool>,
	) -> SessionEnd {
		let subscribed = tokio::select! {
			biased;
			_ = wait_for_shutdown(shutdown) => return SessionEnd::Shutdown,
			subscribed = client.subscribe_new_heads() => subscribed,
		};
		let mut heads = match subscribed {
			Ok(heads) => heads,
			Err(e) => {
				// Logged on construction
				BlockWatcherError::network_error(
					"Head subscription failed",
					Some(Box::new(e)),
					Some(self.error_metadata(None)),
				);
				return SessionEnd::Reconnect;
			}
		};
		tracing::info!(chain = %self.chain.slug, "Following new heads");

		let mut refresh_ticker = self.refresh_ticker();
		let refresh = self.refresh.clone();

		loop {
			tokio::select! {
				biased;
				_ = wait_for_shutdown(shutdown) => return SessionEnd::Shutdown,
				_ = refresh.notified() => self.refresh_addresses().await,
				_ = refresh_ticker.tick() => self.refresh_addresses().await,
				head = heads.next() => match head {
					Some(Ok(number)) => {
						let outcome = tokio::select! {
							biased;
							_ = wait_for_shutdown(shutdown) => return SessionEnd::Shutdown,
							outcome = self.process_new_blocks(client, number) => outcome,
						};
						if let Err(e) = outcome {
							tracing::warn!(
								chain = %self.chain.slug,
								head = number,
								trace_id = %e.trace_id(),
								"Block range interrupted, will resume on next head"
							);
						}
					}
					Some(Err(e)) => {
						// Logged on construction
						BlockWatcherError::network_error(
							"Head stream failed",
							Some(Box::new(e)),
							Some(self.error_metadata(None)),
						);
						return SessionEnd::Reconnect;
					}
					None => {
						tracing::warn!(chain = %self.chain.slug, "Head stream closed");
						return SessionEnd::Reconnect;
					}
				},
			}
		}
	}

	/// Processes every unprocessed block up to `head` minus the confirmation depth.
	///
	/// A transient fetch failure stops the range without advancing the watermark.
	pub async fn process_new_blocks(
		&mut self,
		client: &C::Client,
		head: u64,
	) -> Result<(), BlockWatcherError> {
		let confirmed = head.saturating_sub(self.chain.confirmation_blocks);
		let max_past_blocks = self.chain.max_past_blocks.unwrap_or(DEFAULT_MAX_PAST_BLOCKS);
		let Some(range) = block_range(self.last_processed, confirmed, max_past_blocks) else {
			return Ok(());
		};

		if let Some(last) = self.last_processed {
			let skipped = range.start().saturating_sub(last + 1);
			if skipped > 0 {
				tracing::info!(
					chain = %self.chain.slug,
					last_processed = last,
					skipped,
					"Catch-up window exceeded, skipping older blocks"
				);
			}
		}
		tracing::debug!(
			chain = %self.chain.slug,
			from = *range.start(),
			to = *range.end(),
			"Processing blocks"
		);

		for number in range {
			let addresses = self.address_book.snapshot();
			if !addresses.is_empty() {
				match client.get_block(number).await {
					Ok(block) => {
						self.process_block(&block, &addresses);
					}
					Err(e) if e.is_transient() => {
						return Err(BlockWatcherError::network_error(
							format!("Failed to get block {}", number),
							Some(Box::new(e)),
							Some(self.error_metadata(Some(number))),
						));
					}
					Err(e) => {
						let error = BlockWatcherError::processing_error(
							"Skipping block that could not be decoded",
							Some(Box::new(e)),
							Some(self.error_metadata(Some(number))),
						);
						tracing::warn!(
							chain = %self.chain.slug,
							block = number,
							trace_id = %error.trace_id(),
							"Block skipped"
						);
					}
				}
			}
			self.advance_watermark(number).await;
		}
		Ok(())
	}

	/// Publishes the events of one block and returns how many were found
	fn process_block(&self, block: &BlockType, addresses: &AddressSet) -> usize {
		let number = block.number();
		let mut matched = 0;

		for (index, result) in extract_transactions_for_block(&self.chain, block, addresses)
			.into_iter()
			.enumerate()
		{
			match result {
				Ok(events) => {
					for event in events {
						tracing::info!(
							chain = %event.chain,
							block = number,
							tx_hash = %event.tx_hash,
							address = %event.address,
							direction = %event.direction,
							amount = %event.amount,
							"Matched transaction"
						);
						self.bus.publish(event);
						matched += 1;
					}
				}
				Err(e) => {
					tracing::warn!(
						chain = %self.chain.slug,
						block = number,
						tx_index = index,
						error = %e,
						"Skipping transaction"
					);
				}
			}
		}

		tracing::debug!(
			chain = %self.chain.slug,
			block = number,
			transactions = block.transaction_count(),
			matched,
			"Block processed"
		);
		matched
	}

	async fn advance_watermark(&mut self, number: u64) {
		self.last_processed = Some(number);
		if let Err(e) = self
			.block_storage
			.save_last_processed_block(&self.chain.slug, number)
			.await
		{
			tracing::warn!(chain = %self.chain.slug, block = number, error = %e, "Failed to persist watermark");
		}
	}

	async fn load_watermark(&self) -> Option<u64> {
		match self
			.block_storage
			.get_last_processed_block(&self.chain.slug)
			.await
		{
			Ok(last) => {
				tracing::debug!(chain = %self.chain.slug, last_processed = ?last, "Loaded watermark");
				last
			}
			Err(e) => {
				tracing::warn!(chain = %self.chain.slug, error = %e, "Failed to load watermark, starting at head");
				None
			}
		}
	}
}
