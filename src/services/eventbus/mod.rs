//! In-process fan-out of transaction events.
//!
//! Every subscriber owns a bounded channel. Publishing never waits: if a
//! subscriber's channel is full the event is dropped for that subscriber only, so a
//! slow consumer cannot stall the chain watchers.

use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc, RwLock, Weak,
	},
};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::models::TransactionEvent;

/// Per-subscriber channel capacity used when none is configured
pub const DEFAULT_BUS_CAPACITY: usize = 32;

type Registry = HashMap<u64, mpsc::Sender<TransactionEvent>>;

#[derive(Debug)]
struct BusInner {
	capacity: usize,
	next_id: AtomicU64,
	subscribers: RwLock<Registry>,
}

impl BusInner {
	fn remove(&self, ids: &[u64]) {
		let mut subscribers = match self.subscribers.write() {
			Ok(guard) => guard,
			Err(poisoned) => poisoned.into_inner(),
		};
		for id in ids {
			subscribers.remove(id);
		}
	}
}

/// Cloneable handle to a shared event bus
#[derive(Debug, Clone)]
pub struct EventBus {
	inner: Arc<BusInner>,
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new()
	}
}

impl EventBus {
	pub fn new() -> Self {
		Self::with_capacity(DEFAULT_BUS_CAPACITY)
	}

	/// Creates a bus whose subscriber channels hold `capacity` events (at least one)
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			inner: Arc::new(BusInner {
				capacity: capacity.max(1),
				next_id: AtomicU64::new(0),
				subscribers: RwLock::new(HashMap::new()),
			}),
		}
	}

	pub fn capacity(&self) -> usize {
		self.inner.capacity
	}

	/// Registers a new subscriber.
	///
	/// Events published after this call are delivered to the returned receiver
	/// until the [`BusSubscription`] is released.
	pub fn subscribe(&self) -> (mpsc::Receiver<TransactionEvent>, BusSubscription) {
		let (sender, receiver) = mpsc::channel(self.inner.capacity);
		let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

		match self.inner.subscribers.write() {
			Ok(mut guard) => guard.insert(id, sender),
			Err(poisoned) => poisoned.into_inner().insert(id, sender),
		};
		tracing::debug!(subscriber = id, "Event bus subscriber added");

		(
			receiver,
			BusSubscription {
				id,
				bus: Arc::downgrade(&self.inner),
				active: true,
			},
		)
	}

	/// Offers `event` to every subscriber without waiting and returns how many accepted it
	pub fn publish(&self, event: TransactionEvent) -> usize {
		let mut delivered = 0;
		let mut closed = Vec::new();

		{
			let subscribers = match self.inner.subscribers.read() {
				Ok(guard) => guard,
				Err(poisoned) => poisoned.into_inner(),
			};
			for (id, sender) in subscribers.iter() {
				match sender.try_send(event.clone()) {
					Ok(()) => delivered += 1,
					Err(TrySendError::Full(dropped)) => {
						tracing::debug!(
							subscriber = id,
							chain = %dropped.chain,
							tx_hash = %dropped.tx_hash,
							"Subscriber channel full, dropping event"
						);
					}
					Err(TrySendError::Closed(_)) => closed.push(*id),
				}
			}
		}

		if !closed.is_empty() {
			self.inner.remove(&closed);
		}
		delivered
	}

	pub fn subscriber_count(&self) -> usize {
		match self.inner.subscribers.read() {
			Ok(guard) => guard.len(),
			Err(poisoned) => poisoned.into_inner().len(),
		}
	}
}

/// Registration of one bus subscriber.
///
/// Releasing it, either through [`BusSubscription::unsubscribe`] or by dropping it,
/// removes the subscriber's sender so its receiver closes once drained.
#[derive(Debug)]
pub struct BusSubscription {
	id: u64,
	bus: Weak<BusInner>,
	active: bool,
}

impl BusSubscription {
	pub fn id(&self) -> u64 {
		self.id
	}

	pub fn unsubscribe(mut self) {
		self.detach();
	}

	fn detach(&mut self) {
		if !std::mem::replace(&mut self.active, false) {
			return;
		}
		if let Some(bus) = self.bus.upgrade() {
			bus.remove(&[self.id]);
			tracing::debug!(subscriber = self.id, "Event bus subscriber removed");
		}
	}
}

impl Drop for BusSubscription {
	fn drop(&mut self) {
		self.detach();
	}
}
