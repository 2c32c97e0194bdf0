//! Addresses a chain watcher matches transactions against.
//!
//! An [`AddressSet`] is immutable once built. The [`AddressBook`] owns the current
//! set and swaps it wholesale on refresh, so a block scan that took a snapshot
//! never sees a half-updated set.

use std::{
	collections::HashSet,
	sync::{Arc, RwLock},
};
use tokio::sync::Notify;

use crate::models::normalize_address;

/// Immutable set of normalized addresses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSet {
	addresses: HashSet<String>,
}

impl AddressSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Case-insensitive membership test
	pub fn contains(&self, address: &str) -> bool {
		self.addresses.contains(&normalize_address(address))
	}

	pub fn len(&self) -> usize {
		self.addresses.len()
	}

	pub fn is_empty(&self) -> bool {
		self.addresses.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.addresses.iter().map(String::as_str)
	}
}

impl<S: AsRef<str>> FromIterator<S> for AddressSet {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self {
			addresses: iter
				.into_iter()
				.map(|address| normalize_address(address.as_ref()))
				.filter(|address| !address.is_empty())
				.collect(),
		}
	}
}

/// Holder of the current [`AddressSet`] snapshot
#[derive(Debug, Default)]
pub struct AddressBook {
	current: RwLock<Arc<AddressSet>>,
}

impl AddressBook {
	pub fn new(initial: AddressSet) -> Self {
		Self {
			current: RwLock::new(Arc::new(initial)),
		}
	}

	/// Returns the current set. The snapshot is unaffected by later refreshes.
	pub fn snapshot(&self) -> Arc<AddressSet> {
		match self.current.read() {
			Ok(guard) => Arc::clone(&guard),
			Err(poisoned) => Arc::clone(&poisoned.into_inner()),
		}
	}

	/// Installs a new set and returns its size
	pub fn replace(&self, set: AddressSet) -> usize {
		let len = set.len();
		let next = Arc::new(set);
		match self.current.write() {
			Ok(mut guard) => *guard = next,
			Err(poisoned) => *poisoned.into_inner() = next,
		}
		len
	}
}

/// Asks a watcher to reload its addresses ahead of the next periodic refresh
#[derive(Debug, Clone, Default)]
pub struct AddressRefreshHandle {
	notify: Arc<Notify>,
}

impl AddressRefreshHandle {
	pub fn new() -> Self {
		Self::default()
	}

	/// Requests a refresh. Multiple triggers before the watcher wakes collapse into one.
	pub fn trigger(&self) {
		self.notify.notify_one();
	}

	/// Completes once a refresh has been requested
	pub async fn notified(&self) {
		self.notify.notified().await;
	}
}
