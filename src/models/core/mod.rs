//! Core domain models.
//!
//! - Chains: definitions of watched networks and how to reach them
//! - Events: normalized transactions published by chain watchers
//! - Subscriptions: who wants to hear about which address, and the notification log

mod chain;
mod event;
mod subscription;

pub use chain::{ChainConfig, ConnectRetry, DiscoveryMode};
pub use event::{Direction, TransactionEvent};
pub use subscription::{Notification, Subscription};

/// Canonical form of a wallet address used for storage and matching.
pub fn normalize_address(address: &str) -> String {
	address.trim().to_lowercase()
}
