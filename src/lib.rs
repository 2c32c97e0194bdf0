//! Wallet Notifier
//!
//! Watches EVM and Bitcoin chains for transactions that touch a dynamic set of
//! monitored wallet addresses and fans every match out to the subscribers of
//! that address.
//!
//! The pipeline is:
//!
//! - [`services::blockwatcher`]: one [`services::blockwatcher::ChainWatcher`] per chain,
//!   connecting with backoff, discovering blocks by polling or head subscription and
//!   extracting matching transactions
//! - [`services::eventbus`]: in-process, non-blocking fan-out of normalized events
//! - [`services::dispatch`]: resolves subscribers, persists notification records and
//!   invokes the configured notifiers
//!
//! Storage and alert delivery are reached through the traits in [`repositories`] and
//! [`services::notification`].

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
