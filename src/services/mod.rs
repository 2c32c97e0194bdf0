//! Core services implementing the business logic.
//!
//! This module contains the main service implementations:
//! - `blockchain`: Clients and transports for EVM and Bitcoin nodes
//! - `blockwatcher`: Per-chain block discovery and transaction matching
//! - `dispatch`: Fan-out of matched transactions to subscribers
//! - `eventbus`: In-process delivery of transaction events
//! - `filter`: Extraction of transaction events from blocks
//! - `notification`: Alert delivery to subscribers

pub mod blockchain;
pub mod blockwatcher;
pub mod dispatch;
pub mod eventbus;
pub mod filter;
pub mod notification;
