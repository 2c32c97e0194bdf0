//! Blockchain client interfaces and implementations.
//!
//! - Generic client and connector traits
//! - EVM and Bitcoin clients
//! - HTTP JSON-RPC and WebSocket transports
//! - Error handling for blockchain operations

mod client;
mod clients;
mod error;
mod transports;

pub use client::{BlockChainClient, ChainConnector, HeadStream};
pub use clients::{BitcoinClient, BitcoinConnector, EvmClient, EvmConnector};
pub use error::BlockChainError;
pub use transports::{
	parse_hex_quantity, BlockchainTransport, HttpTransportClient, RpcCredentials,
	WsHeadSubscriber,
};
