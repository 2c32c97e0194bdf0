//! Chain watching.
//!
//! - `ChainWatcher`: per-chain connect, block discovery and event publication
//! - Address sets with atomic snapshot replacement
//! - Watermark storage

mod address_set;
mod error;
mod service;
mod storage;

pub use address_set::{AddressBook, AddressRefreshHandle, AddressSet};
pub use error::BlockWatcherError;
pub use service::{block_range, ChainWatcher, DEFAULT_MAX_PAST_BLOCKS};
pub use storage::{BlockStorage, FileBlockStorage};
