//! Watermark storage for chain watchers.
//!
//! A watermark is the last block a watcher fully processed. Persisting it lets a
//! restarted watcher resume where it stopped instead of at the chain head.

use async_trait::async_trait;
use std::{collections::HashMap, path::PathBuf};

use crate::services::blockwatcher::BlockWatcherError;

/// Interface for watermark storage implementations
#[async_trait]
pub trait BlockStorage: Send + Sync {
	/// Retrieves the last processed block number for a chain
	///
	/// # Arguments
	/// * `chain` - Chain slug
	///
	/// # Returns
	/// * `Result<Option<u64>, BlockWatcherError>` - Last processed block or None if never stored
	async fn get_last_processed_block(&self, chain: &str) -> Result<Option<u64>, BlockWatcherError>;

	/// Saves the last processed block number for a chain
	///
	/// # Arguments
	/// * `chain` - Chain slug
	/// * `block` - Block number to save
	async fn save_last_processed_block(&self, chain: &str, block: u64)
		-> Result<(), BlockWatcherError>;
}

/// File-based implementation of block storage
///
/// Keeps one `{chain}_last_block.txt` file per chain in the storage directory.
#[derive(Debug, Clone)]
pub struct FileBlockStorage {
	/// Base path for all storage files
	storage_path: PathBuf,
}

impl FileBlockStorage {
	pub fn new(storage_path: PathBuf) -> Self {
		FileBlockStorage { storage_path }
	}

	fn watermark_path(&self, chain: &str) -> PathBuf {
		self.storage_path.join(format!("{}_last_block.txt", chain))
	}
}

impl Default for FileBlockStorage {
	/// Uses the `data` directory
	fn default() -> Self {
		FileBlockStorage::new(PathBuf::from("data"))
	}
}

#[async_trait]
impl BlockStorage for FileBlockStorage {
	async fn get_last_processed_block(&self, chain: &str) -> Result<Option<u64>, BlockWatcherError> {
		let file_path = self.watermark_path(chain);
		let metadata = HashMap::from([("path".to_string(), file_path.display().to_string())]);

		if !file_path.exists() {
			return Ok(None);
		}

		let content = tokio::fs::read_to_string(&file_path).await.map_err(|e| {
			BlockWatcherError::storage_error(
				"Failed to read last processed block",
				Some(Box::new(e)),
				Some(metadata.clone()),
			)
		})?;
		let block_number = content.trim().parse::<u64>().map_err(|e| {
			BlockWatcherError::storage_error(
				"Failed to parse last processed block",
				Some(Box::new(e)),
				Some(metadata),
			)
		})?;
		Ok(Some(block_number))
	}

	/// Overwrites any existing watermark for the chain
	async fn save_last_processed_block(
		&self,
		chain: &str,
		block: u64,
	) -> Result<(), BlockWatcherError> {
		let file_path = self.watermark_path(chain);
		let metadata = HashMap::from([("path".to_string(), file_path.display().to_string())]);

		tokio::fs::create_dir_all(&self.storage_path)
			.await
			.map_err(|e| {
				BlockWatcherError::storage_error(
					"Failed to create storage directory",
					Some(Box::new(e)),
					Some(metadata.clone()),
				)
			})?;
		tokio::fs::write(&file_path, block.to_string())
			.await
			.map_err(|e| {
				BlockWatcherError::storage_error(
					"Failed to save last processed block",
					Some(Box::new(e)),
					Some(metadata),
				)
			})?;
		Ok(())
	}
}
