use std::{collections::HashMap, path::Path};
use url::Url;

use crate::models::{ChainConfig, ChainKind, ConfigError, ConfigLoader, DiscoveryMode};

const MIN_POLL_INTERVAL_MS: u64 = 100;

fn validation(msg: impl Into<String>, slug: &str) -> ConfigError {
	ConfigError::validation_error(
		msg,
		None,
		Some(HashMap::from([("chain".to_string(), slug.to_string())])),
	)
}

fn has_scheme(raw: &str, schemes: &[&str]) -> bool {
	Url::parse(raw)
		.map(|url| schemes.contains(&url.scheme()))
		.unwrap_or(false)
}

impl ConfigLoader for ChainConfig {
	fn load_all<T>(path: Option<&Path>) -> Result<T, ConfigError>
	where
		T: FromIterator<(String, Self)>,
	{
		let chain_dir = path.unwrap_or(Path::new("config/chains"));

		if !chain_dir.exists() {
			return Err(ConfigError::file_error(
				"chains directory not found",
				None,
				Some(HashMap::from([(
					"path".to_string(),
					chain_dir.display().to_string(),
				)])),
			));
		}

		let mut entries = std::fs::read_dir(chain_dir)?
			.map(|entry| entry.map(|e| e.path()))
			.collect::<Result<Vec<_>, _>>()?;
		entries.sort();

		let mut pairs: Vec<(String, Self)> = Vec::new();
		for path in entries.into_iter().filter(|p| Self::is_json_file(p)) {
			let chain = Self::load_from_path(&path)?;
			if pairs.iter().any(|(slug, _)| slug == &chain.slug) {
				return Err(validation(
					format!("Duplicate chain slug in {}", path.display()),
					&chain.slug,
				));
			}
			pairs.push((chain.slug.clone(), chain));
		}

		Ok(T::from_iter(pairs))
	}

	fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		let file = std::fs::File::open(path)?;
		let config: ChainConfig = serde_json::from_reader(file)?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		let slug = self.slug.as_str();

		if slug.is_empty()
			|| !slug
				.chars()
				.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
		{
			return Err(validation(
				"Slug must contain only lowercase letters, numbers, and underscores",
				slug,
			));
		}

		if self.currency.trim().is_empty() {
			return Err(validation("Currency symbol must not be empty", slug));
		}

		if self.decimals > crate::utils::amount::MAX_DECIMALS {
			return Err(validation("Decimals must be at most 28", slug));
		}

		if !has_scheme(&self.rpc_url, &["http", "https"]) {
			return Err(validation("RPC URL must start with http:// or https://", slug));
		}

		if let Some(ws_url) = &self.ws_url {
			if !has_scheme(ws_url, &["ws", "wss"]) {
				return Err(validation("WebSocket URL must start with ws:// or wss://", slug));
			}
		}

		match &self.discovery {
			DiscoveryMode::Poll { interval_ms } if *interval_ms < MIN_POLL_INTERVAL_MS => {
				return Err(validation("Poll interval must be at least 100ms", slug));
			}
			DiscoveryMode::Subscribe if self.chain_type != ChainKind::EVM => {
				return Err(validation(
					"Head subscription is only supported for EVM chains",
					slug,
				));
			}
			DiscoveryMode::Subscribe if self.ws_url.is_none() => {
				return Err(validation("Head subscription requires ws_url", slug));
			}
			_ => {}
		}

		if self.connect_retry.initial_delay_ms == 0 {
			return Err(validation("Connect retry delay must be greater than 0", slug));
		}

		if self.address_refresh_interval_ms == 0 || self.lookup_timeout_ms == 0 {
			return Err(validation(
				"Address refresh interval and lookup timeout must be greater than 0",
				slug,
			));
		}

		if self.max_past_blocks == Some(0) {
			return Err(validation("max_past_blocks must be greater than 0", slug));
		}

		if self.chain_type == ChainKind::Bitcoin && !(2..=3).contains(&self.block_verbosity) {
			return Err(validation("block_verbosity must be 2 or 3", slug));
		}

		Ok(())
	}
}
