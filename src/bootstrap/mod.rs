//! Bootstrap module for initializing services and starting watchers.
//!
//! # Services
//! - `SubscriptionService`: validated access to the subscription repository
//! - `DispatchService`: fans bus events out to subscribers
//! - `EventBus`: connects chain watchers with the dispatch service
//!
//! # Watchers
//! - `spawn_watchers`: starts one `ChainWatcher` task per configured chain

use std::{
	collections::{BTreeMap, HashMap},
	env,
	error::Error,
	path::{Path, PathBuf},
	sync::Arc,
	time::Duration,
};
use tokio::{sync::watch, task::JoinHandle};

use crate::{
	models::{ChainConfig, ChainKind, ConfigError, ConfigLoader, Subscription},
	repositories::{
		InMemoryNotificationRepository, InMemorySubscriptionRepository, SubscriptionService,
	},
	services::{
		blockchain::{BitcoinConnector, ChainConnector, EvmConnector},
		blockwatcher::{AddressRefreshHandle, ChainWatcher, FileBlockStorage},
		dispatch::DispatchService,
		eventbus::{EventBus, DEFAULT_BUS_CAPACITY},
		notification::{AlertTemplate, LogNotifier, Notifier, TelegramNotifier},
	},
	utils::{create_retryable_http_client, HttpRetryConfig},
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error + Send + Sync>>;

const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

/// Runtime settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
	/// Directory holding `chains/*.json` and the optional `subscriptions.json`
	pub config_dir: PathBuf,
	/// Directory for watermark files
	pub storage_dir: PathBuf,
	pub telegram_bot_token: Option<String>,
	pub telegram_api_url: Option<String>,
	pub event_bus_capacity: usize,
	/// Time running tasks get to finish after shutdown is requested
	pub shutdown_grace: Duration,
}

impl Default for ServiceSettings {
	fn default() -> Self {
		Self {
			config_dir: PathBuf::from("config"),
			storage_dir: PathBuf::from("data"),
			telegram_bot_token: None,
			telegram_api_url: None,
			event_bus_capacity: DEFAULT_BUS_CAPACITY,
			shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
		}
	}
}

impl ServiceSettings {
	/// Reads `CONFIG_DIR`, `STORAGE_DIR`, `TELEGRAM_BOT_TOKEN`, `TELEGRAM_API_URL`,
	/// `EVENT_BUS_CAPACITY` and `SHUTDOWN_GRACE_SECS`
	pub fn from_env() -> std::result::Result<Self, ConfigError> {
		let defaults = Self::default();
		let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

		Ok(Self {
			config_dir: non_empty("CONFIG_DIR")
				.map(PathBuf::from)
				.unwrap_or(defaults.config_dir),
			storage_dir: non_empty("STORAGE_DIR")
				.map(PathBuf::from)
				.unwrap_or(defaults.storage_dir),
			telegram_bot_token: non_empty("TELEGRAM_BOT_TOKEN"),
			telegram_api_url: non_empty("TELEGRAM_API_URL"),
			event_bus_capacity: match non_empty("EVENT_BUS_CAPACITY") {
				Some(raw) => parse_env_number::<usize>("EVENT_BUS_CAPACITY", &raw)?,
				None => defaults.event_bus_capacity,
			},
			shutdown_grace: match non_empty("SHUTDOWN_GRACE_SECS") {
				Some(raw) => {
					Duration::from_secs(parse_env_number::<u64>("SHUTDOWN_GRACE_SECS", &raw)?)
				}
				None => defaults.shutdown_grace,
			},
		})
	}
}

fn parse_env_number<T: std::str::FromStr>(
	name: &str,
	raw: &str,
) -> std::result::Result<T, ConfigError>
where
	T::Err: Error + Send + Sync + 'static,
{
	raw.trim().parse::<T>().map_err(|e| {
		ConfigError::parse_error(
			format!("Invalid value for {}", name),
			Some(Box::new(e)),
			Some(HashMap::from([("value".to_string(), raw.to_string())])),
		)
	})
}

/// Everything the binary needs to run
pub struct Services {
	/// Configured chains ordered by slug
	pub chains: Vec<ChainConfig>,
	pub subscriptions: Arc<InMemorySubscriptionRepository>,
	pub subscription_service: Arc<SubscriptionService<InMemorySubscriptionRepository>>,
	pub notifications: Arc<InMemoryNotificationRepository>,
	pub block_storage: Arc<FileBlockStorage>,
	pub refresh_handles: HashMap<String, AddressRefreshHandle>,
	pub dispatch: Arc<DispatchService>,
	pub bus: EventBus,
	pub http_retry: HttpRetryConfig,
}

/// Loads configuration and wires the services together.
///
/// # Errors
/// Returns an error if the chain configuration is missing or invalid, or if a
/// notifier cannot be created.
pub async fn initialize_services(settings: &ServiceSettings) -> Result<Services> {
	let chains: BTreeMap<String, ChainConfig> =
		ChainConfig::load_all(Some(settings.config_dir.join("chains").as_path()))?;
	let chains: Vec<ChainConfig> = chains.into_values().collect();

	let refresh_handles: HashMap<String, AddressRefreshHandle> = chains
		.iter()
		.map(|chain| (chain.slug.clone(), AddressRefreshHandle::new()))
		.collect();
	let chain_kinds: HashMap<String, ChainKind> = chains
		.iter()
		.map(|chain| (chain.slug.clone(), chain.chain_type))
		.collect();

	let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
	let subscription_service = Arc::new(
		refresh_handles.iter().fold(
			SubscriptionService::new(subscriptions.clone(), chain_kinds),
			|service, (slug, handle)| service.with_refresh_handle(slug.clone(), handle.clone()),
		),
	);

	let seeds = load_subscription_seeds(&settings.config_dir.join("subscriptions.json"))?;
	let seeded = seed_subscriptions(&subscription_service, seeds).await;
	if seeded > 0 {
		tracing::info!(subscriptions = seeded, "Loaded subscriptions from seed file");
	}

	let http_retry = HttpRetryConfig::default();
	let notifiers = create_notifiers(settings, &http_retry)?;
	let notifications = Arc::new(InMemoryNotificationRepository::new());
	let dispatch = Arc::new(DispatchService::new(
		subscriptions.clone(),
		notifications.clone(),
		notifiers,
	));

	Ok(Services {
		chains,
		subscriptions,
		subscription_service,
		notifications,
		block_storage: Arc::new(FileBlockStorage::new(settings.storage_dir.clone())),
		refresh_handles,
		dispatch,
		bus: EventBus::with_capacity(settings.event_bus_capacity),
		http_retry,
	})
}

/// Reads the optional subscription seed file, a JSON array of subscriptions
pub fn load_subscription_seeds(path: &Path) -> std::result::Result<Vec<Subscription>, ConfigError> {
	if !path.exists() {
		return Ok(Vec::new());
	}
	let file = std::fs::File::open(path)?;
	serde_json::from_reader(file).map_err(|e| {
		ConfigError::parse_error(
			"Failed to parse subscription seed file",
			Some(Box::new(e)),
			Some(HashMap::from([("path".to_string(), path.display().to_string())])),
		)
	})
}

/// Adds `seeds` through the service; invalid entries are logged and skipped
pub async fn seed_subscriptions(
	service: &SubscriptionService<InMemorySubscriptionRepository>,
	seeds: Vec<Subscription>,
) -> usize {
	let mut added = 0;
	for seed in seeds {
		match service
			.subscribe(&seed.subscriber_id, &seed.chain, &seed.address)
			.await
		{
			Ok(true) => added += 1,
			Ok(false) => {}
			Err(e) => {
				tracing::warn!(
					subscriber = %seed.subscriber_id,
					chain = %seed.chain,
					error = %e,
					"Skipping invalid seed subscription"
				);
			}
		}
	}
	added
}

/// Builds the notifiers: Telegram when a bot token is configured, the log notifier otherwise
pub fn create_notifiers(
	settings: &ServiceSettings,
	http_retry: &HttpRetryConfig,
) -> Result<Vec<Arc<dyn Notifier>>> {
	let Some(token) = settings.telegram_bot_token.clone() else {
		tracing::info!("TELEGRAM_BOT_TOKEN not set, alerts will only be logged");
		return Ok(vec![Arc::new(LogNotifier::default())]);
	};

	let client = create_retryable_http_client(http_retry)?;
	let telegram = TelegramNotifier::new(
		settings.telegram_api_url.clone(),
		token,
		AlertTemplate::default(),
		Arc::new(client),
	)?;
	Ok(vec![Arc::new(telegram)])
}

/// Spawns one watcher task per configured chain
pub fn spawn_watchers(
	services: &Services,
	shutdown: &watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
	services
		.chains
		.iter()
		.map(|chain| {
			let refresh = services
				.refresh_handles
				.get(&chain.slug)
				.cloned()
				.unwrap_or_default();
			match chain.chain_type {
				ChainKind::EVM => spawn_watcher(
					services,
					chain,
					EvmConnector::new(chain.clone(), services.http_retry.clone()),
					refresh,
					shutdown.clone(),
				),
				ChainKind::Bitcoin => spawn_watcher(
					services,
					chain,
					BitcoinConnector::new(chain.clone(), services.http_retry.clone()),
					refresh,
					shutdown.clone(),
				),
			}
		})
		.collect()
}

fn spawn_watcher<C: ChainConnector + 'static>(
	services: &Services,
	chain: &ChainConfig,
	connector: C,
	refresh: AddressRefreshHandle,
	shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
	let mut watcher = ChainWatcher::new(
		chain.clone(),
		connector,
		services.subscriptions.clone(),
		services.block_storage.clone(),
		services.bus.clone(),
	)
	.with_refresh_handle(refresh);

	tokio::spawn(async move { watcher.run(shutdown).await })
}
