//! Wallet notifier service entry point.
//!
//! Loads chain definitions and seed subscriptions, starts one watcher per chain and
//! a dispatch task that turns matched transactions into alerts. Ctrl+C stops every
//! task; tasks that do not finish within the grace period are aborted.
//!
//! # Flow
//! 1. Applies CLI options to the environment when not already set
//! 2. Initializes repositories, notifiers and the event bus
//! 3. Subscribes the dispatch service to the bus
//! 4. Spawns the chain watchers
//! 5. Handles graceful shutdown on Ctrl+C

use wallet_notifier::{
	bootstrap::{initialize_services, spawn_watchers, Result, ServiceSettings},
	utils::logging::setup_logging,
};

use clap::{Arg, Command};
use dotenvy::dotenv;
use std::env::{set_var, var};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
	let matches = Command::new("wallet-notifier")
		.version(env!("CARGO_PKG_VERSION"))
		.about(
			"Watches EVM and Bitcoin chains for transactions touching subscribed wallet \
			 addresses and notifies every subscriber of the address.",
		)
		.arg(
			Arg::new("config-dir")
				.long("config-dir")
				.help("Directory holding chains/*.json and subscriptions.json (default: config)")
				.value_name("PATH"),
		)
		.arg(
			Arg::new("storage-dir")
				.long("storage-dir")
				.help("Directory for last processed block files (default: data)")
				.value_name("PATH"),
		)
		.arg(
			Arg::new("log-file")
				.long("log-file")
				.help("Write logs to file instead of stdout")
				.action(clap::ArgAction::SetTrue),
		)
		.arg(
			Arg::new("log-level")
				.long("log-level")
				.help("Set log level (trace, debug, info, warn, error)")
				.value_name("LEVEL"),
		)
		.arg(
			Arg::new("log-path")
				.long("log-path")
				.help("Path to store log files (default: logs/)")
				.value_name("PATH"),
		)
		.arg(
			Arg::new("log-max-size")
				.long("log-max-size")
				.help("Maximum log file size in bytes before rolling (default: 1GB)")
				.value_name("BYTES"),
		)
		.get_matches();

	dotenv().ok();

	// Only apply CLI options if the corresponding environment variables are NOT already set
	if matches.get_flag("log-file") && var("LOG_MODE").is_err() {
		set_var("LOG_MODE", "file");
	}

	for (arg, env_name) in [
		("log-level", "LOG_LEVEL"),
		("log-path", "LOG_DATA_DIR"),
		("log-max-size", "LOG_MAX_SIZE"),
		("config-dir", "CONFIG_DIR"),
		("storage-dir", "STORAGE_DIR"),
	] {
		if let Some(value) = matches.get_one::<String>(arg) {
			if var(env_name).is_err() {
				set_var(env_name, value);
			}
		}
	}

	setup_logging().unwrap_or_else(|e| {
		error!("Failed to setup logging: {}", e);
	});

	let settings = ServiceSettings::from_env()?;
	let services = initialize_services(&settings).await.map_err(|e| {
		anyhow::anyhow!(
			"Failed to initialize services: {}. Check the chain definitions under {}/chains.",
			e,
			settings.config_dir.display()
		)
	})?;

	if services.chains.is_empty() {
		info!("No chains configured. Exiting...");
		return Ok(());
	}

	let (shutdown_tx, shutdown_rx) = watch::channel(false);

	// Subscribe before any watcher can publish
	let (events, bus_subscription) = services.bus.subscribe();
	let dispatch = services.dispatch.clone();
	let dispatch_shutdown = shutdown_rx.clone();
	let mut tasks: Vec<JoinHandle<()>> = vec![tokio::spawn(async move {
		dispatch
			.run(events, bus_subscription, dispatch_shutdown)
			.await
	})];
	tasks.extend(spawn_watchers(&services, &shutdown_rx));

	info!(
		chains = services.chains.len(),
		"Service started. Press Ctrl+C to shutdown"
	);

	tokio::signal::ctrl_c().await?;
	info!("Shutdown signal received, stopping services...");
	let _ = shutdown_tx.send(true);

	let aborts: Vec<_> = tasks.iter().map(|task| task.abort_handle()).collect();
	let joined = tokio::time::timeout(
		settings.shutdown_grace,
		futures_util::future::join_all(tasks),
	)
	.await;

	match joined {
		Ok(results) => {
			for result in results {
				if let Err(e) = result {
					error!("Task failed during shutdown: {}", e);
				}
			}
		}
		Err(_) => {
			warn!(
				grace_secs = settings.shutdown_grace.as_secs(),
				"Tasks did not stop within the grace period, aborting"
			);
			for abort in aborts {
				abort.abort();
			}
		}
	}

	info!("Shutdown complete");
	Ok(())
}
