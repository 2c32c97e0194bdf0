//! Helpers around the process-wide shutdown signal.
//!
//! Every long-running task receives a `watch::Receiver<bool>` that flips to `true`
//! once shutdown starts. A dropped sender is treated the same as a shutdown.

use tokio::sync::watch;

/// Resolves once shutdown has been requested or the sender is gone.
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
	let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Returns true if shutdown has already been requested
pub fn is_shutdown(shutdown: &watch::Receiver<bool>) -> bool {
	*shutdown.borrow()
}
