//! Retry mechanism for operations that must eventually succeed.
//!
//! Unlike a bounded retry, [`retry_until_cancelled`] keeps trying until the
//! operation succeeds or the shutdown signal fires. Both the operation itself and
//! the sleep between attempts are raced against the signal.

use std::{fmt::Display, future::Future, time::Duration};
use tokio::sync::watch;

use crate::utils::shutdown::{is_shutdown, wait_for_shutdown};

/// Backoff between consecutive attempts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackoffConfig {
	/// Delay after the first failure
	pub initial_delay: Duration,

	/// Upper bound for any single delay
	pub max_delay: Duration,

	/// Factor applied to the delay after each failure. `1` gives a fixed interval.
	pub multiplier: u32,
}

impl Default for BackoffConfig {
	/// Fixed 10 second interval
	fn default() -> Self {
		Self {
			initial_delay: Duration::from_secs(10),
			max_delay: Duration::from_secs(10),
			multiplier: 1,
		}
	}
}

impl BackoffConfig {
	/// Delay to wait after the `attempt`-th consecutive failure (1-based)
	pub fn delay_for(&self, attempt: u32) -> Duration {
		let exponent = attempt.saturating_sub(1);
		let factor = self.multiplier.max(1).checked_pow(exponent).unwrap_or(u32::MAX);
		self.initial_delay
			.checked_mul(factor)
			.unwrap_or(self.max_delay)
			.min(self.max_delay)
	}
}

/// Runs `operation` until it succeeds, sleeping according to `backoff` between failures.
///
/// Returns `None` if shutdown is requested before a successful attempt.
pub async fn retry_until_cancelled<F, Fut, T, E>(
	backoff: &BackoffConfig,
	shutdown: &mut watch::Receiver<bool>,
	label: &str,
	mut operation: F,
) -> Option<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: Display,
{
	let mut attempt = 0u32;
	loop {
		if is_shutdown(shutdown) {
			return None;
		}

		let result = tokio::select! {
			_ = wait_for_shutdown(shutdown) => return None,
			result = operation() => result,
		};

		match result {
			Ok(value) => return Some(value),
			Err(e) => {
				attempt = attempt.saturating_add(1);
				let delay = backoff.delay_for(attempt);
				tracing::warn!(
					operation = label,
					attempt,
					retry_in_ms = delay.as_millis() as u64,
					error = %e,
					"Attempt failed, retrying"
				);
				tokio::select! {
					_ = wait_for_shutdown(shutdown) => return None,
					_ = tokio::time::sleep(delay) => {}
				}
			}
		}
	}
}
