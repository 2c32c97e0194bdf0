//! Utility modules for common functionality.
//!
//! - amount: exact conversion between smallest chain units and display units
//! - http: retryable HTTP client construction
//! - logging: logging setup and error context
//! - retry: backoff configuration and cancellable retry loops
//! - shutdown: helpers around the shared shutdown signal
//! - tests: Test utilities

pub mod amount;
pub mod http;
pub mod logging;
pub mod retry;
pub mod shutdown;
pub mod tests;

pub use amount::{to_display_units, to_smallest_units, AmountError};
pub use http::{create_retryable_http_client, HttpRetryConfig};
pub use retry::{retry_until_cancelled, BackoffConfig};
pub use shutdown::{is_shutdown, wait_for_shutdown};
