//! Test helper utilities
//!
//! This module contains test helper utilities for the application.
//!
//! - `builders`: Test helper utilities for creating test instances of models

pub mod builders {
	// Chain specific test helpers
	pub mod bitcoin;
	pub mod evm;

	// Chain agnostic test helpers
	pub mod chain;
}

pub use builders::*;
