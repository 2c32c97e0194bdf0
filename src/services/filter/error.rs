//! Error types for transaction extraction.
//!
//! A [`FilterError`] always describes a single transaction; the block it came
//! from is still processed.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;

/// Represents errors that can occur while extracting events from a transaction
#[derive(ThisError, Debug)]
pub enum FilterError {
	/// The transaction JSON did not have the expected shape
	#[error("Decode error: {0}")]
	DecodeError(ErrorContext),

	/// An amount could not be scaled into display units
	#[error("Conversion error: {0}")]
	ConversionError(ErrorContext),
}

impl FilterError {
	// Decode error
	pub fn decode_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::DecodeError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Conversion error
	pub fn conversion_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConversionError(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for FilterError {
	fn trace_id(&self) -> String {
		match self {
			Self::DecodeError(ctx) => ctx.trace_id.clone(),
			Self::ConversionError(ctx) => ctx.trace_id.clone(),
		}
	}
}
