//! Alert message templates.
//!
//! Templates use `${name}` placeholders. The variables available for a
//! transaction alert are `chain`, `direction`, `amount`, `currency`, `address`,
//! `tx_hash` and `timestamp`.
//!
//! [`AlertTemplate::render_markdown`] escapes substituted values for Telegram's
//! Markdown parse mode, where a lone `_` in a chain slug would otherwise open an
//! entity that never closes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{Direction, TransactionEvent};

/// Title and body of an alert, with `${...}` placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertTemplate {
	pub title: String,
	pub body: String,
}

impl Default for AlertTemplate {
	fn default() -> Self {
		Self {
			title: "${direction_label} ${currency} transaction".to_string(),
			body: "${amount} ${currency} ${direction} on ${chain}\n\nAddress: `${address}`\nTx: \
			       `${tx_hash}`\nTime: ${timestamp}"
				.to_string(),
		}
	}
}

impl AlertTemplate {
	pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			body: body.into(),
		}
	}

	/// Renders the template for `event`, returning `(title, body)`
	pub fn render(&self, event: &TransactionEvent) -> (String, String) {
		let variables = event_variables(event);
		(
			format_template(&self.title, &variables),
			format_template(&self.body, &variables),
		)
	}

	/// Like [`render`](Self::render), with values escaped for Markdown
	pub fn render_markdown(&self, event: &TransactionEvent) -> (String, String) {
		let variables = event_variables(event);
		(
			format_markdown_template(&self.title, &variables),
			format_markdown_template(&self.body, &variables),
		)
	}
}

/// Template variables describing `event`
pub fn event_variables(event: &TransactionEvent) -> HashMap<String, String> {
	let timestamp = DateTime::<Utc>::from_timestamp(event.timestamp, 0)
		.map(|time| time.to_rfc3339())
		.unwrap_or_else(|| event.timestamp.to_string());
	let direction_label = match event.direction {
		Direction::Incoming => "Incoming",
		Direction::Outgoing => "Outgoing",
	};

	HashMap::from([
		("chain".to_string(), event.chain.clone()),
		("direction".to_string(), event.direction.to_string()),
		("direction_label".to_string(), direction_label.to_string()),
		("amount".to_string(), event.amount.normalize().to_string()),
		("currency".to_string(), event.currency.clone()),
		("address".to_string(), event.address.clone()),
		("tx_hash".to_string(), event.tx_hash.clone()),
		("timestamp".to_string(), timestamp),
	])
}

/// Substitutes `${key}` placeholders. Unknown placeholders are left as-is.
pub fn format_template(template: &str, variables: &HashMap<String, String>) -> String {
	let mut message = template.to_string();
	for (key, value) in variables {
		message = message.replace(&format!("${{{}}}", key), value);
	}
	message
}

/// Backslash-escapes the characters that delimit Markdown entities
pub fn escape_markdown(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());
	for ch in value.chars() {
		if matches!(ch, '_' | '*' | '`' | '[') {
			escaped.push('\\');
		}
		escaped.push(ch);
	}
	escaped
}

/// Substitutes `${key}` placeholders for a Markdown message.
///
/// Values outside a `` ` `` code span are escaped. Inside a code span escapes are
/// not interpreted, so only backticks are removed from the value.
pub fn format_markdown_template(template: &str, variables: &HashMap<String, String>) -> String {
	let mut message = String::with_capacity(template.len());
	let mut in_code = false;
	let mut rest = template;

	while let Some(ch) = rest.chars().next() {
		if let Some(after) = rest.strip_prefix("${") {
			let value = after
				.find('}')
				.and_then(|end| variables.get(&after[..end]).map(|value| (end, value)));
			if let Some((end, value)) = value {
				if in_code {
					message.push_str(&value.replace('`', ""));
				} else {
					message.push_str(&escape_markdown(value));
				}
				rest = &after[end + 1..];
				continue;
			}
		}
		if ch == '`' {
			in_code = !in_code;
		}
		message.push(ch);
		rest = &rest[ch.len_utf8()..];
	}
	message
}
