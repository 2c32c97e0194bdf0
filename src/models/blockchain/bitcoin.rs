//! Bitcoin block and transaction data structures as returned by Bitcoin Core's
//! `getblock <hash> 2` (or `3`, which adds `prevout` to inputs).

use serde::{Deserialize, Serialize};

/// Block with decoded transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitcoinBlock {
	pub hash: String,
	pub height: u64,
	/// Block header time in epoch seconds
	pub time: i64,
	/// Raw transaction objects, decoded one at a time by the filter
	#[serde(default)]
	pub tx: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitcoinTransaction {
	pub txid: String,
	#[serde(default)]
	pub vin: Vec<BitcoinInput>,
	#[serde(default)]
	pub vout: Vec<BitcoinOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitcoinInput {
	#[serde(default)]
	pub coinbase: Option<String>,
	#[serde(default)]
	pub txid: Option<String>,
	#[serde(default)]
	pub vout: Option<u32>,
	/// Spent output, only present at verbosity 3
	#[serde(default)]
	pub prevout: Option<BitcoinPrevout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitcoinPrevout {
	#[serde(rename = "scriptPubKey")]
	pub script_pub_key: ScriptPubKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitcoinOutput {
	/// Value in BTC. serde_json stores it as an `f64`; its shortest round-trip
	/// text is exact for 8-decimal amounts, which is what the filter parses.
	pub value: serde_json::Number,
	pub n: u32,
	#[serde(rename = "scriptPubKey")]
	pub script_pub_key: ScriptPubKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptPubKey {
	#[serde(rename = "type")]
	pub script_type: String,
	#[serde(default)]
	pub address: Option<String>,
	/// Pre-22.0 nodes report addresses as a list
	#[serde(default)]
	pub addresses: Vec<String>,
}

impl ScriptPubKey {
	/// Output script types that encode a single recipient address
	pub const ADDRESS_TYPES: [&'static str; 5] = [
		"pubkeyhash",
		"scripthash",
		"witness_v0_keyhash",
		"witness_v0_scripthash",
		"witness_v1_taproot",
	];

	/// The recipient address if this script pays to one
	pub fn address(&self) -> Option<&str> {
		if !Self::ADDRESS_TYPES.contains(&self.script_type.as_str()) {
			return None;
		}
		self.address
			.as_deref()
			.or_else(|| self.addresses.first().map(String::as_str))
	}
}
