//! Core Data Models
//!
//! Data structures shared by the line store, the block recovery engine and the stats
//! aggregator.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`LogLine`] - one line of the cron log, addressed newest first
//! 2. **Decoded**: [`ResponseRecord`] - the JSON body the exchange returned for one attempt
//! 3. **Derived**: [`PurchaseEvent`] - amount bought, amount spent and when
//! 4. **Reports**: [`StatsSummary`] - totals and extremes across the whole history

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single log line with its position in the reversed store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Line text with trailing whitespace stripped
    pub text: String,
    /// 0 is the newest line
    pub index: usize,
}

impl LogLine {
    pub fn new(text: &str, index: usize) -> Self {
        Self {
            text: text.trim_end().to_string(),
            index,
        }
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.text.starts_with(prefix)
    }
}

/// Decoded response line. `error` is mandatory; every other key lands in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub error: Value,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ResponseRecord {
    /// Build a record from a decoded JSON object, `None` when `error` is absent
    pub fn from_object(mut object: Map<String, Value>) -> Option<Self> {
        let error = object.remove("error")?;
        Some(Self {
            error,
            fields: object,
        })
    }

    /// The failure reason, or `None` when the `error` field is empty
    pub fn error_message(&self) -> Option<String> {
        match &self.error {
            Value::Null => None,
            Value::Bool(false) => None,
            Value::Bool(true) => Some("true".to_string()),
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Array(items) if items.is_empty() => None,
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Value::Object(map) if map.is_empty() => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(other.to_string()),
        }
    }

    pub fn has_error(&self) -> bool {
        self.error_message().is_some()
    }
}

/// One completed purchase recovered from the log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseEvent {
    pub amount_crypto: f64,
    pub amount_fiat: u32,
    pub date: NaiveDateTime,
}

/// Serializable summary of the purchase history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    #[serde(rename = "totalCrypto")]
    pub total_crypto: f64,
    #[serde(rename = "totalFiat")]
    pub total_fiat: u64,
    #[serde(rename = "numPurchases")]
    pub num_purchases: usize,
    #[serde(rename = "largestCrypto")]
    pub largest_crypto: Option<f64>,
    #[serde(rename = "largestFiat")]
    pub largest_fiat: Option<u32>,
    #[serde(rename = "smallestCrypto")]
    pub smallest_crypto: Option<f64>,
    #[serde(rename = "smallestFiat")]
    pub smallest_fiat: Option<u32>,
    #[serde(rename = "cryptoAsset")]
    pub crypto_asset: String,
    #[serde(rename = "fiatCurrency")]
    pub fiat_currency: String,
    pub mismatch: bool,
}
