//! Quantity line extraction
//!
//! The cron job records how much fiat each attempt spends on a line such as
//! `Quantity of BTC to be bought for 45 GBP: 0.005` (older runs wrote
//! `Quantity: 45 GBP: 0.00500000 XBT`). Only the integer before the currency is read.

use crate::error::{ParseError, Result};
use crate::models::LogLine;
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

static AMOUNT_PATTERN: OnceLock<Regex> = OnceLock::new();

fn amount_pattern() -> &'static Regex {
    AMOUNT_PATTERN
        .get_or_init(|| Regex::new(r"(\d+) \w+:").expect("amount pattern is a valid regex"))
}

/// Integer amount from the first `<integer> <unit>:` group of `text`
pub fn parse_amount(text: &str) -> Option<u32> {
    amount_pattern()
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

#[derive(Debug, Clone)]
pub struct QuantityExtractor {
    marker: String,
    strict: bool,
}

impl QuantityExtractor {
    /// `strict` turns a marker line without a readable amount into
    /// [`ParseError::MalformedQuantity`]; otherwise the line is skipped with a warning.
    pub fn new(marker: impl Into<String>, strict: bool) -> Self {
        Self {
            marker: marker.into(),
            strict,
        }
    }

    pub fn is_quantity_line(&self, line: &LogLine) -> bool {
        line.starts_with(&self.marker)
    }

    pub fn extract(&self, line: &LogLine) -> Result<u32> {
        if !self.is_quantity_line(line) {
            return Err(ParseError::NotApplicable("quantity"));
        }

        match parse_amount(&line.text) {
            Some(amount) => Ok(amount),
            None if self.strict => Err(ParseError::MalformedQuantity {
                index: line.index,
                line: line.text.clone(),
            }),
            None => {
                warn!(line = line.index, text = %line.text, "Skipping malformed quantity line");
                Err(ParseError::NotApplicable("quantity"))
            }
        }
    }
}
