//! Purchase statistics across the whole log
//!
//! The log layout drifted over the job's lifetime, so this pass does not trust block
//! boundaries. Every line is inspected on its own:
//!
//! - `buy <amount> <tag>` inside a response yields a crypto amount. Its date comes from
//!   the enclosing block via [`LogParser::block_start`] and [`LogParser::purchase_date`].
//! - A quantity line yields a fiat amount unless the line just before it (the block's
//!   response) carries an `error`.
//!
//! The two passes are independent and can drift apart. A count mismatch is reported
//! but does not stop the aggregation. Every amount remembers the block it came from, so
//! [`PurchaseStats::events`] only pairs amounts recorded in the same block.

use crate::error::Result;
use crate::models::{PurchaseEvent, StatsSummary};
use crate::parser::LogParser;
use crate::response::ResponseExtractor;
use chrono::NaiveDateTime;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Everything the full scan collected, newest first
#[derive(Debug, Clone, Default)]
pub struct PurchaseStats {
    pub crypto_amounts: Vec<f64>,
    pub fiat_amounts: Vec<u32>,
    pub dates: Vec<NaiveDateTime>,
    /// Block start of each crypto amount
    pub crypto_blocks: Vec<usize>,
    /// Block start of each fiat amount, `None` when no delimiter precedes the line
    pub fiat_blocks: Vec<Option<usize>>,
    pub mismatch: bool,
}

impl PurchaseStats {
    pub fn total_crypto(&self) -> f64 {
        self.crypto_amounts.iter().sum()
    }

    pub fn total_fiat(&self) -> u64 {
        self.fiat_amounts.iter().map(|&a| u64::from(a)).sum()
    }

    pub fn num_purchases(&self) -> usize {
        self.crypto_amounts.len()
    }

    pub fn largest_crypto(&self) -> Option<f64> {
        self.crypto_amounts.iter().copied().reduce(f64::max)
    }

    pub fn smallest_crypto(&self) -> Option<f64> {
        self.crypto_amounts.iter().copied().reduce(f64::min)
    }

    pub fn largest_fiat(&self) -> Option<u32> {
        self.fiat_amounts.iter().copied().max()
    }

    pub fn smallest_fiat(&self) -> Option<u32> {
        self.fiat_amounts.iter().copied().min()
    }

    /// Pair each crypto amount with the fiat amount of the same block, newest first.
    /// A purchase whose block has no fiat amount is left out.
    pub fn events(&self) -> Vec<PurchaseEvent> {
        let mut fiat_by_block = HashMap::new();
        for (&amount, block) in self.fiat_amounts.iter().zip(&self.fiat_blocks) {
            if let Some(block) = block {
                fiat_by_block.entry(*block).or_insert(amount);
            }
        }

        self.crypto_amounts
            .iter()
            .zip(&self.crypto_blocks)
            .zip(&self.dates)
            .filter_map(|((&amount_crypto, block), &date)| {
                fiat_by_block.get(block).map(|&amount_fiat| PurchaseEvent {
                    amount_crypto,
                    amount_fiat,
                    date,
                })
            })
            .collect()
    }

    pub fn summary(&self, crypto_asset: &str, fiat_currency: &str) -> StatsSummary {
        StatsSummary {
            total_crypto: self.total_crypto(),
            total_fiat: self.total_fiat(),
            num_purchases: self.num_purchases(),
            largest_crypto: self.largest_crypto(),
            largest_fiat: self.largest_fiat(),
            smallest_crypto: self.smallest_crypto(),
            smallest_fiat: self.smallest_fiat(),
            crypto_asset: crypto_asset.to_string(),
            fiat_currency: fiat_currency.to_string(),
            mismatch: self.mismatch,
        }
    }
}

pub struct StatsAggregator {
    buy_pattern: Regex,
}

impl StatsAggregator {
    pub fn new(purchase_tag: &str) -> Result<Self> {
        let buy_pattern = Regex::new(&format!(r"buy (\d\.\d+) {}", regex::escape(purchase_tag)))?;
        Ok(Self { buy_pattern })
    }

    /// Scan every line of the parser's store
    pub fn aggregate(&self, parser: &mut LogParser) -> Result<PurchaseStats> {
        let mut stats = PurchaseStats::default();
        let quantities = parser.quantities().clone();

        for index in 0..parser.store().len() {
            let line = parser.store().get(index)?;

            if quantities.is_quantity_line(&line) {
                if self.preceded_by_error(parser, index) {
                    debug!(line = index, "Quantity line belongs to a failed attempt");
                } else {
                    match quantities.extract(&line) {
                        Ok(amount) => {
                            stats.fiat_amounts.push(amount);
                            stats.fiat_blocks.push(parser.block_start(index).ok());
                        }
                        Err(err) if err.is_line_miss() => {}
                        Err(err) => return Err(err),
                    }
                }
            }

            let amount = self
                .buy_pattern
                .captures(&line.text)
                .and_then(|caps| caps[1].parse::<f64>().ok());
            if let Some(amount) = amount {
                stats.crypto_amounts.push(amount);

                let start = parser.block_start(index)?;
                stats.dates.push(parser.purchase_date(start)?);
                stats.crypto_blocks.push(start);
            }
        }

        if stats.crypto_amounts.len() != stats.fiat_amounts.len() {
            warn!(
                crypto = stats.crypto_amounts.len(),
                fiat = stats.fiat_amounts.len(),
                "Mismatch in crypto and fiat purchases"
            );
            stats.mismatch = true;
        }

        info!(
            purchases = stats.num_purchases(),
            total_fiat = stats.total_fiat(),
            "Collected purchase stats"
        );

        Ok(stats)
    }

    /// Whether the line before `index` is a response with a populated `error`.
    /// A missing or undecodable neighbour counts as no error.
    fn preceded_by_error(&self, parser: &LogParser, index: usize) -> bool {
        index
            .checked_sub(1)
            .and_then(|prev| parser.store().get(prev).ok())
            .and_then(|prev| ResponseExtractor::decode(&prev.text).ok())
            .map(|record| record.has_error())
            .unwrap_or(false)
    }
}

impl LogParser {
    /// Full-history purchase statistics using the configured purchase tag
    pub fn check_stats(&mut self) -> Result<PurchaseStats> {
        let aggregator = StatsAggregator::new(&self.options().purchase_tag)?;
        aggregator.aggregate(self)
    }
}
