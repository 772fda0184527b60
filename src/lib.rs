//! Buylog Library
//!
//! Reads the log written by a recurring automated-purchase cron job and answers two
//! questions: when was the last successful purchase, and what does the whole purchase
//! history add up to.
//!
//! ## Log Layout
//!
//! Each attempt appends a block of four lines. Read newest first, a block is a `---`
//! delimiter, a `date` timestamp, the exchange's JSON response and a `Quantity` line
//! with the fiat amount spent. Failed attempts log a response whose `error` field is
//! populated; those blocks are skipped.
//!
//! ## Architecture Overview
//!
//! - [`line_store`] - the log held in memory, newest line first
//! - [`date_normalizer`] - reorders locale-dependent `date` output into one format
//! - [`response`] - decodes response lines and gates on their `error` field
//! - [`quantity`] - reads the fiat amount from quantity lines
//! - [`parser`] - the block recovery engine and last-purchase queries
//! - [`stats`] - full-history statistics independent of block boundaries
//! - [`notifier`] - alert sinks for upstream failures
//! - [`export`] - CSV export of purchase events
//! - [`display`] - plain, verbose and JSON reporting
//! - [`config`] - configuration with file and environment variable support
//! - [`logging`] - structured logging with JSON and pretty-print formats
//!
//! ## Main Entry Point
//!
//! ```rust,no_run
//! use buylog::{LineStore, LogParser, ParserOptions};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let store = LineStore::load(Path::new("logs/cronjob.log"))?;
//! let mut parser = LogParser::new(store, ParserOptions::default());
//!
//! let last_buy = parser.get_last_buy_date()?;
//! let stats = parser.check_stats()?;
//! println!("{last_buy}: {} purchases", stats.num_purchases());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod date_normalizer;
pub mod display;
pub mod error;
pub mod export;
pub mod line_store;
pub mod logging;
pub mod models;
pub mod notifier;
pub mod parser;
pub mod quantity;
pub mod response;
pub mod stats;

pub use error::ParseError;
pub use line_store::LineStore;
pub use models::*;
pub use parser::{LogParser, ParserOptions};
pub use stats::{PurchaseStats, StatsAggregator};
