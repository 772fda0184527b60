//! Block Recovery Engine
//!
//! Every purchase attempt appends a fixed-size block to the cron log. Read newest first,
//! a block looks like this:
//!
//! ```text
//! ---                                          <- delimiter, block start
//! Tue 14 Mar 09:15:42 GMT 2023                 <- timestamp, tokens in locale order
//! {"error":[],"result":{...}}                  <- exchange response
//! Quantity: 45 GBP: 0.00500000 XBT             <- fiat spent
//! ```
//!
//! [`LogParser::iterate_block`] applies an extractor to the lines of one block. A line
//! the extractor does not recognize is skipped. A response carrying an `error` poisons
//! the block: the engine walks forward block by block with the response gate until it
//! finds a clean block, then re-applies the caller's extractor there. Running off the
//! oldest line ends the query with [`ParseError::NoLogs`].

use crate::config::Config;
use crate::date_normalizer::DateNormalizer;
use crate::error::{ParseError, Result};
use crate::line_store::LineStore;
use crate::models::{LogLine, ResponseRecord};
use crate::notifier::{LogNotifier, Notifier};
use crate::quantity::QuantityExtractor;
use crate::response::ResponseExtractor;
use chrono::NaiveDateTime;
use std::fmt;
use tracing::{debug, info, trace, warn};

const SECONDS_PER_DAY: i64 = 60 * 60 * 24;

/// Log layout and purchase schedule the parser works with
#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub block_size: usize,
    pub block_delimiter: String,
    pub quantity_marker: String,
    pub purchase_tag: String,
    pub strict_quantity: bool,
    pub daily_amount: u32,
    pub recognized_errors: Vec<String>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ParserOptions {
    fn from(config: &Config) -> Self {
        Self {
            block_size: config.parser.block_size,
            block_delimiter: config.parser.block_delimiter.clone(),
            quantity_marker: config.parser.quantity_marker.clone(),
            purchase_tag: config.parser.purchase_tag.clone(),
            strict_quantity: config.parser.strict_quantity,
            daily_amount: config.purchase.daily_amount,
            recognized_errors: config.notifications.recognized_errors.clone(),
        }
    }
}

/// Outcome of scanning a single block
enum Scan<T> {
    Found(T, usize),
    BlockFailed,
    Missed,
}

pub struct LogParser {
    store: LineStore,
    options: ParserOptions,
    responses: ResponseExtractor,
    quantities: QuantityExtractor,
    last_good_response: Option<ResponseRecord>,
    last_buy_date: Option<NaiveDateTime>,
}

impl LogParser {
    /// Parser that reports alerts through the log
    pub fn new(store: LineStore, options: ParserOptions) -> Self {
        Self::with_notifier(store, options, Box::new(LogNotifier))
    }

    pub fn with_notifier(
        store: LineStore,
        options: ParserOptions,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let responses = ResponseExtractor::new(notifier, options.recognized_errors.clone());
        let quantities = QuantityExtractor::new(&options.quantity_marker, options.strict_quantity);
        Self {
            store,
            options,
            responses,
            quantities,
            last_good_response: None,
            last_buy_date: None,
        }
    }

    pub fn from_config(store: LineStore, config: &Config) -> Self {
        Self::new(store, ParserOptions::from(config))
    }

    pub fn store(&self) -> &LineStore {
        &self.store
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn quantities(&self) -> &QuantityExtractor {
        &self.quantities
    }

    /// Response stored by the last successful [`LogParser::get_last_buy_date`]
    pub fn resolved_response(&self) -> Option<&ResponseRecord> {
        self.last_good_response.as_ref()
    }

    /// Date stored by the last successful [`LogParser::get_last_buy_date`]
    pub fn resolved_buy_date(&self) -> Option<NaiveDateTime> {
        self.last_buy_date
    }

    /// Whether a response error has been met during this parser's lifetime
    pub fn has_error(&self) -> bool {
        self.responses.has_error()
    }

    /// Date of the newest purchase whose response carried no error.
    ///
    /// The resolved response and date are kept on the parser for reporting.
    pub fn get_last_buy_date(&mut self) -> Result<NaiveDateTime> {
        let (response, line) = self.last_good_response()?;
        let start = self.block_start(line)?;
        let date = self.purchase_date(start)?;

        info!(%date, response_line = line, block_start = start, "Resolved last buy date");

        self.last_good_response = Some(response);
        self.last_buy_date = Some(date);
        Ok(date)
    }

    /// Newest error-free response and its line index
    pub fn last_good_response(&mut self) -> Result<(ResponseRecord, usize)> {
        self.iterate_block(
            0,
            "response",
            |responses: &mut ResponseExtractor, line: &LogLine| responses.extract(line),
        )
    }

    /// Fiat amount of the newest error-free purchase
    pub fn last_purchase_amount(&mut self) -> Result<u32> {
        let (_, line) = self.last_good_response()?;
        let start = self.block_start(line)?;
        self.quantity(start)
    }

    /// First line of the block holding `index`: the nearest delimiter at or before it
    pub fn block_start(&self, index: usize) -> Result<usize> {
        for i in (0..=index).rev() {
            if self.store.get(i)?.starts_with(&self.options.block_delimiter) {
                return Ok(i);
            }
        }
        Err(ParseError::NoDelimiter { index })
    }

    /// Timestamp of the block starting at `block_start`
    pub fn purchase_date(&mut self, block_start: usize) -> Result<NaiveDateTime> {
        let (canonical, line) = self.iterate_block(
            block_start,
            "date",
            |_: &mut ResponseExtractor, line: &LogLine| DateNormalizer::normalize(&line.text),
        )?;
        trace!(line, canonical = %canonical, "Normalized date line");
        DateNormalizer::parse_canonical(&canonical)
    }

    /// Fiat amount recorded in the block starting at `block_start`
    pub fn quantity(&mut self, block_start: usize) -> Result<u32> {
        let quantities = self.quantities.clone();
        let (amount, _) = self.iterate_block(
            block_start,
            "quantity",
            move |_: &mut ResponseExtractor, line: &LogLine| quantities.extract(line),
        )?;
        Ok(amount)
    }

    /// Apply `extract` to the block starting at `start`, recovering from error blocks.
    ///
    /// Returns the extracted value and the index of the line it came from.
    pub fn iterate_block<T, F>(
        &mut self,
        start: usize,
        what: &'static str,
        mut extract: F,
    ) -> Result<(T, usize)>
    where
        F: FnMut(&mut ResponseExtractor, &LogLine) -> Result<T>,
    {
        let mut block = start;
        loop {
            match self.scan_block(block, &mut extract)? {
                Scan::Found(value, index) => return Ok((value, index)),
                Scan::BlockFailed => {
                    warn!(block_start = block, "Skipping block with response error");
                    block = self.next_good_block(block + self.options.block_size)?;
                    debug!(block_start = block, what, "Resuming extraction in clean block");
                }
                Scan::Missed => return Err(ParseError::NotFoundInBlock { what, start: block }),
            }
        }
    }

    /// Walk forward from `block` with the response gate until a block validates
    fn next_good_block(&mut self, mut block: usize) -> Result<usize> {
        let mut gate = |responses: &mut ResponseExtractor, line: &LogLine| responses.extract(line);
        loop {
            match self.scan_block(block, &mut gate)? {
                Scan::Found(_, _) => return Ok(block),
                Scan::BlockFailed => {
                    warn!(block_start = block, "Skipping block with response error");
                    block += self.options.block_size;
                }
                Scan::Missed => {
                    return Err(ParseError::NotFoundInBlock {
                        what: "response",
                        start: block,
                    })
                }
            }
        }
    }

    fn scan_block<T, F>(&mut self, start: usize, extract: &mut F) -> Result<Scan<T>>
    where
        F: FnMut(&mut ResponseExtractor, &LogLine) -> Result<T>,
    {
        for index in start..start + self.options.block_size {
            let line = match self.store.get(index) {
                Ok(line) => line,
                Err(err) => {
                    debug!(index, lines = self.store.len(), "Ran out of log lines");
                    return Err(err);
                }
            };

            match extract(&mut self.responses, &line) {
                Ok(value) => return Ok(Scan::Found(value, index)),
                Err(err) if err.is_line_miss() => {
                    debug!(index, reason = %err, "Line skipped");
                }
                Err(err) if err.is_block_fatal() => return Ok(Scan::BlockFailed),
                Err(err) => return Err(err),
            }
        }
        Ok(Scan::Missed)
    }

    /// Whole days elapsed between `date` and `now`, rounded down
    pub fn days_since(date: NaiveDateTime, now: NaiveDateTime) -> i64 {
        (now - date).num_seconds().div_euclid(SECONDS_PER_DAY)
    }

    /// Fiat to spend to catch up on `days` missed purchases
    pub fn amount_to_buy(&self, days: i64) -> i64 {
        i64::from(self.options.daily_amount) * days
    }
}

impl fmt::Display for LogParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last_buy_date {
            Some(date) => writeln!(f, "Last buy date: {date}")?,
            None => writeln!(f, "Last buy date: unresolved")?,
        }
        match &self.last_good_response {
            Some(response) => write!(
                f,
                "Last good response: {}",
                serde_json::to_string(response).map_err(|_| fmt::Error)?
            ),
            None => write!(f, "Last good response: unresolved"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::MemoryNotifier;
    use chrono::NaiveDate;

    const GOOD: &str = r#"{"error":[],"result":{"descr":{"order":"buy 0.00500000 XBTGBP @ market"}}}"#;
    const FUNDS: &str = r#"{"error":["EOrder:Insufficient funds"]}"#;

    /// Lines in file order for one block
    fn block(date: &str, response: &str, amount: u32) -> Vec<String> {
        vec![
            format!("Quantity: {amount} GBP: 0.00500000 XBT"),
            response.to_string(),
            date.to_string(),
            "---".to_string(),
        ]
    }

    fn parser(blocks: Vec<Vec<String>>) -> (LogParser, MemoryNotifier) {
        let notifier = MemoryNotifier::new();
        let store = LineStore::from_lines(blocks.into_iter().flatten());
        let parser = LogParser::with_notifier(
            store,
            ParserOptions::default(),
            Box::new(notifier.clone()),
        );
        (parser, notifier)
    }

    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 3, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_newest_good_block() {
        let (mut parser, notifier) = parser(vec![
            block("Mon 13 Mar 09:00:00 GMT 2023", GOOD, 45),
            block("Tue 14 Mar 09:15:42 GMT 2023", GOOD, 45),
        ]);

        assert_eq!(parser.get_last_buy_date().unwrap(), at(14, 9, 15, 42));
        assert_eq!(parser.resolved_buy_date(), Some(at(14, 9, 15, 42)));
        assert!(parser.resolved_response().is_some());
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn test_error_block_skipped() {
        let (mut parser, notifier) = parser(vec![
            block("Sun 12 Mar 09:00:00 GMT 2023", GOOD, 45),
            block("Mon 13 Mar 09:00:00 GMT 2023", FUNDS, 45),
            block("Tue 14 Mar 09:00:00 GMT 2023", FUNDS, 45),
        ]);

        assert_eq!(parser.get_last_buy_date().unwrap(), at(12, 9, 0, 0));
        assert!(parser.has_error());
        assert_eq!(notifier.messages(), vec!["Insufficient funds".to_string()]);
    }

    #[test]
    fn test_all_error_blocks_exhaust() {
        let (mut parser, notifier) = parser(vec![
            block("Mon 13 Mar 09:00:00 GMT 2023", FUNDS, 45),
            block("Tue 14 Mar 09:00:00 GMT 2023", FUNDS, 45),
        ]);

        assert!(matches!(parser.get_last_buy_date(), Err(ParseError::NoLogs)));
        assert_eq!(notifier.messages().len(), 1);
        assert!(parser.resolved_buy_date().is_none());
    }

    #[test]
    fn test_mismatched_weekday_still_resolves() {
        let (mut parser, _) = parser(vec![block("Mon 14 Mar 09:00:00 GMT 2023", GOOD, 45)]);
        assert_eq!(parser.get_last_buy_date().unwrap(), at(14, 9, 0, 0));
    }

    #[test]
    fn test_block_start_is_block_invariant() {
        let (parser, _) = parser(vec![
            block("Mon 13 Mar 09:00:00 GMT 2023", GOOD, 45),
            block("Tue 14 Mar 09:00:00 GMT 2023", GOOD, 45),
        ]);

        for index in 0..4 {
            assert_eq!(parser.block_start(index).unwrap(), 0);
        }
        for index in 4..8 {
            assert_eq!(parser.block_start(index).unwrap(), 4);
        }
    }

    #[test]
    fn test_block_start_without_delimiter() {
        let store = LineStore::from_lines(["---", "no delimiter here"]);
        let parser = LogParser::new(store, ParserOptions::default());
        assert!(matches!(
            parser.block_start(0),
            Err(ParseError::NoDelimiter { index: 0 })
        ));
        assert_eq!(parser.block_start(1).unwrap(), 1);
    }

    #[test]
    fn test_quantity_of_block() {
        let (mut parser, _) = parser(vec![
            block("Mon 13 Mar 09:00:00 GMT 2023", GOOD, 30),
            block("Tue 14 Mar 09:00:00 GMT 2023", GOOD, 45),
        ]);
        assert_eq!(parser.quantity(0).unwrap(), 45);
        assert_eq!(parser.quantity(4).unwrap(), 30);
        assert_eq!(parser.last_purchase_amount().unwrap(), 45);
    }

    #[test]
    fn test_last_purchase_amount_skips_error_block() {
        let (mut parser, _) = parser(vec![
            block("Mon 13 Mar 09:00:00 GMT 2023", GOOD, 30),
            block("Tue 14 Mar 09:00:00 GMT 2023", FUNDS, 45),
        ]);
        assert_eq!(parser.last_purchase_amount().unwrap(), 30);
    }

    #[test]
    fn test_block_without_response() {
        let (mut parser, _) = parser(vec![vec![
            "Quantity: 45 GBP: 0.00500000 XBT".to_string(),
            "curl: (6) Could not resolve host".to_string(),
            "Tue 14 Mar 09:00:00 GMT 2023".to_string(),
            "---".to_string(),
        ]]);
        assert!(matches!(
            parser.last_good_response(),
            Err(ParseError::NotFoundInBlock { what: "response", start: 0 })
        ));
    }

    #[test]
    fn test_days_since_and_amount() {
        let date = at(10, 12, 0, 0);
        assert_eq!(LogParser::days_since(date, at(13, 11, 59, 59)), 2);
        assert_eq!(LogParser::days_since(date, at(13, 12, 0, 0)), 3);
        assert_eq!(LogParser::days_since(date, at(10, 13, 0, 0)), 0);

        let (parser, _) = parser(vec![]);
        assert_eq!(parser.amount_to_buy(3), 135);
        assert_eq!(parser.amount_to_buy(0), 0);
    }

    #[test]
    fn test_display() {
        let (mut parser, _) = parser(vec![block("Tue 14 Mar 09:15:42 GMT 2023", GOOD, 45)]);
        assert!(parser.to_string().contains("unresolved"));
        parser.get_last_buy_date().unwrap();
        let shown = parser.to_string();
        assert!(shown.contains("Last buy date: 2023-03-14 09:15:42"));
        assert!(shown.contains("XBTGBP"));
    }
}
