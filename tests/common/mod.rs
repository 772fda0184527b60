#![allow(dead_code)]

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

pub const INSUFFICIENT_FUNDS: &str = r#"{"error":["EOrder:Insufficient funds"]}"#;
pub const INVALID_KEY: &str = r#"{"error":["EAPI:Invalid key"]}"#;

/// `date` output as the UK-locale cron job writes it
pub fn uk_date(date: NaiveDateTime) -> String {
    date.format("%a %d %b %H:%M:%S GMT %Y").to_string()
}

/// `date` output as the US-locale cron job writes it
pub fn us_date(date: NaiveDateTime) -> String {
    date.format("%a %b %d %H:%M:%S UTC %Y").to_string()
}

pub fn good_response(crypto: &str) -> String {
    format!(
        r#"{{"error":[],"result":{{"descr":{{"order":"buy {crypto} XBTGBP @ market"}},"txid":["OQCLML-BW3P3-BUCMWZ"]}}}}"#
    )
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

/// Builds a cron log in file order, oldest attempt first
#[derive(Debug, Default, Clone)]
pub struct LogBuilder {
    lines: Vec<String>,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one attempt; its block reads quantity, response, date, delimiter
    pub fn block(self, date_line: String, response: &str, fiat: u32) -> Self {
        self.block_with_quantity(
            &format!("Quantity of BTC to be bought for {fiat} GBP: 0.005"),
            response,
            date_line,
        )
    }

    /// Append one attempt with an explicit quantity line
    pub fn block_with_quantity(
        mut self,
        quantity: &str,
        response: &str,
        date_line: String,
    ) -> Self {
        self.lines.push(quantity.to_string());
        self.lines.push(response.to_string());
        self.lines.push(date_line);
        self.lines.push("---".to_string());
        self
    }

    /// Append a purchase whose quantity line was never written
    pub fn unrecorded_purchase(mut self, date: NaiveDateTime, crypto: &str) -> Self {
        self.lines.push(good_response(crypto));
        self.lines.push(uk_date(date));
        self.lines.push("---".to_string());
        self
    }

    pub fn purchase(self, date: NaiveDateTime, crypto: &str, fiat: u32) -> Self {
        self.block(uk_date(date), &good_response(crypto), fiat)
    }

    pub fn failure(self, date: NaiveDateTime, response: &str) -> Self {
        self.block(uk_date(date), response, 45)
    }

    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn content(&self) -> String {
        let mut content = self.lines.join("\n");
        content.push('\n');
        content
    }

    pub fn write_to(&self, dir: &Path, filename: &str) -> Result<PathBuf> {
        let file_path = dir.join(filename);
        fs::write(&file_path, self.content())?;
        Ok(file_path)
    }
}
