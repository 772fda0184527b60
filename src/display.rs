//! Output Formatting
//!
//! Plain output prints bare numbers so the binary can feed a shell script (the purchase
//! job reads the amount to buy from stdout). Verbose output adds labels and color.
//! Stats can also be emitted as JSON.

use crate::models::StatsSummary;
use colored::Colorize;
use std::fmt::Display;

pub struct ReportDisplay {
    verbose: bool,
    json_output: bool,
}

impl ReportDisplay {
    pub fn new(verbose: bool, json_output: bool) -> Self {
        Self {
            verbose,
            json_output,
        }
    }

    pub fn display_days(&self, days: i64) {
        if self.verbose {
            println!("Days to buy: {}", days.to_string().bright_white().bold());
        } else {
            println!("{days}");
        }
    }

    pub fn display_amount(&self, amount: i64, currency: &str) {
        if self.verbose {
            println!(
                "Amount to buy: {}",
                format!("{amount} {currency}").bright_green().bold()
            );
        } else {
            println!("{amount}");
        }
    }

    /// Resolved response and date, verbose mode only
    pub fn display_resolution(&self, resolution: &impl Display) {
        if self.verbose {
            println!("{}", resolution.to_string().bright_black());
        }
    }

    pub fn display_last_purchase(&self, amount: u32, currency: &str) {
        if self.verbose {
            println!(
                "Last purchase: {}",
                format!("{amount} {currency}").bright_cyan()
            );
        }
    }

    pub fn display_stats(&self, summary: &StatsSummary) {
        if self.json_output {
            let output = serde_json::json!({ "stats": summary });
            match serde_json::to_string_pretty(&output) {
                Ok(json_str) => println!("{json_str}"),
                Err(e) => eprintln!("Error serializing stats to JSON: {e}"),
            }
            return;
        }

        if summary.mismatch {
            eprintln!(
                "{}",
                "WARNING: Mismatch in crypto and fiat purchases.".bright_yellow()
            );
        }

        let asset = &summary.crypto_asset;
        let currency = &summary.fiat_currency;

        println!("\n{}", "=".repeat(60).bright_cyan());
        println!("{}", "Purchase Statistics".bright_white().bold());
        println!("{}", "=".repeat(60).bright_cyan());
        println!(
            "   Total purchase value in {asset}: {}",
            format!("{:.8}", summary.total_crypto).bright_green().bold()
        );
        println!(
            "   Total purchase value in fiat: {}",
            format!("{} {currency}", summary.total_fiat).bright_green().bold()
        );
        println!(
            "   Num purchases: {}",
            summary.num_purchases.to_string().bright_white().bold()
        );
        println!(
            "   Largest purchase: {} / {}",
            format_crypto(summary.largest_crypto, asset),
            format_fiat(summary.largest_fiat, currency)
        );
        println!(
            "   Smallest purchase: {} / {}",
            format_crypto(summary.smallest_crypto, asset),
            format_fiat(summary.smallest_fiat, currency)
        );
        println!();
    }

    pub fn display_export(&self, path: &std::path::Path) {
        if self.verbose && !self.json_output {
            println!("Exported purchases to {}", path.display().to_string().bright_blue());
        }
    }
}

fn format_crypto(amount: Option<f64>, asset: &str) -> String {
    match amount {
        Some(amount) => format!("{amount:.8} {asset}"),
        None => "n/a".to_string(),
    }
}

fn format_fiat(amount: Option<u32>, currency: &str) -> String {
    match amount {
        Some(amount) => format!("{amount} {currency}"),
        None => "n/a".to_string(),
    }
}
