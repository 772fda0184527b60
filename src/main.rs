use anyhow::{Context, Result};
use buylog::config::Config;
use buylog::display::ReportDisplay;
use buylog::{export, logging, LineStore, LogParser};
use chrono::Local;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

#[derive(Parser)]
#[command(name = "buylog")]
#[command(about = "Reports on the log of a recurring purchase job")]
#[command(version)]
struct Cli {
    /// Print the number of days since the last successful purchase
    #[arg(long)]
    get_days: bool,
    /// Print the amount to buy (days since last purchase * daily amount)
    #[arg(long)]
    get_amount: bool,
    /// Print statistics over the whole purchase history
    #[arg(long)]
    stats: bool,
    /// Do not export purchase events when printing stats
    #[arg(long)]
    no_export: bool,
    /// File name of the exported purchase events
    #[arg(long, default_value = "stats.csv")]
    file_name: String,
    /// Log file to read instead of the configured one
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Print stats in JSON format
    #[arg(long)]
    json: bool,
    /// Run in verbose mode
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if !(cli.get_days || cli.get_amount || cli.stats) {
        return match print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => handle_error(e, cli.verbose),
        };
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => return handle_error(e, cli.verbose),
    };

    let _guard = match logging::init_logging(&config) {
        Ok(guard) => guard,
        Err(e) => return handle_error(e, cli.verbose),
    };

    let span = logging::run_span(&config.paths.log_file);
    let _entered = span.enter();

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => handle_error(e, cli.verbose),
    }
}

fn print_help() -> Result<()> {
    Cli::command()
        .print_help()
        .context("Failed to print help")
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(log_file) = &cli.log_file {
        config.paths.log_file = log_file.clone();
    }
    Ok(config)
}

fn run(cli: &Cli, config: &Config) -> Result<()> {
    let store = LineStore::load(&config.paths.log_file)?;
    let mut parser = LogParser::from_config(store, config);
    let display = ReportDisplay::new(cli.verbose, cli.json);
    let currency = &config.purchase.fiat_currency;

    if cli.get_days || cli.get_amount {
        let last_buy_date = parser.get_last_buy_date()?;
        display.display_resolution(&parser);

        if cli.verbose {
            match parser.last_purchase_amount() {
                Ok(amount) => display.display_last_purchase(amount, currency),
                Err(e) => warn!(error = %e, "Could not read last purchase amount"),
            }
        }

        let days = LogParser::days_since(last_buy_date, Local::now().naive_local());
        if cli.get_days {
            display.display_days(days);
        }
        if cli.get_amount {
            display.display_amount(parser.amount_to_buy(days), currency);
        }
    }

    if cli.stats {
        let stats = parser.check_stats()?;
        display.display_stats(&stats.summary(&config.purchase.crypto_asset, currency));

        if !cli.no_export {
            let events = stats.events();
            if events.len() < stats.num_purchases() {
                warn!(
                    exported = events.len(),
                    purchases = stats.num_purchases(),
                    "Purchases without a fiat amount left out of the export"
                );
            }
            let path = export::export_purchases(
                &config.paths.stats_directory,
                &cli.file_name,
                &events,
            )?;
            display.display_export(&path);
        }
    }

    Ok(())
}

/// Report a failure and pick the exit status. Nested causes only show in verbose mode.
fn handle_error(e: anyhow::Error, verbose: bool) -> ExitCode {
    if verbose {
        eprintln!("Error: {:?}", e);
    } else {
        eprintln!("Error: {}", e);
    }
    ExitCode::FAILURE
}
