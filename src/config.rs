//! Configuration system
//!
//! Provides configuration management with:
//! - Config file loading (optional)
//! - Environment variable overrides
//! - Runtime defaults matching the cron job's log layout
//! - Validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Log layout understood by the block parser
    pub parser: ParserConfig,

    /// Purchase schedule
    pub purchase: PurchaseConfig,

    /// Alerting on upstream errors
    pub notifications: NotificationConfig,

    /// Paths configuration
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    pub block_size: usize,
    pub block_delimiter: String,
    pub quantity_marker: String,
    pub purchase_tag: String,
    pub strict_quantity: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseConfig {
    pub daily_amount: u32,
    pub fiat_currency: String,
    pub crypto_asset: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub recognized_errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub log_file: PathBuf,
    pub stats_directory: PathBuf,
    pub log_directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "WARN".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
            },
            parser: ParserConfig {
                block_size: 4,
                block_delimiter: "---".to_string(),
                quantity_marker: "Quantity".to_string(),
                purchase_tag: "XBTGBP".to_string(),
                strict_quantity: true,
            },
            purchase: PurchaseConfig {
                daily_amount: 45,
                fiat_currency: "GBP".to_string(),
                crypto_asset: "BTC".to_string(),
            },
            notifications: NotificationConfig {
                recognized_errors: vec![
                    "Invalid key".to_string(),
                    "Insufficient funds".to_string(),
                ],
            },
            paths: PathsConfig {
                log_file: PathBuf::from("logs").join("cronjob.log"),
                stats_directory: PathBuf::from("stats"),
                log_directory: PathBuf::from("logs"),
            },
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and defaults
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            PathBuf::from("buylog.toml"),
            PathBuf::from(".buylog.toml"),
            dirs::config_dir()
                .map(|d| d.join("buylog").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        if let Ok(val) = env::var("BUYLOG_BLOCK_SIZE") {
            self.parser.block_size = val.parse().context("Invalid BUYLOG_BLOCK_SIZE")?;
        }
        if let Ok(val) = env::var("BUYLOG_PURCHASE_TAG") {
            self.parser.purchase_tag = val;
        }
        if let Ok(val) = env::var("BUYLOG_STRICT_QUANTITY") {
            self.parser.strict_quantity =
                val.parse().context("Invalid BUYLOG_STRICT_QUANTITY")?;
        }

        if let Ok(val) = env::var("BUYLOG_DAILY_AMOUNT") {
            self.purchase.daily_amount = val.parse().context("Invalid BUYLOG_DAILY_AMOUNT")?;
        }

        if let Ok(val) = env::var("BUYLOG_LOG_FILE") {
            self.paths.log_file = PathBuf::from(val);
        }
        if let Ok(val) = env::var("BUYLOG_STATS_DIR") {
            self.paths.stats_directory = PathBuf::from(val);
        }
        if let Ok(val) = env::var("BUYLOG_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.parser.block_size < 2 {
            return Err(anyhow::anyhow!(
                "Block size must be at least 2, got {}",
                self.parser.block_size
            ));
        }

        if self.parser.block_delimiter.is_empty() {
            return Err(anyhow::anyhow!("Block delimiter cannot be empty"));
        }

        if self.parser.quantity_marker.is_empty() {
            return Err(anyhow::anyhow!("Quantity marker cannot be empty"));
        }

        if self.parser.purchase_tag.is_empty() {
            return Err(anyhow::anyhow!("Purchase tag cannot be empty"));
        }

        if self.purchase.daily_amount == 0 {
            return Err(anyhow::anyhow!("Daily amount must be greater than 0"));
        }

        if self.notifications.recognized_errors.is_empty() {
            warn!("No recognized errors configured, alerts will never be sent");
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}
