//! Configuration management for PolyArb
//!
//! Loads defaults, then optional config files, then environment variables
//! (a `.env` file is honored if present)

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub scanner: ScannerCfg,
    pub feed: FeedConfig,
    pub persistence: PersistenceConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// CLOB API endpoint
    pub clob_url: String,
    /// Public trade feed endpoint
    pub data_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerCfg {
    /// Minimum profit percent for an opportunity
    pub min_profit_percent: f64,
    /// Markets checked concurrently per batch
    pub batch_size: usize,
    /// Delay between batches in milliseconds (rate-limit politeness)
    pub inter_batch_delay_ms: u64,
    /// Debug mode: examine only the first N tradeable markets (0 = all)
    pub sample_size: usize,
    /// Seconds between scan cycles
    pub scan_interval_secs: u64,
    /// 24h volume must exceed the historical average by this factor to flag
    pub min_spike_multiplier: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Seconds between trade feed polls
    pub poll_interval_secs: u64,
    /// Minimum trade size in USD to persist
    pub min_trade_size_usd: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Data directory
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Bind address for the dashboard HTTP server
    pub bind_addr: String,
    /// Minimum trades for leaderboard eligibility
    pub leaderboard_min_trades: u64,
    /// Leaderboard length
    pub leaderboard_limit: usize,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // API defaults
            .set_default("api.clob_url", "https://clob.polymarket.com")?
            .set_default("api.data_url", "https://data-api.polymarket.com")?
            // Scanner defaults
            .set_default("scanner.min_profit_percent", 0.5)?
            .set_default("scanner.batch_size", 10)?
            .set_default("scanner.inter_batch_delay_ms", 100)?
            .set_default("scanner.sample_size", 0)?
            .set_default("scanner.scan_interval_secs", 60)?
            .set_default("scanner.min_spike_multiplier", 2.0)?
            // Feed defaults
            .set_default("feed.poll_interval_secs", 10)?
            .set_default("feed.min_trade_size_usd", 2000.0)?
            // Persistence defaults
            .set_default("persistence.data_dir", "./data")?
            // Dashboard defaults
            .set_default("dashboard.bind_addr", "127.0.0.1:3000")?
            .set_default("dashboard.leaderboard_min_trades", 5)?
            .set_default("dashboard.leaderboard_limit", 20)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (POLYARB_*)
            .add_source(Environment::with_prefix("POLYARB").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Generate a digest of the config (without secrets) for logging
    pub fn digest(&self) -> String {
        format!(
            "min_profit={:.2}% batch={} delay={}ms interval={}s sample={}",
            self.scanner.min_profit_percent,
            self.scanner.batch_size,
            self.scanner.inter_batch_delay_ms,
            self.scanner.scan_interval_secs,
            self.scanner.sample_size,
        )
    }

    /// Validate required environment variables.
    ///
    /// Missing CLOB credentials are fatal at startup: the process must not
    /// enter the scan loop only to fail every authenticated request.
    pub fn validate_env(&self) -> Result<()> {
        let required = vec!["CLOB_API_KEY", "CLOB_API_SECRET", "CLOB_API_PASSPHRASE"];

        for var in required {
            match std::env::var(var) {
                Ok(value) if !value.trim().is_empty() => {}
                _ => bail!("Required environment variable {} is not set", var),
            }
        }

        Ok(())
    }

    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.scanner.inter_batch_delay_ms)
    }

    /// Sample size as the scanner expects it (`None` = scan everything).
    pub fn sample_size(&self) -> Option<usize> {
        if self.scanner.sample_size > 0 {
            Some(self.scanner.sample_size)
        } else {
            None
        }
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
