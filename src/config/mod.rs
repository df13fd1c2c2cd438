//! Configuration management for the balance aligner.
//!
//! Loads settings from an optional config file layered with environment
//! variables (`ALIGNER__ALIGNMENT__DRY_RUN=true`, ...).

use crate::exchange::{Balance, Market, Ticker};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Alignment strategy parameters
    #[serde(default)]
    pub alignment: AlignmentConfig,
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Paper venues the binary connects to
    #[serde(default)]
    pub venues: Vec<VenueConfig>,
}

/// Preferred quote currencies, separately for buying and selling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteCurrencyPreference {
    #[serde(default)]
    pub buy: Vec<String>,
    #[serde(default)]
    pub sell: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Seconds between alignment cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Venue names in priority order
    #[serde(default)]
    pub sessions: Vec<String>,
    /// Required; startup fails without it
    #[serde(default)]
    pub quote_currencies: Option<QuoteCurrencyPreference>,
    /// Target net balance per currency, summed across venues
    #[serde(default)]
    pub expected_balances: BTreeMap<String, Decimal>,
    /// Cross the spread instead of resting inside it
    #[serde(default)]
    pub use_taker_order: bool,
    /// Log planned orders without submitting
    #[serde(default)]
    pub dry_run: bool,
    /// Stop the cycle after the first failed submission
    #[serde(default = "default_stop_on_submit_error")]
    pub stop_on_submit_error: bool,
    /// In dry run, plan every currency instead of stopping after the first
    #[serde(default)]
    pub dry_run_plan_all: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for rolling log files
    #[serde(default = "default_log_directory")]
    pub directory: String,
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// Seed state for one in-memory venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub name: String,
    #[serde(default)]
    pub balances: BTreeMap<String, Balance>,
    #[serde(default)]
    pub markets: Vec<Market>,
    #[serde(default)]
    pub tickers: BTreeMap<String, Ticker>,
}

// Default value functions
fn default_interval_secs() -> u64 {
    60
}

fn default_stop_on_submit_error() -> bool {
    true
}

fn default_log_directory() -> String {
    "logs".to_string()
}

fn default_log_file_prefix() -> String {
    "balance-aligner.log".to_string()
}

fn default_log_filter() -> String {
    "balance_aligner=debug".to_string()
}

impl AlignmentConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Config {
    /// Load configuration from environment variables and config files.
    ///
    /// `path` names the config file (extension optional); without it an
    /// optional `config.*` in the working directory is used.
    pub fn load(path: Option<&str>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => config::File::with_name(path).required(true),
            None => config::File::with_name("config").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::default().separator("__").prefix("ALIGNER"))
            .build()
            .context("Failed to build configuration")?;

        let mut config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.normalize();
        Ok(config)
    }

    /// Upper-case currency codes and symbols, which some sources lower-case.
    pub fn normalize(&mut self) {
        let alignment = &mut self.alignment;
        alignment.expected_balances = std::mem::take(&mut alignment.expected_balances)
            .into_iter()
            .map(|(currency, target)| (currency.to_uppercase(), target))
            .collect();
        if let Some(quotes) = alignment.quote_currencies.as_mut() {
            for currency in quotes.buy.iter_mut().chain(quotes.sell.iter_mut()) {
                *currency = currency.to_uppercase();
            }
        }

        for venue in &mut self.venues {
            venue.balances = std::mem::take(&mut venue.balances)
                .into_iter()
                .map(|(currency, balance)| (currency.to_uppercase(), balance))
                .collect();
            venue.tickers = std::mem::take(&mut venue.tickers)
                .into_iter()
                .map(|(symbol, ticker)| (symbol.to_uppercase(), ticker))
                .collect();
            for market in &mut venue.markets {
                market.symbol = market.symbol.to_uppercase();
                market.base_currency = market.base_currency.to_uppercase();
                market.quote_currency = market.quote_currency.to_uppercase();
            }
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        let alignment = &self.alignment;

        anyhow::ensure!(
            alignment.quote_currencies.is_some(),
            "quote_currencies is not defined"
        );

        anyhow::ensure!(alignment.interval_secs > 0, "interval_secs must be > 0");

        anyhow::ensure!(
            !alignment.sessions.is_empty(),
            "sessions must name at least one venue"
        );

        let mut seen = HashSet::new();
        for session in &alignment.sessions {
            anyhow::ensure!(seen.insert(session), "session {} is listed twice", session);
        }

        let mut names = HashSet::new();
        for venue in &self.venues {
            anyhow::ensure!(names.insert(&venue.name), "venue {} is defined twice", venue.name);
        }

        Ok(())
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            sessions: Vec::new(),
            quote_currencies: None,
            expected_balances: BTreeMap::new(),
            use_taker_order: false,
            dry_run: false,
            stop_on_submit_error: default_stop_on_submit_error(),
            dry_run_plan_all: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file_prefix: default_log_file_prefix(),
            filter: default_log_filter(),
        }
    }
}
