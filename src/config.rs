//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API credentials) are referenced by env-var name in the config
//! and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;

use crate::types::SnapshotFilters;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub scanner: ScannerConfig,
    pub alpaca: AlpacaConfig,
    pub snapshot: SnapshotFilters,
    pub quote: QuoteConfig,
    pub orders: OrdersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScannerConfig {
    /// Underlying symbols scanned each cycle, in order.
    pub symbols: Vec<String>,
    pub scan_interval_secs: u64,
    /// Upper bound on concurrent contract-metadata lookups per scan.
    pub max_in_flight: usize,
    /// Opportunities must score strictly above this.
    #[serde(default)]
    pub min_profit: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlpacaConfig {
    pub api_key_env: String,
    pub secret_key_env: String,
    pub trading_base_url: String,
    pub data_base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuoteConfig {
    /// Feed for underlying stock quotes ("iex" on the free tier).
    pub feed: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OrdersConfig {
    /// When false, qualified opportunities are logged but nothing is sent.
    pub enabled: bool,
    pub stock_qty: u32,
    pub option_qty: u32,
    pub exercise_delay_secs: u64,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

impl AlpacaConfig {
    /// Resolve the credential pair referenced by `api_key_env` and
    /// `secret_key_env`. The secret never leaves its wrapper after this.
    pub fn resolve_credentials(&self) -> Result<(String, SecretString)> {
        let api_key = AppConfig::resolve_env(&self.api_key_env)?;
        let secret_key = AppConfig::resolve_env(&self.secret_key_env)?;
        Ok((api_key, SecretString::new(secret_key)))
    }
}
