use std::{env, time::Duration};

use accountant_core::{processors::ExplorerEndpoints, rates::DEFAULT_COINGECKO_URL};
use thiserror::Error;

const DEFAULT_DB_PATH: &str = "accountant_db";
const DEFAULT_HTTP_TIMEOUT_SEC: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} must be a positive integer, got {value:?}")]
    NotPositive { name: &'static str, value: String },
}

/// Process configuration read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub update_interval: Duration,
    pub db_path: String,
    pub http_timeout: Duration,
    pub endpoints: ExplorerEndpoints,
    pub coingecko_url: String,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let interval = get("UPDATE_INTERVAL_SEC").ok_or(ConfigError::Missing("UPDATE_INTERVAL_SEC"))?;
        let update_interval = Duration::from_secs(positive("UPDATE_INTERVAL_SEC", &interval)?);

        let http_timeout = match get("HTTP_TIMEOUT_SEC") {
            Some(value) => Duration::from_secs(positive("HTTP_TIMEOUT_SEC", &value)?),
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SEC),
        };

        let defaults = ExplorerEndpoints::default();
        let endpoints = ExplorerEndpoints {
            bitcoin: get("BITCOIN_API_URL").unwrap_or(defaults.bitcoin),
            bitcoin_cash: get("BITCOIN_CASH_API_URL").unwrap_or(defaults.bitcoin_cash),
            bitcoin_gold: get("BITCOIN_GOLD_API_URL").unwrap_or(defaults.bitcoin_gold),
            etherscan: get("ETHERSCAN_API_URL").unwrap_or(defaults.etherscan),
            etherscan_api_key: get("ETHERSCAN_API_KEY"),
            tokenbalance: get("TOKENBALANCE_API_URL").unwrap_or(defaults.tokenbalance),
            ripple: get("RIPPLE_API_URL").unwrap_or(defaults.ripple),
        };

        Ok(Self {
            update_interval,
            db_path: get("ACCOUNTANT_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            http_timeout,
            endpoints,
            coingecko_url: get("COINGECKO_API_URL")
                .unwrap_or_else(|| DEFAULT_COINGECKO_URL.to_string()),
        })
    }
}

fn positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<i64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed as u64),
        _ => Err(ConfigError::NotPositive {
            name,
            value: value.to_string(),
        }),
    }
}
