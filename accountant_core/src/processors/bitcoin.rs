use std::collections::HashMap;

use async_trait::async_trait;
use num_bigint::BigInt;
use reqwest::Client;
use serde_json::Value;

use super::{
    CurrencyProcessor,
    http::{fetch_parsed, json_integer},
};
use crate::{
    currencies::{AddressData, Currency},
    error::FetchError,
};

/// btc.com explorer. Balances are integer satoshi; several addresses can be
/// requested at once by joining them with commas.
#[derive(Clone)]
pub struct BitcoinProcessor {
    client: Client,
    base_url: String,
}

impl BitcoinProcessor {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn address_url(&self, path: &str) -> String {
        format!("{}/address/{}", self.base_url, path)
    }
}

/// `{"data": {"balance": 123}}`
pub fn parse_bitcoin_balance(body: &str) -> Result<BigInt, FetchError> {
    let parsed: Value = serde_json::from_str(body)?;
    let data = parsed.get("data").filter(|d| !d.is_null()).ok_or(FetchError::MissingField("data"))?;
    let balance = data.get("balance").ok_or(FetchError::MissingField("balance"))?;
    json_integer(balance)
}

/// `{"data": [{"address": "...", "balance": 1}, null, ...]}` keyed by address.
/// Entries that are null or carry no usable balance are skipped.
pub fn parse_bitcoin_bunch(body: &str) -> Result<HashMap<String, BigInt>, FetchError> {
    let parsed: Value = serde_json::from_str(body)?;
    let entries = match parsed.get("data") {
        Some(Value::Array(entries)) => entries.clone(),
        Some(Value::Object(_)) => vec![parsed["data"].clone()],
        _ => return Err(FetchError::MissingField("data")),
    };

    let mut balances = HashMap::new();
    for entry in entries {
        let Some(address) = entry.get("address").and_then(Value::as_str) else {
            continue;
        };
        match entry.get("balance").map(json_integer) {
            Some(Ok(balance)) => {
                balances.insert(address.to_string(), balance);
            }
            Some(Err(e)) => log::warn!("Skipping Bitcoin balance of {}: {}", address, e),
            None => log::warn!("Bitcoin response has no balance for {}", address),
        }
    }
    Ok(balances)
}

#[async_trait]
impl CurrencyProcessor for BitcoinProcessor {
    fn currency(&self) -> Currency {
        Currency::Bitcoin
    }

    async fn get_balance(&self, address: &AddressData) -> Option<BigInt> {
        let url = self.address_url(&address.address);
        fetch_parsed(self.client.get(&url), &url, parse_bitcoin_balance).await
    }

    async fn get_balance_bunch(&self, addresses: &[AddressData]) -> Vec<Option<BigInt>> {
        match addresses {
            [] => Vec::new(),
            [single] => vec![self.get_balance(single).await],
            _ => {
                let joined = addresses
                    .iter()
                    .map(|a| a.address.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                let url = self.address_url(&joined);
                let balances =
                    fetch_parsed(self.client.get(&url), &url, parse_bitcoin_bunch).await;

                match balances {
                    Some(balances) => addresses
                        .iter()
                        .map(|a| balances.get(&a.address).cloned())
                        .collect(),
                    None => vec![None; addresses.len()],
                }
            }
        }
    }
}
