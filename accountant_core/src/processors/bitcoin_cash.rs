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

/// Blockchair dashboard for Bitcoin Cash, one request per address.
#[derive(Clone)]
pub struct BitcoinCashProcessor {
    client: Client,
    base_url: String,
}

impl BitcoinCashProcessor {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// `{"data": [{"sum_value_unspent": "12345"}]}`, satoshi. An empty `data`
/// array means the explorer knows nothing about the address.
pub fn parse_bitcoin_cash_balance(body: &str) -> Result<BigInt, FetchError> {
    let parsed: Value = serde_json::from_str(body)?;
    let first = parsed
        .get("data")
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
        .ok_or(FetchError::MissingField("data"))?;
    let unspent = first
        .get("sum_value_unspent")
        .ok_or(FetchError::MissingField("sum_value_unspent"))?;
    json_integer(unspent)
}

#[async_trait]
impl CurrencyProcessor for BitcoinCashProcessor {
    fn currency(&self) -> Currency {
        Currency::BitcoinCash
    }

    async fn get_balance(&self, address: &AddressData) -> Option<BigInt> {
        let url = format!("{}/dashboards/address/{}", self.base_url, address.address);
        fetch_parsed(self.client.get(&url), &url, parse_bitcoin_cash_balance).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bitcoin_cash_balance() {
        let body = r#"{"data":[{"sum_value_unspent":"250000","address":"qq"}]}"#;
        assert_eq!(parse_bitcoin_cash_balance(body).unwrap(), BigInt::from(250_000));
        assert!(parse_bitcoin_cash_balance(r#"{"data":[]}"#).is_err());
        assert!(parse_bitcoin_cash_balance(r#"{"data":[{"sum_value_unspent":"n/a"}]}"#).is_err());
    }

    #[tokio::test]
    async fn test_get_balance_requests_dashboard() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/dashboards/address/qpm2q")
            .with_status(200)
            .with_body(r#"{"data":[{"sum_value_unspent":"100"}]}"#)
            .create_async()
            .await;

        let processor = BitcoinCashProcessor::new(Client::new(), &server.url());
        let balance = processor
            .get_balance(&AddressData::new(Currency::BitcoinCash, "qpm2q"))
            .await;
        assert_eq!(balance, Some(BigInt::from(100)));
        mock.assert_async().await;
    }
}
