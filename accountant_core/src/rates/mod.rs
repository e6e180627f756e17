use std::{collections::HashMap, str::FromStr};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::Client;
use serde::Deserialize;
use serde_json::value::RawValue;

use crate::{
    error::FetchError,
    processors::http::{fetch_parsed, raw_decimal_text},
};

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

/// Fiat exchange rates keyed by price id.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// USD value of one whole unit. Unknown or empty ids have no rate.
    async fn get_rate_to_usd(&self, price_id: &str) -> Option<BigDecimal>;

    /// Same length and order as `price_ids`.
    async fn get_rates_bunch(&self, price_ids: &[String]) -> Vec<Option<BigDecimal>> {
        let mut rates = Vec::with_capacity(price_ids.len());
        for price_id in price_ids {
            rates.push(self.get_rate_to_usd(price_id).await);
        }
        rates
    }
}

#[derive(Clone)]
pub struct CoinGeckoRates {
    client: Client,
    base_url: String,
}

impl CoinGeckoRates {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, ids: &[&str]) -> Option<HashMap<String, BigDecimal>> {
        let url = format!("{}/simple/price", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("ids", ids.join(",")), ("vs_currencies", "usd".to_string())]);
        fetch_parsed(request, &url, parse_usd_rates).await
    }
}

#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<Box<RawValue>>,
}

/// `{"bitcoin": {"usd": 67187.33}, ...}`. Ids without a usable `usd` entry
/// are left out.
pub fn parse_usd_rates(body: &str) -> Result<HashMap<String, BigDecimal>, FetchError> {
    let parsed: HashMap<String, SimplePrice> = serde_json::from_str(body)?;

    let mut rates = HashMap::new();
    for (price_id, entry) in parsed {
        let Some(usd) = entry.usd else {
            continue;
        };
        let rate = raw_decimal_text(&usd)
            .ok()
            .and_then(|text| BigDecimal::from_str(&text).ok());
        match rate {
            Some(rate) => {
                rates.insert(price_id, rate);
            }
            None => log::warn!("Skipping unusable rate for {}: {}", price_id, usd),
        }
    }
    Ok(rates)
}

#[async_trait]
impl RateSource for CoinGeckoRates {
    async fn get_rate_to_usd(&self, price_id: &str) -> Option<BigDecimal> {
        if price_id.is_empty() {
            return None;
        }
        self.fetch(&[price_id]).await?.remove(price_id)
    }

    async fn get_rates_bunch(&self, price_ids: &[String]) -> Vec<Option<BigDecimal>> {
        let mut ids: Vec<&str> = price_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !id.is_empty())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return vec![None; price_ids.len()];
        }

        let rates = self.fetch(&ids).await.unwrap_or_default();
        price_ids.iter().map(|id| rates.get(id).cloned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_parse_usd_rates() {
        let body = r#"{"bitcoin":{"usd":67187.33},"ethereum":{"usd":"3500.1"},"ghost":{}}"#;
        let rates = parse_usd_rates(body).unwrap();
        assert_eq!(rates["bitcoin"], BigDecimal::from_str("67187.33").unwrap());
        assert_eq!(rates["ethereum"], BigDecimal::from_str("3500.1").unwrap());
        assert!(!rates.contains_key("ghost"));
    }

    #[test]
    fn test_numeric_rates_keep_every_digit() {
        let body = r#"{"shiba-inu":{"usd":0.000012345678901234567},"bitcoin":{"usd":null}}"#;
        let rates = parse_usd_rates(body).unwrap();
        assert_eq!(
            rates["shiba-inu"],
            BigDecimal::from_str("0.000012345678901234567").unwrap()
        );
        assert!(!rates.contains_key("bitcoin"));
    }

    #[tokio::test]
    async fn test_rates_bunch_uses_one_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/simple/price")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("ids".into(), "bitcoin,ripple".into()),
                Matcher::UrlEncoded("vs_currencies".into(), "usd".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"bitcoin":{"usd":100.5}}"#)
            .expect(1)
            .create_async()
            .await;

        let rates = CoinGeckoRates::new(Client::new(), &server.url());
        let ids = vec![
            "ripple".to_string(),
            String::new(),
            "bitcoin".to_string(),
            "ripple".to_string(),
        ];
        let result = rates.get_rates_bunch(&ids).await;

        assert_eq!(
            result,
            vec![None, None, Some(BigDecimal::from_str("100.5").unwrap()), None]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_price_id_has_no_rate() {
        let rates = CoinGeckoRates::new(Client::new(), "http://127.0.0.1:9");
        assert_eq!(rates.get_rate_to_usd("").await, None);
        assert_eq!(rates.get_rates_bunch(&[String::new()]).await, vec![None]);
    }
}
