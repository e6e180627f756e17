use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use num_bigint::BigInt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, value::RawValue};

use super::{
    CurrencyProcessor,
    http::{fetch_parsed, json_integer, raw_decimal_text},
};
use crate::{
    currencies::{AddressData, Currency, TokenData},
    error::FetchError,
    helpers::amount::scale_decimal_to_atomic,
};

/// Holder used when only the token metadata is wanted.
const ZERO_HOLDER: &str = "0x0";

/// tokenbalance.com, which reports the balance as a decimal string together
/// with the token's own precision.
#[derive(Clone)]
pub struct Erc20Processor {
    client: Client,
    base_url: String,
    token_data: Arc<DashMap<String, TokenData>>,
}

impl Erc20Processor {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_data: Arc::new(DashMap::new()),
        }
    }

    fn token_url(&self, contract_address: &str, holder: &str) -> String {
        format!("{}/token/{}/{}", self.base_url, contract_address, holder)
    }

    pub fn cached_token_data(&self, contract_address: &str) -> Option<TokenData> {
        self.token_data
            .get(&contract_address.to_lowercase())
            .map(|entry| entry.value().clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenBalanceBody {
    name: Option<String>,
    symbol: Option<String>,
    balance: Option<Box<RawValue>>,
    decimals: Option<Value>,
}

impl TokenBalanceBody {
    fn decimals(&self) -> Result<u32, FetchError> {
        let raw = self
            .decimals
            .as_ref()
            .ok_or(FetchError::MissingField("decimals"))?;
        let decimals = json_integer(raw)?;
        u32::try_from(decimals).map_err(|e| FetchError::NotANumber(e.to_string()))
    }
}

/// `{"name": "..", "symbol": "..", "balance": "1.5", "decimals": 18}`
pub fn parse_erc20_balance(body: &str) -> Result<BigInt, FetchError> {
    let parsed: TokenBalanceBody = serde_json::from_str(body)?;
    let decimals = parsed.decimals()?;
    let balance = parsed
        .balance
        .as_ref()
        .ok_or(FetchError::MissingField("balance"))?;
    let text = raw_decimal_text(balance)?;
    scale_decimal_to_atomic(&text, decimals).ok_or(FetchError::NotANumber(text))
}

pub fn parse_erc20_token_data(body: &str) -> Result<TokenData, FetchError> {
    let parsed: TokenBalanceBody = serde_json::from_str(body)?;
    let decimals = parsed.decimals()?;
    Ok(TokenData {
        name: parsed.name.ok_or(FetchError::MissingField("name"))?,
        symbol: parsed.symbol.ok_or(FetchError::MissingField("symbol"))?,
        decimals,
    })
}

#[async_trait]
impl CurrencyProcessor for Erc20Processor {
    fn currency(&self) -> Currency {
        Currency::Erc20Token
    }

    async fn get_balance(&self, address: &AddressData) -> Option<BigInt> {
        if address.contract_address.is_empty() {
            log::warn!("Token wallet {} has no contract address", address.address);
            return None;
        }
        let url = self.token_url(&address.contract_address, &address.address);
        fetch_parsed(self.client.get(&url), &url, parse_erc20_balance).await
    }

    /// Fetches fresh metadata and remembers it; when the endpoint is down the
    /// last known metadata of the contract is returned instead.
    async fn get_token_data(&self, contract_address: &str) -> Option<TokenData> {
        let url = self.token_url(contract_address, ZERO_HOLDER);
        match fetch_parsed(self.client.get(&url), &url, parse_erc20_token_data).await {
            Some(data) => {
                self.token_data
                    .insert(contract_address.to_lowercase(), data.clone());
                Some(data)
            }
            None => self.cached_token_data(contract_address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = "0xd26114cd6EE289AccF82350c8d8487fedB8A0C07";
    const HOLDER: &str = "0x5e44c3e467a49c9ca0296a9f130fc433041aaa28";

    #[test]
    fn test_parse_eighteen_decimal_token() {
        let body = r#"{"name":"OMGToken","symbol":"OMG","balance":"1.5","decimals":18}"#;
        assert_eq!(
            parse_erc20_balance(body).unwrap(),
            BigInt::from(1_500_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_numeric_balance_is_not_rounded() {
        let body = r#"{"name":"OMGToken","symbol":"OMG","balance":12345678.123456789012345678,"decimals":18}"#;
        assert_eq!(
            parse_erc20_balance(body).unwrap(),
            "12345678123456789012345678".parse::<BigInt>().unwrap()
        );
    }

    #[test]
    fn test_parse_token_data_keeps_name() {
        let body = r#"{"name":"OMGToken","symbol":"OMG","balance":"0","decimals":"18"}"#;
        assert_eq!(
            parse_erc20_token_data(body).unwrap(),
            TokenData {
                name: "OMGToken".to_string(),
                symbol: "OMG".to_string(),
                decimals: 18,
            }
        );
        assert!(parse_erc20_token_data(r#"{"symbol":"OMG","decimals":18}"#).is_err());
    }

    #[tokio::test]
    async fn test_token_wallet_balance() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", format!("/token/{}/{}", CONTRACT, HOLDER).as_str())
            .with_status(200)
            .with_body(r#"{"name":"OMGToken","symbol":"OMG","balance":"20.25","decimals":2}"#)
            .create_async()
            .await;

        let processor = Erc20Processor::new(Client::new(), &server.url());
        let balance = processor.get_balance(&AddressData::token(CONTRACT, HOLDER)).await;
        assert_eq!(balance, Some(BigInt::from(2025)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_data_falls_back_to_cache() {
        let mut server = mockito::Server::new_async().await;
        let url = format!("/token/{}/0x0", CONTRACT);
        let ok = server
            .mock("GET", url.as_str())
            .with_status(200)
            .with_body(r#"{"name":"OMGToken","symbol":"OMG","balance":"0","decimals":18}"#)
            .expect(1)
            .create_async()
            .await;

        let processor = Erc20Processor::new(Client::new(), &server.url());
        let first = processor.get_token_data(CONTRACT).await;
        assert_eq!(first.as_ref().map(|d| d.symbol.as_str()), Some("OMG"));
        ok.assert_async().await;
        ok.remove_async().await;

        let _down = server
            .mock("GET", url.as_str())
            .with_status(502)
            .create_async()
            .await;
        assert_eq!(processor.get_token_data(CONTRACT).await, first);
        assert_eq!(processor.get_token_data("0xunknown").await, None);
    }

    #[tokio::test]
    async fn test_missing_contract_is_absent() {
        let processor = Erc20Processor::new(Client::new(), "http://127.0.0.1:9");
        let address = AddressData::token("", HOLDER);
        assert_eq!(processor.get_balance(&address).await, None);
    }
}
