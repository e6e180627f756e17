use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::join_all;
use num_bigint::BigInt;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use super::{
    CurrencyProcessor,
    http::{fetch_parsed, json_integer},
};
use crate::{
    currencies::{AddressData, Currency},
    error::FetchError,
};

/// `balancemulti` accepts at most this many addresses per call.
pub const ETHERSCAN_BATCH_LIMIT: usize = 20;

/// Etherscan account API. Balances are wei encoded as decimal strings.
#[derive(Clone)]
pub struct EtherProcessor {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl EtherProcessor {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn account_request(&self, action: &str, address: &str) -> RequestBuilder {
        let mut query = vec![
            ("module", "account"),
            ("action", action),
            ("address", address),
            ("tag", "latest"),
        ];
        if let Some(key) = self.api_key.as_deref() {
            query.push(("apikey", key));
        }
        self.client.get(&self.base_url).query(&query)
    }

    async fn get_chunk(&self, chunk: &[AddressData]) -> Vec<Option<BigInt>> {
        let joined = chunk
            .iter()
            .map(|a| a.address.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let endpoint = format!("{} (balancemulti, {} addresses)", self.base_url, chunk.len());
        let request = self.account_request("balancemulti", &joined);

        match fetch_parsed(request, &endpoint, parse_ether_bunch).await {
            Some(balances) => chunk
                .iter()
                .map(|a| balances.get(&a.address.to_lowercase()).cloned())
                .collect(),
            None => vec![None; chunk.len()],
        }
    }
}

fn ether_result(body: &str) -> Result<Value, FetchError> {
    let mut parsed: Value = serde_json::from_str(body)?;
    parsed
        .get_mut("result")
        .map(Value::take)
        .ok_or(FetchError::MissingField("result"))
}

/// `{"status":"1","result":"1000000000000000000"}`
pub fn parse_ether_balance(body: &str) -> Result<BigInt, FetchError> {
    json_integer(&ether_result(body)?)
}

/// `{"result":[{"account":"0x..","balance":"..."}]}`, keyed by lowercase
/// account so checksummed and plain hex spellings match.
pub fn parse_ether_bunch(body: &str) -> Result<HashMap<String, BigInt>, FetchError> {
    let result = ether_result(body)?;
    let entries = match result {
        Value::Array(entries) => entries,
        other => return Err(FetchError::NotANumber(other.to_string())),
    };

    let mut balances = HashMap::new();
    for entry in entries {
        let Some(account) = entry.get("account").and_then(Value::as_str) else {
            continue;
        };
        match entry.get("balance").map(json_integer) {
            Some(Ok(balance)) => {
                balances.insert(account.to_lowercase(), balance);
            }
            Some(Err(e)) => log::warn!("Skipping Ether balance of {}: {}", account, e),
            None => log::warn!("Ether response has no balance for {}", account),
        }
    }
    Ok(balances)
}

#[async_trait]
impl CurrencyProcessor for EtherProcessor {
    fn currency(&self) -> Currency {
        Currency::Ether
    }

    async fn get_balance(&self, address: &AddressData) -> Option<BigInt> {
        let endpoint = format!("{} (balance {})", self.base_url, address.address);
        let request = self.account_request("balance", &address.address);
        fetch_parsed(request, &endpoint, parse_ether_balance).await
    }

    async fn get_balance_bunch(&self, addresses: &[AddressData]) -> Vec<Option<BigInt>> {
        match addresses {
            [] => Vec::new(),
            [single] => vec![self.get_balance(single).await],
            _ => join_all(
                addresses
                    .chunks(ETHERSCAN_BATCH_LIMIT)
                    .map(|chunk| self.get_chunk(chunk)),
            )
            .await
            .into_iter()
            .flatten()
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn ether(address: &str) -> AddressData {
        AddressData::new(Currency::Ether, address)
    }

    #[test]
    fn test_parse_ether_balance() {
        let body = r#"{"status":"1","message":"OK","result":"40891626854930000000000"}"#;
        let expected: BigInt = "40891626854930000000000".parse().unwrap();
        assert_eq!(parse_ether_balance(body).unwrap(), expected);
        assert_eq!(parse_ether_balance(body).unwrap(), parse_ether_balance(body).unwrap());

        let rejected = r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#;
        assert!(matches!(parse_ether_balance(rejected), Err(FetchError::NotANumber(_))));
        assert!(matches!(parse_ether_balance("{}"), Err(FetchError::MissingField("result"))));
    }

    #[tokio::test]
    async fn test_batch_with_one_missing_address() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("action".into(), "balancemulti".into()),
                Matcher::UrlEncoded("address".into(), "0xAAA,0xbbb,0xccc".into()),
                Matcher::UrlEncoded("apikey".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"status":"1","message":"OK","result":[
                    {"account":"0xaaa","balance":"1000000000000000000"},
                    {"account":"0xccc","balance":"3"}
                ]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let processor = EtherProcessor::new(Client::new(), &server.url(), Some("secret".to_string()));
        let balances = processor
            .get_balance_bunch(&[ether("0xAAA"), ether("0xbbb"), ether("0xccc")])
            .await;

        assert_eq!(
            balances,
            vec![
                Some(BigInt::from(1_000_000_000_000_000_000u64)),
                None,
                Some(BigInt::from(3)),
            ]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_large_batches_are_chunked() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(Matcher::UrlEncoded("action".into(), "balancemulti".into()))
            .with_status(200)
            .with_body(r#"{"status":"1","result":[]}"#)
            .expect(2)
            .create_async()
            .await;

        let processor = EtherProcessor::new(Client::new(), &server.url(), None);
        let addresses: Vec<AddressData> = (0..25).map(|i| ether(&format!("0x{:040x}", i))).collect();
        let balances = processor.get_balance_bunch(&addresses).await;

        assert_eq!(balances.len(), 25);
        assert!(balances.iter().all(Option::is_none));
        mock.assert_async().await;
    }
}
