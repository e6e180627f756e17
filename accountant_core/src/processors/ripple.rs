use async_trait::async_trait;
use num_bigint::BigInt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::value::RawValue;

use super::{
    CurrencyProcessor,
    http::{fetch_parsed, raw_decimal_text},
};
use crate::{
    currencies::{AddressData, Currency},
    error::FetchError,
    helpers::amount::scale_decimal_to_atomic,
};

const XRP_DECIMALS: u32 = 6;

/// Ripple data API, balances reported in whole XRP.
#[derive(Clone)]
pub struct RippleXrpProcessor {
    client: Client,
    base_url: String,
}

impl RippleXrpProcessor {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RippleBalances {
    #[serde(default)]
    balances: Vec<RippleBalance>,
}

#[derive(Debug, Deserialize)]
struct RippleBalance {
    value: Box<RawValue>,
}

/// `{"balances": [{"currency": "XRP", "value": "20.5"}]}` in drops.
pub fn parse_ripple_balance(body: &str) -> Result<BigInt, FetchError> {
    let parsed: RippleBalances = serde_json::from_str(body)?;
    let first = parsed
        .balances
        .first()
        .ok_or(FetchError::MissingField("balances"))?;
    let text = raw_decimal_text(&first.value)?;
    scale_decimal_to_atomic(&text, XRP_DECIMALS).ok_or(FetchError::NotANumber(text))
}

#[async_trait]
impl CurrencyProcessor for RippleXrpProcessor {
    fn currency(&self) -> Currency {
        Currency::RippleXrp
    }

    async fn get_balance(&self, address: &AddressData) -> Option<BigInt> {
        let url = format!("{}/accounts/{}/balances", self.base_url, address.address);
        let request = self
            .client
            .get(&url)
            .query(&[("currency", "XRP"), ("limit", "1")]);
        fetch_parsed(request, &url, parse_ripple_balance).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_parse_ripple_balance() {
        let body = r#"{"result":"success","balances":[{"currency":"XRP","value":"20.5"}]}"#;
        assert_eq!(parse_ripple_balance(body).unwrap(), BigInt::from(20_500_000));
        assert!(parse_ripple_balance(r#"{"result":"success","balances":[]}"#).is_err());
        assert!(parse_ripple_balance(r#"{"balances":[{"value":"lots"}]}"#).is_err());
        assert_eq!(
            parse_ripple_balance(r#"{"balances":[{"currency":"XRP","value":90071992547.409931}]}"#)
                .unwrap(),
            BigInt::from(90_071_992_547_409_931u64)
        );
    }

    #[tokio::test]
    async fn test_get_balance_queries_xrp_only() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/accounts/rN7n7otQDd6FczFgLdSqtcsAUxDkw6fzRH/balances")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("currency".into(), "XRP".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"balances":[{"currency":"XRP","value":"0.000001"}]}"#)
            .create_async()
            .await;

        let processor = RippleXrpProcessor::new(Client::new(), &server.url());
        let balance = processor
            .get_balance(&AddressData::new(
                Currency::RippleXrp,
                "rN7n7otQDd6FczFgLdSqtcsAUxDkw6fzRH",
            ))
            .await;
        assert_eq!(balance, Some(BigInt::from(1)));
        mock.assert_async().await;
    }
}
