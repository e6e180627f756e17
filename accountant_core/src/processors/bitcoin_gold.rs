use std::sync::OnceLock;

use async_trait::async_trait;
use num_bigint::BigInt;
use regex::Regex;
use reqwest::Client;

use super::{CurrencyProcessor, http::fetch_parsed};
use crate::{
    currencies::{AddressData, Currency},
    error::FetchError,
    helpers::amount::scale_decimal_to_atomic,
};

const BITCOIN_GOLD_DECIMALS: u32 = 8;

fn address_regex() -> &'static Regex {
    static ADDRESS: OnceLock<Regex> = OnceLock::new();
    ADDRESS.get_or_init(|| {
        Regex::new(r"^[GA][1-9A-HJ-NP-Za-km-z]{10,51}$").expect("valid Bitcoin Gold address regex")
    })
}

pub fn is_bitcoin_gold_address(address: &str) -> bool {
    address_regex().is_match(address)
}

/// btgexp answers with a bare decimal such as `0.5`.
pub fn parse_bitcoin_gold_balance(body: &str) -> Result<BigInt, FetchError> {
    scale_decimal_to_atomic(body, BITCOIN_GOLD_DECIMALS)
        .ok_or_else(|| FetchError::NotANumber(body.trim().to_string()))
}

#[derive(Clone)]
pub struct BitcoinGoldProcessor {
    client: Client,
    base_url: String,
}

impl BitcoinGoldProcessor {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CurrencyProcessor for BitcoinGoldProcessor {
    fn currency(&self) -> Currency {
        Currency::BitcoinGold
    }

    async fn get_balance(&self, address: &AddressData) -> Option<BigInt> {
        let url = format!("{}/ext/getbalance/{}", self.base_url, address.address);
        fetch_parsed(self.client.get(&url), &url, parse_bitcoin_gold_balance).await
    }

    fn is_address_valid(&self, address: &str) -> bool {
        is_bitcoin_gold_address(address)
    }
}
