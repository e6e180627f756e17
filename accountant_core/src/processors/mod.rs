pub mod bitcoin;
pub mod bitcoin_cash;
pub mod bitcoin_gold;
pub mod erc20;
pub mod ether;
pub(crate) mod http;
pub mod ripple;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use num_bigint::BigInt;
use reqwest::Client;

use crate::currencies::{AddressData, Currency, TokenData};

pub use bitcoin::BitcoinProcessor;
pub use bitcoin_cash::BitcoinCashProcessor;
pub use bitcoin_gold::BitcoinGoldProcessor;
pub use erc20::Erc20Processor;
pub use ether::EtherProcessor;
pub use ripple::RippleXrpProcessor;

/// Balance source for one network.
///
/// Implementations never fail: every transport, status or parse problem is
/// logged and reported as `None` for the affected address.
#[async_trait]
pub trait CurrencyProcessor: Send + Sync {
    fn currency(&self) -> Currency;

    /// Balance of a single address in atomic units.
    async fn get_balance(&self, address: &AddressData) -> Option<BigInt>;

    /// Balances of many addresses, same length and order as the input.
    /// Networks without a batch endpoint issue one request per address.
    async fn get_balance_bunch(&self, addresses: &[AddressData]) -> Vec<Option<BigInt>> {
        let mut balances = Vec::with_capacity(addresses.len());
        for address in addresses {
            balances.push(self.get_balance(address).await);
        }
        balances
    }

    fn is_address_valid(&self, _address: &str) -> bool {
        true
    }

    /// Token metadata, only meaningful for token networks.
    async fn get_token_data(&self, _contract_address: &str) -> Option<TokenData> {
        None
    }
}

/// Base URLs of the public explorers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerEndpoints {
    pub bitcoin: String,
    pub bitcoin_cash: String,
    pub bitcoin_gold: String,
    pub etherscan: String,
    pub etherscan_api_key: Option<String>,
    pub tokenbalance: String,
    pub ripple: String,
}

impl Default for ExplorerEndpoints {
    fn default() -> Self {
        Self {
            bitcoin: "https://chain.api.btc.com/v3".to_string(),
            bitcoin_cash: "https://api.blockchair.com/bitcoin-cash".to_string(),
            bitcoin_gold: "http://btgexp.com".to_string(),
            etherscan: "https://api.etherscan.io/api".to_string(),
            etherscan_api_key: None,
            tokenbalance: "https://api.tokenbalance.com".to_string(),
            ripple: "https://data.ripple.com/v2".to_string(),
        }
    }
}

/// One processor per supported currency.
#[derive(Clone, Default)]
pub struct Processors {
    processors: HashMap<Currency, Arc<dyn CurrencyProcessor>>,
}

impl Processors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_endpoints(client: Client, endpoints: &ExplorerEndpoints) -> Self {
        Self::new()
            .with(Arc::new(BitcoinProcessor::new(
                client.clone(),
                &endpoints.bitcoin,
            )))
            .with(Arc::new(BitcoinCashProcessor::new(
                client.clone(),
                &endpoints.bitcoin_cash,
            )))
            .with(Arc::new(BitcoinGoldProcessor::new(
                client.clone(),
                &endpoints.bitcoin_gold,
            )))
            .with(Arc::new(EtherProcessor::new(
                client.clone(),
                &endpoints.etherscan,
                endpoints.etherscan_api_key.clone(),
            )))
            .with(Arc::new(Erc20Processor::new(
                client.clone(),
                &endpoints.tokenbalance,
            )))
            .with(Arc::new(RippleXrpProcessor::new(client, &endpoints.ripple)))
    }

    pub fn with(mut self, processor: Arc<dyn CurrencyProcessor>) -> Self {
        self.processors.insert(processor.currency(), processor);
        self
    }

    pub fn get(&self, currency: Currency) -> Option<Arc<dyn CurrencyProcessor>> {
        self.processors.get(&currency).cloned()
    }

    pub fn is_address_valid(&self, currency: Currency, address: &str) -> bool {
        match self.processors.get(&currency) {
            Some(processor) => processor.is_address_valid(address),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProcessor;

    #[async_trait]
    impl CurrencyProcessor for FixedProcessor {
        fn currency(&self) -> Currency {
            Currency::RippleXrp
        }

        async fn get_balance(&self, address: &AddressData) -> Option<BigInt> {
            if address.address == "missing" {
                None
            } else {
                Some(BigInt::from(address.address.len()))
            }
        }
    }

    #[tokio::test]
    async fn test_default_bunch_keeps_order_and_gaps() {
        let addresses = vec![
            AddressData::new(Currency::RippleXrp, "abc"),
            AddressData::new(Currency::RippleXrp, "missing"),
            AddressData::new(Currency::RippleXrp, "abcdef"),
        ];
        let balances = FixedProcessor.get_balance_bunch(&addresses).await;
        assert_eq!(
            balances,
            vec![Some(BigInt::from(3)), None, Some(BigInt::from(6))]
        );
    }

    #[test]
    fn test_registry_covers_every_currency() {
        let processors = Processors::from_endpoints(Client::new(), &ExplorerEndpoints::default());
        for currency in Currency::ALL {
            let processor = processors.get(currency).expect("processor registered");
            assert_eq!(processor.currency(), currency);
        }
        assert!(!processors.is_address_valid(Currency::BitcoinGold, "not-an-address"));
    }
}
