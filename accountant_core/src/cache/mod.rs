use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;

use crate::{
    aggregator::{AggregateSummary, BalanceView},
    currencies::{AddressData, AddressKey, TokenData},
};

/// Everything one completed refresh cycle learned. Absent balances and
/// rates are simply missing from the maps.
#[derive(Debug, Clone, Default)]
pub struct BalanceSnapshot {
    pub balances: HashMap<AddressKey, BigInt>,
    pub rates: HashMap<String, BigDecimal>,
    pub token_data: HashMap<String, TokenData>,
    pub user_summaries: HashMap<u64, AggregateSummary>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BalanceView for BalanceSnapshot {
    fn balance(&self, address: &AddressData) -> Option<BigInt> {
        self.balances.get(&address.fetch_key()).cloned()
    }

    fn rate_to_usd(&self, price_id: &str) -> Option<BigDecimal> {
        self.rates.get(price_id).cloned()
    }

    fn token_data(&self, contract_address: &str) -> Option<TokenData> {
        self.token_data
            .get(&contract_address.to_lowercase())
            .cloned()
    }
}

/// Shared, read-mostly view of the last committed cycle.
///
/// The whole snapshot is swapped at once, so a reader either sees the
/// previous cycle or the new one, never a mix.
#[derive(Debug, Default)]
pub struct BalanceCache {
    current: RwLock<Arc<BalanceSnapshot>>,
}

impl BalanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<BalanceSnapshot> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn replace(&self, snapshot: BalanceSnapshot) {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Arc::new(snapshot);
    }

    pub fn get_balance(&self, address: &AddressData) -> Option<BigInt> {
        self.snapshot().balance(address)
    }

    pub fn get_rate_to_usd(&self, price_id: &str) -> Option<BigDecimal> {
        self.snapshot().rate_to_usd(price_id)
    }

    pub fn get_erc20_token_data(&self, contract_address: &str) -> Option<TokenData> {
        self.snapshot().token_data(contract_address)
    }

    pub fn user_summary(&self, user_id: u64) -> Option<AggregateSummary> {
        self.snapshot().user_summaries.get(&user_id).cloned()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot().updated_at
    }
}
