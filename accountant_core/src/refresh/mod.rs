//! The poll cycle and the on-demand wallet operations that share its locks.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use chrono::Utc;
use futures::future::join_all;
use log::{debug, error, info, warn};
use num_bigint::BigInt;
use tokio::sync::Mutex;

use crate::{
    aggregator::{AggregateSummary, WalletSummary, aggregate, wallet_balance},
    cache::{BalanceCache, BalanceSnapshot},
    currencies::{AddressData, AddressKey, BalanceChange, Currency, TokenData, WalletInfo},
    error::{RequestError, StoreError},
    notify,
    processors::Processors,
    rates::RateSource,
    storage::WalletStore,
};

/// Owns the refresh cycle.
///
/// `store_lock` is held around store access and the cache swap only, never
/// across network calls. `cycle_guard` keeps two cycles from overlapping.
pub struct ServerDataManager {
    store: Arc<dyn WalletStore>,
    processors: Processors,
    rates: Arc<dyn RateSource>,
    cache: Arc<BalanceCache>,
    store_lock: Mutex<()>,
    cycle_guard: Mutex<()>,
}

impl ServerDataManager {
    pub fn new(
        store: Arc<dyn WalletStore>,
        processors: Processors,
        rates: Arc<dyn RateSource>,
        cache: Arc<BalanceCache>,
    ) -> Self {
        Self {
            store,
            processors,
            rates,
            cache,
            store_lock: Mutex::new(()),
            cycle_guard: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> Arc<BalanceCache> {
        self.cache.clone()
    }

    pub async fn initial_update(&self) -> Result<Vec<BalanceChange>, StoreError> {
        info!("Running initial balance update");
        self.timer_tick().await
    }

    /// Full refresh: fetch every distinct address once, refresh rates and
    /// token metadata, rebuild the summaries, diff baselines and publish.
    pub async fn timer_tick(&self) -> Result<Vec<BalanceChange>, StoreError> {
        let _cycle = self.cycle_guard.lock().await;
        let started = Utc::now();

        let (tracked, contracts, price_ids) = {
            let _store = self.store_lock.lock().await;
            (
                self.store.list_all_tracked_addresses()?,
                self.store.all_contract_addresses()?,
                self.store.all_price_ids()?,
            )
        };

        let mut seen: HashSet<AddressKey> = HashSet::new();
        let mut by_currency: BTreeMap<Currency, Vec<AddressData>> = BTreeMap::new();
        for wallet in &tracked {
            if seen.insert(wallet.data.fetch_key()) {
                by_currency
                    .entry(wallet.data.currency)
                    .or_default()
                    .push(wallet.data.clone());
            }
        }

        let fetches = join_all(
            by_currency
                .into_iter()
                .map(|(currency, addresses)| self.fetch_currency(currency, addresses)),
        );
        let (batches, token_data, rates) = tokio::join!(
            fetches,
            self.fetch_token_data(contracts),
            self.rates.get_rates_bunch(&price_ids),
        );

        let mut snapshot = BalanceSnapshot {
            balances: batches.into_iter().flatten().collect(),
            rates: price_ids
                .into_iter()
                .zip(rates)
                .filter_map(|(price_id, rate)| rate.map(|rate| (price_id, rate)))
                .collect(),
            token_data,
            user_summaries: HashMap::new(),
            updated_at: Some(Utc::now()),
        };

        let mut per_user: HashMap<u64, Vec<AddressData>> = HashMap::new();
        for wallet in &tracked {
            per_user
                .entry(wallet.user_id)
                .or_default()
                .push(wallet.data.clone());
        }
        let user_summaries: HashMap<u64, AggregateSummary> = per_user
            .into_iter()
            .map(|(user_id, addresses)| (user_id, aggregate(&addresses, &snapshot)))
            .collect();
        snapshot.user_summaries = user_summaries;

        let wallets: HashMap<u64, AddressData> = tracked
            .into_iter()
            .map(|wallet| (wallet.wallet_id, wallet.data))
            .collect();

        let changes = {
            let _store = self.store_lock.lock().await;
            let changes = notify::run_cycle(self.store.as_ref(), &wallets, &snapshot)?;
            self.cache.replace(snapshot);
            changes
        };

        let elapsed = Utc::now() - started;
        info!(
            "Balance update finished in {} ms: {} wallets, {} changes",
            elapsed.num_milliseconds(),
            wallets.len(),
            changes.len()
        );
        Ok(changes)
    }

    async fn fetch_currency(
        &self,
        currency: Currency,
        addresses: Vec<AddressData>,
    ) -> Vec<(AddressKey, BigInt)> {
        let Some(processor) = self.processors.get(currency) else {
            warn!("No processor registered for {}", currency);
            return Vec::new();
        };

        debug!("Fetching {} {} addresses", addresses.len(), currency);
        let balances = processor.get_balance_bunch(&addresses).await;
        if balances.len() != addresses.len() {
            error!(
                "{} processor returned {} balances for {} addresses",
                currency,
                balances.len(),
                addresses.len()
            );
            return Vec::new();
        }

        addresses
            .iter()
            .zip(balances)
            .filter_map(|(address, balance)| balance.map(|b| (address.fetch_key(), b)))
            .collect()
    }

    async fn fetch_token_data(&self, contracts: Vec<String>) -> HashMap<String, TokenData> {
        let Some(processor) = self.processors.get(Currency::Erc20Token) else {
            return HashMap::new();
        };

        let fetched = join_all(contracts.into_iter().map(|contract| {
            let processor = processor.clone();
            async move {
                let data = processor.get_token_data(&contract).await;
                (contract, data)
            }
        }))
        .await;

        fetched
            .into_iter()
            .filter_map(|(contract, data)| data.map(|data| (contract.to_lowercase(), data)))
            .collect()
    }

    fn owned_wallet(&self, chat_id: i64, wallet_id: u64) -> Result<u64, RequestError> {
        let user_id = self.store.get_or_create_user(chat_id)?;
        if !self.store.is_wallet_owned_by(wallet_id, user_id)? {
            return Err(RequestError::NotOwner(wallet_id));
        }
        Ok(user_id)
    }

    pub async fn add_wallet(
        &self,
        chat_id: i64,
        name: &str,
        data: AddressData,
    ) -> Result<u64, RequestError> {
        if data.currency.is_token() && data.contract_address.is_empty() {
            return Err(RequestError::MissingContract);
        }
        if !self.processors.is_address_valid(data.currency, &data.address) {
            return Err(RequestError::InvalidAddress {
                currency: data.currency,
                address: data.address,
            });
        }

        let _store = self.store_lock.lock().await;
        let user_id = self.store.get_or_create_user(chat_id)?;
        Ok(self.store.create_watch_only_wallet(user_id, name, &data)?)
    }

    /// Returns the address the removed wallet was watching.
    pub async fn delete_wallet(
        &self,
        chat_id: i64,
        wallet_id: u64,
    ) -> Result<AddressData, RequestError> {
        let _store = self.store_lock.lock().await;
        self.owned_wallet(chat_id, wallet_id)?;
        let address = self
            .store
            .wallet_address(wallet_id)?
            .ok_or(RequestError::NotOwner(wallet_id))?;
        self.store.delete_wallet(wallet_id)?;
        Ok(address)
    }

    pub async fn rename_wallet(
        &self,
        chat_id: i64,
        wallet_id: u64,
        name: &str,
    ) -> Result<(), RequestError> {
        let _store = self.store_lock.lock().await;
        self.owned_wallet(chat_id, wallet_id)?;
        Ok(self.store.rename_wallet(wallet_id, name)?)
    }

    pub async fn set_price_id(
        &self,
        chat_id: i64,
        wallet_id: u64,
        price_id: &str,
    ) -> Result<(), RequestError> {
        let _store = self.store_lock.lock().await;
        self.owned_wallet(chat_id, wallet_id)?;
        Ok(self.store.set_wallet_price_id(wallet_id, price_id)?)
    }

    pub async fn set_notifications(
        &self,
        chat_id: i64,
        wallet_id: u64,
        enabled: bool,
    ) -> Result<(), RequestError> {
        let _store = self.store_lock.lock().await;
        self.owned_wallet(chat_id, wallet_id)?;
        if enabled {
            self.store.enable_balance_notifies(wallet_id)?;
        } else {
            self.store.disable_balance_notifies(wallet_id)?;
        }
        Ok(())
    }

    /// The chat's wallets with their values from the last completed cycle,
    /// plus whether notifications are on.
    pub async fn user_wallets(
        &self,
        chat_id: i64,
    ) -> Result<Vec<(WalletInfo, WalletSummary, bool)>, RequestError> {
        let wallets = {
            let _store = self.store_lock.lock().await;
            let user_id = self.store.get_or_create_user(chat_id)?;
            let mut wallets = Vec::new();
            for wallet in self.store.user_wallets(user_id)? {
                let notifies = self.store.is_balance_notifies_enabled(wallet.wallet_id)?;
                wallets.push((wallet, notifies));
            }
            wallets
        };

        let snapshot = self.cache.snapshot();
        Ok(wallets
            .into_iter()
            .map(|(wallet, notifies)| {
                let summary = wallet_balance(&wallet.data, snapshot.as_ref());
                (wallet, summary, notifies)
            })
            .collect())
    }

    /// Aggregated balances of the chat's wallets as of the last cycle.
    pub async fn user_summary(&self, chat_id: i64) -> Result<Option<AggregateSummary>, RequestError> {
        let user_id = {
            let _store = self.store_lock.lock().await;
            self.store.get_or_create_user(chat_id)?
        };
        Ok(self.cache.user_summary(user_id))
    }

    pub async fn user_chat_id(&self, user_id: u64) -> Result<Option<i64>, StoreError> {
        let _store = self.store_lock.lock().await;
        self.store.user_chat_id(user_id)
    }
}
