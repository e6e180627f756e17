use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use super::currency::Currency;

/// Identity of one trackable wallet address.
///
/// `contract_address` is empty for everything but token wallets and
/// `price_id` is empty when no fiat rate can be looked up.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct AddressData {
    pub currency: Currency,
    pub address: String,
    pub contract_address: String,
    pub price_id: String,
}

impl AddressData {
    pub fn new(currency: Currency, address: &str) -> Self {
        Self {
            currency,
            address: address.to_string(),
            contract_address: String::new(),
            price_id: currency.default_price_id().to_string(),
        }
    }

    pub fn token(contract_address: &str, address: &str) -> Self {
        Self {
            currency: Currency::Erc20Token,
            address: address.to_string(),
            contract_address: contract_address.to_string(),
            price_id: String::new(),
        }
    }

    pub fn with_price_id(mut self, price_id: &str) -> Self {
        self.price_id = price_id.to_string();
        self
    }

    pub fn group_key(&self) -> BalanceGroupKey {
        BalanceGroupKey {
            currency: self.currency,
            contract_address: self.contract_address.clone(),
            price_id: self.price_id.clone(),
        }
    }

    /// Key under which a fetched balance is cached. The price id does not
    /// change what the network reports, so it is left out.
    pub fn fetch_key(&self) -> AddressKey {
        AddressKey {
            currency: self.currency,
            address: self.address.clone(),
            contract_address: self.contract_address.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressKey {
    pub currency: Currency,
    pub address: String,
    pub contract_address: String,
}

/// Wallets sharing this key are folded into one display line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BalanceGroupKey {
    pub currency: Currency,
    pub contract_address: String,
    pub price_id: String,
}

/// A stored wallet as seen by the poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAddress {
    pub wallet_id: u64,
    pub user_id: u64,
    pub data: AddressData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletInfo {
    pub wallet_id: u64,
    pub name: String,
    pub data: AddressData,
}

/// Persisted notification baseline of one wallet. `old_balance` is `None`
/// until the first successful poll after notifications were enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceNotify {
    pub notify_id: u64,
    pub user_id: u64,
    pub wallet_id: u64,
    pub old_balance: Option<BigInt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenData {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

/// Emitted when a wallet with notifications enabled reports a new balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub user_id: u64,
    pub wallet_id: u64,
    pub address: AddressData,
    pub old_balance: Option<BigInt>,
    pub new_balance: BigInt,
}
