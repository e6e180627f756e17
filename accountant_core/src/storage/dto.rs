use bincode::{Decode, Encode};

use crate::currencies::{AddressData, Currency};

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct UserRecord {
    pub id: u64,
    pub chat_id: i64,
}

/// Wallets are never physically removed; `is_removed` hides them from every
/// listing.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct WalletRecord {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    pub currency: Currency,
    pub address: String,
    pub contract_address: String,
    pub price_id: String,
    pub is_removed: bool,
}

impl WalletRecord {
    pub fn address_data(&self) -> AddressData {
        AddressData {
            currency: self.currency,
            address: self.address.clone(),
            contract_address: self.contract_address.clone(),
            price_id: self.price_id.clone(),
        }
    }
}

/// Baseline of one wallet, keyed by wallet id. `last_balance` holds the
/// decimal atomic amount, empty until the first poll after enabling.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct NotifyRecord {
    pub id: u64,
    pub wallet_id: u64,
    pub last_balance: String,
}
