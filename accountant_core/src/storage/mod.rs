pub mod dto;
pub mod sled_store;

pub use sled_store::SledWalletStore;

use crate::{
    currencies::{AddressData, BalanceNotify, WalletAddress, WalletInfo},
    error::StoreError,
};

/// Persistent wallets, users and notification baselines.
///
/// All calls are synchronous; callers that share the store with the poll
/// cycle serialize through the cycle's store lock.
pub trait WalletStore: Send + Sync {
    /// Every wallet that is not removed.
    fn list_all_tracked_addresses(&self) -> Result<Vec<WalletAddress>, StoreError>;

    /// Baselines of all wallets with notifications enabled.
    fn list_notify_baselines(&self) -> Result<Vec<BalanceNotify>, StoreError>;

    /// Persist new baselines in one atomic operation. Records that no longer
    /// exist (notifications disabled meanwhile) are skipped.
    fn write_notify_baselines(&self, updates: &[BalanceNotify]) -> Result<(), StoreError>;

    fn is_wallet_owned_by(&self, wallet_id: u64, user_id: u64) -> Result<bool, StoreError>;

    fn get_or_create_user(&self, chat_id: i64) -> Result<u64, StoreError>;
    fn user_chat_id(&self, user_id: u64) -> Result<Option<i64>, StoreError>;

    fn create_watch_only_wallet(
        &self,
        user_id: u64,
        name: &str,
        data: &AddressData,
    ) -> Result<u64, StoreError>;
    fn user_wallets(&self, user_id: u64) -> Result<Vec<WalletInfo>, StoreError>;
    fn rename_wallet(&self, wallet_id: u64, name: &str) -> Result<(), StoreError>;
    /// Soft delete; the wallet's baseline goes away in the same operation.
    fn delete_wallet(&self, wallet_id: u64) -> Result<(), StoreError>;
    fn wallet_address(&self, wallet_id: u64) -> Result<Option<AddressData>, StoreError>;

    /// Distinct non-empty contract addresses of wallets that are not removed.
    fn all_contract_addresses(&self) -> Result<Vec<String>, StoreError>;
    /// Distinct non-empty price ids of wallets that are not removed.
    fn all_price_ids(&self) -> Result<Vec<String>, StoreError>;
    fn set_wallet_price_id(&self, wallet_id: u64, price_id: &str) -> Result<(), StoreError>;

    fn enable_balance_notifies(&self, wallet_id: u64) -> Result<(), StoreError>;
    fn disable_balance_notifies(&self, wallet_id: u64) -> Result<(), StoreError>;
    fn is_balance_notifies_enabled(&self, wallet_id: u64) -> Result<bool, StoreError>;
}
