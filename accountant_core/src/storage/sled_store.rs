use std::collections::BTreeSet;

use bincode::config;
use log::debug;
use num_bigint::BigInt;
use sled::{
    Db, Tree,
    transaction::{ConflictableTransactionError, ConflictableTransactionResult, Transactional},
};

use super::{
    WalletStore,
    dto::{NotifyRecord, UserRecord, WalletRecord},
};
use crate::{
    currencies::{AddressData, BalanceNotify, WalletAddress, WalletInfo},
    error::StoreError,
    helpers::amount::parse_atomic_integer,
};

const USERS_TREE: &str = "users";
const USER_CHATS_TREE: &str = "user_chats";
const WALLETS_TREE: &str = "wallets";
const BALANCE_NOTIFIES_TREE: &str = "balance_notifies";

fn id_key(id: u64) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

fn key_to_id(key: &[u8]) -> Result<u64, StoreError> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| StoreError::Corrupted(format!("key of unexpected length {}", key.len())))?;
    Ok(u64::from_be_bytes(bytes))
}

fn encode<T: bincode::Encode>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::encode_to_vec(value, config::standard())?)
}

fn decode<T: bincode::Decode<()>>(bytes: &[u8]) -> Result<T, StoreError> {
    let (value, _) = bincode::decode_from_slice::<T, _>(bytes, config::standard())?;
    Ok(value)
}

fn abort(e: StoreError) -> ConflictableTransactionError<StoreError> {
    ConflictableTransactionError::Abort(e)
}

/// `WalletStore` on top of sled trees. Every record is keyed by its
/// big-endian id, so iteration order is id order.
#[derive(Clone)]
pub struct SledWalletStore {
    db: Db,
    users: Tree,
    user_chats: Tree,
    wallets: Tree,
    notifies: Tree,
}

impl SledWalletStore {
    pub fn new(db: &Db) -> sled::Result<Self> {
        Ok(Self {
            db: db.clone(),
            users: db.open_tree(USERS_TREE)?,
            user_chats: db.open_tree(USER_CHATS_TREE)?,
            wallets: db.open_tree(WALLETS_TREE)?,
            notifies: db.open_tree(BALANCE_NOTIFIES_TREE)?,
        })
    }

    fn next_id(&self) -> Result<u64, StoreError> {
        Ok(self.db.generate_id()? + 1)
    }

    fn get_wallet(&self, wallet_id: u64) -> Result<Option<WalletRecord>, StoreError> {
        let Some(bytes) = self.wallets.get(id_key(wallet_id))? else {
            return Ok(None);
        };
        let record: WalletRecord = decode(&bytes)?;
        if record.id != wallet_id {
            return Err(StoreError::Corrupted(format!(
                "wallet stored under id {} claims id {}",
                wallet_id, record.id
            )));
        }
        Ok(Some(record))
    }

    fn active_wallet(&self, wallet_id: u64) -> Result<WalletRecord, StoreError> {
        match self.get_wallet(wallet_id)? {
            Some(wallet) if !wallet.is_removed => Ok(wallet),
            _ => Err(StoreError::WalletNotFound(wallet_id)),
        }
    }

    fn put_wallet(&self, wallet: &WalletRecord) -> Result<(), StoreError> {
        self.wallets.insert(id_key(wallet.id), encode(wallet)?)?;
        Ok(())
    }

    fn active_wallets(&self) -> Result<Vec<WalletRecord>, StoreError> {
        let mut wallets = Vec::new();
        for entry in self.wallets.iter() {
            let (key, bytes) = entry?;
            let record: WalletRecord = decode(&bytes)?;
            if record.id != key_to_id(&key)? {
                return Err(StoreError::Corrupted(format!(
                    "wallet record {} is stored under a foreign key",
                    record.id
                )));
            }
            if !record.is_removed {
                wallets.push(record);
            }
        }
        Ok(wallets)
    }
}

impl WalletStore for SledWalletStore {
    fn list_all_tracked_addresses(&self) -> Result<Vec<WalletAddress>, StoreError> {
        Ok(self
            .active_wallets()?
            .into_iter()
            .map(|wallet| WalletAddress {
                wallet_id: wallet.id,
                user_id: wallet.user_id,
                data: wallet.address_data(),
            })
            .collect())
    }

    fn list_notify_baselines(&self) -> Result<Vec<BalanceNotify>, StoreError> {
        let mut baselines = Vec::new();
        for entry in self.notifies.iter() {
            let (key, bytes) = entry?;
            let wallet_id = key_to_id(&key)?;
            let record: NotifyRecord = decode(&bytes)?;
            if record.wallet_id != wallet_id {
                return Err(StoreError::Corrupted(format!(
                    "baseline {} of wallet {} is stored under wallet {}",
                    record.id, record.wallet_id, wallet_id
                )));
            }

            let wallet = match self.get_wallet(wallet_id)? {
                Some(wallet) if !wallet.is_removed => wallet,
                _ => {
                    return Err(StoreError::Corrupted(format!(
                        "baseline {} refers to missing wallet {}",
                        record.id, wallet_id
                    )));
                }
            };

            let old_balance = if record.last_balance.is_empty() {
                None
            } else {
                match parse_atomic_integer(&record.last_balance) {
                    Some(balance) => Some(balance),
                    None => {
                        return Err(StoreError::Corrupted(format!(
                            "baseline {} of wallet {} holds {:?}",
                            record.id, wallet_id, record.last_balance
                        )));
                    }
                }
            };

            baselines.push(BalanceNotify {
                notify_id: record.id,
                user_id: wallet.user_id,
                wallet_id,
                old_balance,
            });
        }
        Ok(baselines)
    }

    fn write_notify_baselines(&self, updates: &[BalanceNotify]) -> Result<(), StoreError> {
        if updates.is_empty() {
            return Ok(());
        }

        self.notifies
            .transaction(|tx| -> ConflictableTransactionResult<(), StoreError> {
                for update in updates {
                    let key = id_key(update.wallet_id);
                    let Some(bytes) = tx.get(&key)? else {
                        continue;
                    };
                    let mut record: NotifyRecord = decode(&bytes).map_err(abort)?;
                    record.last_balance = update
                        .old_balance
                        .as_ref()
                        .map(BigInt::to_string)
                        .unwrap_or_default();
                    tx.insert(key, encode(&record).map_err(abort)?)?;
                }
                Ok(())
            })?;

        debug!("Persisted {} notification baselines", updates.len());
        Ok(())
    }

    fn is_wallet_owned_by(&self, wallet_id: u64, user_id: u64) -> Result<bool, StoreError> {
        Ok(match self.get_wallet(wallet_id)? {
            Some(wallet) => !wallet.is_removed && wallet.user_id == user_id,
            None => false,
        })
    }

    fn get_or_create_user(&self, chat_id: i64) -> Result<u64, StoreError> {
        let chat_key = chat_id.to_be_bytes().to_vec();
        if let Some(existing) = self.user_chats.get(&chat_key)? {
            return key_to_id(&existing);
        }

        let user_id = self.next_id()?;
        let claimed = self
            .user_chats
            .compare_and_swap(&chat_key, None as Option<&[u8]>, Some(id_key(user_id)))?;
        match claimed {
            Ok(()) => {
                self.users
                    .insert(id_key(user_id), encode(&UserRecord { id: user_id, chat_id })?)?;
                debug!("Created user {} for chat {}", user_id, chat_id);
                Ok(user_id)
            }
            // Another caller registered the chat first.
            Err(conflict) => match conflict.current {
                Some(current) => key_to_id(&current),
                None => Err(StoreError::Corrupted(format!(
                    "chat {} lost its user while being registered",
                    chat_id
                ))),
            },
        }
    }

    fn user_chat_id(&self, user_id: u64) -> Result<Option<i64>, StoreError> {
        match self.users.get(id_key(user_id))? {
            Some(bytes) => Ok(Some(decode::<UserRecord>(&bytes)?.chat_id)),
            None => Ok(None),
        }
    }

    fn create_watch_only_wallet(
        &self,
        user_id: u64,
        name: &str,
        data: &AddressData,
    ) -> Result<u64, StoreError> {
        let wallet = WalletRecord {
            id: self.next_id()?,
            user_id,
            name: name.to_string(),
            currency: data.currency,
            address: data.address.clone(),
            contract_address: data.contract_address.clone(),
            price_id: data.price_id.clone(),
            is_removed: false,
        };
        self.put_wallet(&wallet)?;
        debug!("Created {} wallet {} for user {}", wallet.currency, wallet.id, user_id);
        Ok(wallet.id)
    }

    fn user_wallets(&self, user_id: u64) -> Result<Vec<WalletInfo>, StoreError> {
        Ok(self
            .active_wallets()?
            .into_iter()
            .filter(|wallet| wallet.user_id == user_id)
            .map(|wallet| WalletInfo {
                wallet_id: wallet.id,
                data: wallet.address_data(),
                name: wallet.name,
            })
            .collect())
    }

    fn rename_wallet(&self, wallet_id: u64, name: &str) -> Result<(), StoreError> {
        let mut wallet = self.active_wallet(wallet_id)?;
        wallet.name = name.to_string();
        self.put_wallet(&wallet)
    }

    fn delete_wallet(&self, wallet_id: u64) -> Result<(), StoreError> {
        let mut wallet = self.active_wallet(wallet_id)?;
        wallet.is_removed = true;
        let bytes = encode(&wallet)?;
        let key = id_key(wallet_id);

        (&self.wallets, &self.notifies).transaction(
            |(wallets, notifies)| -> ConflictableTransactionResult<(), StoreError> {
                wallets.insert(key.clone(), bytes.clone())?;
                notifies.remove(key.clone())?;
                Ok(())
            },
        )?;
        Ok(())
    }

    fn wallet_address(&self, wallet_id: u64) -> Result<Option<AddressData>, StoreError> {
        Ok(self
            .get_wallet(wallet_id)?
            .filter(|wallet| !wallet.is_removed)
            .map(|wallet| wallet.address_data()))
    }

    fn all_contract_addresses(&self) -> Result<Vec<String>, StoreError> {
        let contracts: BTreeSet<String> = self
            .active_wallets()?
            .into_iter()
            .map(|wallet| wallet.contract_address)
            .filter(|contract| !contract.is_empty())
            .collect();
        Ok(contracts.into_iter().collect())
    }

    fn all_price_ids(&self) -> Result<Vec<String>, StoreError> {
        let price_ids: BTreeSet<String> = self
            .active_wallets()?
            .into_iter()
            .map(|wallet| wallet.price_id)
            .filter(|price_id| !price_id.is_empty())
            .collect();
        Ok(price_ids.into_iter().collect())
    }

    fn set_wallet_price_id(&self, wallet_id: u64, price_id: &str) -> Result<(), StoreError> {
        let mut wallet = self.active_wallet(wallet_id)?;
        wallet.price_id = price_id.to_string();
        self.put_wallet(&wallet)
    }

    fn enable_balance_notifies(&self, wallet_id: u64) -> Result<(), StoreError> {
        self.active_wallet(wallet_id)?;
        let key = id_key(wallet_id);
        if self.notifies.contains_key(&key)? {
            return Ok(());
        }

        let record = NotifyRecord {
            id: self.next_id()?,
            wallet_id,
            last_balance: String::new(),
        };
        self.notifies.insert(key, encode(&record)?)?;
        Ok(())
    }

    fn disable_balance_notifies(&self, wallet_id: u64) -> Result<(), StoreError> {
        self.notifies.remove(id_key(wallet_id))?;
        Ok(())
    }

    fn is_balance_notifies_enabled(&self, wallet_id: u64) -> Result<bool, StoreError> {
        Ok(self.notifies.contains_key(id_key(wallet_id))?)
    }
}
