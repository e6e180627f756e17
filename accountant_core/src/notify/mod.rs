//! Balance change detection against persisted baselines.

use std::collections::HashMap;

use log::{debug, info};

use crate::{
    aggregator::BalanceView,
    currencies::{AddressData, BalanceChange, BalanceNotify},
    error::StoreError,
    storage::WalletStore,
};

/// Compare fresh balances with the stored baselines.
///
/// Returns the change events together with the baselines to persist; an
/// update carries the new balance in `old_balance`, which is what the next
/// cycle compares against. Wallets whose fresh balance is absent are left
/// untouched.
pub fn diff_baselines(
    baselines: &[BalanceNotify],
    wallets: &HashMap<u64, AddressData>,
    view: &impl BalanceView,
) -> (Vec<BalanceChange>, Vec<BalanceNotify>) {
    let mut changes = Vec::new();
    let mut updates = Vec::new();

    for baseline in baselines {
        let Some(address) = wallets.get(&baseline.wallet_id) else {
            debug!("Wallet {} is not part of this cycle", baseline.wallet_id);
            continue;
        };
        let Some(fresh) = view.balance(address) else {
            continue;
        };
        if baseline.old_balance.as_ref() == Some(&fresh) {
            continue;
        }

        changes.push(BalanceChange {
            user_id: baseline.user_id,
            wallet_id: baseline.wallet_id,
            address: address.clone(),
            old_balance: baseline.old_balance.clone(),
            new_balance: fresh.clone(),
        });
        updates.push(BalanceNotify {
            old_balance: Some(fresh),
            ..baseline.clone()
        });
    }

    (changes, updates)
}

/// One tracker pass: read baselines, diff, and write every update of the
/// pass in a single store operation.
pub fn run_cycle(
    store: &dyn WalletStore,
    wallets: &HashMap<u64, AddressData>,
    view: &impl BalanceView,
) -> Result<Vec<BalanceChange>, StoreError> {
    let baselines = store.list_notify_baselines()?;
    let (changes, updates) = diff_baselines(&baselines, wallets, view);

    if !updates.is_empty() {
        store.write_notify_baselines(&updates)?;
        info!("Detected {} balance changes", changes.len());
    }
    Ok(changes)
}
