use accountant_core::{
    aggregator::BalanceView, currencies::BalanceChange, refresh::ServerDataManager,
};
use teloxide::{prelude::*, types::ChatId};

use crate::bot::helpers::{render_amount, short_address};

pub fn render_change(change: &BalanceChange, view: &impl BalanceView) -> String {
    let decimals = view.decimals_of(&change.address);
    let symbol = view.symbol_of(&change.address);
    let new_balance = render_amount(&change.new_balance, decimals, &symbol);
    let wallet = format!(
        "wallet #{} ({})",
        change.wallet_id,
        short_address(&change.address.address)
    );

    match &change.old_balance {
        Some(old) => format!(
            "🔔 Balance of {} changed: {} → {}",
            wallet,
            render_amount(old, decimals, &symbol),
            new_balance
        ),
        None => format!("🔔 Balance of {} is {}", wallet, new_balance),
    }
}

/// Send every change to the chat of the wallet owner. Delivery failures are
/// logged and do not stop the remaining messages.
pub async fn deliver_balance_changes(bot: &Bot, manager: &ServerDataManager, changes: &[BalanceChange]) {
    if changes.is_empty() {
        return;
    }

    let snapshot = manager.cache().snapshot();
    for change in changes {
        let chat_id = match manager.user_chat_id(change.user_id).await {
            Ok(Some(chat_id)) => chat_id,
            Ok(None) => {
                log::warn!("No chat known for user {}, dropping change of wallet {}", change.user_id, change.wallet_id);
                continue;
            }
            Err(e) => {
                log::error!("Failed to look up chat of user {}: {}", change.user_id, e);
                continue;
            }
        };

        let text = render_change(change, snapshot.as_ref());
        if let Err(e) = bot.send_message(ChatId(chat_id), text).await {
            log::error!("Failed to notify chat {} about wallet {}: {}", chat_id, change.wallet_id, e);
        }
    }
}
