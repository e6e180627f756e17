use accountant_core::{error::RequestError, helpers::bot_commands::Command};
use anyhow::Result as AnyResult;
use teloxide::{prelude::*, types::Message, utils::command::BotCommands};

use super::{
    helpers::{
        parse_add_wallet, parse_notify, parse_rename, parse_set_price, parse_wallet_id,
        render_summary, render_wallets, short_address,
    },
};
use crate::dependencies::BotDependencies;

async fn reply(bot: &Bot, msg: &Message, text: impl Into<String>) -> AnyResult<()> {
    bot.send_message(msg.chat.id, text.into()).await?;
    Ok(())
}

/// User mistakes are answered in the chat; store failures go up to the
/// dispatcher's error handler.
async fn reply_request_error(bot: &Bot, msg: &Message, error: RequestError) -> AnyResult<()> {
    match error {
        RequestError::Store(e) => {
            log::error!("Wallet store failure for chat {}: {}", msg.chat.id, e);
            reply(bot, msg, "❌ Something went wrong, please try again later.").await?;
            Err(e.into())
        }
        other => reply(bot, msg, format!("❌ {}", other)).await,
    }
}

pub async fn handle_help(bot: Bot, msg: Message) -> AnyResult<()> {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

pub async fn handle_add_wallet(
    bot: Bot,
    msg: Message,
    args: &str,
    bot_deps: BotDependencies,
) -> AnyResult<()> {
    let wallet = match parse_add_wallet(args) {
        Ok(wallet) => wallet,
        Err(usage) => return reply(&bot, &msg, usage).await,
    };

    match bot_deps
        .manager
        .add_wallet(msg.chat.id.0, &wallet.name, wallet.data)
        .await
    {
        Ok(wallet_id) => {
            log::info!("Chat {} added wallet {}", msg.chat.id, wallet_id);
            reply(
                &bot,
                &msg,
                format!(
                    "✅ Wallet #{} \"{}\" added. Its balance shows up after the next update.",
                    wallet_id, wallet.name
                ),
            )
            .await
        }
        Err(e) => reply_request_error(&bot, &msg, e).await,
    }
}

pub async fn handle_wallets(bot: Bot, msg: Message, bot_deps: BotDependencies) -> AnyResult<()> {
    match bot_deps.manager.user_wallets(msg.chat.id.0).await {
        Ok(wallets) => reply(&bot, &msg, render_wallets(&wallets)).await,
        Err(e) => reply_request_error(&bot, &msg, e).await,
    }
}

pub async fn handle_balance(bot: Bot, msg: Message, bot_deps: BotDependencies) -> AnyResult<()> {
    match bot_deps.manager.user_summary(msg.chat.id.0).await {
        Ok(Some(summary)) => reply(&bot, &msg, render_summary(&summary)).await,
        Ok(None) => {
            let text = match bot_deps.cache.updated_at() {
                Some(_) => "You have no wallets yet. Use /addwallet to add one.",
                None => "⏳ Balances are still being fetched, please try again shortly.",
            };
            reply(&bot, &msg, text).await
        }
        Err(e) => reply_request_error(&bot, &msg, e).await,
    }
}

pub async fn handle_notify(
    bot: Bot,
    msg: Message,
    args: &str,
    bot_deps: BotDependencies,
) -> AnyResult<()> {
    let (wallet_id, enabled) = match parse_notify(args) {
        Ok(parsed) => parsed,
        Err(usage) => return reply(&bot, &msg, usage).await,
    };

    match bot_deps
        .manager
        .set_notifications(msg.chat.id.0, wallet_id, enabled)
        .await
    {
        Ok(()) if enabled => {
            reply(&bot, &msg, format!("🔔 Notifications for wallet #{} are on.", wallet_id)).await
        }
        Ok(()) => {
            reply(&bot, &msg, format!("🔕 Notifications for wallet #{} are off.", wallet_id)).await
        }
        Err(e) => reply_request_error(&bot, &msg, e).await,
    }
}

pub async fn handle_delete_wallet(
    bot: Bot,
    msg: Message,
    args: &str,
    bot_deps: BotDependencies,
) -> AnyResult<()> {
    let wallet_id = match parse_wallet_id(args) {
        Ok(wallet_id) => wallet_id,
        Err(usage) => return reply(&bot, &msg, usage).await,
    };

    match bot_deps.manager.delete_wallet(msg.chat.id.0, wallet_id).await {
        Ok(address) => {
            reply(
                &bot,
                &msg,
                format!(
                    "🗑 Wallet #{} ({} {}) removed.",
                    wallet_id,
                    address.currency.symbol(),
                    short_address(&address.address)
                ),
            )
            .await
        }
        Err(e) => reply_request_error(&bot, &msg, e).await,
    }
}

pub async fn handle_rename_wallet(
    bot: Bot,
    msg: Message,
    args: &str,
    bot_deps: BotDependencies,
) -> AnyResult<()> {
    let (wallet_id, name) = match parse_rename(args) {
        Ok(parsed) => parsed,
        Err(usage) => return reply(&bot, &msg, usage).await,
    };

    match bot_deps
        .manager
        .rename_wallet(msg.chat.id.0, wallet_id, &name)
        .await
    {
        Ok(()) => reply(&bot, &msg, format!("✅ Wallet #{} is now \"{}\".", wallet_id, name)).await,
        Err(e) => reply_request_error(&bot, &msg, e).await,
    }
}

pub async fn handle_set_price(
    bot: Bot,
    msg: Message,
    args: &str,
    bot_deps: BotDependencies,
) -> AnyResult<()> {
    let (wallet_id, price_id) = match parse_set_price(args) {
        Ok(parsed) => parsed,
        Err(usage) => return reply(&bot, &msg, usage).await,
    };

    match bot_deps
        .manager
        .set_price_id(msg.chat.id.0, wallet_id, &price_id)
        .await
    {
        Ok(()) if price_id.is_empty() => {
            reply(&bot, &msg, format!("✅ Wallet #{} has no fiat rate now.", wallet_id)).await
        }
        Ok(()) => {
            reply(
                &bot,
                &msg,
                format!(
                    "✅ Wallet #{} is priced by \"{}\" from the next update on.",
                    wallet_id, price_id
                ),
            )
            .await
        }
        Err(e) => reply_request_error(&bot, &msg, e).await,
    }
}
