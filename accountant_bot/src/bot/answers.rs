use anyhow::Result;
use teloxide::{Bot, types::Message};

use accountant_core::helpers::bot_commands::Command;

use super::handler::{
    handle_add_wallet, handle_balance, handle_delete_wallet, handle_help, handle_notify,
    handle_rename_wallet, handle_set_price, handle_wallets,
};
use crate::dependencies::BotDependencies;

pub async fn answers(
    bot: Bot,
    msg: Message,
    cmd: Command,
    bot_deps: BotDependencies,
) -> Result<()> {
    match cmd {
        Command::Help => handle_help(bot, msg).await?,
        Command::AddWallet(args) => handle_add_wallet(bot, msg, &args, bot_deps).await?,
        Command::Wallets => handle_wallets(bot, msg, bot_deps).await?,
        Command::Balance => handle_balance(bot, msg, bot_deps).await?,
        Command::Notify(args) => handle_notify(bot, msg, &args, bot_deps).await?,
        Command::DeleteWallet(args) => handle_delete_wallet(bot, msg, &args, bot_deps).await?,
        Command::RenameWallet(args) => handle_rename_wallet(bot, msg, &args, bot_deps).await?,
        Command::SetPrice(args) => handle_set_price(bot, msg, &args, bot_deps).await?,
    }
    Ok(())
}
