use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "Display this text.")]
    Help,
    #[command(
        description = "Watch an address: /addwallet <currency> <address> [contract]. Currencies: btc, bch, btg, eth, xrp, erc20."
    )]
    AddWallet(String),
    #[command(description = "List your wallets with their balances.")]
    Wallets,
    #[command(description = "Show your balances grouped by currency.")]
    Balance,
    #[command(description = "Balance change notifications: /notify <wallet_id> on|off.")]
    Notify(String),
    #[command(description = "Stop watching a wallet: /deletewallet <wallet_id>.")]
    DeleteWallet(String),
    #[command(description = "Rename a wallet: /renamewallet <wallet_id> <name>.")]
    RenameWallet(String),
    #[command(
        description = "Set the fiat rate id of a wallet: /setprice <wallet_id> <price_id>, or - to clear."
    )]
    SetPrice(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("/addwallet erc20 0xholder 0xcontract", "accountant_bot").unwrap(),
            Command::AddWallet("erc20 0xholder 0xcontract".to_string())
        );
        assert_eq!(
            Command::parse("/balance", "accountant_bot").unwrap(),
            Command::Balance
        );
        assert_eq!(
            Command::parse("/renamewallet 3 cold storage", "accountant_bot").unwrap(),
            Command::RenameWallet("3 cold storage".to_string())
        );
        assert!(Command::parse("/withdraw 3", "accountant_bot").is_err());
    }
}
