use accountant_core::{
    aggregator::{AggregateSummary, WalletSummary},
    currencies::{AddressData, Currency, WalletInfo},
    helpers::amount::{format_amount, format_fiat},
};
use num_bigint::BigInt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWallet {
    pub name: String,
    pub data: AddressData,
}

/// `<currency> <address> [contract]`
pub fn parse_add_wallet(args: &str) -> Result<NewWallet, String> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    let (currency, address, contract) = match tokens.as_slice() {
        [currency, address] => (*currency, *address, None),
        [currency, address, contract] => (*currency, *address, Some(*contract)),
        _ => return Err("Usage: /addwallet <currency> <address> [contract]".to_string()),
    };

    let currency: Currency = currency.parse()?;
    let data = match (currency.is_token(), contract) {
        (true, Some(contract)) => AddressData::token(contract, address),
        (true, None) => return Err("Token wallets need a contract address.".to_string()),
        (false, None) => AddressData::new(currency, address),
        (false, Some(_)) => return Err(format!("{} wallets take no contract address.", currency)),
    };

    Ok(NewWallet {
        name: format!("{} {}", currency.symbol(), short_address(address)),
        data,
    })
}

pub fn parse_wallet_id(args: &str) -> Result<u64, String> {
    args.trim()
        .parse()
        .map_err(|_| format!("{:?} is not a wallet id. See /wallets.", args.trim()))
}

/// `<wallet_id> on|off`
pub fn parse_notify(args: &str) -> Result<(u64, bool), String> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    let [wallet_id, switch] = tokens.as_slice() else {
        return Err("Usage: /notify <wallet_id> on|off".to_string());
    };
    let enabled = match switch.to_lowercase().as_str() {
        "on" | "enable" => true,
        "off" | "disable" => false,
        _ => return Err("Usage: /notify <wallet_id> on|off".to_string()),
    };
    Ok((parse_wallet_id(wallet_id)?, enabled))
}

/// `<wallet_id> <price_id>`; `-` clears the price id.
pub fn parse_set_price(args: &str) -> Result<(u64, String), String> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    let [wallet_id, price_id] = tokens.as_slice() else {
        return Err("Usage: /setprice <wallet_id> <price_id>".to_string());
    };
    let price_id = if *price_id == "-" {
        String::new()
    } else {
        price_id.to_lowercase()
    };
    Ok((parse_wallet_id(wallet_id)?, price_id))
}

/// `<wallet_id> <name...>`
pub fn parse_rename(args: &str) -> Result<(u64, String), String> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    let [wallet_id, name @ ..] = tokens.as_slice() else {
        return Err("Usage: /renamewallet <wallet_id> <name>".to_string());
    };
    if name.is_empty() {
        return Err("Usage: /renamewallet <wallet_id> <name>".to_string());
    }
    Ok((parse_wallet_id(wallet_id)?, name.join(" ")))
}

pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 14 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Amount with its symbol. Without known decimals the raw atomic amount is
/// shown, which still tells the user that a balance was fetched.
pub fn render_amount(amount: &BigInt, decimals: Option<u32>, symbol: &str) -> String {
    match decimals {
        Some(decimals) => format!("{} {}", format_amount(amount, decimals), symbol),
        None => format!("{} (atomic units of {})", amount, symbol),
    }
}

fn render_balance(balance: Option<&BigInt>, decimals: Option<u32>, symbol: &str) -> String {
    match balance {
        Some(amount) => render_amount(amount, decimals, symbol),
        None => "no data".to_string(),
    }
}

pub fn render_summary(summary: &AggregateSummary) -> String {
    if summary.groups.is_empty() {
        return "You have no wallets yet. Use /addwallet to add one.".to_string();
    }

    let mut lines = vec!["💰 Your balances:".to_string()];
    for group in &summary.groups {
        let amount = render_balance(group.balance.as_ref(), group.decimals, &group.symbol);
        let line = match group.fiat_value() {
            Some(fiat) => format!("• {}: {} ≈ ${}", group.symbol, amount, format_fiat(&fiat)),
            None => format!("• {}: {}", group.symbol, amount),
        };
        lines.push(line);
    }
    if let Some(total) = &summary.fiat_total {
        lines.push(String::new());
        lines.push(format!("Total ≈ ${}", format_fiat(total)));
    }
    lines.join("\n")
}

pub fn render_wallets(wallets: &[(WalletInfo, WalletSummary, bool)]) -> String {
    if wallets.is_empty() {
        return "You have no wallets yet. Use /addwallet to add one.".to_string();
    }

    let mut blocks = Vec::with_capacity(wallets.len());
    for (wallet, summary, notifies) in wallets {
        let balance = render_balance(summary.balance.as_ref(), summary.decimals, &summary.symbol);
        let fiat = summary
            .fiat_value
            .as_ref()
            .map(|fiat| format!(" ≈ ${}", format_fiat(fiat)))
            .unwrap_or_default();
        blocks.push(format!(
            "#{} {} ({})\n{}\nBalance: {}{}\nNotifications: {}",
            wallet.wallet_id,
            wallet.name,
            wallet.data.currency,
            wallet.data.address,
            balance,
            fiat,
            if *notifies { "on" } else { "off" }
        ));
    }
    blocks.join("\n\n")
}
