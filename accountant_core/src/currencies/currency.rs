use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Networks the accountant can watch.
#[derive(
    Debug,
    Clone,
    Copy,
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
pub enum Currency {
    Bitcoin,
    BitcoinCash,
    BitcoinGold,
    Ether,
    RippleXrp,
    Erc20Token,
}

impl Currency {
    pub const ALL: [Currency; 6] = [
        Currency::Bitcoin,
        Currency::BitcoinCash,
        Currency::BitcoinGold,
        Currency::Ether,
        Currency::RippleXrp,
        Currency::Erc20Token,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Bitcoin => "BTC",
            Currency::BitcoinCash => "BCH",
            Currency::BitcoinGold => "BTG",
            Currency::Ether => "ETH",
            Currency::RippleXrp => "XRP",
            Currency::Erc20Token => "ERC20",
        }
    }

    /// Number of decimal places between the atomic unit and one whole coin.
    /// Tokens carry their own precision, so `Erc20Token` has none here.
    pub fn decimals(self) -> Option<u32> {
        match self {
            Currency::Bitcoin | Currency::BitcoinCash | Currency::BitcoinGold => Some(8),
            Currency::Ether => Some(18),
            Currency::RippleXrp => Some(6),
            Currency::Erc20Token => None,
        }
    }

    /// Rate id used for wallets created without an explicit one.
    pub fn default_price_id(self) -> &'static str {
        match self {
            Currency::Bitcoin => "bitcoin",
            Currency::BitcoinCash => "bitcoin-cash",
            Currency::BitcoinGold => "bitcoin-gold",
            Currency::Ether => "ethereum",
            Currency::RippleXrp => "ripple",
            Currency::Erc20Token => "",
        }
    }

    pub fn is_token(self) -> bool {
        matches!(self, Currency::Erc20Token)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Currency::Bitcoin => "Bitcoin",
            Currency::BitcoinCash => "Bitcoin Cash",
            Currency::BitcoinGold => "Bitcoin Gold",
            Currency::Ether => "Ether",
            Currency::RippleXrp => "Ripple",
            Currency::Erc20Token => "ERC20 token",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "btc" | "bitcoin" => Ok(Currency::Bitcoin),
            "bch" | "bitcoincash" | "bitcoin-cash" => Ok(Currency::BitcoinCash),
            "btg" | "bitcoingold" | "bitcoin-gold" => Ok(Currency::BitcoinGold),
            "eth" | "ether" | "ethereum" => Ok(Currency::Ether),
            "xrp" | "ripple" => Ok(Currency::RippleXrp),
            "erc20" | "token" => Ok(Currency::Erc20Token),
            other => Err(format!("Unknown currency: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency_aliases() {
        assert_eq!("BTC".parse::<Currency>().unwrap(), Currency::Bitcoin);
        assert_eq!("ethereum".parse::<Currency>().unwrap(), Currency::Ether);
        assert_eq!(" xrp ".parse::<Currency>().unwrap(), Currency::RippleXrp);
        assert_eq!("erc20".parse::<Currency>().unwrap(), Currency::Erc20Token);
        assert!("doge".parse::<Currency>().is_err());
    }

    #[test]
    fn test_token_has_no_fixed_decimals() {
        assert_eq!(Currency::Erc20Token.decimals(), None);
        assert_eq!(Currency::Erc20Token.default_price_id(), "");
        assert_eq!(Currency::RippleXrp.decimals(), Some(6));
        assert_eq!(Currency::BitcoinGold.decimals(), Some(8));
    }
}
