//! Folding wallet balances into per-currency groups and fiat totals.

use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::{
    currencies::{AddressData, BalanceGroupKey, TokenData},
    helpers::amount::{atomic_to_decimal, format_amount, to_decimal_string},
};

/// Read access to the results of a refresh cycle.
pub trait BalanceView {
    fn balance(&self, address: &AddressData) -> Option<BigInt>;
    fn rate_to_usd(&self, price_id: &str) -> Option<BigDecimal>;
    fn token_data(&self, contract_address: &str) -> Option<TokenData>;

    /// Decimal places of the address' currency, looked up in the token
    /// metadata for token wallets.
    fn decimals_of(&self, address: &AddressData) -> Option<u32> {
        match address.currency.decimals() {
            Some(decimals) => Some(decimals),
            None => self
                .token_data(&address.contract_address)
                .map(|data| data.decimals),
        }
    }

    fn symbol_of(&self, address: &AddressData) -> String {
        if address.currency.is_token() {
            self.token_data(&address.contract_address)
                .map(|data| data.symbol)
                .unwrap_or_else(|| address.contract_address.clone())
        } else {
            address.currency.symbol().to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub key: BalanceGroupKey,
    pub wallets: usize,
    /// Wallets of the group with a known balance.
    pub present: usize,
    /// Sum over present members, `None` when every member is absent.
    pub balance: Option<BigInt>,
    pub decimals: Option<u32>,
    pub symbol: String,
    pub rate: Option<BigDecimal>,
}

impl GroupSummary {
    /// Balance with exactly `decimals` fractional digits.
    pub fn decimal_balance(&self) -> Option<String> {
        Some(to_decimal_string(self.balance.as_ref()?, self.decimals?))
    }

    pub fn display_balance(&self) -> Option<String> {
        Some(format_amount(self.balance.as_ref()?, self.decimals?))
    }

    pub fn fiat_value(&self) -> Option<BigDecimal> {
        let whole = atomic_to_decimal(self.balance.as_ref()?, self.decimals?);
        Some(whole * self.rate.as_ref()?)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateSummary {
    /// Sorted by group key.
    pub groups: Vec<GroupSummary>,
    /// Sum of the fiat values that could be computed. `None` when no group
    /// has both a balance and a rate.
    pub fiat_total: Option<BigDecimal>,
}

pub fn aggregate(wallets: &[AddressData], view: &impl BalanceView) -> AggregateSummary {
    let mut grouped: BTreeMap<BalanceGroupKey, Vec<&AddressData>> = BTreeMap::new();
    for wallet in wallets {
        grouped.entry(wallet.group_key()).or_default().push(wallet);
    }

    let mut groups = Vec::with_capacity(grouped.len());
    let mut fiat_total: Option<BigDecimal> = None;

    for (key, members) in grouped {
        let mut balance: Option<BigInt> = None;
        let mut present = 0;
        for member in &members {
            if let Some(value) = view.balance(member) {
                present += 1;
                balance = Some(match balance {
                    Some(sum) => sum + value,
                    None => value,
                });
            }
        }

        let first = members[0];
        let summary = GroupSummary {
            rate: if key.price_id.is_empty() {
                None
            } else {
                view.rate_to_usd(&key.price_id)
            },
            decimals: view.decimals_of(first),
            symbol: view.symbol_of(first),
            wallets: members.len(),
            present,
            balance,
            key,
        };

        if let Some(value) = summary.fiat_value() {
            fiat_total = Some(match fiat_total {
                Some(total) => total + value,
                None => value,
            });
        }
        groups.push(summary);
    }

    AggregateSummary { groups, fiat_total }
}

/// Presentation values of a single wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletSummary {
    pub balance: Option<BigInt>,
    pub decimals: Option<u32>,
    pub display_balance: Option<String>,
    pub symbol: String,
    pub fiat_value: Option<BigDecimal>,
}

pub fn wallet_balance(address: &AddressData, view: &impl BalanceView) -> WalletSummary {
    let group = aggregate(std::slice::from_ref(address), view)
        .groups
        .into_iter()
        .next();

    match group {
        Some(group) => WalletSummary {
            display_balance: group.display_balance(),
            decimals: group.decimals,
            fiat_value: group.fiat_value(),
            balance: group.balance,
            symbol: group.symbol,
        },
        None => WalletSummary {
            balance: None,
            decimals: view.decimals_of(address),
            display_balance: None,
            symbol: view.symbol_of(address),
            fiat_value: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currencies::Currency;
    use std::{collections::HashMap, str::FromStr};

    #[derive(Default)]
    struct FakeView {
        balances: HashMap<String, BigInt>,
        rates: HashMap<String, BigDecimal>,
        tokens: HashMap<String, TokenData>,
    }

    impl FakeView {
        fn with_balance(mut self, address: &str, value: i64) -> Self {
            self.balances.insert(address.to_string(), BigInt::from(value));
            self
        }

        fn with_rate(mut self, price_id: &str, rate: &str) -> Self {
            self.rates
                .insert(price_id.to_string(), BigDecimal::from_str(rate).unwrap());
            self
        }
    }

    impl BalanceView for FakeView {
        fn balance(&self, address: &AddressData) -> Option<BigInt> {
            self.balances.get(&address.address).cloned()
        }

        fn rate_to_usd(&self, price_id: &str) -> Option<BigDecimal> {
            self.rates.get(price_id).cloned()
        }

        fn token_data(&self, contract_address: &str) -> Option<TokenData> {
            self.tokens.get(contract_address).cloned()
        }
    }

    fn btc(address: &str) -> AddressData {
        AddressData::new(Currency::Bitcoin, address)
    }

    #[test]
    fn test_same_key_wallets_are_summed() {
        let view = FakeView::default()
            .with_balance("a", 100)
            .with_balance("b", 250);
        let summary = aggregate(&[btc("a"), btc("b")], &view);

        assert_eq!(summary.groups.len(), 1);
        assert_eq!(summary.groups[0].balance, Some(BigInt::from(350)));
        assert_eq!(summary.groups[0].wallets, 2);
        assert_eq!(summary.groups[0].present, 2);
    }

    #[test]
    fn test_permuting_wallets_keeps_sums() {
        let view = FakeView::default()
            .with_balance("a", 1)
            .with_balance("b", 20)
            .with_balance("x", 300)
            .with_balance("y", 4000)
            .with_rate("bitcoin", "2")
            .with_rate("ripple", "0.5");
        let wallets = vec![
            btc("a"),
            AddressData::new(Currency::RippleXrp, "x"),
            btc("b"),
            AddressData::new(Currency::RippleXrp, "y"),
        ];
        let mut reversed = wallets.clone();
        reversed.reverse();
        let mut rotated = wallets.clone();
        rotated.rotate_left(1);

        let expected = aggregate(&wallets, &view);
        assert_eq!(aggregate(&reversed, &view), expected);
        assert_eq!(aggregate(&rotated, &view), expected);
    }

    #[test]
    fn test_absent_members_do_not_hide_present_ones() {
        let view = FakeView::default().with_balance("a", 70);
        let summary = aggregate(&[btc("a"), btc("gone")], &view);
        assert_eq!(summary.groups[0].balance, Some(BigInt::from(70)));
        assert_eq!(summary.groups[0].present, 1);

        let summary = aggregate(&[btc("gone"), btc("also-gone")], &view);
        assert_eq!(summary.groups[0].balance, None);
        assert_eq!(summary.groups[0].display_balance(), None);
        assert_eq!(summary.groups[0].fiat_value(), None);
        assert_eq!(summary.fiat_total, None);
    }

    #[test]
    fn test_groups_are_sorted_and_split_by_price_id() {
        let view = FakeView::default()
            .with_balance("e", 1)
            .with_balance("b", 1)
            .with_balance("c", 1);
        let wallets = vec![
            AddressData::new(Currency::Ether, "e"),
            btc("b").with_price_id("wrapped-bitcoin"),
            btc("c"),
        ];
        let keys: Vec<(Currency, String)> = aggregate(&wallets, &view)
            .groups
            .into_iter()
            .map(|g| (g.key.currency, g.key.price_id))
            .collect();

        assert_eq!(
            keys,
            vec![
                (Currency::Bitcoin, "bitcoin".to_string()),
                (Currency::Bitcoin, "wrapped-bitcoin".to_string()),
                (Currency::Ether, "ethereum".to_string()),
            ]
        );
    }

    #[test]
    fn test_fiat_total_skips_unpriced_groups() {
        let view = FakeView::default()
            .with_balance("a", 150_000_000)
            .with_balance("x", 2_000_000)
            .with_rate("bitcoin", "10000.50");
        let summary = aggregate(&[btc("a"), AddressData::new(Currency::RippleXrp, "x")], &view);

        assert_eq!(
            summary.fiat_total,
            Some(BigDecimal::from_str("15000.75").unwrap())
        );
        let ripple = &summary.groups[1];
        assert_eq!(ripple.display_balance().as_deref(), Some("2"));
        assert_eq!(ripple.fiat_value(), None);
    }

    #[test]
    fn test_token_group_uses_token_metadata() {
        let contract = "0xd26114cd6EE289AccF82350c8d8487fedB8A0C07";
        let mut view = FakeView::default();
        view.balances.insert(
            "holder".to_string(),
            BigInt::from(1_500_000_000_000_000_000u64),
        );
        view.tokens.insert(
            contract.to_string(),
            TokenData {
                name: "OMGToken".to_string(),
                symbol: "OMG".to_string(),
                decimals: 18,
            },
        );

        let wallet = wallet_balance(&AddressData::token(contract, "holder"), &view);
        assert_eq!(wallet.symbol, "OMG");
        assert_eq!(wallet.display_balance.as_deref(), Some("1.5"));
        assert_eq!(wallet.fiat_value, None);

        let summary = aggregate(&[AddressData::token(contract, "holder")], &view);
        assert_eq!(
            summary.groups[0].decimal_balance().as_deref(),
            Some("1.500000000000000000")
        );
    }

    #[test]
    fn test_token_without_metadata_has_no_display_value() {
        let view = FakeView::default().with_balance("holder", 5);
        let wallet = wallet_balance(&AddressData::token("0xabc", "holder"), &view);
        assert_eq!(wallet.balance, Some(BigInt::from(5)));
        assert_eq!(wallet.display_balance, None);
        assert_eq!(wallet.symbol, "0xabc");
    }
}
