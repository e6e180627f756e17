pub mod currency;
pub mod dto;

pub use currency::Currency;
pub use dto::{
    AddressData, AddressKey, BalanceChange, BalanceGroupKey, BalanceNotify, TokenData,
    WalletAddress, WalletInfo,
};
