pub mod aggregator;
pub mod cache;
pub mod currencies;
pub mod error;
pub mod helpers;
pub mod notify;
pub mod processors;
pub mod rates;
pub mod refresh;
pub mod storage;
