mod bot;
mod config;
mod dependencies;
mod job;
mod notifications;

use std::sync::Arc;

use accountant_core::{
    cache::BalanceCache, processors::Processors, rates::CoinGeckoRates,
    refresh::ServerDataManager, storage::sled_store::SledWalletStore,
};
use teloxide::prelude::*;

use crate::{
    bot::handler_tree::handler_tree, config::BotConfig, dependencies::BotDependencies,
    job::job_scheduler::schedule_jobs, notifications::handler::deliver_balance_changes,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    log::info!("Starting accountant_bot...");

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let db = match sled::open(&config.db_path) {
        Ok(db) => db,
        Err(e) => {
            log::error!("Failed to open database at {}: {}", config.db_path, e);
            std::process::exit(1);
        }
    };
    let store = match SledWalletStore::new(&db) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open wallet trees: {}", e);
            std::process::exit(1);
        }
    };

    let client = match reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let processors = Processors::from_endpoints(client.clone(), &config.endpoints);
    let rates = CoinGeckoRates::new(client, &config.coingecko_url);
    let manager = Arc::new(ServerDataManager::new(
        Arc::new(store),
        processors,
        Arc::new(rates),
        Arc::new(BalanceCache::new()),
    ));

    let bot = Bot::from_env();

    match manager.initial_update().await {
        Ok(changes) => deliver_balance_changes(&bot, &manager, &changes).await,
        Err(e) => {
            log::error!("Initial balance update failed: {}", e);
            std::process::exit(1);
        }
    }

    if let Err(e) = schedule_jobs(manager.clone(), bot.clone(), config.update_interval).await {
        log::error!("Failed to schedule jobs: {}", e);
        std::process::exit(1);
    }

    Dispatcher::builder(bot, handler_tree())
        .dependencies(dptree::deps![BotDependencies::new(manager)])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
