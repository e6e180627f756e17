use std::{sync::Arc, time::Duration};

use accountant_core::refresh::ServerDataManager;
use anyhow::Result;
use teloxide::Bot;
use tokio_cron_scheduler::Job;

use crate::notifications::handler::deliver_balance_changes;

/// Repeating balance refresh. A corrupted store ends the process, anything
/// else is logged and retried on the next tick.
pub fn job_refresh_balances(
    manager: Arc<ServerDataManager>,
    bot: Bot,
    interval: Duration,
) -> Result<Job> {
    let job = Job::new_repeated_async(interval, move |_uuid, _l| {
        let manager = manager.clone();
        let bot = bot.clone();
        Box::pin(async move {
            match manager.timer_tick().await {
                Ok(changes) => deliver_balance_changes(&bot, &manager, &changes).await,
                Err(e) if e.is_fatal() => {
                    log::error!("Wallet store is corrupted, stopping: {}", e);
                    std::process::exit(1);
                }
                Err(e) => log::error!("Balance update failed: {}", e),
            }
        })
    })?;
    Ok(job)
}
