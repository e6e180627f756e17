use std::{sync::Arc, time::Duration};

use accountant_core::refresh::ServerDataManager;
use anyhow::Result;
use teloxide::Bot;
use tokio_cron_scheduler::JobScheduler;

use crate::job::handler::job_refresh_balances;

pub async fn schedule_jobs(
    manager: Arc<ServerDataManager>,
    bot: Bot,
    interval: Duration,
) -> Result<()> {
    log::info!("Initializing job scheduler...");

    let scheduler = match JobScheduler::new().await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            log::error!("Failed to create job scheduler: {}", e);
            return Err(anyhow::anyhow!("Failed to create job scheduler: {}", e));
        }
    };

    let job_refresh_balances = job_refresh_balances(manager, bot, interval)?;

    if let Err(e) = scheduler.add(job_refresh_balances).await {
        log::error!("Failed to add balance refresh job to scheduler: {}", e);
        return Err(anyhow::anyhow!("Failed to add balance refresh job: {}", e));
    }

    if let Err(e) = scheduler.start().await {
        log::error!("Failed to start job scheduler: {}", e);
        return Err(anyhow::anyhow!("Failed to start scheduler: {}", e));
    }

    log::info!(
        "Job scheduler started, balances refresh every {} seconds",
        interval.as_secs()
    );
    Ok(())
}
