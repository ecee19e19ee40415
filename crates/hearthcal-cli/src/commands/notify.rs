use anyhow::{anyhow, Result};
use chrono::Utc;

use hearthcal_core::notify::NotificationScheduler;
use hearthcal_core::repository::EventRepository;

use crate::cli::{NotifyScheduleCommand, NotifySweepCommand};
use crate::App;

pub async fn schedule(app: &App<'_>, command: NotifyScheduleCommand) -> Result<()> {
    let def = app
        .repo
        .find_event_by_id(&command.id)
        .await?
        .ok_or_else(|| anyhow!("Event with id '{}' not found", command.id))?;

    let scheduler =
        NotificationScheduler::new(app.repo, app.directory, app.transport, app.timezone);
    let scheduled = scheduler.reschedule_for_event(&def, Utc::now()).await?;
    println!("Scheduled {} reminder(s) for '{}'.", scheduled, def.name);
    Ok(())
}

pub async fn sweep(app: &App<'_>, command: NotifySweepCommand) -> Result<()> {
    let limit = command.limit.unwrap_or(app.config.sweep_batch_size);
    let scheduler =
        NotificationScheduler::new(app.repo, app.directory, app.transport, app.timezone);
    let summary = scheduler.run_delivery_sweep(Utc::now(), limit).await?;
    println!(
        "Processed {}: {} sent, {} deferred, {} failed.",
        summary.processed, summary.sent, summary.deferred, summary.failed
    );
    Ok(())
}
