use anyhow::Result;
use uuid::Uuid;

use hearthcal_core::annual::AnnualScheduler;
use hearthcal_core::models::AnnualEvent;
use hearthcal_core::repository::{AnnualEventRepository, EventRepository};
use hearthcal_core::timezone::local_today;

use crate::cli::{AnnualAddCommand, AnnualDeleteCommand};
use crate::views::table::display_annual_events;
use crate::App;

pub async fn add_annual_event(app: &App<'_>, command: AnnualAddCommand) -> Result<()> {
    let annual = AnnualEvent {
        id: Uuid::now_v7().to_string(),
        family_id: app.config.family_id.clone(),
        name: command.name,
        kind: command.kind,
        date: command.date,
        notify_prior: command.notify_prior,
        color: command.color,
        icon: None,
        notes: command.notes,
    };
    app.repo.put_annual_event(&annual).await?;

    let scheduler = AnnualScheduler::new(app.repo, app.directory, app.entitlements);
    let written = scheduler
        .generate_for_definition(&annual, app.config.premium, local_today(app.timezone))
        .await?;
    println!(
        "Added annual event '{}' ({}); generated {} calendar event(s).",
        annual.name, annual.id, written
    );
    Ok(())
}

pub async fn list_annual_events(app: &App<'_>) -> Result<()> {
    let events = app
        .repo
        .find_annual_events_for_family(&app.config.family_id)
        .await?;
    display_annual_events(&events);
    Ok(())
}

pub async fn delete_annual_event(app: &App<'_>, command: AnnualDeleteCommand) -> Result<()> {
    // Generated definitions first, then the template itself.
    let generated: Vec<String> = app
        .repo
        .find_events_by_annual_id(&command.id)
        .await?
        .into_iter()
        .map(|e| e.id)
        .collect();
    app.repo.delete_events(&generated).await?;
    app.repo.delete_annual_event(&command.id).await?;

    println!(
        "Deleted annual event {} and {} generated event(s).",
        command.id,
        generated.len()
    );
    Ok(())
}

pub async fn sync_annual_events(app: &App<'_>) -> Result<()> {
    let scheduler = AnnualScheduler::new(app.repo, app.directory, app.entitlements);
    let written = scheduler
        .sync_family(&app.config.family_id, local_today(app.timezone))
        .await?;
    println!("Annual sync complete; {} event(s) generated.", written);
    Ok(())
}

pub async fn cleanup_expired_reminders(app: &App<'_>) -> Result<()> {
    let scheduler = AnnualScheduler::new(app.repo, app.directory, app.entitlements);
    let removed = scheduler
        .cleanup_expired_reminders(local_today(app.timezone))
        .await?;
    println!("Removed {} expired reminder(s).", removed);
    Ok(())
}
