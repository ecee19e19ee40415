use anyhow::Result;

use hearthcal_core::models::{EventRef, EventWriteRequest};
use hearthcal_core::notify::NotificationScheduler;
use hearthcal_core::reconcile::Reconciler;

use crate::cli::DeleteCommand;
use crate::App;

pub async fn delete_event(app: &App<'_>, command: DeleteCommand) -> Result<()> {
    let request = EventWriteRequest {
        id: Some(command.id.clone()),
        original_event_id: command.original_id.clone(),
        family_id: Some(app.config.family_id.clone()),
        ..Default::default()
    };

    let reconciler = Reconciler::new(app.repo, app.directory, app.ledger, &app.config.actor);
    reconciler.delete_event(&request).await?;

    // The tombstone covers the whole series; its queued reminders go too.
    let template_id = EventRef::from_parts(
        Some(command.id.as_str()),
        command.original_id.as_deref(),
        None,
    )
    .map(|r| r.definition_id().to_string())
    .unwrap_or(command.id.clone());
    let scheduler =
        NotificationScheduler::new(app.repo, app.directory, app.transport, app.timezone);
    let cancelled = scheduler.cancel_for_event(&template_id).await?;

    println!("Deleted event {}", template_id);
    if cancelled > 0 {
        println!("Cancelled {} queued reminder(s).", cancelled);
    }
    Ok(())
}
