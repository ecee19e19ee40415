use anyhow::Result;

use hearthcal_core::models::EventWriteRequest;
use hearthcal_core::reconcile::Reconciler;

use crate::cli::StatusCommand;
use crate::App;

pub async fn change_status(app: &App<'_>, command: StatusCommand) -> Result<()> {
    let request = EventWriteRequest {
        id: Some(command.id.clone()),
        original_event_id: command.original_id,
        display_date: command.date,
        ..Default::default()
    };

    let reconciler = Reconciler::new(app.repo, app.directory, app.ledger, &app.config.actor);
    reconciler
        .change_event_status(&request, command.status, command.reason)
        .await?;
    println!("Marked {} as {}", command.id, command.status);

    Ok(())
}
