use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;

use hearthcal_core::models::{EventPatch, EventRef, EventWriteRequest, ReminderSettings};
use hearthcal_core::notify::NotificationScheduler;
use hearthcal_core::reconcile::Reconciler;
use hearthcal_core::repository::EventRepository;

use crate::cli::{AddCommand, EditCommand};
use crate::util::{parse_time, parse_weekdays};
use crate::App;

pub async fn add_event(app: &App<'_>, command: AddCommand) -> Result<()> {
    let recurrence_days = command
        .on
        .as_deref()
        .map(parse_weekdays)
        .transpose()?
        .unwrap_or_default();

    let request = EventWriteRequest {
        family_id: Some(app.config.family_id.clone()),
        date: command.date,
        recurrence_type: Some(command.every),
        start_date: command.start,
        end_date: command.until,
        recurrence_days: (!recurrence_days.is_empty()).then_some(recurrence_days),
        fields: EventPatch {
            name: Some(command.name.clone()),
            time: Some(parse_time(&command.time)?),
            end_time: command.end_time.as_deref().map(parse_time).transpose()?,
            location: command.location,
            notes: command.notes,
            assigned_to: command.assigned_to,
            points: command.points,
            reminders: (!command.remind.is_empty()).then(|| ReminderSettings {
                enabled: true,
                times: command.remind.clone(),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    };

    let reconciler = Reconciler::new(app.repo, app.directory, app.ledger, &app.config.actor);
    let outcome = reconciler.save_event(&request).await?;
    println!("Created event '{}' ({})", command.name, outcome.id);

    reschedule_reminders(app, &outcome.id).await?;
    Ok(())
}

pub async fn edit_event(app: &App<'_>, command: EditCommand) -> Result<()> {
    let request = EventWriteRequest {
        id: Some(command.id.clone()),
        original_event_id: command.original_id.clone(),
        is_recurring_occurrence: command.original_id.is_some(),
        save_as_exception: command.as_exception,
        display_date: command.date,
        fields: EventPatch {
            name: command.name,
            time: command.time.as_deref().map(parse_time).transpose()?,
            location: command.location,
            notes: command.notes,
            assigned_to: command.assigned_to,
            points: command.points,
            ..Default::default()
        },
        ..Default::default()
    };

    let reconciler = Reconciler::new(app.repo, app.directory, app.ledger, &app.config.actor);
    let outcome = reconciler.save_event(&request).await?;
    if command.as_exception {
        println!("Saved exception {}", outcome.id);
    } else {
        println!("Updated event {}", outcome.id);
    }
    if let Some(conflict) = outcome.conflict {
        println!("{} {}", "Warning:".yellow().bold(), conflict);
    }

    reschedule_reminders(app, &outcome.id).await?;
    Ok(())
}

/// Edits invalidate previously queued reminders; rebuild them from the
/// stored definition. Exception saves return a generated occurrence id
/// that no document carries, so resolve the template id first.
async fn reschedule_reminders(app: &App<'_>, id: &str) -> Result<()> {
    if let Some(def) = app.repo.find_event_by_id(reminder_target(id)).await? {
        let scheduler =
            NotificationScheduler::new(app.repo, app.directory, app.transport, app.timezone);
        let scheduled = scheduler.reschedule_for_event(&def, Utc::now()).await?;
        if scheduled > 0 {
            println!("Scheduled {} reminder(s).", scheduled);
        }
    }
    Ok(())
}

fn reminder_target(id: &str) -> &str {
    EventRef::split_generated_id(id)
        .map(|(definition_id, _)| definition_id)
        .unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_target_resolves_generated_occurrence_ids() {
        assert_eq!(reminder_target("abc-2025-01-13"), "abc");
        assert_eq!(reminder_target("abc"), "abc");
        assert_eq!(reminder_target("annual-a1-2025"), "annual-a1-2025");
    }
}
