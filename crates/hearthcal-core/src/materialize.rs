//! Expansion of event definitions + exceptions into displayable
//! occurrences for a date range. Read-only and deterministic: the same
//! definitions and range always produce the same output, so callers
//! may memoize freely.

use chrono::NaiveDate;

use crate::exceptions::find_exception;
use crate::models::{EventDefinition, EventRef, EventStatus, Occurrence};
use crate::recurrence::occurrences_between;

/// Resolves the effective view of one occurrence: template fields with
/// the per-date exception (if any) layered over them. Fields the
/// exception leaves unset fall back to the template.
pub fn resolve_occurrence(def: &EventDefinition, date: NaiveDate) -> Occurrence {
    let exception = find_exception(def, date);
    let recurring = def.is_recurring();
    let id = if recurring {
        EventRef::occurrence_id(&def.id, date)
    } else {
        def.id.clone()
    };

    let mut occ = Occurrence {
        id,
        definition_id: def.id.clone(),
        display_date: date,
        name: def.name.clone(),
        time: def.time,
        end_time: def.end_time,
        location: def.location.clone(),
        notes: def.notes.clone(),
        icon: def.icon.clone(),
        color: def.color.clone(),
        assigned_to: def.assigned_to.clone(),
        visibility: def.visibility,
        points: def.points,
        status: def.status,
        cancellation_reason: def.cancellation_reason.clone(),
        reminders: def.reminders.clone(),
        notification_recipients: def.notification_recipients.clone(),
        has_exception: exception.is_some(),
        is_recurring: recurring,
    };

    if let Some(ex) = exception {
        let p = &ex.overrides;
        if let Some(v) = &p.name {
            occ.name = v.clone();
        }
        if let Some(v) = &p.location {
            occ.location = Some(v.clone());
        }
        if let Some(v) = &p.notes {
            occ.notes = Some(v.clone());
        }
        if let Some(v) = &p.icon {
            occ.icon = Some(v.clone());
        }
        if let Some(v) = &p.color {
            occ.color = Some(v.clone());
        }
        if let Some(v) = &p.assigned_to {
            occ.assigned_to = Some(v.clone());
        }
        if let Some(v) = p.visibility {
            occ.visibility = v;
        }
        if let Some(v) = p.points {
            occ.points = v;
        }
        if let Some(v) = p.time {
            occ.time = v;
        }
        if let Some(v) = p.end_time {
            occ.end_time = Some(v);
        }
        if let Some(v) = p.status {
            occ.status = v;
            // A status override replaces the cancellation reason
            // wholesale; a stale template reason must not leak through.
            occ.cancellation_reason = p.cancellation_reason.clone();
        } else if let Some(v) = &p.cancellation_reason {
            occ.cancellation_reason = Some(v.clone());
        }
        if let Some(v) = &p.reminders {
            occ.reminders = Some(v.clone());
        }
        if let Some(v) = &p.notification_recipients {
            occ.notification_recipients = v.clone();
        }
    }

    occ
}

/// Expands every non-deleted definition over `[from, to]`, merges
/// per-date exceptions, and drops occurrences whose resolved status is
/// `deleted`. Output is ordered by (date, time, id).
pub fn materialize_occurrences(
    definitions: &[EventDefinition],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<Occurrence> {
    let mut out = Vec::new();
    for def in definitions {
        if def.status == EventStatus::Deleted {
            continue;
        }
        for date in occurrences_between(def, from, to) {
            let occ = resolve_occurrence(def, date);
            if occ.status == EventStatus::Deleted {
                continue;
            }
            out.push(occ);
        }
    }
    out.sort_by(|a, b| {
        (a.display_date, a.time, a.id.as_str()).cmp(&(b.display_date, b.time, b.id.as_str()))
    });
    out
}
