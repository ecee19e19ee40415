//! Per-date override handling on an [`EventDefinition`]'s exception
//! list. All writes to the list go through [`upsert_exception`], which
//! enforces the one-entry-per-date invariant by find-or-replace.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{EventDefinition, EventException, EventPatch};

/// Exact-date lookup. Dates are `NaiveDate` end to end, so there is no
/// time-of-day normalization to get wrong; string form only exists at
/// the serde boundary.
pub fn find_exception(def: &EventDefinition, date: NaiveDate) -> Option<&EventException> {
    def.exceptions.iter().find(|ex| ex.date == date)
}

pub fn find_exception_mut(
    def: &mut EventDefinition,
    date: NaiveDate,
) -> Option<&mut EventException> {
    def.exceptions.iter_mut().find(|ex| ex.date == date)
}

/// Replaces the entry for `date` in place, layering `patch` over the
/// existing overrides (fields the patch leaves unset are retained,
/// e.g. an earlier `points` override survives a later status-only
/// patch), or appends a new entry. Never produces two entries for the
/// same date.
pub fn upsert_exception<'a>(
    def: &'a mut EventDefinition,
    date: NaiveDate,
    patch: &EventPatch,
    now: DateTime<Utc>,
    actor: Option<&str>,
) -> &'a mut EventException {
    let idx = match def.exceptions.iter().position(|ex| ex.date == date) {
        Some(idx) => {
            let existing = &mut def.exceptions[idx];
            existing.overrides.merge_from(patch);
            existing.last_modified = now;
            existing.last_modified_by = actor.map(str::to_string);
            idx
        }
        None => {
            def.exceptions.push(EventException {
                date,
                overrides: patch.clone(),
                completed_at: None,
                completed_by: None,
                completed_by_user_id: None,
                last_modified: now,
                last_modified_by: actor.map(str::to_string),
            });
            def.exceptions.len() - 1
        }
    };
    &mut def.exceptions[idx]
}

/// Removes the override for `date`, reverting that occurrence fully to
/// template values. The reconciler never calls this implicitly; it is
/// a deliberate caller-facing primitive.
pub fn remove_exception(def: &mut EventDefinition, date: NaiveDate) -> bool {
    let before = def.exceptions.len();
    def.exceptions.retain(|ex| ex.date != date);
    def.exceptions.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventStatus;

    fn def_with_exceptions() -> EventDefinition {
        EventDefinition::new("e1", "fam1", "Swimming")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn upsert_then_find_round_trips() {
        let mut def = def_with_exceptions();
        let d = date(2025, 1, 13);
        let patch = EventPatch {
            status: Some(EventStatus::Cancelled),
            cancellation_reason: Some("sick".to_string()),
            ..Default::default()
        };
        upsert_exception(&mut def, d, &patch, Utc::now(), Some("parent-1"));

        let found = find_exception(&def, d).unwrap();
        assert_eq!(found.overrides.status, Some(EventStatus::Cancelled));
        assert_eq!(found.overrides.cancellation_reason.as_deref(), Some("sick"));
        assert_eq!(found.last_modified_by.as_deref(), Some("parent-1"));
        assert!(find_exception(&def, date(2025, 1, 14)).is_none());
    }

    #[test]
    fn upsert_same_date_replaces_not_duplicates() {
        let mut def = def_with_exceptions();
        let d = date(2025, 1, 13);
        let first = EventPatch {
            points: Some(10),
            status: Some(EventStatus::Cancelled),
            ..Default::default()
        };
        upsert_exception(&mut def, d, &first, Utc::now(), None);

        let second = EventPatch {
            status: Some(EventStatus::Active),
            ..Default::default()
        };
        upsert_exception(&mut def, d, &second, Utc::now(), None);

        assert_eq!(def.exceptions.len(), 1);
        let ex = find_exception(&def, d).unwrap();
        // Unset fields in the later patch keep their earlier value.
        assert_eq!(ex.overrides.points, Some(10));
        assert_eq!(ex.overrides.status, Some(EventStatus::Active));
    }

    #[test]
    fn upsert_other_dates_unaffected() {
        let mut def = def_with_exceptions();
        let d1 = date(2025, 1, 13);
        let d2 = date(2025, 1, 20);
        upsert_exception(
            &mut def,
            d1,
            &EventPatch {
                status: Some(EventStatus::Cancelled),
                ..Default::default()
            },
            Utc::now(),
            None,
        );
        upsert_exception(
            &mut def,
            d2,
            &EventPatch {
                notes: Some("bring goggles".to_string()),
                ..Default::default()
            },
            Utc::now(),
            None,
        );

        assert_eq!(def.exceptions.len(), 2);
        assert_eq!(
            find_exception(&def, d1).unwrap().overrides.status,
            Some(EventStatus::Cancelled)
        );
        assert!(find_exception(&def, d2).unwrap().overrides.status.is_none());
    }

    #[test]
    fn remove_exception_reverts_to_template() {
        let mut def = def_with_exceptions();
        let d = date(2025, 1, 13);
        upsert_exception(
            &mut def,
            d,
            &EventPatch {
                status: Some(EventStatus::Cancelled),
                ..Default::default()
            },
            Utc::now(),
            None,
        );
        assert!(remove_exception(&mut def, d));
        assert!(find_exception(&def, d).is_none());
        assert!(!remove_exception(&mut def, d));
    }
}
