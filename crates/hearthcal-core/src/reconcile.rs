//! Write reconciliation: every mutation of an [`EventDefinition`] or
//! its exception list goes through the [`Reconciler`], which decides
//! whether a client payload targets the template, creates a per-date
//! exception, or inserts a new document. Conflicts are detected
//! advisory-style from `lastModified` and resolved last-writer-wins;
//! the losing writer gets a warning, never a rejection.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::error::CoreError;
use crate::exceptions::upsert_exception;
use crate::external::{MemberDirectory, PointsLedger, SessionStore};
use crate::materialize::resolve_occurrence;
use crate::models::{
    ConflictWarning, EventDefinition, EventPatch, EventRef, EventStatus, EventWriteRequest,
    RecurrenceType, SaveOutcome,
};
use crate::repository::Repository;

/// Session key under which a client records the occurrence date it is
/// currently editing.
pub const EDITING_DATE_KEY: &str = "editingEventDate";

pub struct Reconciler<'a> {
    repo: &'a dyn Repository,
    directory: &'a dyn MemberDirectory,
    ledger: &'a dyn PointsLedger,
    /// Actor recorded in `lastModifiedBy` / completion bookkeeping.
    actor: String,
    /// Client session state; consulted only as the last fallback for
    /// an exception write that names no occurrence date of its own.
    session: Option<&'a dyn SessionStore>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        repo: &'a dyn Repository,
        directory: &'a dyn MemberDirectory,
        ledger: &'a dyn PointsLedger,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            directory,
            ledger,
            actor: actor.into(),
            session: None,
        }
    }

    pub fn with_session(mut self, session: &'a dyn SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    /// Accepts a client-submitted payload and performs exactly one
    /// document write. Decision order:
    ///
    /// 1. recurring occurrence + `saveAsException` → upsert an
    ///    exception on the template; template fields untouched. The
    ///    exception date comes from the payload (`date`, then
    ///    `displayDate`), falling back to the session's editing date.
    /// 2. recurring occurrence without `saveAsException` → update the
    ///    template (propagates to every occurrence).
    /// 3. generated occurrence id + original id → update the template
    ///    (a generated id is never a real document id).
    /// 4. plain id → overwrite existing (with advisory conflict
    ///    warning when the store is newer than the client knew) or
    ///    create at that id (idempotent client retries).
    /// 5. no id → insert a new definition.
    pub async fn save_event(&self, req: &EventWriteRequest) -> Result<SaveOutcome, CoreError> {
        let now = Utc::now();

        if req.is_recurring_occurrence {
            if let Some(original) = req.original_event_id.as_deref() {
                if req.save_as_exception {
                    let date = req
                        .date
                        .or(req.display_date)
                        .or_else(|| self.editing_date())
                        .ok_or_else(|| {
                            CoreError::MissingDate(format!(
                                "no occurrence date in payload for event {}",
                                original
                            ))
                        })?;
                    let mut template = self.require_event(original).await?;
                    upsert_exception(&mut template, date, &req.fields, now, Some(&self.actor));
                    self.repo.put_event(&template).await?;
                    return Ok(SaveOutcome {
                        id: EventRef::occurrence_id(original, date),
                        conflict: None,
                    });
                }
                return self.update_template(original, req, now).await;
            }
        }

        if let (Some(id), Some(original)) = (req.id.as_deref(), req.original_event_id.as_deref()) {
            if EventRef::split_generated_id(id).is_some() {
                return self.update_template(original, req, now).await;
            }
        }

        if let Some(id) = req.id.as_deref() {
            if let Some(mut existing) = self.repo.find_event_by_id(id).await? {
                let conflict = match req.last_modified {
                    Some(known) if existing.last_modified > known => Some(ConflictWarning {
                        event_id: id.to_string(),
                        server_modified: existing.last_modified,
                        client_modified: known,
                    }),
                    _ => None,
                };
                if conflict.is_some() {
                    warn!(event_id = %id, "overwriting a newer revision (last-writer-wins)");
                }
                apply_request(&mut existing, req);
                existing.last_modified = now;
                existing.last_modified_by = Some(self.actor.clone());
                self.repo.put_event(&existing).await?;
                return Ok(SaveOutcome {
                    id: id.to_string(),
                    conflict,
                });
            }
            let def = build_definition(id, req, now, &self.actor)?;
            self.repo.put_event(&def).await?;
            return Ok(SaveOutcome {
                id: id.to_string(),
                conflict: None,
            });
        }

        let id = Uuid::now_v7().to_string();
        let def = build_definition(&id, req, now, &self.actor)?;
        self.repo.put_event(&def).await?;
        Ok(SaveOutcome { id, conflict: None })
    }

    /// Soft delete. Deleting any occurrence of a recurring series
    /// tombstones the whole template, so every other occurrence
    /// disappears from materialization too. A missing template is
    /// created directly as a tombstone (merge semantics).
    pub async fn delete_event(&self, req: &EventWriteRequest) -> Result<(), CoreError> {
        let target = resolve_target(req)
            .ok_or_else(|| CoreError::Validation("delete requires an event id".to_string()))?;
        let template_id = target.definition_id().to_string();
        let now = Utc::now();

        match self.repo.find_event_by_id(&template_id).await? {
            Some(mut def) => {
                def.status = EventStatus::Deleted;
                def.last_modified = now;
                def.last_modified_by = Some(self.actor.clone());
                self.repo.put_event(&def).await?;
            }
            None => {
                let mut tombstone = EventDefinition::new(
                    template_id,
                    req.family_id.clone().unwrap_or_default(),
                    req.fields.name.clone().unwrap_or_default(),
                );
                tombstone.status = EventStatus::Deleted;
                tombstone.last_modified = now;
                tombstone.last_modified_by = Some(self.actor.clone());
                self.repo.put_event(&tombstone).await?;
            }
        }
        Ok(())
    }

    /// Status transitions. Resolved as an occurrence, the new status
    /// is written to that date's exception only; resolved as the
    /// template, the document itself is updated. Completion
    /// transitions drive the gamification ledger for child members;
    /// ledger failures are logged and never fail the status change.
    pub async fn change_event_status(
        &self,
        req: &EventWriteRequest,
        new_status: EventStatus,
        reason: Option<String>,
    ) -> Result<(), CoreError> {
        let now = Utc::now();
        let target = resolve_target(req)
            .ok_or_else(|| CoreError::Validation("status change requires an event id".to_string()))?;
        let mut template = self.require_event(target.definition_id()).await?;

        let (previous_status, occurrence_date) = match &target {
            EventRef::Occurrence { date, .. } => {
                (resolve_occurrence(&template, *date).status, Some(*date))
            }
            EventRef::Definition(_) => (template.status, template.date),
        };

        match &target {
            EventRef::Occurrence { date, .. } => {
                let patch = EventPatch {
                    status: Some(new_status),
                    cancellation_reason: if new_status == EventStatus::Cancelled {
                        reason.clone()
                    } else {
                        None
                    },
                    ..Default::default()
                };
                let ex = upsert_exception(&mut template, *date, &patch, now, Some(&self.actor));
                if new_status != EventStatus::Cancelled {
                    // Un-cancelling clears the reason outright; merge
                    // semantics would otherwise retain the stale one.
                    ex.overrides.cancellation_reason = None;
                }
                if new_status == EventStatus::Completed {
                    ex.completed_at = Some(now);
                    ex.completed_by = Some(self.actor.clone());
                    ex.completed_by_user_id = Some(self.actor.clone());
                } else {
                    ex.completed_at = None;
                    ex.completed_by = None;
                    ex.completed_by_user_id = None;
                }
            }
            EventRef::Definition(_) => {
                template.status = new_status;
                template.cancellation_reason = if new_status == EventStatus::Cancelled {
                    reason.clone()
                } else {
                    None
                };
                template.last_modified = now;
                template.last_modified_by = Some(self.actor.clone());
            }
        }

        self.repo.put_event(&template).await?;

        let occ_date = occurrence_date.unwrap_or_else(|| now.date_naive());
        let occurrence = resolve_occurrence(&template, occ_date);
        if let Some(member_id) = occurrence.assigned_to.clone() {
            if previous_status != EventStatus::Completed && new_status == EventStatus::Completed {
                self.award_points(&template.family_id, &member_id, &occurrence)
                    .await;
            } else if previous_status == EventStatus::Completed
                && new_status == EventStatus::Active
            {
                self.reverse_points(&template.family_id, &member_id, &occurrence)
                    .await;
            }
        }

        Ok(())
    }

    async fn update_template(
        &self,
        template_id: &str,
        req: &EventWriteRequest,
        now: DateTime<Utc>,
    ) -> Result<SaveOutcome, CoreError> {
        let mut template = self.require_event(template_id).await?;
        apply_request(&mut template, req);
        template.last_modified = now;
        template.last_modified_by = Some(self.actor.clone());
        self.repo.put_event(&template).await?;
        Ok(SaveOutcome {
            id: template_id.to_string(),
            conflict: None,
        })
    }

    /// The date the client session says is being edited, if a session
    /// was injected and holds a parseable one.
    fn editing_date(&self) -> Option<NaiveDate> {
        self.session?
            .get(EDITING_DATE_KEY)
            .and_then(|raw| raw.parse().ok())
    }

    async fn require_event(&self, id: &str) -> Result<EventDefinition, CoreError> {
        self.repo
            .find_event_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Event with id {} not found", id)))
    }

    async fn is_child_member(&self, family_id: &str, member_id: &str) -> bool {
        match self.directory.members(family_id).await {
            Ok(members) => members
                .iter()
                .any(|m| m.id == member_id && m.is_child),
            Err(e) => {
                warn!(member_id = %member_id, error = %e, "member lookup failed; skipping points");
                false
            }
        }
    }

    async fn award_points(
        &self,
        family_id: &str,
        member_id: &str,
        occurrence: &crate::models::Occurrence,
    ) {
        if !self.is_child_member(family_id, member_id).await {
            return;
        }
        if let Err(e) = self
            .ledger
            .add_points(member_id, occurrence, &self.actor)
            .await
        {
            warn!(member_id = %member_id, error = %e, "point award failed");
        }
    }

    async fn reverse_points(
        &self,
        family_id: &str,
        member_id: &str,
        occurrence: &crate::models::Occurrence,
    ) {
        if !self.is_child_member(family_id, member_id).await {
            return;
        }
        if let Err(e) = self.ledger.remove_points(member_id, occurrence).await {
            warn!(member_id = %member_id, error = %e, "point reversal failed");
        }
    }
}

/// Boundary resolution of the client's loose id fields into a
/// structured target.
fn resolve_target(req: &EventWriteRequest) -> Option<EventRef> {
    EventRef::from_parts(
        req.id.as_deref(),
        req.original_event_id.as_deref(),
        req.date.or(req.display_date),
    )
}

/// Applies a request's submitted fields to a definition wholesale;
/// fields the request leaves unset keep their stored value.
fn apply_request(def: &mut EventDefinition, req: &EventWriteRequest) {
    if let Some(rt) = req.recurrence_type {
        def.recurrence_type = rt;
    }
    if let Some(d) = req.date {
        def.date = Some(d);
    }
    if let Some(d) = req.start_date {
        def.start_date = Some(d);
    }
    if let Some(d) = req.end_date {
        def.end_date = Some(d);
    }
    if let Some(days) = &req.recurrence_days {
        def.recurrence_days = days.clone();
    }
    let p = &req.fields;
    if let Some(v) = &p.name {
        def.name = v.clone();
    }
    if let Some(v) = &p.location {
        def.location = Some(v.clone());
    }
    if let Some(v) = &p.notes {
        def.notes = Some(v.clone());
    }
    if let Some(v) = &p.icon {
        def.icon = Some(v.clone());
    }
    if let Some(v) = &p.color {
        def.color = Some(v.clone());
    }
    if let Some(v) = &p.assigned_to {
        def.assigned_to = Some(v.clone());
    }
    if let Some(v) = p.visibility {
        def.visibility = v;
    }
    if let Some(v) = p.points {
        def.points = v;
    }
    if let Some(v) = p.time {
        def.time = v;
    }
    if let Some(v) = p.end_time {
        def.end_time = Some(v);
    }
    if let Some(v) = p.status {
        def.status = v;
    }
    if let Some(v) = &p.cancellation_reason {
        def.cancellation_reason = Some(v.clone());
    }
    if let Some(v) = &p.reminders {
        def.reminders = Some(v.clone());
    }
    if let Some(v) = &p.notification_recipients {
        def.notification_recipients = v.clone();
    }
}

/// Builds a new definition from a create payload, rejecting malformed
/// input before any write.
fn build_definition(
    id: &str,
    req: &EventWriteRequest,
    now: DateTime<Utc>,
    actor: &str,
) -> Result<EventDefinition, CoreError> {
    let name = req
        .fields
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| CoreError::Validation("event name is required".to_string()))?;
    let family_id = req
        .family_id
        .clone()
        .ok_or_else(|| CoreError::Validation("family id is required".to_string()))?;
    let time = req
        .fields
        .time
        .ok_or_else(|| CoreError::Validation("event time is required".to_string()))?;

    let recurrence_type = req.recurrence_type.unwrap_or(RecurrenceType::None);
    match recurrence_type {
        RecurrenceType::None => {
            if req.date.is_none() {
                return Err(CoreError::Validation(
                    "one-time events require a date".to_string(),
                ));
            }
        }
        RecurrenceType::Weekly => {
            if req.start_date.is_none() {
                return Err(CoreError::Validation(
                    "recurring events require a start date".to_string(),
                ));
            }
            if req
                .recurrence_days
                .as_ref()
                .map_or(true, |days| days.is_empty() || days.iter().any(|d| *d > 6))
            {
                return Err(CoreError::Validation(
                    "weekly events require weekday indices 0-6".to_string(),
                ));
            }
        }
        RecurrenceType::Daily | RecurrenceType::Monthly => {
            if req.start_date.is_none() {
                return Err(CoreError::Validation(
                    "recurring events require a start date".to_string(),
                ));
            }
        }
    }

    let mut def = EventDefinition::new(id, family_id, name);
    def.time = time;
    def.recurrence_type = recurrence_type;
    apply_request(&mut def, req);
    def.last_modified = now;
    def.last_modified_by = Some(actor.to_string());
    Ok(def)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exceptions::find_exception;
    use crate::external::ReminderProfile;
    use crate::materialize::materialize_occurrences;
    use crate::models::{FamilyMember, Occurrence};
    use crate::repository::{EventRepository, MemoryRepository};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveTime};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StubDirectory {
        members: Vec<FamilyMember>,
    }

    #[async_trait]
    impl MemberDirectory for StubDirectory {
        async fn members(&self, _family_id: &str) -> Result<Vec<FamilyMember>, CoreError> {
            Ok(self.members.clone())
        }

        async fn reminder_profile(
            &self,
            _member_id: &str,
        ) -> Result<Option<ReminderProfile>, CoreError> {
            Ok(None)
        }

        async fn deactivate_device(&self, _user_id: &str, _token: &str) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingLedger {
        awarded: Mutex<Vec<String>>,
        reversed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PointsLedger for RecordingLedger {
        async fn add_points(
            &self,
            member_id: &str,
            occurrence: &Occurrence,
            _actor: &str,
        ) -> Result<u32, CoreError> {
            self.awarded.lock().unwrap().push(member_id.to_string());
            Ok(occurrence.points)
        }

        async fn remove_points(
            &self,
            member_id: &str,
            occurrence: &Occurrence,
        ) -> Result<u32, CoreError> {
            self.reversed.lock().unwrap().push(member_id.to_string());
            Ok(occurrence.points)
        }
    }

    #[derive(Default)]
    struct StubSession {
        values: Mutex<HashMap<String, String>>,
    }

    impl SessionStore for StubSession {
        fn get(&self, key: &str) -> Option<String> {
            self.values.lock().unwrap().get(key).cloned()
        }

        fn set(&self, key: &str, value: &str) {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }

        fn clear(&self, key: &str) {
            self.values.lock().unwrap().remove(key);
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn child_member(id: &str) -> FamilyMember {
        FamilyMember {
            id: id.to_string(),
            user_id: Some(format!("user-{}", id)),
            name: "Kid".to_string(),
            is_child: true,
            color: None,
            avatar: None,
            birth_date: None,
        }
    }

    async fn seed_weekly_template(repo: &MemoryRepository) -> EventDefinition {
        let mut def = EventDefinition::new("abc", "fam1", "Swimming");
        def.recurrence_type = RecurrenceType::Weekly;
        def.start_date = Some(date(2025, 1, 6));
        def.recurrence_days = vec![1];
        def.time = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        repo.put_event(&def).await.unwrap();
        def
    }

    fn reconciler<'a>(
        repo: &'a MemoryRepository,
        directory: &'a StubDirectory,
        ledger: &'a RecordingLedger,
    ) -> Reconciler<'a> {
        Reconciler::new(repo, directory, ledger, "parent-1")
    }

    #[tokio::test]
    async fn exception_write_leaves_template_fields_untouched() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        seed_weekly_template(&repo).await;
        let r = reconciler(&repo, &directory, &ledger);

        let req = EventWriteRequest {
            original_event_id: Some("abc".to_string()),
            is_recurring_occurrence: true,
            save_as_exception: true,
            display_date: Some(date(2025, 1, 13)),
            fields: EventPatch {
                name: Some("Swimming gala".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let outcome = r.save_event(&req).await.unwrap();
        assert_eq!(outcome.id, "abc-2025-01-13");

        let stored = repo.find_event_by_id("abc").await.unwrap().unwrap();
        assert_eq!(stored.name, "Swimming");
        let ex = find_exception(&stored, date(2025, 1, 13)).unwrap();
        assert_eq!(ex.overrides.name.as_deref(), Some("Swimming gala"));
        assert_eq!(ex.last_modified_by.as_deref(), Some("parent-1"));
    }

    #[tokio::test]
    async fn exception_write_without_date_fails() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        seed_weekly_template(&repo).await;
        let r = reconciler(&repo, &directory, &ledger);

        let req = EventWriteRequest {
            original_event_id: Some("abc".to_string()),
            is_recurring_occurrence: true,
            save_as_exception: true,
            ..Default::default()
        };
        let err = r.save_event(&req).await.unwrap_err();
        assert!(matches!(err, CoreError::MissingDate(_)));
    }

    #[tokio::test]
    async fn exception_write_falls_back_to_session_editing_date() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        seed_weekly_template(&repo).await;

        let session = StubSession::default();
        session.set(EDITING_DATE_KEY, "2025-01-20");
        let r = reconciler(&repo, &directory, &ledger).with_session(&session);

        // No date or displayDate in the payload; the session's editing
        // date decides which occurrence the exception lands on.
        let req = EventWriteRequest {
            original_event_id: Some("abc".to_string()),
            is_recurring_occurrence: true,
            save_as_exception: true,
            fields: EventPatch {
                notes: Some("coach away".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let outcome = r.save_event(&req).await.unwrap();
        assert_eq!(outcome.id, "abc-2025-01-20");

        let stored = repo.find_event_by_id("abc").await.unwrap().unwrap();
        let ex = find_exception(&stored, date(2025, 1, 20)).unwrap();
        assert_eq!(ex.overrides.notes.as_deref(), Some("coach away"));

        // A cleared session is back to the hard error.
        session.clear(EDITING_DATE_KEY);
        let err = r.save_event(&req).await.unwrap_err();
        assert!(matches!(err, CoreError::MissingDate(_)));
    }

    #[tokio::test]
    async fn occurrence_edit_without_exception_flag_updates_template() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        seed_weekly_template(&repo).await;
        let r = reconciler(&repo, &directory, &ledger);

        let req = EventWriteRequest {
            original_event_id: Some("abc".to_string()),
            is_recurring_occurrence: true,
            save_as_exception: false,
            fields: EventPatch {
                name: Some("Diving".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let outcome = r.save_event(&req).await.unwrap();
        assert_eq!(outcome.id, "abc");

        let stored = repo.find_event_by_id("abc").await.unwrap().unwrap();
        assert_eq!(stored.name, "Diving");
        assert!(stored.exceptions.is_empty());
    }

    #[tokio::test]
    async fn generated_id_with_original_updates_template() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        seed_weekly_template(&repo).await;
        let r = reconciler(&repo, &directory, &ledger);

        let req = EventWriteRequest {
            id: Some("abc-2025-01-13".to_string()),
            original_event_id: Some("abc".to_string()),
            fields: EventPatch {
                points: Some(7),
                ..Default::default()
            },
            ..Default::default()
        };
        let outcome = r.save_event(&req).await.unwrap();
        assert_eq!(outcome.id, "abc");
        let stored = repo.find_event_by_id("abc").await.unwrap().unwrap();
        assert_eq!(stored.points, 7);
    }

    #[tokio::test]
    async fn stale_write_wins_with_conflict_warning() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        let def = seed_weekly_template(&repo).await;
        let r = reconciler(&repo, &directory, &ledger);

        let stale = def.last_modified - Duration::minutes(30);
        let req = EventWriteRequest {
            id: Some("abc".to_string()),
            last_modified: Some(stale),
            fields: EventPatch {
                notes: Some("second writer".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let outcome = r.save_event(&req).await.unwrap();
        let conflict = outcome.conflict.expect("expected conflict warning");
        assert_eq!(conflict.event_id, "abc");
        assert_eq!(conflict.client_modified, stale);

        // The write still landed.
        let stored = repo.find_event_by_id("abc").await.unwrap().unwrap();
        assert_eq!(stored.notes.as_deref(), Some("second writer"));
    }

    #[tokio::test]
    async fn up_to_date_write_carries_no_warning() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        let def = seed_weekly_template(&repo).await;
        let r = reconciler(&repo, &directory, &ledger);

        let req = EventWriteRequest {
            id: Some("abc".to_string()),
            last_modified: Some(def.last_modified),
            ..Default::default()
        };
        assert!(r.save_event(&req).await.unwrap().conflict.is_none());
    }

    #[tokio::test]
    async fn create_at_client_assigned_id() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        let r = reconciler(&repo, &directory, &ledger);

        let req = EventWriteRequest {
            id: Some("client-chosen".to_string()),
            family_id: Some("fam1".to_string()),
            date: Some(date(2025, 5, 1)),
            fields: EventPatch {
                name: Some("Dentist".to_string()),
                time: NaiveTime::from_hms_opt(10, 30, 0),
                ..Default::default()
            },
            ..Default::default()
        };
        let outcome = r.save_event(&req).await.unwrap();
        assert_eq!(outcome.id, "client-chosen");
        assert!(repo
            .find_event_by_id("client-chosen")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn insert_without_id_generates_one() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        let r = reconciler(&repo, &directory, &ledger);

        let req = EventWriteRequest {
            family_id: Some("fam1".to_string()),
            date: Some(date(2025, 5, 1)),
            fields: EventPatch {
                name: Some("Picnic".to_string()),
                time: NaiveTime::from_hms_opt(12, 0, 0),
                ..Default::default()
            },
            ..Default::default()
        };
        let outcome = r.save_event(&req).await.unwrap();
        assert!(!outcome.id.is_empty());
        assert!(repo.find_event_by_id(&outcome.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn create_without_name_is_rejected() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        let r = reconciler(&repo, &directory, &ledger);

        let req = EventWriteRequest {
            family_id: Some("fam1".to_string()),
            date: Some(date(2025, 5, 1)),
            fields: EventPatch {
                time: NaiveTime::from_hms_opt(12, 0, 0),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            r.save_event(&req).await.unwrap_err(),
            CoreError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn delete_via_generated_occurrence_id_tombstones_whole_series() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        seed_weekly_template(&repo).await;
        let r = reconciler(&repo, &directory, &ledger);

        let req = EventWriteRequest {
            id: Some("abc-2025-01-13".to_string()),
            original_event_id: Some("abc".to_string()),
            ..Default::default()
        };
        r.delete_event(&req).await.unwrap();

        let stored = repo.find_event_by_id("abc").await.unwrap().unwrap();
        assert_eq!(stored.status, EventStatus::Deleted);

        // Every occurrence of the series disappears, not just 01-13.
        let occs = materialize_occurrences(&[stored], date(2025, 1, 1), date(2025, 1, 31));
        assert!(occs.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_template_creates_tombstone() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        let r = reconciler(&repo, &directory, &ledger);

        let req = EventWriteRequest {
            id: Some("ghost".to_string()),
            family_id: Some("fam1".to_string()),
            ..Default::default()
        };
        r.delete_event(&req).await.unwrap();
        let stored = repo.find_event_by_id("ghost").await.unwrap().unwrap();
        assert_eq!(stored.status, EventStatus::Deleted);
    }

    #[tokio::test]
    async fn cancel_then_uncancel_touches_only_that_exception() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        seed_weekly_template(&repo).await;
        let r = reconciler(&repo, &directory, &ledger);

        let req = EventWriteRequest {
            id: Some("abc-2025-01-13".to_string()),
            original_event_id: Some("abc".to_string()),
            display_date: Some(date(2025, 1, 13)),
            ..Default::default()
        };
        r.change_event_status(&req, EventStatus::Cancelled, Some("sick".to_string()))
            .await
            .unwrap();

        let stored = repo.find_event_by_id("abc").await.unwrap().unwrap();
        let ex = find_exception(&stored, date(2025, 1, 13)).unwrap();
        assert_eq!(ex.overrides.status, Some(EventStatus::Cancelled));
        assert_eq!(ex.overrides.cancellation_reason.as_deref(), Some("sick"));
        assert_eq!(stored.status, EventStatus::Active);

        r.change_event_status(&req, EventStatus::Active, None)
            .await
            .unwrap();

        let stored = repo.find_event_by_id("abc").await.unwrap().unwrap();
        let ex = find_exception(&stored, date(2025, 1, 13)).unwrap();
        assert_eq!(ex.overrides.status, Some(EventStatus::Active));
        assert!(ex.overrides.cancellation_reason.is_none());
        assert_eq!(stored.exceptions.len(), 1);
        assert_eq!(stored.status, EventStatus::Active);
    }

    #[tokio::test]
    async fn completion_awards_points_for_child_and_uncompletion_reverses() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory {
            members: vec![child_member("kid-1")],
        };
        let ledger = RecordingLedger::default();
        let mut def = seed_weekly_template(&repo).await;
        def.assigned_to = Some("kid-1".to_string());
        def.points = 5;
        repo.put_event(&def).await.unwrap();
        let r = reconciler(&repo, &directory, &ledger);

        let req = EventWriteRequest {
            id: Some("abc-2025-01-13".to_string()),
            original_event_id: Some("abc".to_string()),
            display_date: Some(date(2025, 1, 13)),
            ..Default::default()
        };
        r.change_event_status(&req, EventStatus::Completed, None)
            .await
            .unwrap();
        assert_eq!(*ledger.awarded.lock().unwrap(), vec!["kid-1".to_string()]);

        let stored = repo.find_event_by_id("abc").await.unwrap().unwrap();
        let ex = find_exception(&stored, date(2025, 1, 13)).unwrap();
        assert!(ex.completed_at.is_some());
        assert_eq!(ex.completed_by.as_deref(), Some("parent-1"));

        r.change_event_status(&req, EventStatus::Active, None)
            .await
            .unwrap();
        assert_eq!(*ledger.reversed.lock().unwrap(), vec!["kid-1".to_string()]);
    }

    #[tokio::test]
    async fn completion_for_adult_awards_nothing() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        let mut def = seed_weekly_template(&repo).await;
        def.assigned_to = Some("adult-1".to_string());
        repo.put_event(&def).await.unwrap();
        let r = reconciler(&repo, &directory, &ledger);

        let req = EventWriteRequest {
            id: Some("abc-2025-01-13".to_string()),
            original_event_id: Some("abc".to_string()),
            display_date: Some(date(2025, 1, 13)),
            ..Default::default()
        };
        r.change_event_status(&req, EventStatus::Completed, None)
            .await
            .unwrap();
        assert!(ledger.awarded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_change_on_one_time_event_updates_template() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory { members: vec![] };
        let ledger = RecordingLedger::default();
        let mut def = EventDefinition::new("solo", "fam1", "Dentist");
        def.date = Some(date(2025, 5, 1));
        repo.put_event(&def).await.unwrap();
        let r = reconciler(&repo, &directory, &ledger);

        let req = EventWriteRequest {
            id: Some("solo".to_string()),
            ..Default::default()
        };
        r.change_event_status(&req, EventStatus::Cancelled, Some("rain".to_string()))
            .await
            .unwrap();
        let stored = repo.find_event_by_id("solo").await.unwrap().unwrap();
        assert_eq!(stored.status, EventStatus::Cancelled);
        assert_eq!(stored.cancellation_reason.as_deref(), Some("rain"));
        assert!(stored.exceptions.is_empty());
    }
}
