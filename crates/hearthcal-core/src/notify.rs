//! Reminder notifications: enqueueing per-recipient delivery records
//! when an event is written, and the bounded sweep that pushes due
//! records out through the transport. Edits never diff the queue; the
//! event's pending records are cancelled and scheduled from scratch.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::external::{MemberDirectory, PushTransport};
use crate::models::{EventDefinition, EventStatus, NotificationStatus, ScheduledNotification};
use crate::recurrence::occurrence_dates;
use crate::repository::Repository;
use crate::timezone::{local_date_at, local_datetime_at, utc_from_local};

/// Delivery attempts before a record is left in `failed` for good.
pub const MAX_ATTEMPTS: u32 = 3;

/// How far ahead the scheduler looks for the next occurrence of a
/// recurring event.
const NEXT_OCCURRENCE_HORIZON_DAYS: i64 = 366;

/// Outcome counts of one delivery sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub processed: usize,
    pub sent: usize,
    pub deferred: usize,
    pub failed: usize,
}

pub struct NotificationScheduler<'a> {
    repo: &'a dyn Repository,
    directory: &'a dyn MemberDirectory,
    transport: &'a dyn PushTransport,
    timezone: Tz,
}

impl<'a> NotificationScheduler<'a> {
    pub fn new(
        repo: &'a dyn Repository,
        directory: &'a dyn MemberDirectory,
        transport: &'a dyn PushTransport,
        timezone: Tz,
    ) -> Self {
        Self {
            repo,
            directory,
            transport,
            timezone,
        }
    }

    /// Enqueues pending records for the event's next occurrence: one
    /// per recipient per configured reminder offset, skipping any
    /// whose computed delivery time has already passed. Returns the
    /// number enqueued.
    pub async fn schedule_for_event(
        &self,
        def: &EventDefinition,
        now: DateTime<Utc>,
    ) -> Result<usize, CoreError> {
        if def.status != EventStatus::Active {
            return Ok(0);
        }
        let Some(reminders) = def.reminders.as_ref().filter(|r| r.enabled) else {
            return Ok(0);
        };
        if reminders.times.is_empty() {
            return Ok(0);
        }
        let Some(date) = self.next_occurrence_date(def, now) else {
            return Ok(0);
        };
        let occurrence_at = utc_from_local(date.and_time(def.time), self.timezone);

        let mut enqueued = 0;
        for member in self.recipients(def).await? {
            let Some(profile) = self.directory.reminder_profile(&member).await? else {
                continue;
            };
            if !profile.event_reminders_enabled || profile.devices.is_empty() {
                continue;
            }
            for minutes in &reminders.times {
                let scheduled_time = occurrence_at - Duration::minutes(i64::from(*minutes));
                if scheduled_time <= now {
                    continue;
                }
                let record = ScheduledNotification {
                    id: Uuid::now_v7().to_string(),
                    user_id: profile.user_id.clone(),
                    event_id: def.id.clone(),
                    scheduled_time,
                    message: format!("{} at {}", def.name, def.time.format("%H:%M")),
                    status: NotificationStatus::Pending,
                    attempts: 0,
                    max_attempts: MAX_ATTEMPTS,
                    last_error: None,
                    created_at: now,
                };
                self.repo.add_notification(&record).await?;
                enqueued += 1;
            }
        }
        debug!(event_id = %def.id, enqueued, "reminders scheduled");
        Ok(enqueued)
    }

    /// Soft-cancels every pending record for the event. Sent and
    /// failed records are history and stay untouched.
    pub async fn cancel_for_event(&self, event_id: &str) -> Result<usize, CoreError> {
        let pending = self.repo.find_pending_for_event(event_id).await?;
        let count = pending.len();
        for mut record in pending {
            record.status = NotificationStatus::Cancelled;
            self.repo.update_notification(&record).await?;
        }
        Ok(count)
    }

    /// Cancel-then-schedule, applied on every event edit.
    pub async fn reschedule_for_event(
        &self,
        def: &EventDefinition,
        now: DateTime<Utc>,
    ) -> Result<usize, CoreError> {
        self.cancel_for_event(&def.id).await?;
        self.schedule_for_event(def, now).await
    }

    /// Processes up to `limit` due pending records. Each record is
    /// handled independently; a failure is recorded on that record and
    /// the sweep moves on.
    pub async fn run_delivery_sweep(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<SweepSummary, CoreError> {
        let due = self.repo.find_due_pending(now, limit).await?;
        let mut summary = SweepSummary::default();
        for mut record in due {
            summary.processed += 1;
            match self.deliver(&mut record, now).await {
                Ok(Delivery::Sent) => summary.sent += 1,
                Ok(Delivery::Deferred) => summary.deferred += 1,
                Ok(Delivery::Failed) => summary.failed += 1,
                Err(e) => {
                    summary.failed += 1;
                    warn!(notification_id = %record.id, error = %e, "delivery failed");
                    if let Err(e) = self.record_failure(&mut record, e.to_string()).await {
                        warn!(notification_id = %record.id, error = %e, "failure not recorded");
                    }
                }
            }
        }
        info!(
            processed = summary.processed,
            sent = summary.sent,
            deferred = summary.deferred,
            failed = summary.failed,
            "delivery sweep complete"
        );
        Ok(summary)
    }

    async fn deliver(
        &self,
        record: &mut ScheduledNotification,
        now: DateTime<Utc>,
    ) -> Result<Delivery, CoreError> {
        let profile = self.directory.reminder_profile(&record.user_id).await?;
        let Some(profile) = profile.filter(|p| !p.devices.is_empty()) else {
            self.record_failure(record, "recipient has no registered devices".to_string())
                .await?;
            return Ok(Delivery::Failed);
        };

        if let Some(quiet) = profile.quiet_hours {
            let local = local_datetime_at(now, self.timezone);
            if quiet.contains(local.time()) {
                record.scheduled_time = utc_from_local(quiet.next_end_after(local), self.timezone);
                self.repo.update_notification(record).await?;
                return Ok(Delivery::Deferred);
            }
        }

        let results = self
            .transport
            .send(&profile.devices, "Reminder", &record.message)
            .await?;

        for result in results.iter().filter(|r| r.hard_failure) {
            if let Err(e) = self
                .directory
                .deactivate_device(&profile.user_id, &result.token)
                .await
            {
                warn!(token = %result.token, error = %e, "token deactivation failed");
            }
        }

        if results.iter().any(|r| r.delivered) {
            record.status = NotificationStatus::Sent;
            self.repo.update_notification(record).await?;
            Ok(Delivery::Sent)
        } else {
            let error = results
                .iter()
                .find_map(|r| r.error.clone())
                .unwrap_or_else(|| "delivery failed on every device".to_string());
            self.record_failure(record, error).await?;
            Ok(Delivery::Failed)
        }
    }

    /// Records one failed attempt. The record stays pending, so the
    /// next sweep retries it, until the attempt cap is reached; only
    /// then does it settle in `failed`.
    async fn record_failure(
        &self,
        record: &mut ScheduledNotification,
        error: String,
    ) -> Result<(), CoreError> {
        record.attempts += 1;
        record.last_error = Some(error);
        record.status = if record.attempts >= record.max_attempts {
            NotificationStatus::Failed
        } else {
            NotificationStatus::Pending
        };
        self.repo.update_notification(record).await
    }

    /// Explicit recipients when the event names any, otherwise every
    /// family member.
    async fn recipients(&self, def: &EventDefinition) -> Result<Vec<String>, CoreError> {
        if !def.notification_recipients.is_empty() {
            return Ok(def.notification_recipients.clone());
        }
        Ok(self
            .directory
            .members(&def.family_id)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect())
    }

    fn next_occurrence_date(&self, def: &EventDefinition, now: DateTime<Utc>) -> Option<NaiveDate> {
        let today = local_date_at(now, self.timezone);
        if !def.is_recurring() {
            return def.date.filter(|d| *d >= today);
        }
        let horizon = today + Duration::days(NEXT_OCCURRENCE_HORIZON_DAYS);
        occurrence_dates(def, today, horizon).into_iter().next()
    }
}

enum Delivery {
    Sent,
    Deferred,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{PushResult, QuietHours, ReminderProfile};
    use crate::models::{FamilyMember, RecurrenceType, ReminderSettings};
    use crate::repository::{MemoryRepository, NotificationRepository};
    use async_trait::async_trait;
    use chrono::{NaiveTime, TimeZone};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StubDirectory {
        members: Vec<FamilyMember>,
        profiles: HashMap<String, ReminderProfile>,
        deactivated: Mutex<Vec<String>>,
    }

    impl StubDirectory {
        fn new() -> Self {
            Self {
                members: Vec::new(),
                profiles: HashMap::new(),
                deactivated: Mutex::new(Vec::new()),
            }
        }

        fn with_profile(mut self, key: &str, profile: ReminderProfile) -> Self {
            self.profiles.insert(key.to_string(), profile);
            self
        }
    }

    #[async_trait]
    impl MemberDirectory for StubDirectory {
        async fn members(&self, _family_id: &str) -> Result<Vec<FamilyMember>, CoreError> {
            Ok(self.members.clone())
        }

        async fn reminder_profile(
            &self,
            member_id: &str,
        ) -> Result<Option<ReminderProfile>, CoreError> {
            Ok(self.profiles.get(member_id).cloned())
        }

        async fn deactivate_device(&self, _user_id: &str, token: &str) -> Result<(), CoreError> {
            self.deactivated.lock().unwrap().push(token.to_string());
            Ok(())
        }
    }

    struct StubTransport {
        results: Vec<PushResult>,
        sent: Mutex<Vec<Vec<String>>>,
    }

    impl StubTransport {
        fn delivering() -> Self {
            Self {
                results: vec![PushResult {
                    token: "tok1".to_string(),
                    delivered: true,
                    hard_failure: false,
                    error: None,
                }],
                sent: Mutex::new(Vec::new()),
            }
        }

        fn failing(hard: bool) -> Self {
            Self {
                results: vec![PushResult {
                    token: "tok1".to_string(),
                    delivered: false,
                    hard_failure: hard,
                    error: Some("unregistered".to_string()),
                }],
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PushTransport for StubTransport {
        async fn send(
            &self,
            tokens: &[String],
            _title: &str,
            _body: &str,
        ) -> Result<Vec<PushResult>, CoreError> {
            self.sent.lock().unwrap().push(tokens.to_vec());
            Ok(self.results.clone())
        }
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn profile(member: &str, quiet: Option<QuietHours>) -> ReminderProfile {
        ReminderProfile {
            member_id: member.to_string(),
            user_id: format!("user-{}", member),
            event_reminders_enabled: true,
            devices: vec!["tok1".to_string()],
            quiet_hours: quiet,
        }
    }

    fn event_with_reminders(times: Vec<u32>) -> EventDefinition {
        let mut def = EventDefinition::new("e1", "fam1", "Football practice");
        def.date = Some(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
        def.time = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        def.reminders = Some(ReminderSettings {
            enabled: true,
            times,
            ..Default::default()
        });
        def.notification_recipients = vec!["m1".to_string()];
        def
    }

    fn pending(id: &str, at: DateTime<Utc>, user: &str) -> ScheduledNotification {
        ScheduledNotification {
            id: id.to_string(),
            user_id: user.to_string(),
            event_id: "e1".to_string(),
            scheduled_time: at,
            message: "Football practice at 17:00".to_string(),
            status: NotificationStatus::Pending,
            attempts: 0,
            max_attempts: MAX_ATTEMPTS,
            last_error: None,
            created_at: at,
        }
    }

    fn tz() -> Tz {
        "UTC".parse().unwrap()
    }

    #[tokio::test]
    async fn schedules_one_record_per_offset_future_only() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory::new().with_profile("m1", profile("m1", None));
        let transport = StubTransport::delivering();
        let s = NotificationScheduler::new(&repo, &directory, &transport, tz());

        // 16:30 on event day: the 60-minute reminder (16:00) has
        // passed, the 15-minute one (16:45) has not.
        let now = utc(2025, 6, 10, 16, 30);
        let enqueued = s
            .schedule_for_event(&event_with_reminders(vec![60, 15]), now)
            .await
            .unwrap();
        assert_eq!(enqueued, 1);

        let records = repo.find_pending_for_event("e1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].scheduled_time, utc(2025, 6, 10, 16, 45));
        assert_eq!(records[0].user_id, "user-m1");
    }

    #[tokio::test]
    async fn disabled_reminders_schedule_nothing() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory::new().with_profile("m1", profile("m1", None));
        let transport = StubTransport::delivering();
        let s = NotificationScheduler::new(&repo, &directory, &transport, tz());

        let mut def = event_with_reminders(vec![15]);
        def.reminders.as_mut().unwrap().enabled = false;
        let now = utc(2025, 6, 1, 12, 0);
        assert_eq!(s.schedule_for_event(&def, now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn recurring_event_schedules_for_next_occurrence() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory::new().with_profile("m1", profile("m1", None));
        let transport = StubTransport::delivering();
        let s = NotificationScheduler::new(&repo, &directory, &transport, tz());

        let mut def = event_with_reminders(vec![30]);
        def.date = None;
        def.recurrence_type = RecurrenceType::Weekly;
        def.start_date = Some(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        def.recurrence_days = vec![1]; // Mondays

        // Wednesday Jun 11: next Monday is Jun 16.
        let now = utc(2025, 6, 11, 9, 0);
        assert_eq!(s.schedule_for_event(&def, now).await.unwrap(), 1);
        let records = repo.find_pending_for_event("e1").await.unwrap();
        assert_eq!(records[0].scheduled_time, utc(2025, 6, 16, 16, 30));
    }

    #[tokio::test]
    async fn cancel_soft_cancels_pending_only() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory::new();
        let transport = StubTransport::delivering();
        let s = NotificationScheduler::new(&repo, &directory, &transport, tz());

        let at = utc(2025, 6, 10, 16, 45);
        repo.add_notification(&pending("n1", at, "user-m1"))
            .await
            .unwrap();
        let mut sent = pending("n2", at, "user-m1");
        sent.status = NotificationStatus::Sent;
        repo.add_notification(&sent).await.unwrap();

        assert_eq!(s.cancel_for_event("e1").await.unwrap(), 1);
        assert!(repo.find_pending_for_event("e1").await.unwrap().is_empty());
        // The sent record is untouched history.
        let due = repo.find_due_pending(at, 10).await.unwrap();
        assert!(due.is_empty());
    }

    #[tokio::test]
    async fn sweep_delivers_and_marks_sent() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory::new().with_profile("user-m1", profile("m1", None));
        let transport = StubTransport::delivering();
        let s = NotificationScheduler::new(&repo, &directory, &transport, tz());

        let now = utc(2025, 6, 10, 17, 0);
        repo.add_notification(&pending("n1", utc(2025, 6, 10, 16, 45), "user-m1"))
            .await
            .unwrap();

        let summary = s.run_delivery_sweep(now, 10).await.unwrap();
        assert_eq!(summary.sent, 1);
        assert_eq!(summary.processed, 1);
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
        assert!(repo.find_pending_for_event("e1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sweep_defers_into_quiet_hours_end() {
        let repo = MemoryRepository::new();
        let quiet = QuietHours {
            start: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
        };
        let directory = StubDirectory::new().with_profile("user-m1", profile("m1", Some(quiet)));
        let transport = StubTransport::delivering();
        let s = NotificationScheduler::new(&repo, &directory, &transport, tz());

        let now = utc(2025, 6, 10, 22, 0);
        repo.add_notification(&pending("n1", utc(2025, 6, 10, 21, 30), "user-m1"))
            .await
            .unwrap();

        let summary = s.run_delivery_sweep(now, 10).await.unwrap();
        assert_eq!(summary.deferred, 1);
        assert!(transport.sent.lock().unwrap().is_empty());

        // Still pending, now due tomorrow morning.
        let rescheduled = repo
            .find_pending_for_event("e1")
            .await
            .unwrap()
            .pop()
            .unwrap();
        assert_eq!(rescheduled.scheduled_time, utc(2025, 6, 11, 7, 0));
    }

    #[tokio::test]
    async fn sweep_records_failure_and_deactivates_dead_tokens() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory::new().with_profile("user-m1", profile("m1", None));
        let transport = StubTransport::failing(true);
        let s = NotificationScheduler::new(&repo, &directory, &transport, tz());

        let now = utc(2025, 6, 10, 17, 0);
        repo.add_notification(&pending("n1", utc(2025, 6, 10, 16, 45), "user-m1"))
            .await
            .unwrap();

        let summary = s.run_delivery_sweep(now, 10).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(*directory.deactivated.lock().unwrap(), vec!["tok1".to_string()]);
    }

    #[tokio::test]
    async fn transient_failure_stays_pending_until_the_attempt_cap() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory::new().with_profile("user-m1", profile("m1", None));
        let transport = StubTransport::failing(false);
        let s = NotificationScheduler::new(&repo, &directory, &transport, tz());

        let now = utc(2025, 6, 10, 17, 0);
        repo.add_notification(&pending("n1", utc(2025, 6, 10, 16, 45), "user-m1"))
            .await
            .unwrap();

        // Every sweep short of the cap leaves the record pending with
        // the attempt recorded, so the next sweep picks it up again.
        for expected_attempts in 1..MAX_ATTEMPTS {
            let summary = s.run_delivery_sweep(now, 10).await.unwrap();
            assert_eq!(summary.failed, 1);
            let record = repo
                .find_pending_for_event("e1")
                .await
                .unwrap()
                .pop()
                .expect("record should still be retryable");
            assert_eq!(record.attempts, expected_attempts);
            assert_eq!(record.last_error.as_deref(), Some("unregistered"));
        }

        // The attempt that reaches the cap is terminal.
        let summary = s.run_delivery_sweep(now, 10).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert!(repo.find_pending_for_event("e1").await.unwrap().is_empty());
        assert_eq!(s.run_delivery_sweep(now, 10).await.unwrap().processed, 0);
    }

    #[tokio::test]
    async fn one_bad_record_does_not_abort_the_sweep() {
        let repo = MemoryRepository::new();
        // Only the second recipient has a profile; the first fails.
        let directory = StubDirectory::new().with_profile("user-m2", profile("m2", None));
        let transport = StubTransport::delivering();
        let s = NotificationScheduler::new(&repo, &directory, &transport, tz());

        let now = utc(2025, 6, 10, 17, 0);
        repo.add_notification(&pending("n1", utc(2025, 6, 10, 16, 40), "user-m1"))
            .await
            .unwrap();
        repo.add_notification(&pending("n2", utc(2025, 6, 10, 16, 45), "user-m2"))
            .await
            .unwrap();

        let summary = s.run_delivery_sweep(now, 10).await.unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.sent, 1);
    }

    #[tokio::test]
    async fn sweep_respects_the_batch_limit() {
        let repo = MemoryRepository::new();
        let directory = StubDirectory::new().with_profile("user-m1", profile("m1", None));
        let transport = StubTransport::delivering();
        let s = NotificationScheduler::new(&repo, &directory, &transport, tz());

        let now = utc(2025, 6, 10, 17, 0);
        for i in 0..5 {
            repo.add_notification(&pending(
                &format!("n{}", i),
                utc(2025, 6, 10, 16, 40),
                "user-m1",
            ))
            .await
            .unwrap();
        }

        let summary = s.run_delivery_sweep(now, 3).await.unwrap();
        assert_eq!(summary.processed, 3);
    }
}
