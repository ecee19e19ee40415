//! Annual-event scheduling: expands year-anchored templates
//! (birthdays, name days, anniversaries) into concrete dated
//! [`EventDefinition`]s for the current and next year, plus lead-time
//! reminder definitions for premium families.

use chrono::{Datelike, Duration, NaiveDate};
use tracing::{info, warn};

use crate::error::CoreError;
use crate::external::{EntitlementCheck, MemberDirectory};
use crate::models::{AnnualEvent, AnnualEventKind, EventDefinition, FamilyMember, MonthDay};
use crate::recurrence::is_leap_year;
use crate::repository::Repository;

/// Days before the main event at which reminder definitions are
/// generated.
pub const REMINDER_LEAD_DAYS: [i64; 2] = [14, 2];

/// Expired reminders are kept this many days past their date before
/// cleanup removes them.
pub const REMINDER_RETENTION_DAYS: i64 = 2;

/// Resolves a month-day anchor against a concrete year. Feb 29 lands
/// on Feb 28 in non-leap years.
pub fn resolve_annual_date(anchor: MonthDay, year: i32) -> NaiveDate {
    let day = if anchor.is_leap_day() && !is_leap_year(year) {
        28
    } else {
        anchor.day()
    };
    // Anchor is validated at construction, so this cannot fail.
    NaiveDate::from_ymd_opt(year, anchor.month(), day)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, anchor.month(), 28).unwrap())
}

/// Deterministic document id for the materialized main event.
pub fn annual_event_doc_id(annual_event_id: &str, year: i32) -> String {
    format!("annual-{}-{}", annual_event_id, year)
}

/// Deterministic document id for a lead-time reminder.
pub fn annual_reminder_doc_id(annual_event_id: &str, days: i64, year: i32) -> String {
    format!("annual-{}-reminder-{}-{}", annual_event_id, days, year)
}

/// Synthetic annual-event id for a member's birthday.
pub fn member_birthday_id(member_id: &str) -> String {
    format!("member-birthday-{}", member_id)
}

pub struct AnnualScheduler<'a> {
    repo: &'a dyn Repository,
    directory: &'a dyn MemberDirectory,
    entitlements: &'a dyn EntitlementCheck,
}

impl<'a> AnnualScheduler<'a> {
    pub fn new(
        repo: &'a dyn Repository,
        directory: &'a dyn MemberDirectory,
        entitlements: &'a dyn EntitlementCheck,
    ) -> Self {
        Self {
            repo,
            directory,
            entitlements,
        }
    }

    /// Regenerates the materialized definitions for one annual event:
    /// hard-deletes everything previously generated for it in a single
    /// batch, then writes definitions for the current and next year.
    /// Main events dated before `today` are skipped. Reminder
    /// definitions (14 and 2 days prior) are premium-only and opt-in
    /// via `notifyPrior`.
    ///
    /// Document ids are deterministic, so a definition that already
    /// exists after the delete (e.g. written by a concurrent run) is
    /// left alone. Returns the number of definitions written.
    pub async fn generate_for_definition(
        &self,
        annual: &AnnualEvent,
        is_premium: bool,
        today: NaiveDate,
    ) -> Result<usize, CoreError> {
        let stale: Vec<String> = self
            .repo
            .find_events_by_annual_id(&annual.id)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();
        self.repo.delete_events(&stale).await?;

        let mut written = 0;
        for year in [today.year(), today.year() + 1] {
            let date = resolve_annual_date(annual.date, year);

            if date >= today {
                written += self
                    .put_if_absent(self.main_definition(annual, date, year))
                    .await?;
            }

            if annual.notify_prior && is_premium {
                for days in REMINDER_LEAD_DAYS {
                    let reminder_date = date - Duration::days(days);
                    written += self
                        .put_if_absent(self.reminder_definition(annual, reminder_date, days, year))
                        .await?;
                }
            }
        }
        info!(annual_event_id = %annual.id, written, "annual event regenerated");
        Ok(written)
    }

    /// Generates the synthetic birthday annual event for one member.
    /// Members without a birth date are skipped.
    pub async fn generate_birthday_events_for_member(
        &self,
        family_id: &str,
        member: &FamilyMember,
        is_premium: bool,
        today: NaiveDate,
    ) -> Result<usize, CoreError> {
        let Some(birth_date) = member.birth_date else {
            return Ok(0);
        };
        let annual = AnnualEvent {
            id: member_birthday_id(&member.id),
            family_id: family_id.to_string(),
            name: format!("{}'s birthday", member.name),
            kind: AnnualEventKind::Birthday,
            date: MonthDay::from_date(birth_date),
            notify_prior: true,
            color: member.color.clone(),
            icon: None,
            notes: None,
        };
        self.generate_for_definition(&annual, is_premium, today).await
    }

    /// Re-runs generation for every stored annual event and every
    /// member birthday of a family. Safe to re-run; one template's
    /// failure does not abort the rest.
    pub async fn sync_family(&self, family_id: &str, today: NaiveDate) -> Result<usize, CoreError> {
        let is_premium = self.entitlements.is_premium(family_id).await?;
        let mut written = 0;

        for annual in self.repo.find_annual_events_for_family(family_id).await? {
            match self.generate_for_definition(&annual, is_premium, today).await {
                Ok(n) => written += n,
                Err(e) => {
                    warn!(annual_event_id = %annual.id, error = %e, "annual generation failed")
                }
            }
        }

        for member in self.directory.members(family_id).await? {
            match self
                .generate_birthday_events_for_member(family_id, &member, is_premium, today)
                .await
            {
                Ok(n) => written += n,
                Err(e) => {
                    warn!(member_id = %member.id, error = %e, "birthday generation failed")
                }
            }
        }

        info!(family_id = %family_id, written, "annual sync complete");
        Ok(written)
    }

    /// Permanently deletes reminder definitions dated more than
    /// [`REMINDER_RETENTION_DAYS`] in the past. Main events are never
    /// touched. Returns the number deleted.
    pub async fn cleanup_expired_reminders(&self, today: NaiveDate) -> Result<usize, CoreError> {
        let cutoff = today - Duration::days(REMINDER_RETENTION_DAYS);
        let expired: Vec<String> = self
            .repo
            .find_expired_reminders(cutoff)
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();
        let count = expired.len();
        self.repo.delete_events(&expired).await?;
        if count > 0 {
            info!(count, "expired reminders removed");
        }
        Ok(count)
    }

    async fn put_if_absent(&self, def: EventDefinition) -> Result<usize, CoreError> {
        if self.repo.find_event_by_id(&def.id).await?.is_some() {
            return Ok(0);
        }
        self.repo.put_event(&def).await?;
        Ok(1)
    }

    fn main_definition(&self, annual: &AnnualEvent, date: NaiveDate, year: i32) -> EventDefinition {
        let mut def = EventDefinition::new(
            annual_event_doc_id(&annual.id, year),
            annual.family_id.clone(),
            annual.name.clone(),
        );
        def.date = Some(date);
        def.color = annual.color.clone();
        def.icon = annual.icon.clone();
        def.notes = annual.notes.clone();
        def.is_annual_event = true;
        def.annual_event_id = Some(annual.id.clone());
        def
    }

    fn reminder_definition(
        &self,
        annual: &AnnualEvent,
        date: NaiveDate,
        days: i64,
        year: i32,
    ) -> EventDefinition {
        let mut def = EventDefinition::new(
            annual_reminder_doc_id(&annual.id, days, year),
            annual.family_id.clone(),
            format!("{} in {} days", annual.name, days),
        );
        def.date = Some(date);
        def.color = annual.color.clone();
        def.icon = annual.icon.clone();
        def.is_annual_event = true;
        def.annual_event_id = Some(annual.id.clone());
        def.is_reminder = true;
        def
    }
}
