//! Local implementations of the core crate's external interfaces,
//! backed by the CLI config file. The directory and entitlement check
//! read from `hearthcal.toml`; push delivery prints to the terminal.

use async_trait::async_trait;
use owo_colors::OwoColorize;
use tracing::{info, warn};

use hearthcal_core::error::CoreError;
use hearthcal_core::external::{
    EntitlementCheck, MemberDirectory, PointsLedger, PushResult, PushTransport, QuietHours,
    ReminderProfile,
};
use hearthcal_core::models::{FamilyMember, Occurrence};

use crate::config::MemberConfig;

pub struct ConfigDirectory {
    members: Vec<MemberConfig>,
}

impl ConfigDirectory {
    pub fn new(members: Vec<MemberConfig>) -> Self {
        Self { members }
    }

    fn find(&self, key: &str) -> Option<&MemberConfig> {
        self.members
            .iter()
            .find(|m| m.id == key || m.user_id.as_deref() == Some(key))
    }
}

#[async_trait]
impl MemberDirectory for ConfigDirectory {
    async fn members(&self, _family_id: &str) -> Result<Vec<FamilyMember>, CoreError> {
        Ok(self
            .members
            .iter()
            .map(|m| FamilyMember {
                id: m.id.clone(),
                user_id: m.user_id.clone(),
                name: m.name.clone(),
                is_child: m.is_child,
                color: m.color.clone(),
                avatar: None,
                birth_date: m.birth_date,
            })
            .collect())
    }

    async fn reminder_profile(
        &self,
        member_id: &str,
    ) -> Result<Option<ReminderProfile>, CoreError> {
        let Some(member) = self.find(member_id) else {
            return Ok(None);
        };
        let quiet_hours = match (&member.quiet_start, &member.quiet_end) {
            (Some(start), Some(end)) => Some(QuietHours {
                start: parse_hhmm(start)?,
                end: parse_hhmm(end)?,
            }),
            _ => None,
        };
        Ok(Some(ReminderProfile {
            member_id: member.id.clone(),
            user_id: member.user_id.clone().unwrap_or_else(|| member.id.clone()),
            event_reminders_enabled: member.reminders_enabled,
            devices: member.devices.clone(),
            quiet_hours,
        }))
    }

    async fn deactivate_device(&self, user_id: &str, token: &str) -> Result<(), CoreError> {
        // Config-file tokens are managed by hand; just surface it.
        warn!(user_id = %user_id, token = %token, "device token rejected; remove it from hearthcal.toml");
        Ok(())
    }
}

fn parse_hhmm(raw: &str) -> Result<chrono::NaiveTime, CoreError> {
    chrono::NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| CoreError::Validation(format!("Invalid quiet-hours time: {}", raw)))
}

pub struct ConfigEntitlements {
    premium: bool,
}

impl ConfigEntitlements {
    pub fn new(premium: bool) -> Self {
        Self { premium }
    }
}

#[async_trait]
impl EntitlementCheck for ConfigEntitlements {
    async fn is_premium(&self, _family_id: &str) -> Result<bool, CoreError> {
        Ok(self.premium)
    }
}

/// Terminal stand-in for a real push service: every token "delivers"
/// by printing the message.
pub struct ConsoleTransport;

#[async_trait]
impl PushTransport for ConsoleTransport {
    async fn send(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
    ) -> Result<Vec<PushResult>, CoreError> {
        for token in tokens {
            println!("{} [{}] {}: {}", "push".cyan().bold(), token, title, body);
        }
        Ok(tokens
            .iter()
            .map(|t| PushResult {
                token: t.clone(),
                delivered: true,
                hard_failure: false,
                error: None,
            })
            .collect())
    }
}

/// Points transitions are logged rather than persisted; the CLI has no
/// gamification backend.
pub struct LogLedger;

#[async_trait]
impl PointsLedger for LogLedger {
    async fn add_points(
        &self,
        member_id: &str,
        occurrence: &Occurrence,
        actor: &str,
    ) -> Result<u32, CoreError> {
        info!(member_id = %member_id, points = occurrence.points, actor = %actor, "points awarded");
        Ok(occurrence.points)
    }

    async fn remove_points(
        &self,
        member_id: &str,
        occurrence: &Occurrence,
    ) -> Result<u32, CoreError> {
        info!(member_id = %member_id, points = occurrence.points, "points reversed");
        Ok(occurrence.points)
    }
}
