//! Interfaces for external collaborators. These are consumed, never
//! implemented, by the core engine: the member directory, premium
//! entitlement check, push delivery transport, gamification ledger and
//! the client session store all live outside this crate.

use async_trait::async_trait;
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::{FamilyMember, Occurrence};

/// A per-recipient window during which delivery is deferred rather
/// than sent. May wrap past midnight (e.g. 21:00-07:00).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuietHours {
    #[serde(with = "crate::models::hhmm")]
    pub start: NaiveTime,
    #[serde(with = "crate::models::hhmm")]
    pub end: NaiveTime,
}

impl QuietHours {
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            // Overnight window.
            time >= self.start || time < self.end
        }
    }

    /// The first moment at or after `local` that lies outside the
    /// window. Identity when `local` is already outside.
    pub fn next_end_after(&self, local: NaiveDateTime) -> NaiveDateTime {
        if !self.contains(local.time()) {
            return local;
        }
        if self.start <= self.end || local.time() < self.end {
            // Same-day window, or the early-morning tail of an
            // overnight window: ends today.
            local.date().and_time(self.end)
        } else {
            local
                .date()
                .succ_opt()
                .map(|d| d.and_time(self.end))
                .unwrap_or(local)
        }
    }
}

/// Notification-relevant view of one member, resolved by the external
/// directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderProfile {
    pub member_id: String,
    pub user_id: String,
    pub event_reminders_enabled: bool,
    /// Registered push device tokens.
    pub devices: Vec<String>,
    pub quiet_hours: Option<QuietHours>,
}

/// Read-only family member directory.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn members(&self, family_id: &str) -> Result<Vec<FamilyMember>, CoreError>;

    /// None when the member has no registered user/device.
    async fn reminder_profile(&self, member_id: &str)
        -> Result<Option<ReminderProfile>, CoreError>;

    /// Called when a push token hard-fails so it is not targeted again.
    async fn deactivate_device(&self, user_id: &str, token: &str) -> Result<(), CoreError>;
}

/// Premium entitlement, checked per family.
#[async_trait]
pub trait EntitlementCheck: Send + Sync {
    async fn is_premium(&self, family_id: &str) -> Result<bool, CoreError>;
}

/// Per-token delivery outcome from the push transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PushResult {
    pub token: String,
    pub delivered: bool,
    /// Token is permanently invalid (unregistered device) and should
    /// be deactivated.
    pub hard_failure: bool,
    pub error: Option<String>,
}

/// Push delivery transport; given device tokens and a message, returns
/// per-token success/failure.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
    ) -> Result<Vec<PushResult>, CoreError>;
}

/// Gamification ledger, called on completion status transitions.
#[async_trait]
pub trait PointsLedger: Send + Sync {
    /// Returns the points awarded.
    async fn add_points(
        &self,
        member_id: &str,
        occurrence: &Occurrence,
        actor: &str,
    ) -> Result<u32, CoreError>;

    /// Returns the points reversed.
    async fn remove_points(
        &self,
        member_id: &str,
        occurrence: &Occurrence,
    ) -> Result<u32, CoreError>;
}

/// Explicit client session state (PIN, usage counters); injected at
/// call sites instead of read from ambient globals.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn clear(&self, key: &str);
}
