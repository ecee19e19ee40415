use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Serde adapter for "HH:MM" wall-clock times, the stored wire format
/// for `time`/`endTime` fields.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Like [`hhmm`] but for optional fields.
pub mod hhmm_opt {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => s.serialize_str(&t.format(super::hhmm::FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            Some(raw) => NaiveTime::parse_from_str(&raw, super::hhmm::FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrenceType::None => write!(f, "none"),
            RecurrenceType::Daily => write!(f, "daily"),
            RecurrenceType::Weekly => write!(f, "weekly"),
            RecurrenceType::Monthly => write!(f, "monthly"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence type: {0}")]
pub struct ParseRecurrenceTypeError(String);

impl FromStr for RecurrenceType {
    type Err = ParseRecurrenceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(RecurrenceType::None),
            "daily" => Ok(RecurrenceType::Daily),
            "weekly" => Ok(RecurrenceType::Weekly),
            "monthly" => Ok(RecurrenceType::Monthly),
            _ => Err(ParseRecurrenceTypeError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Active,
    Cancelled,
    Inactive,
    Completed,
    Deleted,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Active => write!(f, "active"),
            EventStatus::Cancelled => write!(f, "cancelled"),
            EventStatus::Inactive => write!(f, "inactive"),
            EventStatus::Completed => write!(f, "completed"),
            EventStatus::Deleted => write!(f, "deleted"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid event status: {0}")]
pub struct ParseEventStatusError(String);

impl FromStr for EventStatus {
    type Err = ParseEventStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(EventStatus::Active),
            "cancelled" => Ok(EventStatus::Cancelled),
            "inactive" => Ok(EventStatus::Inactive),
            "completed" => Ok(EventStatus::Completed),
            "deleted" => Ok(EventStatus::Deleted),
            _ => Err(ParseEventStatusError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    OnlyMe,
    #[default]
    Family,
    KnownFamilies,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::OnlyMe => write!(f, "only_me"),
            Visibility::Family => write!(f, "family"),
            Visibility::KnownFamilies => write!(f, "known_families"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid visibility: {0}")]
pub struct ParseVisibilityError(String);

impl FromStr for Visibility {
    type Err = ParseVisibilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "only_me" => Ok(Visibility::OnlyMe),
            "family" => Ok(Visibility::Family),
            "known_families" => Ok(Visibility::KnownFamilies),
            _ => Err(ParseVisibilityError(s.to_string())),
        }
    }
}

/// Per-event reminder configuration, stored verbatim on the document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSettings {
    pub enabled: bool,
    /// Minutes before the occurrence time.
    #[serde(default)]
    pub times: Vec<u32>,
    #[serde(default)]
    pub sound: bool,
    #[serde(default)]
    pub vibration: bool,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            times: Vec::new(),
            sound: true,
            vibration: true,
        }
    }
}

/// Partial override of an event's presentational, schedule and status
/// fields. An unset field means "fall back to the template"; there is
/// no presence-sniffing over loose maps — merging happens only through
/// [`EventPatch::is_empty`] and the materializer's resolve step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    #[serde(
        default,
        with = "hhmm_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<NaiveTime>,
    #[serde(
        default,
        with = "hhmm_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<ReminderSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_recipients: Option<Vec<String>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.location.is_none()
            && self.notes.is_none()
            && self.icon.is_none()
            && self.color.is_none()
            && self.assigned_to.is_none()
            && self.visibility.is_none()
            && self.points.is_none()
            && self.time.is_none()
            && self.end_time.is_none()
            && self.status.is_none()
            && self.cancellation_reason.is_none()
            && self.reminders.is_none()
            && self.notification_recipients.is_none()
    }

    /// Layer `other` over `self`: fields set in `other` win, fields it
    /// leaves unset keep their current value (e.g. a re-upserted
    /// exception retains its `points` if the new patch omits them).
    pub fn merge_from(&mut self, other: &EventPatch) {
        macro_rules! take {
            ($field:ident) => {
                if other.$field.is_some() {
                    self.$field = other.$field.clone();
                }
            };
        }
        take!(name);
        take!(location);
        take!(notes);
        take!(icon);
        take!(color);
        take!(assigned_to);
        take!(visibility);
        take!(points);
        take!(time);
        take!(end_time);
        take!(status);
        take!(cancellation_reason);
        take!(reminders);
        take!(notification_recipients);
    }
}

/// Per-date override attached to a recurring definition. At most one
/// exception exists per calendar date (enforced by find-or-replace on
/// write).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventException {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub overrides: EventPatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by_user_id: Option<String>,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
}

/// The authoritative stored record for a one-time event or a recurring
/// series. Field names and enum values are part of the external store
/// contract and round-trip byte-for-byte.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDefinition {
    pub id: String,
    pub family_id: String,
    pub name: String,
    #[serde(default)]
    pub recurrence_type: RecurrenceType,
    /// Set when `recurrence_type == None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Inclusive; set when recurring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive; None = unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Weekday indices 0-6, Sunday = 0. Required non-empty for weekly,
    /// ignored otherwise.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recurrence_days: Vec<u8>,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    #[serde(
        default,
        with = "hhmm_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<ReminderSettings>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notification_recipients: Vec<String>,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<EventException>,
    /// Set on definitions materialized from an annual event.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_annual_event: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_event_id: Option<String>,
    /// Set on the generated lead-time reminder definitions.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_reminder: bool,
}

impl EventDefinition {
    /// Minimal valid one-time event; tests and creation paths fill in
    /// the rest.
    pub fn new(id: impl Into<String>, family_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            family_id: family_id.into(),
            name: name.into(),
            recurrence_type: RecurrenceType::None,
            date: None,
            start_date: None,
            end_date: None,
            recurrence_days: Vec::new(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: None,
            location: None,
            notes: None,
            icon: None,
            color: None,
            assigned_to: None,
            visibility: Visibility::Family,
            points: 0,
            status: EventStatus::Active,
            cancellation_reason: None,
            reminders: None,
            notification_recipients: Vec::new(),
            last_modified: Utc::now(),
            last_modified_by: None,
            exceptions: Vec::new(),
            is_annual_event: false,
            annual_event_id: None,
            is_reminder: false,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_type != RecurrenceType::None
    }
}

/// Structured identifier for a write target: either the definition
/// document itself or one concrete occurrence of a recurring series.
/// Constructed once at the boundary from the client's loose id fields;
/// the trailing-date sniff over generated ids lives only in
/// [`EventRef::from_parts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRef {
    Definition(String),
    Occurrence {
        definition_id: String,
        date: NaiveDate,
    },
}

impl EventRef {
    /// The composite id a materialized recurring occurrence carries:
    /// `{definitionId}-{YYYY-MM-DD}`.
    pub fn occurrence_id(definition_id: &str, date: NaiveDate) -> String {
        format!("{}-{}", definition_id, date.format("%Y-%m-%d"))
    }

    /// Splits a generated occurrence id into its parts, or None when
    /// the id does not end in `-YYYY-MM-DD`.
    pub fn split_generated_id(id: &str) -> Option<(&str, NaiveDate)> {
        // "x-2025-01-13": at least one prefix char, a dash, 10 date chars
        if id.len() < 12 {
            return None;
        }
        let (head, date_part) = id.split_at(id.len() - 10);
        let prefix = head.strip_suffix('-')?;
        if prefix.is_empty() {
            return None;
        }
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
        Some((prefix, date))
    }

    /// Resolves the client's loose id fields into a structured target.
    pub fn from_parts(
        id: Option<&str>,
        original_event_id: Option<&str>,
        display_date: Option<NaiveDate>,
    ) -> Option<EventRef> {
        if let (Some(id), Some(original)) = (id, original_event_id) {
            if let Some((prefix, date)) = Self::split_generated_id(id) {
                if prefix == original {
                    return Some(EventRef::Occurrence {
                        definition_id: original.to_string(),
                        date,
                    });
                }
                // Generated-looking id for a different definition:
                // trust the explicit original id.
                return Some(EventRef::Occurrence {
                    definition_id: original.to_string(),
                    date,
                });
            }
        }
        if let (Some(original), Some(date)) = (original_event_id, display_date) {
            return Some(EventRef::Occurrence {
                definition_id: original.to_string(),
                date,
            });
        }
        if let Some(original) = original_event_id {
            return Some(EventRef::Definition(original.to_string()));
        }
        id.map(|id| EventRef::Definition(id.to_string()))
    }

    pub fn definition_id(&self) -> &str {
        match self {
            EventRef::Definition(id) => id,
            EventRef::Occurrence { definition_id, .. } => definition_id,
        }
    }
}

/// Client-submitted save payload, as accepted by the write reconciler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWriteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_event_id: Option<String>,
    #[serde(default)]
    pub is_recurring_occurrence: bool,
    #[serde(default)]
    pub save_as_exception: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_id: Option<String>,
    /// The `lastModified` the client last observed, for advisory
    /// conflict detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_type: Option<RecurrenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_days: Option<Vec<u8>>,
    #[serde(flatten)]
    pub fields: EventPatch,
}

/// Advisory conflict notice attached to a successful save: the store
/// held a strictly newer revision than the client had seen, and the
/// client's write overwrote it (last-writer-wins).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictWarning {
    pub event_id: String,
    pub server_modified: DateTime<Utc>,
    pub client_modified: DateTime<Utc>,
}

impl fmt::Display for ConflictWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event {} was modified by someone else at {}; your change has overwritten theirs",
            self.event_id, self.server_modified
        )
    }
}

/// Result of a reconciled save.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub id: String,
    pub conflict: Option<ConflictWarning>,
}

/// A single displayable calendar instance, produced by the
/// materializer: template fields with any per-date exception layered
/// on top.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    /// `{definitionId}-{date}` for recurring occurrences, the bare
    /// definition id for one-time events.
    pub id: String,
    pub definition_id: String,
    pub display_date: NaiveDate,
    pub name: String,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    #[serde(with = "hhmm_opt", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub assigned_to: Option<String>,
    pub visibility: Visibility,
    pub points: u32,
    pub status: EventStatus,
    pub cancellation_reason: Option<String>,
    pub reminders: Option<ReminderSettings>,
    pub notification_recipients: Vec<String>,
    pub has_exception: bool,
    pub is_recurring: bool,
}

// ============================================================================
// Annual events
// ============================================================================

/// A month-day anchor ("MM-DD" on the wire). Feb 29 is representable
/// and resolved per target year by the annual scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid month-day: {0}")]
pub struct ParseMonthDayError(String);

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Result<Self, ParseMonthDayError> {
        let max_day = match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 => 29,
            _ => return Err(ParseMonthDayError(format!("{:02}-{:02}", month, day))),
        };
        if day == 0 || day > max_day {
            return Err(ParseMonthDayError(format!("{:02}-{:02}", month, day)));
        }
        Ok(Self { month, day })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn is_leap_day(&self) -> bool {
        self.month == 2 && self.day == 29
    }

    pub fn from_date(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

impl FromStr for MonthDay {
    type Err = ParseMonthDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month, day) = s
            .split_once('-')
            .ok_or_else(|| ParseMonthDayError(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| ParseMonthDayError(s.to_string()))?;
        let day: u32 = day.parse().map_err(|_| ParseMonthDayError(s.to_string()))?;
        MonthDay::new(month, day).map_err(|_| ParseMonthDayError(s.to_string()))
    }
}

impl Serialize for MonthDay {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthDay {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnnualEventKind {
    Birthday,
    NameDay,
    Anniversary,
    Other,
}

impl fmt::Display for AnnualEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnualEventKind::Birthday => write!(f, "birthday"),
            AnnualEventKind::NameDay => write!(f, "name_day"),
            AnnualEventKind::Anniversary => write!(f, "anniversary"),
            AnnualEventKind::Other => write!(f, "other"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid annual event kind: {0}")]
pub struct ParseAnnualEventKindError(String);

impl FromStr for AnnualEventKind {
    type Err = ParseAnnualEventKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "birthday" => Ok(AnnualEventKind::Birthday),
            "name_day" | "nameday" => Ok(AnnualEventKind::NameDay),
            "anniversary" => Ok(AnnualEventKind::Anniversary),
            "other" => Ok(AnnualEventKind::Other),
            _ => Err(ParseAnnualEventKindError(s.to_string())),
        }
    }
}

/// Year-anchored template (birthday, name day, anniversary) that the
/// annual scheduler expands into dated [`EventDefinition`]s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnualEvent {
    pub id: String,
    pub family_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AnnualEventKind,
    pub date: MonthDay,
    #[serde(default)]
    pub notify_prior: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    #[default]
    Pending,
    Sent,
    Cancelled,
    Failed,
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationStatus::Pending => write!(f, "pending"),
            NotificationStatus::Sent => write!(f, "sent"),
            NotificationStatus::Cancelled => write!(f, "cancelled"),
            NotificationStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid notification status: {0}")]
pub struct ParseNotificationStatusError(String);

impl FromStr for NotificationStatus {
    type Err = ParseNotificationStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(NotificationStatus::Pending),
            "sent" => Ok(NotificationStatus::Sent),
            "cancelled" => Ok(NotificationStatus::Cancelled),
            "failed" => Ok(NotificationStatus::Failed),
            _ => Err(ParseNotificationStatusError(s.to_string())),
        }
    }
}

/// Queued delivery record, owned by the notification scheduler. The
/// delivery sweep only transitions `status` and bumps `attempts`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledNotification {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub scheduled_time: DateTime<Utc>,
    pub message: String,
    #[serde(default)]
    pub status: NotificationStatus,
    #[serde(default)]
    pub attempts: u32,
    pub max_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Read model for the external member directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_child: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
}
