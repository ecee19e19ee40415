//! IANA timezone validation and family-local time helpers. All stored
//! dates are naive family-local dates; these helpers are the only
//! place instants and zones meet.

use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Validate an IANA timezone name.
pub fn validate_timezone(timezone: &str) -> Result<(), CoreError> {
    parse_timezone(timezone).map(|_| ())
}

pub fn parse_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone).map_err(|_| CoreError::InvalidTimezone(timezone.to_string()))
}

/// The calendar date it currently is in `tz`.
pub fn local_today(tz: Tz) -> NaiveDate {
    local_date_at(Utc::now(), tz)
}

pub fn local_date_at(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// The wall-clock datetime `instant` reads as in `tz`.
pub fn local_datetime_at(instant: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

/// Convert a wall-clock datetime in `tz` back to an instant. Ambiguous
/// times (DST fall-back) take the earlier reading; nonexistent times
/// (spring-forward gap) shift forward an hour.
pub fn utc_from_local(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&local).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        None => {
            let shifted = local + chrono::Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&local))
        }
    }
}
