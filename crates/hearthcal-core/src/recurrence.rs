use chrono::{Datelike, Days, NaiveDate};

use crate::models::{EventDefinition, RecurrenceType};

/// True for Gregorian leap years.
#[inline]
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in the given month.
#[inline]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => unreachable!("month out of range: {}", month),
    }
}

/// The date in `year`/`month` with the anchor day-of-month, clamped to
/// the last day of shorter months (day-31 anchor in February resolves
/// to Feb 28, or Feb 29 in leap years).
#[inline]
pub fn clamp_day_of_month(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.min(days_in_month(year, month));
    // Clamped day is always valid for the month.
    NaiveDate::from_ymd_opt(year, month, day).expect("clamped day-of-month is valid")
}

/// Weekday index with Sunday = 0, matching the stored
/// `recurrenceDays` contract.
#[inline]
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

#[derive(Debug, Clone)]
enum Pattern {
    Once,
    Daily,
    /// Bitmask over weekday indices 0-6.
    Weekly(u8),
    Monthly {
        anchor_day: u32,
    },
}

/// Lazy, finite sequence of the calendar dates at which a definition's
/// temporal pattern fires within a query range. Pure function of its
/// inputs: iterating twice over clones yields identical output.
#[derive(Debug, Clone)]
pub struct Occurrences {
    cursor: Option<NaiveDate>,
    last: NaiveDate,
    pattern: Pattern,
}

impl Occurrences {
    fn empty() -> Self {
        Self {
            cursor: None,
            last: NaiveDate::MIN,
            pattern: Pattern::Once,
        }
    }

    fn first_monthly_candidate(lo: NaiveDate, anchor_day: u32) -> NaiveDate {
        let candidate = clamp_day_of_month(lo.year(), lo.month(), anchor_day);
        if candidate >= lo {
            candidate
        } else {
            let (year, month) = next_month(lo.year(), lo.month());
            clamp_day_of_month(year, month, anchor_day)
        }
    }
}

#[inline]
fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            let current = self.cursor?;
            if current > self.last {
                self.cursor = None;
                return None;
            }
            match self.pattern {
                Pattern::Once => {
                    self.cursor = None;
                    return Some(current);
                }
                Pattern::Daily => {
                    self.cursor = current.checked_add_days(Days::new(1));
                    return Some(current);
                }
                Pattern::Weekly(mask) => {
                    self.cursor = current.checked_add_days(Days::new(1));
                    if mask & (1 << weekday_index(current)) != 0 {
                        return Some(current);
                    }
                }
                Pattern::Monthly { anchor_day } => {
                    let (year, month) = next_month(current.year(), current.month());
                    self.cursor = Some(clamp_day_of_month(year, month, anchor_day));
                    return Some(current);
                }
            }
        }
    }
}

/// Expands a definition's temporal fields over the inclusive query
/// range `[from, to]`.
///
/// - `none`: the single `date`, when it lies in range.
/// - `daily`: every date in `[max(startDate, from), min(endDate, to)]`.
/// - `weekly`: dates in the bounded range whose weekday index is in
///   `recurrenceDays`.
/// - `monthly`: one date per month sharing `startDate`'s day-of-month,
///   clamped to the last day of shorter months.
///
/// `endDate < startDate` or a missing `startDate` on a recurring
/// definition yields the empty sequence. No I/O, no hidden state.
pub fn occurrences_between(def: &EventDefinition, from: NaiveDate, to: NaiveDate) -> Occurrences {
    if from > to {
        return Occurrences::empty();
    }
    if def.recurrence_type == RecurrenceType::None {
        return match def.date {
            Some(date) if date >= from && date <= to => Occurrences {
                cursor: Some(date),
                last: date,
                pattern: Pattern::Once,
            },
            _ => Occurrences::empty(),
        };
    }

    let start = match def.start_date {
        Some(start) => start,
        None => return Occurrences::empty(),
    };
    if let Some(end) = def.end_date {
        if end < start {
            return Occurrences::empty();
        }
    }
    let lo = start.max(from);
    let hi = def.end_date.map_or(to, |end| end.min(to));
    if hi < lo {
        return Occurrences::empty();
    }

    match def.recurrence_type {
        RecurrenceType::Daily => Occurrences {
            cursor: Some(lo),
            last: hi,
            pattern: Pattern::Daily,
        },
        RecurrenceType::Weekly => {
            let mask = def
                .recurrence_days
                .iter()
                .filter(|d| **d <= 6)
                .fold(0u8, |mask, d| mask | (1 << d));
            if mask == 0 {
                return Occurrences::empty();
            }
            Occurrences {
                cursor: Some(lo),
                last: hi,
                pattern: Pattern::Weekly(mask),
            }
        }
        RecurrenceType::Monthly => {
            let anchor_day = start.day();
            Occurrences {
                cursor: Some(Occurrences::first_monthly_candidate(lo, anchor_day)),
                last: hi,
                pattern: Pattern::Monthly { anchor_day },
            }
        }
        RecurrenceType::None => unreachable!(),
    }
}

/// Collected convenience form of [`occurrences_between`].
pub fn occurrence_dates(def: &EventDefinition, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    occurrences_between(def, from, to).collect()
}
