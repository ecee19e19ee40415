use anyhow::{anyhow, Result};
use chrono::NaiveTime;

/// Parses a "HH:MM" wall-clock time.
pub fn parse_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| anyhow!("Invalid time '{}'. Use HH:MM, e.g. 08:30", raw))
}

/// Parses a comma-separated weekday list (sun,mon,...,sat) into the
/// stored indices, Sunday = 0.
pub fn parse_weekdays(raw: &str) -> Result<Vec<u8>> {
    let mut days = Vec::new();
    for part in raw.split(',') {
        let day = match part.trim().to_lowercase().as_str() {
            "sun" | "sunday" => 0,
            "mon" | "monday" => 1,
            "tue" | "tuesday" => 2,
            "wed" | "wednesday" => 3,
            "thu" | "thursday" => 4,
            "fri" | "friday" => 5,
            "sat" | "saturday" => 6,
            other => return Err(anyhow!("Unknown weekday '{}'", other)),
        };
        if !days.contains(&day) {
            days.push(day);
        }
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_parsing() {
        assert_eq!(parse_weekdays("mon,wed").unwrap(), vec![1, 3]);
        assert_eq!(parse_weekdays("Sun, sat").unwrap(), vec![0, 6]);
        assert_eq!(parse_weekdays("mon,mon").unwrap(), vec![1]);
        assert!(parse_weekdays("mon,funday").is_err());
    }

    #[test]
    fn time_parsing() {
        assert_eq!(
            parse_time("08:30").unwrap(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap()
        );
        assert!(parse_time("8.30").is_err());
        assert!(parse_time("25:00").is_err());
    }
}
