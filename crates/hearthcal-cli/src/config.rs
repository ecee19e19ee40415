use chrono::NaiveDate;
use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file.
    pub database_path: String,
    /// The family every command operates on.
    pub family_id: String,
    /// Actor recorded in lastModifiedBy on every write.
    pub actor: String,
    /// Family timezone (IANA format).
    pub timezone: String,
    /// Default listing window in days.
    pub lookahead_days: u32,
    /// Records handled per delivery sweep.
    pub sweep_batch_size: usize,
    /// Premium entitlement; gates annual-event lead reminders.
    pub premium: bool,
    /// Family members, also used as notification recipients.
    pub members: Vec<MemberConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MemberConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_child: bool,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub color: Option<String>,
    /// Registered push device tokens.
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default = "default_true")]
    pub reminders_enabled: bool,
    /// "HH:MM" quiet-hours bounds; both or neither.
    #[serde(default)]
    pub quiet_start: Option<String>,
    #[serde(default)]
    pub quiet_end: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "hearthcal.db".to_string(),
            family_id: "default".to_string(),
            actor: "cli".to_string(),
            timezone: detect_system_timezone(),
            lookahead_days: 30,
            sweep_batch_size: 50,
            premium: false,
            members: Vec::new(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("hearthcal.toml"))
            .merge(Env::prefixed("HEARTHCAL_"))
            .extract()
    }
}

/// Validates that a timezone string is a valid IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<Tz, String> {
    Tz::from_str(timezone).map_err(|_| {
        format!(
            "Invalid timezone: '{}'. Use IANA timezone names like 'Europe/Stockholm'",
            timezone
        )
    })
}

/// Detects the system timezone, falling back to UTC if detection fails
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    if let Ok(tz) = iana_time_zone::get_timezone() {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    "UTC".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert!(validate_timezone(&config.timezone).is_ok());
        assert_eq!(config.lookahead_days, 30);
        assert!(!config.database_path.is_empty());
    }

    #[test]
    fn invalid_timezone_is_rejected() {
        assert!(validate_timezone("Not/A_Zone").is_err());
        assert!(validate_timezone("Europe/Stockholm").is_ok());
    }
}
