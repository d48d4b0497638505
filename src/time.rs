//! Time zone plumbing for appointments.
//!
//! Three zones are in play: storage is always UTC, business-hours rules are
//! evaluated in a fixed organisation zone, and the list/form show times in the
//! viewer's zone.

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Text layout of timestamps in the database. Seconds precision keeps the
/// column lexicographically comparable.
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Layout accepted and shown by the edit forms.
pub const INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn to_storage(instant: DateTime<Utc>) -> String {
    instant.format(STORAGE_FORMAT).to_string()
}

pub fn from_storage(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, STORAGE_FORMAT).map(|naive| naive.and_utc())
}

/// Zone used to render instants for the person at the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    Local,
    Named(Tz),
}

impl DisplayZone {
    pub fn to_display(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            DisplayZone::Local => instant.with_timezone(&Local).naive_local(),
            DisplayZone::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }

    /// Interpret a wall-clock value typed by the user. Ambiguous values (DST
    /// fall-back) resolve to the earlier instant; values inside a DST gap do
    /// not exist and yield `None`.
    pub fn from_display(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            DisplayZone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            DisplayZone::Named(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    pub fn format(&self, instant: DateTime<Utc>) -> String {
        self.to_display(instant).format(INPUT_FORMAT).to_string()
    }

    pub fn parse(&self, input: &str) -> Option<DateTime<Utc>> {
        let naive = NaiveDateTime::parse_from_str(input.trim(), INPUT_FORMAT).ok()?;
        self.from_display(naive)
    }

    pub fn label(&self) -> String {
        match self {
            DisplayZone::Local => {
                let offset = Local::now().offset().fix();
                format!("local {offset}")
            }
            DisplayZone::Named(tz) => tz.name().to_string(),
        }
    }
}

/// Opening window in the business zone. The closing minute itself is still
/// inside the window; anything past it is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub zone: Tz,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl BusinessHours {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let local = instant.with_timezone(&self.zone).time();
        local >= self.open && local <= self.close
    }

    pub fn describe(&self) -> String {
        format!(
            "{}-{} {}",
            self.open.format("%H:%M"),
            self.close.format("%H:%M"),
            self.zone.name()
        )
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            zone: chrono_tz::US::Eastern,
            open: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or_default(),
        }
    }
}
