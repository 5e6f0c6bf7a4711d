//! Date tokens and relative-day resolution.

use super::error::{Result, ScheduleError};
use chrono::{Datelike, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// The day a session falls on.
///
/// Recurring weekly sessions carry a weekday; one-off sessions carry a
/// calendar date. The two kinds never match each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DateToken {
    Weekday(Weekday),
    Calendar(NaiveDate),
}

impl DateToken {
    /// Storage discriminator, `"weekday"` or `"calendar"`.
    pub fn kind(&self) -> &'static str {
        match self {
            DateToken::Weekday(_) => "weekday",
            DateToken::Calendar(_) => "calendar",
        }
    }

    /// Rebuilds a token from its stored kind and value.
    pub fn from_parts(kind: &str, value: &str) -> Result<Self> {
        let token: DateToken = value.parse()?;
        if token.kind() != kind {
            return Err(ScheduleError::Storage {
                message: format!("date '{value}' stored with kind '{kind}'"),
            });
        }
        Ok(token)
    }
}

impl FromStr for DateToken {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(day) = trimmed.parse::<Weekday>() {
            return Ok(DateToken::Weekday(day));
        }
        NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT)
            .map(DateToken::Calendar)
            .map_err(|_| {
                ScheduleError::invalid(format!(
                    "'{s}' is neither a weekday name nor a YYYY-MM-DD date"
                ))
            })
    }
}

impl TryFrom<String> for DateToken {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DateToken> for String {
    fn from(value: DateToken) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for DateToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateToken::Weekday(day) => f.write_str(weekday_name(*day)),
            DateToken::Calendar(date) => write!(f, "{}", date.format(ISO_DATE_FORMAT)),
        }
    }
}

/// English display name, e.g. `"Monday"`.
pub(crate) fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// `today`, `tomorrow` or `yesterday`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDay {
    Today,
    Tomorrow,
    Yesterday,
}

impl RelativeDay {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Some(RelativeDay::Today),
            "tomorrow" => Some(RelativeDay::Tomorrow),
            "yesterday" => Some(RelativeDay::Yesterday),
            _ => None,
        }
    }

    pub fn weekday_from(self, today: NaiveDate) -> Weekday {
        let day = today.weekday();
        match self {
            RelativeDay::Today => day,
            RelativeDay::Tomorrow => day.succ(),
            RelativeDay::Yesterday => day.pred(),
        }
    }
}

/// Resolves a caller-supplied day filter.
///
/// Relative tokens become the weekday they land on relative to `today`;
/// anything else must be an explicit weekday name or ISO date.
pub fn resolve_day_filter(raw: &str, today: NaiveDate) -> Result<DateToken> {
    match RelativeDay::parse(raw) {
        Some(relative) => Ok(DateToken::Weekday(relative.weekday_from(today))),
        None => raw.parse(),
    }
}

/// Source of "today" for relative-day resolution.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The local civil calendar of the running process.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
