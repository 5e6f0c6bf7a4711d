//! Wall-clock times of day and interval overlap.

use super::error::{Result, ScheduleError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

const MINUTES_PER_DAY: u16 = 24 * 60;

// Static patterns for parsing - compiled once
static TWELVE_HOUR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*([AP])\.?M\.?$").unwrap());
static TWENTY_FOUR_HOUR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap());

/// A local time of day, stored as minutes since midnight.
///
/// Accepts both `9:00 AM` / `12:30 pm` and `09:00` / `13:30` when parsed.
/// Always displayed in 24-hour `HH:MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Builds a time from minutes since midnight.
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self(hour * 60 + minute))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl FromStr for TimeOfDay {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let bad = || ScheduleError::invalid(format!("unrecognized time '{s}'"));

        if let Some(caps) = TWELVE_HOUR_REGEX.captures(trimmed) {
            let hour: u16 = caps[1].parse().map_err(|_| bad())?;
            let minute: u16 = caps[2].parse().map_err(|_| bad())?;
            if !(1..=12).contains(&hour) || minute > 59 {
                return Err(bad());
            }
            // 12 AM is midnight, 12 PM is noon
            let hour = match (&caps[3].to_ascii_uppercase()[..], hour) {
                ("A", 12) => 0,
                ("A", h) => h,
                ("P", 12) => 12,
                (_, h) => h + 12,
            };
            return Self::from_hm(hour, minute).ok_or_else(bad);
        }

        if let Some(caps) = TWENTY_FOUR_HOUR_REGEX.captures(trimmed) {
            let hour: u16 = caps[1].parse().map_err(|_| bad())?;
            let minute: u16 = caps[2].parse().map_err(|_| bad())?;
            return Self::from_hm(hour, minute).ok_or_else(bad);
        }

        Err(bad())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Half-open interval overlap: `[s1, e1)` and `[s2, e2)` overlap iff
/// `s1 < e2 && s2 < e1`. Touching boundaries do not overlap.
pub(crate) fn intervals_overlap(
    s1: TimeOfDay,
    e1: TimeOfDay,
    s2: TimeOfDay,
    e2: TimeOfDay,
) -> bool {
    s1 < e2 && s2 < e1
}
