/// Database row types for schedule data
use crate::schedule::{DateToken, Result, ScheduleError, Session, TimeOfDay};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct DbSchedule {
    pub schedule_id: String,
    pub teacher_id: String,
    pub course_id: String,
    pub class_name: String,
    pub section: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DbSession {
    pub position: i64,
    pub date_kind: String,  // "weekday" | "calendar"
    pub date_value: String, // "Monday" | "2024-09-02"
    pub start_min: i64,
    pub end_min: i64,
}

impl DbSession {
    pub fn from_session(position: usize, session: &Session) -> Self {
        Self {
            position: position as i64,
            date_kind: session.date.kind().to_string(),
            date_value: session.date.to_string(),
            start_min: i64::from(session.start_time.minutes()),
            end_min: i64::from(session.end_time.minutes()),
        }
    }

    pub fn into_session(self) -> Result<Session> {
        Ok(Session {
            date: DateToken::from_parts(&self.date_kind, &self.date_value)?,
            start_time: stored_time(self.start_min)?,
            end_time: stored_time(self.end_min)?,
        })
    }
}

fn stored_time(minutes: i64) -> Result<TimeOfDay> {
    u16::try_from(minutes)
        .ok()
        .and_then(TimeOfDay::from_minutes)
        .ok_or_else(|| ScheduleError::Storage {
            message: format!("stored time {minutes} is out of range"),
        })
}
