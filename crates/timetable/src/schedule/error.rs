//! Error types for the scheduling subsystem.
//!
//! A schedule that collides with an existing one is not an error; see
//! [`super::CreateOutcome::Rejected`].

use thiserror::Error;

/// What kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Schedule,
    Student,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Schedule => write!(f, "Schedule"),
            RecordKind::Student => write!(f, "Student"),
        }
    }
}

/// Errors that can occur during scheduling operations.
#[derive(Debug, Error, Clone)]
pub enum ScheduleError {
    /// The requested schedule or referenced student does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    /// Malformed time string, empty day list, inverted interval, etc.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// The schedule store failed
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// A student/class/teacher/course directory failed
    #[error("Directory error: {message}")]
    Directory { message: String },

    /// Configuration could not be read or parsed
    #[error("Config error: {message}")]
    Config { message: String },
}

impl ScheduleError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ScheduleError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn schedule_not_found(id: &str) -> Self {
        ScheduleError::NotFound {
            kind: RecordKind::Schedule,
            id: id.to_string(),
        }
    }

    pub fn student_not_found(id: &str) -> Self {
        ScheduleError::NotFound {
            kind: RecordKind::Student,
            id: id.to_string(),
        }
    }

    /// Returns true if this error comes from a collaborator rather than the
    /// caller's request.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            ScheduleError::Storage { .. } | ScheduleError::Directory { .. }
        )
    }

    /// Returns true if the requested record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScheduleError::NotFound { .. })
    }
}

impl From<rusqlite::Error> for ScheduleError {
    fn from(err: rusqlite::Error) -> Self {
        ScheduleError::Storage {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ScheduleError {
    fn from(err: serde_json::Error) -> Self {
        ScheduleError::Config {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
