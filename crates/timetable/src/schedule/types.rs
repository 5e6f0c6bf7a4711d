/// Types for schedule entries, requests and query results
use super::day::DateToken;
use super::error::{Result, ScheduleError};
use super::locks::ResourceKey;
use super::time::{intervals_overlap, TimeOfDay};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One weekly meeting of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub date: DateToken,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

impl Session {
    /// True if both sessions fall on the same date token and their
    /// half-open intervals intersect.
    pub fn collides_with(&self, other: &Session) -> bool {
        self.date == other.date
            && intervals_overlap(
                self.start_time,
                self.end_time,
                other.start_time,
                other.end_time,
            )
    }
}

/// A stored schedule entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: String,
    pub teacher_id: String,
    pub course_id: String,
    pub class_name: String,
    pub section: String,
    pub days: Vec<Session>,
    pub created_at: DateTime<Utc>,
}

impl ScheduleEntry {
    pub fn has_session_on(&self, date: &DateToken) -> bool {
        self.days.iter().any(|s| &s.date == date)
    }
}

/// A validated entry waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScheduleEntry {
    pub teacher_id: String,
    pub course_id: String,
    pub class_name: String,
    pub section: String,
    pub days: Vec<Session>,
}

impl NewScheduleEntry {
    /// The resources this entry occupies, one per conflict class.
    pub fn resource_keys(&self) -> Vec<ResourceKey> {
        vec![
            ResourceKey::Teacher(self.teacher_id.clone()),
            ResourceKey::Classroom {
                class_name: self.class_name.clone(),
                section: self.section.clone(),
            },
            ResourceKey::Course(self.course_id.clone()),
        ]
    }
}

/// A session as supplied by a caller, times not yet parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInput {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

impl SessionInput {
    pub fn new(date: &str, start_time: &str, end_time: &str) -> Self {
        Self {
            date: date.to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        }
    }

    pub fn validate(&self) -> Result<Session> {
        let session = Session {
            date: self.date.parse()?,
            start_time: self.start_time.parse()?,
            end_time: self.end_time.parse()?,
        };
        if session.start_time >= session.end_time {
            return Err(ScheduleError::invalid(format!(
                "session on {} ends ({}) before it starts ({})",
                session.date, session.end_time, session.start_time
            )));
        }
        Ok(session)
    }
}

/// Request to create a schedule entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInput {
    pub teacher_id: String,
    pub course_id: String,
    pub class_name: String,
    pub section: String,
    /// Accepts the legacy `dayOfWeek` key as well
    #[serde(alias = "dayOfWeek")]
    pub days: Vec<SessionInput>,
}

impl ScheduleInput {
    /// Checks every field and parses every session.
    pub fn validate(&self) -> Result<NewScheduleEntry> {
        require_non_empty("teacherId", &self.teacher_id)?;
        require_non_empty("courseId", &self.course_id)?;
        require_non_empty("className", &self.class_name)?;
        require_non_empty("section", &self.section)?;

        Ok(NewScheduleEntry {
            teacher_id: self.teacher_id.trim().to_string(),
            course_id: self.course_id.trim().to_string(),
            class_name: self.class_name.trim().to_string(),
            section: self.section.trim().to_string(),
            days: validate_sessions(&self.days)?,
        })
    }
}

/// Replace-by-id update. Absent fields keep their stored value; `days`
/// replaces the whole session list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulePatch {
    pub teacher_id: Option<String>,
    pub course_id: Option<String>,
    pub class_name: Option<String>,
    pub section: Option<String>,
    #[serde(alias = "dayOfWeek")]
    pub days: Option<Vec<SessionInput>>,
}

impl SchedulePatch {
    pub fn validate(&self) -> Result<EntryChanges> {
        let field = |name: &str, value: &Option<String>| -> Result<Option<String>> {
            match value {
                Some(v) => {
                    require_non_empty(name, v)?;
                    Ok(Some(v.trim().to_string()))
                }
                None => Ok(None),
            }
        };

        Ok(EntryChanges {
            teacher_id: field("teacherId", &self.teacher_id)?,
            course_id: field("courseId", &self.course_id)?,
            class_name: field("className", &self.class_name)?,
            section: field("section", &self.section)?,
            days: self.days.as_deref().map(validate_sessions).transpose()?,
        })
    }
}

/// A validated patch, as handed to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryChanges {
    pub teacher_id: Option<String>,
    pub course_id: Option<String>,
    pub class_name: Option<String>,
    pub section: Option<String>,
    pub days: Option<Vec<Session>>,
}

fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ScheduleError::invalid(format!("{name} must not be empty")));
    }
    Ok(())
}

fn validate_sessions(inputs: &[SessionInput]) -> Result<Vec<Session>> {
    if inputs.is_empty() {
        return Err(ScheduleError::invalid("at least one session day is required"));
    }

    let sessions = inputs
        .iter()
        .map(SessionInput::validate)
        .collect::<Result<Vec<_>>>()?;

    // An entry must not collide with itself
    for (i, a) in sessions.iter().enumerate() {
        if let Some(b) = sessions[i + 1..].iter().find(|b| a.collides_with(b)) {
            return Err(ScheduleError::invalid(format!(
                "sessions on {} overlap each other ({}-{} and {}-{})",
                a.date, a.start_time, a.end_time, b.start_time, b.end_time
            )));
        }
    }

    Ok(sessions)
}

/// Caller-facing listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleFilter {
    pub class_name: Option<String>,
    pub section: Option<String>,
    /// A teacher id, or a teacher's email address when it contains `@`
    #[serde(alias = "email")]
    pub email_or_teacher_id: Option<String>,
    /// Teacher id; when given together with an email both must name the
    /// same teacher
    pub teacher_id: Option<String>,
    /// `today`, `tomorrow`, `yesterday`, a weekday name or an ISO date
    pub date: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Return every match, unpaginated, with only courses expanded
    #[serde(alias = "courseId")]
    pub courses_only: bool,
}

/// Store-level query. All present conditions must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryQuery {
    pub teacher_id: Option<String>,
    pub course_id: Option<String>,
    pub class_name: Option<String>,
    pub section: Option<String>,
    /// At least one session on this token
    pub date: Option<DateToken>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl EntryQuery {
    pub fn teacher(teacher_id: &str) -> Self {
        Self {
            teacher_id: Some(teacher_id.to_string()),
            ..Default::default()
        }
    }

    pub fn classroom(class_name: &str, section: &str) -> Self {
        Self {
            class_name: Some(class_name.to_string()),
            section: Some(section.to_string()),
            ..Default::default()
        }
    }

    pub fn course(course_id: &str) -> Self {
        Self {
            course_id: Some(course_id.to_string()),
            ..Default::default()
        }
    }

    pub fn on(mut self, date: DateToken) -> Self {
        self.date = Some(date);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRecord {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    pub id: String,
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub class_name: String,
    pub section: String,
}

/// A schedule entry with its teacher and course references resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedEntry {
    #[serde(flatten)]
    pub entry: ScheduleEntry,
    pub teacher: Option<TeacherRecord>,
    pub course: Option<CourseRecord>,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(rename = "data")]
    pub entries: Vec<ExpandedEntry>,
    /// Matches before pagination
    pub total: u64,
}

/// Per-teacher load, degraded to zeros with `success: false` on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherLoad {
    pub success: bool,
    pub total_students: u64,
    pub today_classes: u64,
}

impl TeacherLoad {
    pub fn failed() -> Self {
        Self {
            success: false,
            total_students: 0,
            today_classes: 0,
        }
    }
}
