//! Collaborator interfaces the engine consumes.
//!
//! The engine owns no storage of its own. Anything implementing these traits
//! can back it; [`crate::db::ScheduleDb`] implements all of them over SQLite.

use super::day::DateToken;
use super::error::Result;
use super::types::{
    CourseRecord, EntryChanges, EntryQuery, NewScheduleEntry, ScheduleEntry, StudentRecord,
    TeacherRecord,
};

/// Persistent schedule storage.
pub trait ScheduleStore: Send + Sync {
    /// Entries matching every condition of `query`, newest first.
    fn find(&self, query: &EntryQuery) -> Result<Vec<ScheduleEntry>>;

    /// Number of entries matching `query`, ignoring `skip`/`limit`.
    fn count(&self, query: &EntryQuery) -> Result<u64>;

    fn find_by_id(&self, id: &str) -> Result<Option<ScheduleEntry>>;

    /// Assigns an id and creation time and writes the entry.
    fn insert(&self, entry: NewScheduleEntry) -> Result<ScheduleEntry>;

    /// Applies `changes` and returns the updated entry, or `None` if absent.
    fn update_by_id(&self, id: &str, changes: &EntryChanges) -> Result<Option<ScheduleEntry>>;

    /// Deletes the entry and returns what was removed, or `None` if absent.
    fn delete_by_id(&self, id: &str) -> Result<Option<ScheduleEntry>>;

    /// Entries of one class-section having a session on `date`, with each
    /// entry's session list cut down to the sessions on `date`. Newest first.
    fn find_projected(
        &self,
        class_name: &str,
        section: &str,
        date: &DateToken,
    ) -> Result<Vec<ScheduleEntry>>;
}

pub trait StudentDirectory: Send + Sync {
    fn find_student(&self, student_id: &str) -> Result<Option<StudentRecord>>;
}

pub trait ClassDirectory: Send + Sync {
    /// Headcount of one class-section.
    fn count_students(&self, class_name: &str, section: &str) -> Result<u64>;
}

pub trait TeacherDirectory: Send + Sync {
    fn find_teacher(&self, teacher_id: &str) -> Result<Option<TeacherRecord>>;
    fn find_teacher_by_email(&self, email: &str) -> Result<Option<TeacherRecord>>;
}

pub trait CourseDirectory: Send + Sync {
    fn find_course(&self, course_id: &str) -> Result<Option<CourseRecord>>;
}
