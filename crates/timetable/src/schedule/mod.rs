//! Recurring weekly class-schedule engine.
//!
//! Accepts or rejects proposed schedules based on teacher, classroom and
//! course overlap, answers day- and resource-filtered queries, and computes
//! per-teacher load.

mod config;
mod conflict;
mod day;
mod error;
mod load;
mod locks;
mod store;
mod time;
mod types;

pub use config::EngineConfig;
pub use conflict::{Conflict, ConflictChecker, ConflictKind};
pub use day::{resolve_day_filter, Clock, DateToken, FixedClock, LocalClock, RelativeDay};
pub use error::{RecordKind, Result, ScheduleError};
pub use load::TeacherLoadCalculator;
pub use locks::{ResourceKey, ResourceLocks};
pub use store::{
    ClassDirectory, CourseDirectory, ScheduleStore, StudentDirectory, TeacherDirectory,
};
pub use time::TimeOfDay;
pub use types::*;

use crate::db::ScheduleDb;
use chrono::Datelike;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of [`ScheduleEngine::create_schedule`]. A conflict is an ordinary
/// negative result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(ScheduleEntry),
    Rejected(Conflict),
}

impl CreateOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

/// Collaborators the engine consumes.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn ScheduleStore>,
    pub students: Arc<dyn StudentDirectory>,
    pub classes: Arc<dyn ClassDirectory>,
    pub teachers: Arc<dyn TeacherDirectory>,
    pub courses: Arc<dyn CourseDirectory>,
}

impl Collaborators {
    /// Uses one SQLite database for every collaborator.
    pub fn from_db(db: Arc<ScheduleDb>) -> Self {
        Self {
            store: db.clone(),
            students: db.clone(),
            classes: db.clone(),
            teachers: db.clone(),
            courses: db,
        }
    }
}

pub struct ScheduleEngine {
    deps: Collaborators,
    clock: Arc<dyn Clock>,
    locks: ResourceLocks,
    config: EngineConfig,
}

impl ScheduleEngine {
    /// Creates an engine on the local calendar.
    pub fn new(deps: Collaborators, config: EngineConfig) -> Self {
        Self {
            deps,
            clock: Arc::new(LocalClock),
            locks: ResourceLocks::new(),
            config,
        }
    }

    /// Creates an engine backed entirely by `db`.
    pub fn from_db(db: Arc<ScheduleDb>, config: EngineConfig) -> Self {
        Self::new(Collaborators::from_db(db), config)
    }

    /// Replaces the clock used to resolve `today`/`tomorrow`/`yesterday`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates and, when no teacher, classroom or course conflict exists,
    /// stores a new schedule entry.
    ///
    /// Creation is all-or-nothing: the first conflict on any day rejects the
    /// whole entry and nothing is written.
    pub fn create_schedule(&self, input: &ScheduleInput) -> Result<CreateOutcome> {
        let proposed = input.validate()?;

        if self.config.serialize_creates {
            let keys = proposed.resource_keys();
            self.locks.with_locked(&keys, || self.check_and_insert(proposed))
        } else {
            self.check_and_insert(proposed)
        }
    }

    fn check_and_insert(&self, proposed: NewScheduleEntry) -> Result<CreateOutcome> {
        let checker = ConflictChecker::new(self.deps.store.as_ref());
        if let Some(conflict) = checker.first_conflict(&proposed)? {
            warn!(
                "Rejected schedule for teacher {} / class {}-{}: {}",
                proposed.teacher_id, proposed.class_name, proposed.section, conflict
            );
            return Ok(CreateOutcome::Rejected(conflict));
        }

        let entry = self.deps.store.insert(proposed)?;
        info!(
            "Created schedule {} ({} sessions) for teacher {}",
            entry.id,
            entry.days.len(),
            entry.teacher_id
        );
        Ok(CreateOutcome::Created(entry))
    }

    /// Lists entries matching `filter`, newest first.
    ///
    /// With `courses_only` set the whole match set is returned unpaginated
    /// with only course references expanded; otherwise one page is returned
    /// with teacher and course references expanded.
    pub fn find_all(&self, filter: &ScheduleFilter) -> Result<Page> {
        let mut query = EntryQuery {
            class_name: non_blank(&filter.class_name),
            section: non_blank(&filter.section),
            ..Default::default()
        };

        if let Some(who) = non_blank(&filter.email_or_teacher_id) {
            if who.contains('@') {
                match self.deps.teachers.find_teacher_by_email(&who)? {
                    Some(teacher) => query.teacher_id = Some(teacher.id),
                    None => {
                        debug!("No teacher with email {}, empty listing", who);
                        return Ok(Page {
                            entries: Vec::new(),
                            total: 0,
                        });
                    }
                }
            } else {
                query.teacher_id = Some(who);
            }
        }

        if let Some(teacher_id) = non_blank(&filter.teacher_id) {
            match &query.teacher_id {
                Some(resolved) if *resolved != teacher_id => {
                    debug!(
                        "Teacher filter {} disagrees with {}, empty listing",
                        teacher_id, resolved
                    );
                    return Ok(Page {
                        entries: Vec::new(),
                        total: 0,
                    });
                }
                _ => query.teacher_id = Some(teacher_id),
            }
        }

        if let Some(raw) = non_blank(&filter.date) {
            query.date = Some(resolve_day_filter(&raw, self.clock.today())?);
        }

        let total = self.deps.store.count(&query)?;

        if filter.courses_only {
            let entries = self
                .deps
                .store
                .find(&query)?
                .into_iter()
                .map(|e| self.expand(e, false))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Page { entries, total });
        }

        let page = filter.page.unwrap_or(1);
        let limit = filter.limit.unwrap_or(self.config.default_page_limit);
        if page < 1 || limit < 1 {
            return Err(ScheduleError::invalid("page and limit must be at least 1"));
        }
        let limit = limit.min(self.config.max_page_limit) as usize;
        query.skip = (page as usize - 1) * limit;
        query.limit = Some(limit);

        let entries = self
            .deps
            .store
            .find(&query)?
            .into_iter()
            .map(|e| self.expand(e, true))
            .collect::<Result<Vec<_>>>()?;

        Ok(Page { entries, total })
    }

    /// Looks up one entry with teacher and course expanded.
    pub fn find_by_id(&self, id: &str) -> Result<ExpandedEntry> {
        match self.deps.store.find_by_id(id)? {
            Some(entry) => self.expand(entry, true),
            None => {
                warn!("Schedule not found: {}", id);
                Err(ScheduleError::schedule_not_found(id))
            }
        }
    }

    /// Entries for a student's class-section on the resolved day, each cut
    /// down to the sessions on that day.
    ///
    /// Entries whose teacher or course can't be resolved are left out.
    pub fn find_by_student_and_date(
        &self,
        student_id: &str,
        date: &str,
    ) -> Result<Vec<ExpandedEntry>> {
        let student = self
            .deps
            .students
            .find_student(student_id)?
            .ok_or_else(|| ScheduleError::student_not_found(student_id))?;

        let section = if self.config.capitalize_student_section {
            capitalize_first_letter(&student.section)
        } else {
            student.section.clone()
        };
        let day = resolve_day_filter(date, self.clock.today())?;
        debug!(
            "Student {} -> class {}-{} on {}",
            student_id, student.class_name, section, day
        );

        let mut result = Vec::new();
        for entry in self
            .deps
            .store
            .find_projected(&student.class_name, &section, &day)?
        {
            let expanded = self.expand(entry, true)?;
            if expanded.teacher.is_none() || expanded.course.is_none() {
                debug!("Dropping schedule {} with unresolved references", expanded.entry.id);
                continue;
            }
            result.push(expanded);
        }

        Ok(result)
    }

    /// Headcount over the teacher's distinct class-sections and the number
    /// of their entries meeting today.
    ///
    /// Never fails: collaborator errors are logged and reported as a zeroed
    /// summary with `success: false`.
    pub fn teacher_load_summary(&self, teacher_id: &str) -> TeacherLoad {
        let calculator =
            TeacherLoadCalculator::new(self.deps.store.as_ref(), self.deps.classes.as_ref());

        match calculator.compute(teacher_id, self.clock.today().weekday()) {
            Ok(load) => load,
            Err(e) => {
                error!("Failed to compute load for teacher {}: {}", teacher_id, e);
                TeacherLoad::failed()
            }
        }
    }

    /// Replaces the given fields of an entry.
    ///
    /// Conflict checks are not re-run, so an update can reintroduce an
    /// overlap that creation would have rejected.
    pub fn update_schedule(&self, id: &str, patch: &SchedulePatch) -> Result<ScheduleEntry> {
        let changes = patch.validate()?;
        match self.deps.store.update_by_id(id, &changes)? {
            Some(entry) => {
                info!("Updated schedule {}", id);
                Ok(entry)
            }
            None => {
                warn!("Schedule not found for update: {}", id);
                Err(ScheduleError::schedule_not_found(id))
            }
        }
    }

    /// Physically deletes an entry and returns it.
    pub fn remove_schedule(&self, id: &str) -> Result<ScheduleEntry> {
        match self.deps.store.delete_by_id(id)? {
            Some(entry) => {
                info!("Removed schedule {}", id);
                Ok(entry)
            }
            None => {
                warn!("Schedule not found for removal: {}", id);
                Err(ScheduleError::schedule_not_found(id))
            }
        }
    }

    /// Drops lock entries for resources nobody is creating against.
    pub fn prune_locks(&self) {
        self.locks.prune();
    }

    fn expand(&self, entry: ScheduleEntry, with_teacher: bool) -> Result<ExpandedEntry> {
        let teacher = if with_teacher {
            self.deps.teachers.find_teacher(&entry.teacher_id)?
        } else {
            None
        };
        let course = self.deps.courses.find_course(&entry.course_id)?;
        Ok(ExpandedEntry {
            entry,
            teacher,
            course,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn capitalize_first_letter(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize_first_letter() {
        assert_eq!(capitalize_first_letter("a"), "A");
        assert_eq!(capitalize_first_letter("blue"), "Blue");
        assert_eq!(capitalize_first_letter("B"), "B");
        assert_eq!(capitalize_first_letter(""), "");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(&Some("  9 ".to_string())), Some("9".to_string()));
        assert_eq!(non_blank(&Some("   ".to_string())), None);
        assert_eq!(non_blank(&None), None);
    }
}
