/// Per-teacher load computation
use super::day::DateToken;
use super::error::Result;
use super::store::{ClassDirectory, ScheduleStore};
use super::types::{EntryQuery, TeacherLoad};
use chrono::Weekday;
use std::collections::BTreeSet;

/// Computes how many students a teacher reaches and how many classes they
/// have today
pub struct TeacherLoadCalculator<'a> {
    store: &'a dyn ScheduleStore,
    classes: &'a dyn ClassDirectory,
}

impl<'a> TeacherLoadCalculator<'a> {
    pub fn new(store: &'a dyn ScheduleStore, classes: &'a dyn ClassDirectory) -> Self {
        Self { store, classes }
    }

    /// Computes the load of one teacher
    ///
    /// # Arguments
    /// * `teacher_id` - Teacher whose entries are aggregated
    /// * `today` - Weekday counted as "today"
    ///
    /// # Returns
    /// * `Ok(TeacherLoad)` - Headcount over distinct class-sections and
    ///   number of entries meeting today
    /// * `Err` - If the store or class directory fails
    pub fn compute(&self, teacher_id: &str, today: Weekday) -> Result<TeacherLoad> {
        let entries = self.store.find(&EntryQuery::teacher(teacher_id))?;

        // A class-section taught through several courses is counted once
        let class_sections: BTreeSet<(&str, &str)> = entries
            .iter()
            .map(|e| (e.class_name.as_str(), e.section.as_str()))
            .collect();

        let mut total_students = 0;
        for (class_name, section) in class_sections {
            total_students += self.classes.count_students(class_name, section)?;
        }

        let today = DateToken::Weekday(today);
        let today_classes = entries.iter().filter(|e| e.has_session_on(&today)).count() as u64;

        Ok(TeacherLoad {
            success: true,
            total_students,
            today_classes,
        })
    }
}
