//! Teacher, classroom and course conflict detection.

use super::day::DateToken;
use super::error::Result;
use super::store::ScheduleStore;
use super::time::TimeOfDay;
use super::types::{EntryQuery, NewScheduleEntry, ScheduleEntry, Session};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The resource dimension along which two sessions collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    Teacher,
    Classroom,
    Course,
}

impl ConflictKind {
    /// Order in which conflict classes are checked.
    pub const CHECK_ORDER: [ConflictKind; 3] =
        [ConflictKind::Teacher, ConflictKind::Classroom, ConflictKind::Course];
}

/// A proposed session collided with an accepted one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub kind: ConflictKind,
    pub date: DateToken,
    /// Window of the already-accepted session
    pub existing_start: TimeOfDay,
    pub existing_end: TimeOfDay,
    /// Window that was proposed
    pub proposed_start: TimeOfDay,
    pub proposed_end: TimeOfDay,
    /// Id of the accepted entry that holds the resource
    pub existing_entry_id: String,
    pub class_name: String,
    pub section: String,
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ConflictKind::Teacher => write!(
                f,
                "Teacher conflict: Teacher already has a class on {} between {} and {}",
                self.date, self.existing_start, self.existing_end
            ),
            ConflictKind::Classroom => write!(
                f,
                "Classroom conflict: Class {}-{} already has a schedule on {} between {} and {}",
                self.class_name, self.section, self.date, self.existing_start, self.existing_end
            ),
            ConflictKind::Course => write!(
                f,
                "Course conflict: This course already has a schedule on {} between {} and {}",
                self.date, self.existing_start, self.existing_end
            ),
        }
    }
}

/// First accepted session in `existing` that collides with `proposed`.
pub(crate) fn find_collision<'a>(
    existing: &'a [ScheduleEntry],
    proposed: &Session,
) -> Option<(&'a ScheduleEntry, &'a Session)> {
    existing.iter().find_map(|entry| {
        entry
            .days
            .iter()
            .find(|s| s.collides_with(proposed))
            .map(|s| (entry, s))
    })
}

/// Checks a proposed entry against everything already in the store.
pub struct ConflictChecker<'a> {
    store: &'a dyn ScheduleStore,
}

impl<'a> ConflictChecker<'a> {
    pub fn new(store: &'a dyn ScheduleStore) -> Self {
        Self { store }
    }

    /// Returns the first conflict found, or `None` if the entry can be accepted.
    ///
    /// Runs one pass per conflict class (teacher, then classroom, then course),
    /// each pass visiting the proposed sessions in order. Stops at the first hit.
    pub fn first_conflict(&self, proposed: &NewScheduleEntry) -> Result<Option<Conflict>> {
        for kind in ConflictKind::CHECK_ORDER {
            for session in &proposed.days {
                let query = self.query_for(kind, proposed).on(session.date);
                let existing = self.store.find(&query)?;
                debug!(
                    "{:?} check on {}: {} candidate entries",
                    kind,
                    session.date,
                    existing.len()
                );

                if let Some((entry, hit)) = find_collision(&existing, session) {
                    return Ok(Some(Conflict {
                        kind,
                        date: session.date,
                        existing_start: hit.start_time,
                        existing_end: hit.end_time,
                        proposed_start: session.start_time,
                        proposed_end: session.end_time,
                        existing_entry_id: entry.id.clone(),
                        class_name: proposed.class_name.clone(),
                        section: proposed.section.clone(),
                    }));
                }
            }
        }

        Ok(None)
    }

    fn query_for(&self, kind: ConflictKind, proposed: &NewScheduleEntry) -> EntryQuery {
        match kind {
            ConflictKind::Teacher => EntryQuery::teacher(&proposed.teacher_id),
            ConflictKind::Classroom => {
                EntryQuery::classroom(&proposed.class_name, &proposed.section)
            }
            ConflictKind::Course => EntryQuery::course(&proposed.course_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Utc, Weekday};

    fn session(day: Weekday, start: &str, end: &str) -> Session {
        Session {
            date: DateToken::Weekday(day),
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
        }
    }

    fn entry(id: &str, days: Vec<Session>) -> ScheduleEntry {
        ScheduleEntry {
            id: id.to_string(),
            teacher_id: "T".to_string(),
            course_id: "A".to_string(),
            class_name: "9".to_string(),
            section: "A".to_string(),
            days,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_find_collision_requires_same_day() {
        let existing = vec![entry("e1", vec![session(Weekday::Mon, "09:00", "10:30")])];

        let hit = find_collision(&existing, &session(Weekday::Mon, "10:00", "11:00"));
        assert_eq!(hit.map(|(e, _)| e.id.as_str()), Some("e1"));

        assert!(find_collision(&existing, &session(Weekday::Tue, "10:00", "11:00")).is_none());
        assert!(find_collision(&existing, &session(Weekday::Mon, "10:30", "11:30")).is_none());
    }

    #[test]
    fn test_find_collision_reports_colliding_session() {
        let existing = vec![entry(
            "e1",
            vec![
                session(Weekday::Mon, "08:00", "09:00"),
                session(Weekday::Wed, "13:00", "14:00"),
            ],
        )];

        let (_, hit) = find_collision(&existing, &session(Weekday::Wed, "1:30 PM", "2:30 PM"))
            .expect("collision");
        assert_eq!(hit.start_time.to_string(), "13:00");
    }

    #[test]
    fn test_conflict_messages() {
        let conflict = Conflict {
            kind: ConflictKind::Classroom,
            date: DateToken::Weekday(Weekday::Mon),
            existing_start: "09:00".parse().unwrap(),
            existing_end: "10:30".parse().unwrap(),
            proposed_start: "09:30".parse().unwrap(),
            proposed_end: "10:00".parse().unwrap(),
            existing_entry_id: "e1".to_string(),
            class_name: "9".to_string(),
            section: "A".to_string(),
        };
        assert_eq!(
            conflict.to_string(),
            "Classroom conflict: Class 9-A already has a schedule on Monday between 09:00 and 10:30"
        );

        let teacher = Conflict {
            kind: ConflictKind::Teacher,
            ..conflict
        };
        assert!(teacher.to_string().starts_with("Teacher conflict:"));
    }
}
