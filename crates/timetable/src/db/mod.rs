/// Database module for schedule entries and the directories they reference

mod types;

pub use types::{DbSchedule, DbSession};

use crate::schedule::{
    ClassDirectory, CourseDirectory, CourseRecord, DateToken, EntryChanges, EntryQuery,
    NewScheduleEntry, Result, ScheduleEntry, ScheduleError, ScheduleStore, Session,
    StudentDirectory, StudentRecord, TeacherDirectory, TeacherRecord,
};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_schedules.sql");

const SCHEDULE_COLUMNS: &str =
    "s.schedule_id, s.teacher_id, s.course_id, s.class_name, s.section, s.created_at";

/// SQLite-backed schedule store and directory.
///
/// One connection behind a mutex; every trait method takes the lock for the
/// duration of its statements.
pub struct ScheduleDb {
    db: Mutex<Connection>,
}

impl ScheduleDb {
    /// Opens (or creates) the database at `db_path` and initializes the schema
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| ScheduleError::Storage {
            message: "database mutex poisoned".to_string(),
        })
    }

    /// Inserts or replaces a teacher record
    pub fn upsert_teacher(&self, teacher: &TeacherRecord) -> Result<()> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO teachers (teacher_id, name, email, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(teacher_id) DO UPDATE SET name = excluded.name, email = excluded.email",
            (&teacher.id, &teacher.name, &teacher.email, Utc::now()),
        )?;
        Ok(())
    }

    /// Inserts or replaces a course record
    pub fn upsert_course(&self, course: &CourseRecord) -> Result<()> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO courses (course_id, name, code, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(course_id) DO UPDATE SET name = excluded.name, code = excluded.code",
            (&course.id, &course.name, &course.code, Utc::now()),
        )?;
        Ok(())
    }

    /// Inserts or replaces a student record
    pub fn upsert_student(&self, student: &StudentRecord) -> Result<()> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO students (student_id, name, class_name, section, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(student_id) DO UPDATE SET
                name = excluded.name,
                class_name = excluded.class_name,
                section = excluded.section",
            (
                &student.id,
                &student.name,
                &student.class_name,
                &student.section,
                Utc::now(),
            ),
        )?;
        Ok(())
    }
}

/// Builds the WHERE clause and its parameters for an entry query.
fn where_clause(query: &EntryQuery) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    if let Some(teacher_id) = &query.teacher_id {
        clauses.push("s.teacher_id = ?");
        params.push(Value::Text(teacher_id.clone()));
    }
    if let Some(course_id) = &query.course_id {
        clauses.push("s.course_id = ?");
        params.push(Value::Text(course_id.clone()));
    }
    if let Some(class_name) = &query.class_name {
        clauses.push("s.class_name = ?");
        params.push(Value::Text(class_name.clone()));
    }
    if let Some(section) = &query.section {
        clauses.push("s.section = ?");
        params.push(Value::Text(section.clone()));
    }
    if let Some(date) = &query.date {
        clauses.push(
            "EXISTS (SELECT 1 FROM schedule_sessions ss
                     WHERE ss.schedule_id = s.schedule_id
                       AND ss.date_kind = ? AND ss.date_value = ?)",
        );
        params.push(Value::Text(date.kind().to_string()));
        params.push(Value::Text(date.to_string()));
    }

    let sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (sql, params)
}

fn row_to_schedule(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbSchedule> {
    Ok(DbSchedule {
        schedule_id: row.get(0)?,
        teacher_id: row.get(1)?,
        course_id: row.get(2)?,
        class_name: row.get(3)?,
        section: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Loads the sessions of one entry in their stored order, optionally only
/// those on `only`.
fn load_sessions(
    db: &Connection,
    schedule_id: &str,
    only: Option<&DateToken>,
) -> Result<Vec<Session>> {
    let mut sql = String::from(
        "SELECT position, date_kind, date_value, start_min, end_min
         FROM schedule_sessions
         WHERE schedule_id = ?",
    );
    let mut params = vec![Value::Text(schedule_id.to_string())];
    if let Some(date) = only {
        sql.push_str(" AND date_kind = ? AND date_value = ?");
        params.push(Value::Text(date.kind().to_string()));
        params.push(Value::Text(date.to_string()));
    }
    sql.push_str(" ORDER BY position");

    let mut stmt = db.prepare(&sql)?;
    let rows: Vec<DbSession> = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            Ok(DbSession {
                position: row.get(0)?,
                date_kind: row.get(1)?,
                date_value: row.get(2)?,
                start_min: row.get(3)?,
                end_min: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter().map(DbSession::into_session).collect()
}

fn assemble(db: &Connection, row: DbSchedule, only: Option<&DateToken>) -> Result<ScheduleEntry> {
    let days = load_sessions(db, &row.schedule_id, only)?;
    Ok(ScheduleEntry {
        id: row.schedule_id,
        teacher_id: row.teacher_id,
        course_id: row.course_id,
        class_name: row.class_name,
        section: row.section,
        days,
        created_at: row.created_at,
    })
}

/// Runs an entry query, newest first, then loads each entry's sessions.
fn select_entries(
    db: &Connection,
    query: &EntryQuery,
    only: Option<&DateToken>,
) -> Result<Vec<ScheduleEntry>> {
    let (where_sql, mut params) = where_clause(query);
    let sql = format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules s{where_sql}
         ORDER BY s.created_at DESC, s.rowid DESC
         LIMIT ? OFFSET ?"
    );
    // LIMIT -1 means no limit in SQLite
    params.push(Value::Integer(query.limit.map_or(-1, |l| l as i64)));
    params.push(Value::Integer(query.skip as i64));

    debug!("Schedule query: {:?}", query);

    let mut stmt = db.prepare(&sql)?;
    let rows: Vec<DbSchedule> = stmt
        .query_map(params_from_iter(params.iter()), row_to_schedule)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter().map(|row| assemble(db, row, only)).collect()
}

fn select_one(db: &Connection, id: &str) -> Result<Option<ScheduleEntry>> {
    let row = db
        .query_row(
            &format!("SELECT {SCHEDULE_COLUMNS} FROM schedules s WHERE s.schedule_id = ?1"),
            [id],
            row_to_schedule,
        )
        .optional()?;

    row.map(|row| assemble(db, row, None)).transpose()
}

fn insert_sessions(db: &Connection, schedule_id: &str, days: &[Session]) -> Result<()> {
    for (position, session) in days.iter().enumerate() {
        let row = DbSession::from_session(position, session);
        db.execute(
            "INSERT INTO schedule_sessions (
                schedule_id, position, date_kind, date_value, start_min, end_min
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                schedule_id,
                row.position,
                &row.date_kind,
                &row.date_value,
                row.start_min,
                row.end_min,
            ),
        )?;
    }
    Ok(())
}

impl ScheduleStore for ScheduleDb {
    fn find(&self, query: &EntryQuery) -> Result<Vec<ScheduleEntry>> {
        let db = self.conn()?;
        select_entries(&db, query, None)
    }

    fn count(&self, query: &EntryQuery) -> Result<u64> {
        let db = self.conn()?;
        let (where_sql, params) = where_clause(query);
        let count: i64 = db.query_row(
            &format!("SELECT COUNT(*) FROM schedules s{where_sql}"),
            params_from_iter(params.iter()),
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<ScheduleEntry>> {
        let db = self.conn()?;
        select_one(&db, id)
    }

    fn insert(&self, entry: NewScheduleEntry) -> Result<ScheduleEntry> {
        let mut db = self.conn()?;
        let tx = db.transaction()?;

        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        tx.execute(
            "INSERT INTO schedules (
                schedule_id, teacher_id, course_id, class_name, section, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                &id,
                &entry.teacher_id,
                &entry.course_id,
                &entry.class_name,
                &entry.section,
                created_at,
            ),
        )?;
        insert_sessions(&tx, &id, &entry.days)?;
        tx.commit()?;

        Ok(ScheduleEntry {
            id,
            teacher_id: entry.teacher_id,
            course_id: entry.course_id,
            class_name: entry.class_name,
            section: entry.section,
            days: entry.days,
            created_at,
        })
    }

    fn update_by_id(&self, id: &str, changes: &EntryChanges) -> Result<Option<ScheduleEntry>> {
        let mut db = self.conn()?;
        let tx = db.transaction()?;

        let updated = tx.execute(
            "UPDATE schedules SET
                teacher_id = COALESCE(?1, teacher_id),
                course_id = COALESCE(?2, course_id),
                class_name = COALESCE(?3, class_name),
                section = COALESCE(?4, section)
             WHERE schedule_id = ?5",
            (
                &changes.teacher_id,
                &changes.course_id,
                &changes.class_name,
                &changes.section,
                id,
            ),
        )?;
        if updated == 0 {
            return Ok(None);
        }

        if let Some(days) = &changes.days {
            tx.execute("DELETE FROM schedule_sessions WHERE schedule_id = ?1", [id])?;
            insert_sessions(&tx, id, days)?;
        }

        let entry = select_one(&tx, id)?;
        tx.commit()?;
        Ok(entry)
    }

    fn delete_by_id(&self, id: &str) -> Result<Option<ScheduleEntry>> {
        let mut db = self.conn()?;
        let tx = db.transaction()?;

        let Some(entry) = select_one(&tx, id)? else {
            return Ok(None);
        };
        tx.execute("DELETE FROM schedule_sessions WHERE schedule_id = ?1", [id])?;
        tx.execute("DELETE FROM schedules WHERE schedule_id = ?1", [id])?;
        tx.commit()?;

        Ok(Some(entry))
    }

    fn find_projected(
        &self,
        class_name: &str,
        section: &str,
        date: &DateToken,
    ) -> Result<Vec<ScheduleEntry>> {
        let db = self.conn()?;
        let query = EntryQuery::classroom(class_name, section).on(*date);
        select_entries(&db, &query, Some(date))
    }
}

impl StudentDirectory for ScheduleDb {
    fn find_student(&self, student_id: &str) -> Result<Option<StudentRecord>> {
        let db = self.conn()?;
        let student = db
            .query_row(
                "SELECT student_id, name, class_name, section FROM students WHERE student_id = ?1",
                [student_id],
                |row| {
                    Ok(StudentRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        class_name: row.get(2)?,
                        section: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(student)
    }
}

impl ClassDirectory for ScheduleDb {
    fn count_students(&self, class_name: &str, section: &str) -> Result<u64> {
        let db = self.conn()?;
        // Student sections are stored in whatever case they were entered in
        let count: i64 = db.query_row(
            "SELECT COUNT(*) FROM students WHERE class_name = ?1 AND section = ?2 COLLATE NOCASE",
            [class_name, section],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl TeacherDirectory for ScheduleDb {
    fn find_teacher(&self, teacher_id: &str) -> Result<Option<TeacherRecord>> {
        let db = self.conn()?;
        let teacher = db
            .query_row(
                "SELECT teacher_id, name, email FROM teachers WHERE teacher_id = ?1",
                [teacher_id],
                |row| {
                    Ok(TeacherRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(teacher)
    }

    fn find_teacher_by_email(&self, email: &str) -> Result<Option<TeacherRecord>> {
        let db = self.conn()?;
        let teacher = db
            .query_row(
                "SELECT teacher_id, name, email FROM teachers WHERE email = ?1 COLLATE NOCASE",
                [email],
                |row| {
                    Ok(TeacherRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(teacher)
    }
}

impl CourseDirectory for ScheduleDb {
    fn find_course(&self, course_id: &str) -> Result<Option<CourseRecord>> {
        let db = self.conn()?;
        let course = db
            .query_row(
                "SELECT course_id, name, code FROM courses WHERE course_id = ?1",
                [course_id],
                |row| {
                    Ok(CourseRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        code: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(course)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn session(day: Weekday, start: &str, end: &str) -> Session {
        Session {
            date: DateToken::Weekday(day),
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
        }
    }

    fn new_entry(
        teacher: &str,
        class_name: &str,
        section: &str,
        days: Vec<Session>,
    ) -> NewScheduleEntry {
        NewScheduleEntry {
            teacher_id: teacher.to_string(),
            course_id: "math".to_string(),
            class_name: class_name.to_string(),
            section: section.to_string(),
            days,
        }
    }

    #[test]
    fn test_insert_and_find_by_id_keeps_session_order() {
        let db = ScheduleDb::open_in_memory().unwrap();
        let stored = db
            .insert(new_entry(
                "t1",
                "9",
                "A",
                vec![
                    session(Weekday::Wed, "13:00", "14:00"),
                    session(Weekday::Mon, "09:00", "10:00"),
                ],
            ))
            .unwrap();

        let loaded = db.find_by_id(&stored.id).unwrap().expect("entry exists");
        assert_eq!(loaded.days, stored.days);
        assert_eq!(loaded.teacher_id, "t1");
        assert!(db.find_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_find_filters_and_orders_newest_first() {
        let db = ScheduleDb::open_in_memory().unwrap();
        let first = db
            .insert(new_entry("t1", "9", "A", vec![session(Weekday::Mon, "09:00", "10:00")]))
            .unwrap();
        let second = db
            .insert(new_entry("t1", "9", "B", vec![session(Weekday::Tue, "09:00", "10:00")]))
            .unwrap();
        db.insert(new_entry("t2", "10", "A", vec![session(Weekday::Mon, "11:00", "12:00")]))
            .unwrap();

        let ids: Vec<_> = db
            .find(&EntryQuery::teacher("t1"))
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![second.id.clone(), first.id.clone()]);

        let monday = EntryQuery::default().on(DateToken::Weekday(Weekday::Mon));
        assert_eq!(db.count(&monday).unwrap(), 2);
        assert_eq!(db.count(&EntryQuery::default()).unwrap(), 3);

        let paged = EntryQuery {
            skip: 1,
            limit: Some(1),
            ..Default::default()
        };
        let page = db.find(&paged).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, second.id);
    }

    #[test]
    fn test_find_projected_keeps_only_matching_sessions() {
        let db = ScheduleDb::open_in_memory().unwrap();
        db.insert(new_entry(
            "t1",
            "9",
            "A",
            vec![
                session(Weekday::Mon, "09:00", "10:00"),
                session(Weekday::Wed, "09:00", "10:00"),
            ],
        ))
        .unwrap();
        db.insert(new_entry("t2", "9", "A", vec![session(Weekday::Tue, "09:00", "10:00")]))
            .unwrap();

        let wednesday = DateToken::Weekday(Weekday::Wed);
        let projected = db.find_projected("9", "A", &wednesday).unwrap();
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].days.len(), 1);
        assert_eq!(projected[0].days[0].date, wednesday);

        assert!(db.find_projected("9", "B", &wednesday).unwrap().is_empty());
    }

    #[test]
    fn test_update_and_delete() {
        let db = ScheduleDb::open_in_memory().unwrap();
        let stored = db
            .insert(new_entry("t1", "9", "A", vec![session(Weekday::Mon, "09:00", "10:00")]))
            .unwrap();

        let changes = EntryChanges {
            section: Some("C".to_string()),
            days: Some(vec![session(Weekday::Fri, "14:00", "15:00")]),
            ..Default::default()
        };
        let updated = db.update_by_id(&stored.id, &changes).unwrap().unwrap();
        assert_eq!(updated.section, "C");
        assert_eq!(updated.teacher_id, "t1");
        assert_eq!(updated.days, vec![session(Weekday::Fri, "14:00", "15:00")]);

        assert!(db.update_by_id("missing", &changes).unwrap().is_none());

        let removed = db.delete_by_id(&stored.id).unwrap().unwrap();
        assert_eq!(removed.id, stored.id);
        assert!(db.find_by_id(&stored.id).unwrap().is_none());
        assert!(db.delete_by_id(&stored.id).unwrap().is_none());
    }

    #[test]
    fn test_directories() {
        let db = ScheduleDb::open_in_memory().unwrap();
        db.upsert_teacher(&TeacherRecord {
            id: "t1".to_string(),
            name: "Ada".to_string(),
            email: Some("ada@school.test".to_string()),
        })
        .unwrap();
        for (id, section) in [("s1", "a"), ("s2", "A"), ("s3", "B")] {
            db.upsert_student(&StudentRecord {
                id: id.to_string(),
                name: id.to_string(),
                class_name: "9".to_string(),
                section: section.to_string(),
            })
            .unwrap();
        }

        assert_eq!(
            db.find_teacher_by_email("ADA@school.test").unwrap().map(|t| t.id),
            Some("t1".to_string())
        );
        assert_eq!(db.count_students("9", "A").unwrap(), 2);
        assert_eq!(db.count_students("10", "A").unwrap(), 0);
        assert_eq!(db.find_student("s3").unwrap().unwrap().section, "B");
        assert!(db.find_course("nope").unwrap().is_none());
    }
}
