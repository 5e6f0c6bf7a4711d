//! Recurring weekly class-schedule engine.
//!
//! [`schedule::ScheduleEngine`] accepts or rejects proposed weekly schedules
//! based on teacher, classroom and course overlap and answers day-filtered
//! queries. [`db::ScheduleDb`] is the SQLite store behind it, and [`ipc`] is
//! the JSON-lines surface the `timetable` binary speaks.

pub mod db;
pub mod ipc;
pub mod schedule;
