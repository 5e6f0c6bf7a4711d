use serde_json::json;

use crate::ipc::error::{bad_params, from_schedule_error, ok};
use crate::ipc::types::{AppState, Request};
use crate::schedule::{CourseRecord, StudentRecord, TeacherRecord};

pub fn try_handle(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "teachers.upsert" => serde_json::from_value::<TeacherRecord>(req.params.clone())
            .map(|t| state.db.upsert_teacher(&t)),
        "courses.upsert" => serde_json::from_value::<CourseRecord>(req.params.clone())
            .map(|c| state.db.upsert_course(&c)),
        "students.upsert" => serde_json::from_value::<StudentRecord>(req.params.clone())
            .map(|s| state.db.upsert_student(&s)),
        _ => return None,
    };

    Some(match result {
        Ok(Ok(())) => ok(&req.id, json!({ "saved": true })),
        Ok(Err(e)) => from_schedule_error(&req.id, &e),
        Err(e) => bad_params(&req.id, e),
    })
}
