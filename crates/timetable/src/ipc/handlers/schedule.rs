use serde::Deserialize;
use serde_json::json;

use crate::ipc::error::{bad_params, from_schedule_error, ok};
use crate::ipc::types::{AppState, Request};
use crate::schedule::{
    CreateOutcome, ScheduleError, ScheduleFilter, ScheduleInput, SchedulePatch,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdParams {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentDayParams {
    student_id: String,
    #[serde(default = "default_day")]
    date: String,
}

fn default_day() -> String {
    "today".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeacherParams {
    teacher_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateParams {
    id: String,
    patch: SchedulePatch,
}

pub fn try_handle(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    let resp = match req.method.as_str() {
        "schedule.create" => handle_create(state, req),
        "schedule.list" => handle_list(state, req),
        "schedule.get" => handle_get(state, req),
        "schedule.forStudent" => handle_for_student(state, req),
        "schedule.teacherLoad" => handle_teacher_load(state, req),
        "schedule.update" => handle_update(state, req),
        "schedule.remove" => handle_remove(state, req),
        _ => return None,
    };
    Some(resp)
}

fn parse<T: serde::de::DeserializeOwned>(req: &Request) -> Result<T, serde_json::Value> {
    serde_json::from_value(req.params.clone()).map_err(|e| bad_params(&req.id, e))
}

fn to_value<T: serde::Serialize>(req: &Request, value: &T) -> serde_json::Value {
    match serde_json::to_value(value) {
        Ok(v) => ok(&req.id, v),
        Err(e) => from_schedule_error(
            &req.id,
            &ScheduleError::Storage {
                message: format!("failed to encode result: {e}"),
            },
        ),
    }
}

fn handle_create(state: &AppState, req: &Request) -> serde_json::Value {
    let input: ScheduleInput = match parse(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.engine.create_schedule(&input) {
        Ok(CreateOutcome::Created(entry)) => to_value(
            req,
            &json!({
                "success": true,
                "message": "Schedule created successfully.",
                "schedule": entry,
            }),
        ),
        Ok(CreateOutcome::Rejected(conflict)) => to_value(
            req,
            &json!({
                "success": false,
                "message": conflict.to_string(),
                "conflict": conflict,
            }),
        ),
        Err(e) => from_schedule_error(&req.id, &e),
    }
}

fn handle_list(state: &AppState, req: &Request) -> serde_json::Value {
    let filter: ScheduleFilter = if req.params.is_null() {
        ScheduleFilter::default()
    } else {
        match parse(req) {
            Ok(v) => v,
            Err(resp) => return resp,
        }
    };

    match state.engine.find_all(&filter) {
        Ok(page) => to_value(req, &page),
        Err(e) => from_schedule_error(&req.id, &e),
    }
}

fn handle_get(state: &AppState, req: &Request) -> serde_json::Value {
    let params: IdParams = match parse(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.engine.find_by_id(&params.id) {
        Ok(entry) => to_value(req, &entry),
        Err(e) => from_schedule_error(&req.id, &e),
    }
}

fn handle_for_student(state: &AppState, req: &Request) -> serde_json::Value {
    let params: StudentDayParams = match parse(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state
        .engine
        .find_by_student_and_date(&params.student_id, &params.date)
    {
        Ok(entries) => to_value(req, &entries),
        Err(e) => from_schedule_error(&req.id, &e),
    }
}

fn handle_teacher_load(state: &AppState, req: &Request) -> serde_json::Value {
    let params: TeacherParams = match parse(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let load = state.engine.teacher_load_summary(&params.teacher_id);
    to_value(req, &load)
}

fn handle_update(state: &AppState, req: &Request) -> serde_json::Value {
    let params: UpdateParams = match parse(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.engine.update_schedule(&params.id, &params.patch) {
        Ok(entry) => to_value(req, &entry),
        Err(e) => from_schedule_error(&req.id, &e),
    }
}

fn handle_remove(state: &AppState, req: &Request) -> serde_json::Value {
    let params: IdParams = match parse(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.engine.remove_schedule(&params.id) {
        Ok(entry) => to_value(req, &entry),
        Err(e) => from_schedule_error(&req.id, &e),
    }
}
