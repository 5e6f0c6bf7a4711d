use serde_json::json;

use crate::schedule::ScheduleError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(id: &str, code: &str, message: impl Into<String>) -> serde_json::Value {
    json!({
        "id": id,
        "ok": false,
        "error": {
            "code": code,
            "message": message.into(),
        },
    })
}

pub fn bad_params(id: &str, message: impl std::fmt::Display) -> serde_json::Value {
    err(id, "bad_params", message.to_string())
}

/// Maps an engine error onto a wire error code.
pub fn from_schedule_error(id: &str, error: &ScheduleError) -> serde_json::Value {
    let code = match error {
        ScheduleError::NotFound { .. } => "not_found",
        ScheduleError::InvalidInput { .. } => "bad_params",
        ScheduleError::Storage { .. } => "storage_error",
        ScheduleError::Directory { .. } => "directory_error",
        ScheduleError::Config { .. } => "config_error",
    };
    err(id, code, error.to_string())
}
