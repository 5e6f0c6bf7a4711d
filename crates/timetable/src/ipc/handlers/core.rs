use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};

pub fn try_handle(state: &AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(ok(
            &req.id,
            json!({
                "version": env!("CARGO_PKG_VERSION"),
                "serializeCreates": state.engine.config().serialize_creates,
            }),
        )),
        _ => None,
    }
}
