use std::sync::Arc;

use serde::Deserialize;

use crate::db::ScheduleDb;
use crate::schedule::ScheduleEngine;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub engine: ScheduleEngine,
    /// Same database the engine reads, for directory upserts
    pub db: Arc<ScheduleDb>,
}
