use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use timetable::db::ScheduleDb;
use timetable::ipc;
use timetable::schedule::{EngineConfig, ScheduleEngine};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn load_config() -> Result<EngineConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TIMETABLE_CONFIG").ok())
        .map(PathBuf::from);

    let mut config = match path {
        Some(path) => EngineConfig::load_from_file(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Ok(db_path) = std::env::var("TIMETABLE_DB") {
        config.db_path = db_path;
    }
    config.check().context("checking config")?;
    Ok(config)
}

fn main() -> Result<()> {
    // stdout carries responses, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = load_config()?;
    let db = Arc::new(
        ScheduleDb::open(&config.db_path)
            .with_context(|| format!("opening database {}", config.db_path))?,
    );
    info!("Opened schedule database at {}", config.db_path);

    let state = ipc::AppState {
        engine: ScheduleEngine::from_db(db.clone(), config),
        db,
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("reading request")?;
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&state, req),
            Err(e) => {
                // Can't reply without id
                warn!("Unparseable request: {}", e);
                serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() },
                })
            }
        };

        writeln!(stdout, "{resp}").context("writing response")?;
        stdout.flush().context("flushing response")?;
        state.engine.prune_locks();
    }

    Ok(())
}
