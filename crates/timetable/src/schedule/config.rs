/// Configuration for the scheduling engine and its sidecar
use super::error::{Result, ScheduleError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine configuration. Every field has a default, so an empty JSON object
/// (or no file at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQLite database path; `:memory:` for a throwaway store
    pub db_path: String,
    /// Page size used when a listing doesn't specify one
    pub default_page_limit: u32,
    /// Upper bound applied to caller-supplied page sizes
    pub max_page_limit: u32,
    /// Serialize creates per teacher/class/course inside this process
    pub serialize_creates: bool,
    /// Upper-case the first letter of a student's section before matching
    pub capitalize_student_section: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: "timetable.sqlite3".to_string(),
            default_page_limit: 10,
            max_page_limit: 100,
            serialize_creates: true,
            capitalize_student_section: true,
        }
    }
}

impl EngineConfig {
    /// Loads the configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to the JSON config file
    ///
    /// # Returns
    /// * `Ok(EngineConfig)` - Parsed and checked configuration
    /// * `Err` - If the file can't be read, parsed, or holds nonsensical limits
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ScheduleError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Rejects limits the engine can't honor.
    pub fn check(&self) -> Result<()> {
        if self.default_page_limit == 0 || self.max_page_limit == 0 {
            return Err(ScheduleError::Config {
                message: "page limits must be positive".to_string(),
            });
        }
        if self.default_page_limit > self.max_page_limit {
            return Err(ScheduleError::Config {
                message: format!(
                    "default_page_limit ({}) exceeds max_page_limit ({})",
                    self.default_page_limit, self.max_page_limit
                ),
            });
        }
        Ok(())
    }
}
