//! Configuration loading and database path resolution

use crate::Result;
use std::path::PathBuf;

/// Environment variable naming an explicit database file
pub const DB_PATH_ENV: &str = "ROLLBOOK_DB";

/// Resolve the database file path, in priority order:
/// 1. Explicit override (e.g. command-line argument of the embedding app)
/// 2. `ROLLBOOK_DB` environment variable
/// 3. `database_path` key in the TOML config file
/// 4. OS-dependent default data directory (fallback)
pub fn resolve_database_path(override_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(PathBuf::from(path));
    }

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    if let Some(config_path) = config_file_path() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(db_path) = config.get("database_path").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(db_path));
                }
            }
        }
    }

    Ok(default_database_path())
}

/// Platform config file location (~/.config/rollbook/config.toml or equivalent)
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rollbook").join("config.toml"))
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("rollbook"))
        .unwrap_or_else(|| PathBuf::from("./rollbook_data"))
        .join("rollbook.db")
}
