//! Optional `config.json` in the working directory.
//!
//! Every key is optional; a missing or unreadable file falls back to defaults.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::db::DEFAULT_DB_FILE;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backing database file.
    pub db_path: PathBuf,
    /// Run the recurring-task notifier.
    pub notifications: bool,
    /// bcrypt work factor for new passwords.
    pub bcrypt_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            notifications: true,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Self {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, using defaults");
                return Config::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config file, using defaults");
                return Config::default();
            }
        };
        match serde_json::from_str(&data) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                Config::default()
            }
        }
    }
}
