//! Whole-file JSON persistence for the task collection.
//!
//! `Database` is the complete persisted state: the ordered task list plus the
//! optional password hash. It is always read and written as one document.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compat::{self, null_as_default};
use crate::error::{Error, Result};
use crate::task::Task;

/// Default backing file name, resolved against the working directory.
pub const DEFAULT_DB_FILE: &str = "db.json";

/// In-memory copy of the backing file.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
    /// bcrypt hash of the access password; `None` means no password is required.
    #[serde(default, with = "compat::password")]
    pub password: Option<Vec<u8>>,
}

impl Database {
    /// Load from `path`. A missing file is a first run and yields an empty database.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no database yet, starting empty");
                return Ok(Database::default());
            }
            Err(e) => return Err(e.into()),
        };
        let db: Database = serde_json::from_str(&data).map_err(|source| Error::Deserialize {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), tasks = db.tasks.len(), "loaded database");
        Ok(db)
    }

    /// Save to `path` via a temp file and rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), tasks = self.tasks.len(), "saved database");
        Ok(())
    }

    /// Next task id: the last task's id + 1, or 1 when empty.
    ///
    /// This follows the last element, not the maximum, so ids appended out of
    /// order (e.g. by a CSV import) can make a later id collide. `None` when
    /// the last id is `u64::MAX`.
    pub fn next_id(&self) -> Option<u64> {
        self.tasks.last().map_or(Some(1), |t| t.id.checked_add(1))
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}
