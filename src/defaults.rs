//! Flat key-value store for primitive settings and small snapshots.
//!
//! Values live in memory and, when the store is file-backed, every `set`
//! rewrites the whole JSON object on disk. Failures are logged and the
//! in-memory value stays authoritative for the rest of the process.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::{
    cell::RefCell,
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use crate::error::StoreError;

pub const LAST_TIMER_DURATION_KEY: &str = "lastTimerDuration";
pub const SAVED_TASKS_KEY: &str = "savedTasks";
pub const LAST_RESET_KEY: &str = "lastResetDate";

#[derive(Debug, Default)]
pub struct Defaults {
    path: Option<PathBuf>,
    values: RefCell<Map<String, Value>>,
}

impl Defaults {
    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens (or lazily creates) the store at `path`.
    ///
    /// A missing file is an empty store. A file that cannot be read or parsed
    /// is logged and also treated as empty; it is overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match read_object(&path) {
            Ok(values) => values,
            Err(err) => {
                warn!(error = %err, "defaults file unusable, starting empty");
                Map::new()
            }
        };
        debug!(path = %path.display(), keys = values.len(), "defaults loaded");
        Self {
            path: Some(path),
            values: RefCell::new(values),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.borrow().contains_key(key)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.borrow().get(key).cloned()?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(err) => {
                warn!(key, error = %err, "stored value has unexpected shape");
                None
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(err) => {
                warn!(key, error = %err, "failed to encode value, write dropped");
                return;
            }
        };
        self.values.borrow_mut().insert(key.to_owned(), value);
        self.flush();
    }

    pub fn remove(&self, key: &str) {
        let removed = self.values.borrow_mut().remove(key).is_some();
        if removed {
            self.flush();
        }
    }

    fn flush(&self) {
        let Some(path) = &self.path else { return };
        if let Err(err) = write_object(path, &self.values.borrow()) {
            warn!(error = %err, "failed to persist defaults");
        }
    }
}

fn read_object(path: &Path) -> Result<Map<String, Value>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    Ok(serde_json::from_str(&text)?)
}

fn write_object(path: &Path, values: &Map<String, Value>) -> Result<(), StoreError> {
    let text = serde_json::to_string_pretty(values)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}
