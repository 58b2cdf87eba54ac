use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::BotError;
use crate::models::user::UserMap;

/// Whole-document user storage.
///
/// There is no per-record access: callers load the full map, mutate one
/// record, and save the full map back. Serializing those cycles is the
/// caller's job (see `conversation::service::Conversation`).
pub trait UserStore: Send + Sync {
    fn load(&self) -> Result<UserMap, BotError>;
    fn save(&self, users: &UserMap) -> Result<(), BotError>;
}

/// JSON document on local disk, replaced atomically on every save.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UserStore for JsonFileStore {
    fn load(&self) -> Result<UserMap, BotError> {
        if !self.path.exists() {
            info!("User store {} not found, initializing", self.path.display());
            self.save(&UserMap::new())?;
        }

        let raw = fs::read_to_string(&self.path).map_err(|e| {
            BotError::StorageUnavailable(format!("read {}: {e}", self.path.display()))
        })?;
        let users: UserMap = serde_json::from_str(&raw).map_err(|e| {
            BotError::StorageUnavailable(format!("parse {}: {e}", self.path.display()))
        })?;

        debug!("Loaded {} user records", users.len());
        Ok(users)
    }

    fn save(&self, users: &UserMap) -> Result<(), BotError> {
        let unavailable =
            |e: std::io::Error| BotError::StorageUnavailable(format!("write {}: {e}", self.path.display()));

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let body = serde_json::to_string_pretty(users)
            .map_err(|e| BotError::StorageUnavailable(format!("serialize users: {e}")))?;

        // Write beside the target, then rename over it.
        let mut tmp = NamedTempFile::new_in(parent).map_err(unavailable)?;
        tmp.write_all(body.as_bytes()).map_err(unavailable)?;
        tmp.flush().map_err(unavailable)?;
        tmp.persist(&self.path).map_err(|e| unavailable(e.error))?;

        debug!("Saved {} user records", users.len());
        Ok(())
    }
}

/// In-process store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    users: std::sync::Mutex<UserMap>,
}

#[cfg(test)]
impl UserStore for MemoryStore {
    fn load(&self) -> Result<UserMap, BotError> {
        self.users
            .lock()
            .map(|users| users.clone())
            .map_err(|_| BotError::StorageUnavailable("memory store poisoned".to_string()))
    }

    fn save(&self, users: &UserMap) -> Result<(), BotError> {
        let mut guard = self
            .users
            .lock()
            .map_err(|_| BotError::StorageUnavailable("memory store poisoned".to_string()))?;
        *guard = users.clone();
        Ok(())
    }
}
