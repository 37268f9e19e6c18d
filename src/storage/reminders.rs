//! Persisted personal long-break reminders.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::warn;

use super::error::StorageError;
use super::settings::write_json;
use crate::reminders::sanitize_reminders;

/// Load/save of the personal reminder list.
pub trait ReminderStore {
    /// Returns the stored reminders, sanitized. Missing or corrupt data is empty.
    fn load(&self) -> Vec<String>;

    fn save(&self, reminders: &[String]) -> Result<(), StorageError>;
}

/// Reminders stored as a JSON array of strings.
#[derive(Debug, Clone)]
pub struct JsonFileReminderStore {
    path: PathBuf,
}

impl JsonFileReminderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReminderStore for JsonFileReminderStore {
    fn load(&self) -> Vec<String> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Failed to read reminders {:?}: {}", self.path, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(list) => sanitize_reminders(list),
            Err(e) => {
                warn!("Ignoring unparseable reminders file {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }

    fn save(&self, reminders: &[String]) -> Result<(), StorageError> {
        write_json(&self.path, reminders)
    }
}

/// In-memory reminder store for testing. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryReminderStore {
    reminders: Arc<Mutex<Vec<String>>>,
}

impl MemoryReminderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reminders(reminders: Vec<String>) -> Self {
        Self {
            reminders: Arc::new(Mutex::new(reminders)),
        }
    }
}

impl ReminderStore for MemoryReminderStore {
    fn load(&self) -> Vec<String> {
        self.reminders
            .lock()
            .map(|r| sanitize_reminders(r.clone()))
            .unwrap_or_default()
    }

    fn save(&self, reminders: &[String]) -> Result<(), StorageError> {
        if let Ok(mut stored) = self.reminders.lock() {
            *stored = reminders.to_vec();
        }
        Ok(())
    }
}
