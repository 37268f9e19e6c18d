//! Local persistence for the Pomodoro Timer.
//!
//! Everything lives under one data directory:
//!
//! ```text
//! $POMODORO_HOME (or ~/.pomodoro)
//! ├── settings.json    preferences and the session counter
//! ├── reminders.json   personal long-break reminders
//! └── pomodoro.sock    daemon socket
//! ```

mod error;
mod reminders;
mod settings;

use std::path::PathBuf;

pub use error::StorageError;
pub use reminders::{JsonFileReminderStore, MemoryReminderStore, ReminderStore};
pub use settings::{JsonFileSettingsStore, MemorySettingsStore, SettingsStore, StoredSettings};

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "POMODORO_HOME";

const DATA_DIR_NAME: &str = ".pomodoro";
const SETTINGS_FILE: &str = "settings.json";
const REMINDERS_FILE: &str = "reminders.json";
const SOCKET_FILE: &str = "pomodoro.sock";

/// Resolves the data directory: `$POMODORO_HOME` if set, else `~/.pomodoro`.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    match std::env::var_os(HOME_ENV) {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => dirs::home_dir()
            .map(|home| home.join(DATA_DIR_NAME))
            .ok_or(StorageError::HomeNotFound),
    }
}

/// Paths of every file under a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Paths under the resolved default data directory.
    pub fn resolve() -> Result<Self, StorageError> {
        data_dir().map(Self::new)
    }

    pub fn settings(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn reminders(&self) -> PathBuf {
        self.root.join(REMINDERS_FILE)
    }

    pub fn socket(&self) -> PathBuf {
        self.root.join(SOCKET_FILE)
    }
}
