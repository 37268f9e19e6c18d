//! Persisted user preferences.
//!
//! Decoding is lenient per field: a missing, mistyped or unknown value falls
//! back to its default instead of discarding the whole file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::StorageError;
use crate::sound::clamp_volume;
use crate::types::{AmbiencePlayMode, AmbienceType, ModeKey, UiMode};

/// Default ambience volume.
pub const DEFAULT_VOLUME: f32 = 0.35;

// ============================================================================
// StoredSettings
// ============================================================================

/// User preferences and progress persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettings {
    pub mode: ModeKey,
    pub ui_mode: UiMode,
    pub sound_enabled: bool,
    pub ambience_enabled: bool,
    pub ambience_type: AmbienceType,
    pub ambience_play_mode: AmbiencePlayMode,
    /// Always within `[0, 1]`
    pub ambience_volume: f32,
    pub focus_sessions_completed: u32,
}

impl Default for StoredSettings {
    fn default() -> Self {
        Self {
            mode: ModeKey::Normal,
            ui_mode: UiMode::Dashboard,
            sound_enabled: true,
            ambience_enabled: false,
            ambience_type: AmbienceType::None,
            ambience_play_mode: AmbiencePlayMode::Focus,
            ambience_volume: DEFAULT_VOLUME,
            focus_sessions_completed: 0,
        }
    }
}

fn bool_field(obj: &serde_json::Map<String, Value>, key: &str, default: bool) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn str_field<'a>(obj: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn count_field(obj: &serde_json::Map<String, Value>, key: &str) -> u32 {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .map(|n| n.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(0),
        _ => 0,
    }
}

impl StoredSettings {
    /// Decodes settings from a JSON value, field by field.
    ///
    /// Returns None if the value is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let defaults = Self::default();

        Some(Self {
            mode: str_field(obj, "mode")
                .and_then(ModeKey::parse)
                .unwrap_or(defaults.mode),
            ui_mode: match str_field(obj, "uiMode") {
                Some("minimal") => UiMode::Minimal,
                _ => UiMode::Dashboard,
            },
            sound_enabled: bool_field(obj, "soundEnabled", defaults.sound_enabled),
            ambience_enabled: bool_field(obj, "ambienceEnabled", defaults.ambience_enabled),
            ambience_type: str_field(obj, "ambienceType")
                .and_then(AmbienceType::parse)
                .unwrap_or(defaults.ambience_type),
            ambience_play_mode: match str_field(obj, "ambiencePlayMode") {
                Some("always") => AmbiencePlayMode::Always,
                _ => AmbiencePlayMode::Focus,
            },
            ambience_volume: obj
                .get("ambienceVolume")
                .and_then(Value::as_f64)
                .map(|v| clamp_volume(v as f32))
                .unwrap_or(defaults.ambience_volume),
            focus_sessions_completed: count_field(obj, "focusSessionsCompleted"),
        })
    }

    /// Decodes settings from raw JSON. Unparseable input yields None.
    pub fn decode(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        Self::from_value(&value)
    }
}

// ============================================================================
// SettingsStore
// ============================================================================

/// Load/save of [`StoredSettings`].
pub trait SettingsStore {
    /// Returns the stored settings, or None when absent or unreadable.
    fn load(&self) -> Option<StoredSettings>;

    /// Persists `settings`.
    fn save(&self, settings: &StoredSettings) -> Result<(), StorageError>;
}

/// Settings stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load(&self) -> Option<StoredSettings> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {:?}", self.path);
                return None;
            }
            Err(e) => {
                warn!("Failed to read settings {:?}: {}", self.path, e);
                return None;
            }
        };

        let settings = StoredSettings::decode(&raw);
        if settings.is_none() {
            warn!("Ignoring unparseable settings file {:?}", self.path);
        }
        settings
    }

    fn save(&self, settings: &StoredSettings) -> Result<(), StorageError> {
        write_json(&self.path, settings)
    }
}

/// Serializes `value` as pretty JSON, creating parent directories.
///
/// Goes through a sibling `.json.tmp` file and a rename.
pub(super) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, json).map_err(|e| StorageError::io(&temp_path, e))?;
    std::fs::rename(&temp_path, path).map_err(|e| StorageError::io(path, e))
}

/// In-memory settings store for testing. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    stored: Arc<Mutex<Option<StoredSettings>>>,
    save_count: Arc<AtomicUsize>,
    should_fail: Arc<AtomicBool>,
}

impl MemorySettingsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `settings`.
    #[must_use]
    pub fn with_settings(settings: StoredSettings) -> Self {
        let store = Self::default();
        if let Ok(mut stored) = store.stored.lock() {
            *stored = Some(settings);
        }
        store
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Last saved settings.
    #[must_use]
    pub fn stored(&self) -> Option<StoredSettings> {
        self.stored.lock().ok().and_then(|s| s.clone())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Option<StoredSettings> {
        self.stored()
    }

    fn save(&self, settings: &StoredSettings) -> Result<(), StorageError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(StorageError::io(
                "memory",
                std::io::Error::other("Mock failure"),
            ));
        }
        if let Ok(mut stored) = self.stored.lock() {
            *stored = Some(settings.clone());
        }
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod decode_tests {
        use super::*;

        #[test]
        fn test_empty_object_uses_defaults() {
            let settings = StoredSettings::decode("{}").unwrap();
            assert_eq!(settings, StoredSettings::default());
        }

        #[test]
        fn test_defaults() {
            let settings = StoredSettings::default();
            assert_eq!(settings.mode, ModeKey::Normal);
            assert_eq!(settings.ui_mode, UiMode::Dashboard);
            assert!(settings.sound_enabled);
            assert!(!settings.ambience_enabled);
            assert_eq!(settings.ambience_type, AmbienceType::None);
            assert_eq!(settings.ambience_play_mode, AmbiencePlayMode::Focus);
            assert_eq!(settings.ambience_volume, 0.35);
            assert_eq!(settings.focus_sessions_completed, 0);
        }

        #[test]
        fn test_full_round_trip() {
            let settings = StoredSettings {
                mode: ModeKey::Hard,
                ui_mode: UiMode::Minimal,
                sound_enabled: false,
                ambience_enabled: true,
                ambience_type: AmbienceType::Rain,
                ambience_play_mode: AmbiencePlayMode::Always,
                ambience_volume: 0.5,
                focus_sessions_completed: 12,
            };
            let json = serde_json::to_string(&settings).unwrap();
            assert!(json.contains("\"ambiencePlayMode\":\"always\""));
            assert_eq!(StoredSettings::decode(&json).unwrap(), settings);
        }

        #[test]
        fn test_invalid_fields_fall_back_individually() {
            let value = json!({
                "mode": "turbo",
                "uiMode": "minimal",
                "soundEnabled": "yes",
                "ambienceEnabled": true,
                "ambienceType": "ocean",
                "ambiencePlayMode": 3,
                "ambienceVolume": "loud",
                "focusSessionsCompleted": -2,
                "unknownField": [1, 2, 3]
            });
            let settings = StoredSettings::from_value(&value).unwrap();

            assert_eq!(settings.mode, ModeKey::Normal);
            assert_eq!(settings.ui_mode, UiMode::Minimal);
            assert!(settings.sound_enabled);
            assert!(settings.ambience_enabled);
            assert_eq!(settings.ambience_type, AmbienceType::None);
            assert_eq!(settings.ambience_play_mode, AmbiencePlayMode::Focus);
            assert_eq!(settings.ambience_volume, 0.35);
            assert_eq!(settings.focus_sessions_completed, 0);
        }

        #[test]
        fn test_volume_is_clamped() {
            let high = StoredSettings::from_value(&json!({"ambienceVolume": 4.2})).unwrap();
            assert_eq!(high.ambience_volume, 1.0);
            let low = StoredSettings::from_value(&json!({"ambienceVolume": -1})).unwrap();
            assert_eq!(low.ambience_volume, 0.0);
        }

        #[test]
        fn test_fractional_counter_truncates() {
            let settings =
                StoredSettings::from_value(&json!({"focusSessionsCompleted": 3.7})).unwrap();
            assert_eq!(settings.focus_sessions_completed, 3);
        }

        #[test]
        fn test_custom_mode_is_kept() {
            let settings = StoredSettings::from_value(&json!({"mode": "custom"})).unwrap();
            assert_eq!(settings.mode, ModeKey::Custom);
        }

        #[test]
        fn test_unparseable_is_none() {
            assert!(StoredSettings::decode("not json").is_none());
            assert!(StoredSettings::decode("[1,2]").is_none());
        }
    }

    mod store_tests {
        use super::*;

        #[test]
        fn test_file_store_missing_file() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonFileSettingsStore::new(dir.path().join("settings.json"));
            assert!(store.load().is_none());
        }

        #[test]
        fn test_file_store_save_and_load() {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonFileSettingsStore::new(dir.path().join("nested").join("settings.json"));
            let settings = StoredSettings {
                mode: ModeKey::Soft,
                focus_sessions_completed: 5,
                ..StoredSettings::default()
            };

            store.save(&settings).unwrap();

            assert!(store.path().exists());
            assert_eq!(store.load(), Some(settings));
        }

        #[test]
        fn test_file_store_corrupt_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("settings.json");
            std::fs::write(&path, "{broken").unwrap();

            assert!(JsonFileSettingsStore::new(&path).load().is_none());
        }

        #[test]
        fn test_memory_store() {
            let store = MemorySettingsStore::new();
            assert!(store.load().is_none());

            store.save(&StoredSettings::default()).unwrap();
            assert_eq!(store.save_count(), 1);
            assert_eq!(store.load(), Some(StoredSettings::default()));

            store.set_should_fail(true);
            assert!(store.save(&StoredSettings::default()).is_err());
            assert_eq!(store.save_count(), 1);
        }
    }
}
