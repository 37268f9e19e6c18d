//! Cloud sync of the user's custom mode.
//!
//! The backend is a PostgREST-style REST API holding one `custom_mode` row per
//! user plus a `profiles` row. The account identity and API credentials come
//! from the environment; there is no login flow.

mod error;
mod rest;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use error::SyncError;
pub use rest::RestCustomModeStore;

use crate::types::{CustomModeParams, CustomModeSummary, ModeConfig};

// ============================================================================
// Configuration
// ============================================================================

pub const URL_ENV: &str = "POMODORO_SYNC_URL";
pub const KEY_ENV: &str = "POMODORO_SYNC_KEY";
pub const USER_ID_ENV: &str = "POMODORO_SYNC_USER_ID";
pub const TOKEN_ENV: &str = "POMODORO_SYNC_TOKEN";

/// Connection settings for the sync backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Base URL, e.g. `https://project.supabase.co`
    pub url: String,
    /// Public API key sent as `apikey`
    pub api_key: String,
    pub user_id: String,
    /// Access token of the signed-in user
    pub access_token: String,
}

impl SyncConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Returns None unless every variable is set and non-empty.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Some(Self {
            url: get(URL_ENV)?.trim_end_matches('/').to_string(),
            api_key: get(KEY_ENV)?,
            user_id: get(USER_ID_ENV)?,
            access_token: get(TOKEN_ENV)?,
        })
    }
}

// ============================================================================
// Rows
// ============================================================================

/// Accent color of the custom mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AccentColor {
    #[default]
    Tomato,
    Warm,
    Gym,
    Night,
}

impl AccentColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccentColor::Tomato => "tomato",
            AccentColor::Warm => "warm",
            AccentColor::Gym => "gym",
            AccentColor::Night => "night",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tomato" => Some(AccentColor::Tomato),
            "warm" => Some(AccentColor::Warm),
            "gym" => Some(AccentColor::Gym),
            "night" => Some(AccentColor::Night),
            _ => None,
        }
    }
}

/// A `custom_mode` row as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomModeRow {
    pub id: String,
    pub user_id: String,
    pub focus_sec: u32,
    pub short_break_sec: u32,
    pub long_break_sec: u32,
    pub long_break_every: u32,
    pub accent_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl CustomModeRow {
    /// Timer configuration described by this row.
    pub fn to_config(&self) -> ModeConfig {
        ModeConfig::new(
            "Custom",
            self.focus_sec,
            self.short_break_sec,
            self.long_break_sec,
            self.long_break_every,
        )
    }

    pub fn summary(&self) -> CustomModeSummary {
        CustomModeSummary {
            id: self.id.clone(),
            focus_sec: self.focus_sec,
            short_break_sec: self.short_break_sec,
            long_break_sec: self.long_break_sec,
            long_break_every: self.long_break_every,
            accent_color: self.accent_color.clone(),
        }
    }
}

/// Editable values of a custom mode, in backend column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CustomModeDraft {
    pub focus_sec: u32,
    pub short_break_sec: u32,
    pub long_break_sec: u32,
    pub long_break_every: u32,
    pub accent_color: AccentColor,
}

impl Default for CustomModeDraft {
    fn default() -> Self {
        Self {
            focus_sec: 25 * 60,
            short_break_sec: 5 * 60,
            long_break_sec: 15 * 60,
            long_break_every: 4,
            accent_color: AccentColor::Tomato,
        }
    }
}

/// Allowed minute ranges for edits.
pub const FOCUS_MINUTES: (u32, u32) = (1, 180);
pub const SHORT_BREAK_MINUTES: (u32, u32) = (1, 60);
pub const LONG_BREAK_MINUTES: (u32, u32) = (1, 90);
pub const LONG_BREAK_EVERY: (u32, u32) = (1, 10);

fn clamp_range(value: u32, (min, max): (u32, u32)) -> u32 {
    value.clamp(min, max)
}

fn minutes_from_secs(secs: u32) -> u32 {
    secs / 60 + u32::from(secs % 60 >= 30)
}

impl CustomModeDraft {
    /// Draft seeded from an existing row, with values brought into range.
    pub fn from_row(row: &CustomModeRow) -> Self {
        let minutes = |secs, range| clamp_range(minutes_from_secs(secs), range) * 60;
        Self {
            focus_sec: minutes(row.focus_sec, FOCUS_MINUTES),
            short_break_sec: minutes(row.short_break_sec, SHORT_BREAK_MINUTES),
            long_break_sec: minutes(row.long_break_sec, LONG_BREAK_MINUTES),
            long_break_every: clamp_range(row.long_break_every, LONG_BREAK_EVERY),
            accent_color: AccentColor::parse(&row.accent_color).unwrap_or_default(),
        }
    }

    /// Applies the set fields of `params`, clamping minutes into range.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidAccent` for an unknown accent color; the
    /// draft is left untouched in that case.
    pub fn apply(&mut self, params: &CustomModeParams) -> Result<(), SyncError> {
        let accent = match params.accent_color.as_deref() {
            Some(raw) => {
                Some(AccentColor::parse(raw).ok_or_else(|| SyncError::InvalidAccent(raw.to_string()))?)
            }
            None => None,
        };

        if let Some(m) = params.focus_minutes {
            self.focus_sec = clamp_range(m, FOCUS_MINUTES) * 60;
        }
        if let Some(m) = params.short_break_minutes {
            self.short_break_sec = clamp_range(m, SHORT_BREAK_MINUTES) * 60;
        }
        if let Some(m) = params.long_break_minutes {
            self.long_break_sec = clamp_range(m, LONG_BREAK_MINUTES) * 60;
        }
        if let Some(every) = params.long_break_every {
            self.long_break_every = clamp_range(every, LONG_BREAK_EVERY);
        }
        if let Some(accent) = accent {
            self.accent_color = accent;
        }
        Ok(())
    }
}

// ============================================================================
// CustomModeStore
// ============================================================================

/// Remote storage of the custom mode.
#[allow(async_fn_in_trait)]
pub trait CustomModeStore {
    /// Makes sure the user's profile row exists.
    async fn ensure_profile(&self, user_id: &str) -> Result<(), SyncError>;

    /// Returns the user's custom mode, if one exists.
    async fn fetch(&self, user_id: &str) -> Result<Option<CustomModeRow>, SyncError>;

    /// Creates the user's custom mode.
    async fn create(&self, user_id: &str, draft: &CustomModeDraft)
        -> Result<CustomModeRow, SyncError>;

    /// Overwrites the user's custom mode.
    async fn update(&self, user_id: &str, draft: &CustomModeDraft)
        -> Result<CustomModeRow, SyncError>;
}

/// In-memory custom mode store for testing. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCustomModeStore {
    rows: Arc<Mutex<HashMap<String, CustomModeRow>>>,
    profiles: Arc<Mutex<HashSet<String>>>,
    should_fail: Arc<AtomicBool>,
    update_count: Arc<AtomicUsize>,
    update_response: Arc<Mutex<Option<CustomModeRow>>>,
}

impl MemoryCustomModeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already holds `row`.
    #[must_use]
    pub fn with_row(row: CustomModeRow) -> Self {
        let store = Self::default();
        if let Ok(mut rows) = store.rows.lock() {
            rows.insert(row.user_id.clone(), row);
        }
        store
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn has_profile(&self, user_id: &str) -> bool {
        self.profiles
            .lock()
            .map(|p| p.contains(user_id))
            .unwrap_or(false)
    }

    /// Makes the next update answer with `row` as the stored result.
    pub fn set_update_response(&self, row: CustomModeRow) {
        if let Ok(mut next) = self.update_response.lock() {
            *next = Some(row);
        }
    }

    #[must_use]
    pub fn update_count(&self) -> usize {
        self.update_count.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn row(&self, user_id: &str) -> Option<CustomModeRow> {
        self.rows.lock().ok().and_then(|r| r.get(user_id).cloned())
    }

    fn check(&self) -> Result<(), SyncError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SyncError::Status {
                status: 503,
                message: "Mock failure".to_string(),
            });
        }
        Ok(())
    }

    fn lock_rows(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, CustomModeRow>>, SyncError> {
        self.rows
            .lock()
            .map_err(|_| SyncError::Decode("store poisoned".to_string()))
    }
}

fn row_from_draft(id: String, user_id: &str, draft: &CustomModeDraft) -> CustomModeRow {
    CustomModeRow {
        id,
        user_id: user_id.to_string(),
        focus_sec: draft.focus_sec,
        short_break_sec: draft.short_break_sec,
        long_break_sec: draft.long_break_sec,
        long_break_every: draft.long_break_every,
        accent_color: draft.accent_color.as_str().to_string(),
        created_at: None,
        updated_at: None,
    }
}

impl CustomModeStore for MemoryCustomModeStore {
    async fn ensure_profile(&self, user_id: &str) -> Result<(), SyncError> {
        self.check()?;
        if let Ok(mut profiles) = self.profiles.lock() {
            profiles.insert(user_id.to_string());
        }
        Ok(())
    }

    async fn fetch(&self, user_id: &str) -> Result<Option<CustomModeRow>, SyncError> {
        self.check()?;
        Ok(self.lock_rows()?.get(user_id).cloned())
    }

    async fn create(
        &self,
        user_id: &str,
        draft: &CustomModeDraft,
    ) -> Result<CustomModeRow, SyncError> {
        self.check()?;
        let mut rows = self.lock_rows()?;
        if rows.contains_key(user_id) {
            return Err(SyncError::Status {
                status: 409,
                message: "duplicate key value violates unique constraint".to_string(),
            });
        }
        let row = row_from_draft(uuid::Uuid::new_v4().to_string(), user_id, draft);
        rows.insert(user_id.to_string(), row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        user_id: &str,
        draft: &CustomModeDraft,
    ) -> Result<CustomModeRow, SyncError> {
        self.check()?;
        let mut rows = self.lock_rows()?;
        let existing = rows.get(user_id).ok_or(SyncError::NotFound)?;
        let row = self
            .update_response
            .lock()
            .ok()
            .and_then(|mut next| next.take())
            .unwrap_or_else(|| row_from_draft(existing.id.clone(), user_id, draft));
        rows.insert(user_id.to_string(), row.clone());
        self.update_count.fetch_add(1, Ordering::SeqCst);
        Ok(row)
    }
}

// ============================================================================
// Tests
// ============================================================================
