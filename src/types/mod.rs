//! Core data types for the Pomodoro Timer.
//!
//! This module defines the data structures used for:
//! - Timer phases and mode configuration with validation
//! - Timer state owned by the engine
//! - Ambience and display preferences
//! - IPC request/response serialization

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

// ============================================================================
// Phase
// ============================================================================

/// The current timer activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Focused work
    #[default]
    Focus,
    /// Short break between focus sessions
    ShortBreak,
    /// Long break after `long_break_every` focus sessions
    LongBreak,
}

impl Phase {
    /// Returns the wire representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Focus => "focus",
            Phase::ShortBreak => "shortBreak",
            Phase::LongBreak => "longBreak",
        }
    }

    /// Returns true for either break phase.
    pub fn is_break(&self) -> bool {
        matches!(self, Phase::ShortBreak | Phase::LongBreak)
    }
}

// ============================================================================
// ModeKey
// ============================================================================

/// Identifies a named preset or the user-defined custom mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ModeKey {
    Soft,
    #[default]
    Normal,
    Hard,
    Custom,
}

impl ModeKey {
    /// Returns the string representation of the mode key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKey::Soft => "soft",
            ModeKey::Normal => "normal",
            ModeKey::Hard => "hard",
            ModeKey::Custom => "custom",
        }
    }

    /// Parses a stored mode key, returning None for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "soft" => Some(ModeKey::Soft),
            "normal" => Some(ModeKey::Normal),
            "hard" => Some(ModeKey::Hard),
            "custom" => Some(ModeKey::Custom),
            _ => None,
        }
    }
}

// ============================================================================
// ModeConfig
// ============================================================================

/// Durations and long-break cadence for one mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeConfig {
    /// Display label (e.g. "Normal")
    pub label: String,
    /// Focus duration in seconds
    pub focus_sec: u32,
    /// Short break duration in seconds
    pub short_break_sec: u32,
    /// Long break duration in seconds
    pub long_break_sec: u32,
    /// Number of focus sessions between long breaks (>= 1)
    pub long_break_every: u32,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            label: "Normal".to_string(),
            focus_sec: 25 * 60,
            short_break_sec: 5 * 60,
            long_break_sec: 15 * 60,
            long_break_every: 4,
        }
    }
}

impl ModeConfig {
    /// Creates a configuration from durations in seconds.
    pub fn new(
        label: impl Into<String>,
        focus_sec: u32,
        short_break_sec: u32,
        long_break_sec: u32,
        long_break_every: u32,
    ) -> Self {
        Self {
            label: label.into(),
            focus_sec,
            short_break_sec,
            long_break_sec,
            long_break_every,
        }
    }

    /// Returns a copy with the specified focus duration.
    pub fn with_focus_sec(mut self, seconds: u32) -> Self {
        self.focus_sec = seconds;
        self
    }

    /// Returns a copy with the specified short break duration.
    pub fn with_short_break_sec(mut self, seconds: u32) -> Self {
        self.short_break_sec = seconds;
        self
    }

    /// Returns a copy with the specified long break duration.
    pub fn with_long_break_sec(mut self, seconds: u32) -> Self {
        self.long_break_sec = seconds;
        self
    }

    /// Returns a copy with the specified long-break cadence.
    pub fn with_long_break_every(mut self, every: u32) -> Self {
        self.long_break_every = every;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.focus_sec == 0 {
            return Err("作業時間は1秒以上で指定してください".to_string());
        }
        if self.short_break_sec == 0 {
            return Err("休憩時間は1秒以上で指定してください".to_string());
        }
        if self.long_break_sec == 0 {
            return Err("長い休憩時間は1秒以上で指定してください".to_string());
        }
        if self.long_break_every == 0 {
            return Err("長い休憩の間隔は1以上で指定してください".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Ambience / display preferences
// ============================================================================

/// Background ambience sound type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AmbienceType {
    #[default]
    None,
    Rain,
    Night,
    White,
}

impl AmbienceType {
    /// Returns the string representation of the ambience type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AmbienceType::None => "none",
            AmbienceType::Rain => "rain",
            AmbienceType::Night => "night",
            AmbienceType::White => "white",
        }
    }

    /// Parses a stored ambience type, returning None for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(AmbienceType::None),
            "rain" => Some(AmbienceType::Rain),
            "night" => Some(AmbienceType::Night),
            "white" => Some(AmbienceType::White),
            _ => None,
        }
    }
}

/// When ambience is allowed to play.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AmbiencePlayMode {
    /// Only during focus phases
    #[default]
    Focus,
    /// During every phase
    Always,
}

impl AmbiencePlayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmbiencePlayMode::Focus => "focus",
            AmbiencePlayMode::Always => "always",
        }
    }
}

/// How much the status display shows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    #[default]
    Dashboard,
    Minimal,
}

impl UiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiMode::Dashboard => "dashboard",
            UiMode::Minimal => "minimal",
        }
    }

    /// Returns the other display mode.
    pub fn toggled(&self) -> Self {
        match self {
            UiMode::Dashboard => UiMode::Minimal,
            UiMode::Minimal => UiMode::Dashboard,
        }
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// Represents the current state of the timer.
///
/// Owned exclusively by the timer engine; everything else reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerState {
    /// Current phase of the timer
    pub phase: Phase,
    /// Remaining seconds in the current phase
    pub remaining_seconds: u32,
    /// Whether the countdown is running
    pub is_running: bool,
    /// Number of completed (or skipped) focus sessions
    pub focus_sessions_completed: u32,
    /// Active mode configuration
    pub config: ModeConfig,
}

impl TimerState {
    /// Creates a new idle TimerState at the start of a focus phase.
    pub fn new(config: ModeConfig) -> Self {
        Self {
            phase: Phase::Focus,
            remaining_seconds: config.focus_sec,
            is_running: false,
            focus_sessions_completed: 0,
            config,
        }
    }

    /// Returns true if the timer is actively counting down.
    pub fn is_running(&self) -> bool {
        self.is_running
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// Parameters for the ambience command. Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbienceParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<AmbienceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_mode: Option<AmbiencePlayMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
}

/// Parameters for saving the custom mode. Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomModeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_break_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_break_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_break_every: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
}

impl CustomModeParams {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.focus_minutes.is_none()
            && self.short_break_minutes.is_none()
            && self.long_break_minutes.is_none()
            && self.long_break_every.is_none()
            && self.accent_color.is_none()
    }
}

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcRequest {
    /// Start (or continue) the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Start if idle, pause if running
    Toggle,
    /// Return to a full focus phase without counting
    Reset,
    /// Skip the current phase
    Skip,
    /// Query the current status
    Status,
    /// Switch the active mode
    Mode { mode: ModeKey },
    /// Enable or disable sound cues
    Sound { enabled: bool },
    /// Update ambience preferences
    Ambience {
        #[serde(flatten)]
        params: AmbienceParams,
    },
    /// Set the display mode; toggles when absent
    View {
        #[serde(rename = "uiMode", skip_serializing_if = "Option::is_none")]
        ui_mode: Option<UiMode>,
    },
    /// Add a personal long-break reminder
    ReminderAdd { text: String },
    /// Remove a personal long-break reminder by index
    ReminderRemove { index: usize },
    /// List personal long-break reminders
    ReminderList,
    /// Pick another long-break idea
    Another,
    /// Dismiss the current notice
    Dismiss,
    /// Show the loaded custom mode
    CustomShow,
    /// Create the custom mode in the cloud
    CustomCreate,
    /// Save edits to the custom mode
    CustomSave {
        #[serde(flatten)]
        params: CustomModeParams,
    },
    /// Reload cloud data
    Sync,
}

/// Ambience portion of a status snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbienceStatus {
    pub enabled: bool,
    pub kind: AmbienceType,
    pub play_mode: AmbiencePlayMode,
    pub volume: f32,
    /// Type of the instance currently playing, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playing: Option<AmbienceType>,
}

/// Custom mode portion of a status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomModeSummary {
    pub id: String,
    pub focus_sec: u32,
    pub short_break_sec: u32,
    pub long_break_sec: u32,
    pub long_break_every: u32,
    pub accent_color: String,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_running: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_sessions_completed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ModeKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_break_every: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_mode: Option<UiMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambience: Option<AmbienceStatus>,
    /// Session feedback message (e.g. after a completion)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Break reminder currently shown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_mode: Option<CustomModeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Vec<String>>,
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true if the daemon reported success.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
