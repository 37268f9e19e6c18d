//! Ambient Pomodoro Library
//!
//! This library provides the core functionality for the Pomodoro Timer CLI.
//! It includes:
//! - Timer engine and daemon session for Pomodoro cycles
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities
//! - Sound cues and background ambience synthesized with rodio
//! - Break reminders (tips, long-break ideas, personal reminders)
//! - Local persistence of preferences and reminders
//! - Cloud sync of the custom mode

pub mod cli;
pub mod daemon;
pub mod reminders;
pub mod sound;
pub mod storage;
pub mod sync;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    AmbienceParams, AmbiencePlayMode, AmbienceType, CustomModeParams, IpcRequest, IpcResponse,
    ModeConfig, ModeKey, Phase, ResponseData, TimerState, UiMode,
};

pub use daemon::{
    handle_request, CloudSync, Daemon, IpcServer, Session, SessionError, SessionParts,
    TimerEngine, TimerEvent,
};

// Re-export sound types
pub use sound::{
    AmbienceBackend, AmbienceController, MockAmbienceBackend, MockSoundPlayer, RodioSoundPlayer,
    SilentAmbienceBackend, SoundError, SoundEvent, SoundPlayer,
};

pub use reminders::{LogNotifier, MockNotifier, Notice, NoticeKind, Notifier, ReminderPicker};

pub use storage::{
    DataPaths, JsonFileReminderStore, JsonFileSettingsStore, MemoryReminderStore,
    MemorySettingsStore, StorageError, StoredSettings,
};

pub use sync::{
    CustomModeDraft, CustomModeRow, CustomModeStore, MemoryCustomModeStore, RestCustomModeStore,
    SyncConfig, SyncError,
};
