//! Daemon-side owner of all runtime state.
//!
//! A `Session` wires the timer engine to everything that reacts to it: sound
//! cues, ambience, break reminders, persisted preferences and the cloud custom
//! mode. Every public operation ends with the same pass:
//!
//! 1. drain the engine's events (cues, messages, notices)
//! 2. reconcile ambience with the new phase and running flag
//! 3. persist settings if anything changed
//!
//! Boundary failures (audio, storage, network) are logged or reported through
//! `cloud_status`; they never change engine state.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::clock::phase_label;
use super::modes;
use super::timer::{TimerEngine, TimerEvent};
use crate::reminders::content::{
    messages_for, IDLE_HINT, RUNNING_HINT, SKIPPED_BREAK_MESSAGE, SKIPPED_FOCUS_MESSAGE,
};
use crate::reminders::{self, Notice, NoticeKind, Notifier, ReminderError, ReminderPicker};
use crate::sound::{
    AmbienceAction, AmbienceBackend, AmbienceController, AmbienceInputs, AudioContext,
    SoundEvent, SoundPlayer, clamp_volume,
};
use crate::storage::{ReminderStore, SettingsStore, StoredSettings};
use crate::sync::{CustomModeDraft, CustomModeRow, CustomModeStore, SyncError};
use crate::types::{
    AmbienceParams, AmbienceStatus, CustomModeParams, ModeKey, Phase, ResponseData, TimerState,
    UiMode,
};

pub const SAVE_WHILE_RUNNING: &str = "Pause the timer before saving your custom settings.";
const CUSTOM_LOADED: &str = "Custom mode loaded.";
const CUSTOM_MISSING: &str = "No custom mode yet.";
const CUSTOM_CREATED: &str = "Custom mode created ✅";
const CUSTOM_CREATE_FAILED: &str = "Could not create custom mode.";
const CUSTOM_SAVED: &str = "Saved ✅";
const CUSTOM_SAVE_FAILED: &str = "Could not save custom mode.";

// ============================================================================
// SessionError
// ============================================================================

/// Errors returned by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Custom mode needs cloud sync
    #[error("カスタムモードにはクラウド同期の設定が必要です")]
    SyncNotConfigured,

    /// Custom settings can only be saved while paused
    #[error("{}", SAVE_WHILE_RUNNING)]
    SaveWhileRunning,

    #[error("カスタムモードがまだありません (`pomodoro custom create` で作成できます)")]
    NoCustomMode,

    #[error("カスタムモードは既に作成されています")]
    CustomModeExists,

    #[error("長い休憩のプロンプトは表示されていません")]
    NoLongBreakPrompt,

    #[error(transparent)]
    Reminder(#[from] ReminderError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

// ============================================================================
// Session
// ============================================================================

/// The account a session syncs its custom mode with.
pub struct CloudSync<S> {
    pub store: S,
    pub user_id: String,
}

/// Collaborators handed to [`Session::new`].
pub struct SessionParts<S> {
    pub settings_store: Box<dyn SettingsStore>,
    pub reminder_store: Box<dyn ReminderStore>,
    /// None when no audio device is available
    pub player: Option<Box<dyn SoundPlayer>>,
    pub ambience: Box<dyn AmbienceBackend>,
    pub notifier: Box<dyn Notifier>,
    pub picker: ReminderPicker,
    /// None when sync is not configured
    pub cloud: Option<CloudSync<S>>,
}

pub struct Session<S> {
    engine: TimerEngine,
    event_rx: mpsc::UnboundedReceiver<TimerEvent>,
    mode: ModeKey,
    settings: StoredSettings,
    /// Last settings written to the store
    persisted: Option<StoredSettings>,
    settings_store: Box<dyn SettingsStore>,
    reminders: Vec<String>,
    reminder_store: Box<dyn ReminderStore>,
    player: Option<Box<dyn SoundPlayer>>,
    ambience: AmbienceController,
    notifier: Box<dyn Notifier>,
    picker: ReminderPicker,
    cloud: Option<CloudSync<S>>,
    custom: Option<CustomModeRow>,
    cloud_status: Option<String>,
    notice: Option<Notice>,
    message: Option<String>,
}

impl<S: CustomModeStore> Session<S> {
    /// Restores persisted state and builds an idle session.
    ///
    /// A stored custom mode without sync falls back to normal.
    pub fn new(parts: SessionParts<S>) -> Self {
        let loaded = parts.settings_store.load();
        let mut settings = loaded.clone().unwrap_or_default();
        if settings.mode == ModeKey::Custom && parts.cloud.is_none() {
            info!("Custom mode needs sync; falling back to normal");
            settings.mode = ModeKey::Normal;
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let engine = TimerEngine::new(modes::resolve(settings.mode, None), event_tx)
            .with_focus_sessions_completed(settings.focus_sessions_completed);

        if let Some(player) = parts.player.as_ref() {
            if settings.sound_enabled {
                player.enable();
            } else {
                player.disable();
            }
        }

        Self {
            engine,
            event_rx,
            mode: settings.mode,
            settings,
            persisted: loaded,
            settings_store: parts.settings_store,
            reminders: parts.reminder_store.load(),
            reminder_store: parts.reminder_store,
            player: parts.player,
            ambience: AmbienceController::new(parts.ambience),
            notifier: parts.notifier,
            picker: parts.picker,
            cloud: parts.cloud,
            custom: None,
            cloud_status: None,
            notice: None,
            message: None,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn state(&self) -> &TimerState {
        self.engine.get_state()
    }

    pub fn mode(&self) -> ModeKey {
        self.mode
    }

    pub fn settings(&self) -> &StoredSettings {
        &self.settings
    }

    pub fn reminders(&self) -> &[String] {
        &self.reminders
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cloud_status(&self) -> Option<&str> {
        self.cloud_status.as_deref()
    }

    pub fn custom_mode(&self) -> Option<&CustomModeRow> {
        self.custom.as_ref()
    }

    pub fn is_sync_configured(&self) -> bool {
        self.cloud.is_some()
    }

    /// Type of the ambience instance currently playing.
    pub fn playing_ambience(&self) -> Option<crate::types::AmbienceType> {
        self.ambience.active_kind()
    }

    // ------------------------------------------------------------------------
    // Timer operations
    // ------------------------------------------------------------------------

    pub fn start(&mut self) {
        if !self.engine.get_state().is_running() {
            self.message = None;
        }
        self.engine.start();
        self.settle();
    }

    pub fn pause(&mut self) {
        self.engine.pause();
        self.settle();
    }

    pub fn toggle(&mut self) {
        if self.engine.get_state().is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    pub fn reset(&mut self) {
        self.message = None;
        self.engine.reset();
        self.settle();
    }

    pub fn skip(&mut self) {
        self.message = None;
        self.engine.skip();
        self.settle();
    }

    /// One scheduler tick. Returns true if a phase completed.
    pub fn tick(&mut self) -> bool {
        let completed = self.engine.tick();
        self.settle();
        completed
    }

    // ------------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------------

    /// Switches the active mode.
    ///
    /// The engine is only reset when the mode identity (key plus custom row id)
    /// actually changes.
    pub fn set_mode(&mut self, key: ModeKey) -> Result<(), SessionError> {
        if key == ModeKey::Custom && self.cloud.is_none() {
            return Err(SessionError::SyncNotConfigured);
        }
        self.apply_mode(key);
        self.settle();
        Ok(())
    }

    pub fn set_sound(&mut self, enabled: bool) {
        self.settings.sound_enabled = enabled;
        if let Some(player) = self.player.as_ref() {
            if enabled {
                player.enable();
            } else {
                player.disable();
            }
        }
        self.settle();
    }

    /// Applies the set fields of `params`.
    pub fn set_ambience(&mut self, params: &AmbienceParams) {
        if let Some(enabled) = params.enabled {
            self.settings.ambience_enabled = enabled;
        }
        if let Some(kind) = params.kind {
            self.settings.ambience_type = kind;
        }
        if let Some(play_mode) = params.play_mode {
            self.settings.ambience_play_mode = play_mode;
        }
        if let Some(volume) = params.volume {
            self.settings.ambience_volume = clamp_volume(volume);
        }
        self.settle();
    }

    /// Sets the display mode, or toggles it when `ui_mode` is None.
    pub fn set_view(&mut self, ui_mode: Option<UiMode>) -> UiMode {
        self.settings.ui_mode = ui_mode.unwrap_or_else(|| self.settings.ui_mode.toggled());
        self.settle();
        self.settings.ui_mode
    }

    // ------------------------------------------------------------------------
    // Reminders
    // ------------------------------------------------------------------------

    pub fn add_reminder(&mut self, text: &str) -> Result<(), SessionError> {
        reminders::add_reminder(&mut self.reminders, text)?;
        self.save_reminders();
        Ok(())
    }

    pub fn remove_reminder(&mut self, index: usize) -> Result<String, SessionError> {
        let removed = reminders::remove_reminder(&mut self.reminders, index)?;
        self.save_reminders();
        Ok(removed)
    }

    /// Replaces the long-break prompt with another idea.
    pub fn another(&mut self) -> Result<&Notice, SessionError> {
        match self.notice.as_ref() {
            Some(notice) if notice.kind == NoticeKind::LongBreakPrompt => {}
            _ => return Err(SessionError::NoLongBreakPrompt),
        }
        self.show_long_prompt();
        self.notice.as_ref().ok_or(SessionError::NoLongBreakPrompt)
    }

    /// Closes the current notice. Returns true if one was shown.
    pub fn dismiss(&mut self) -> bool {
        if self.notice.take().is_some() {
            self.notifier.dismiss();
            true
        } else {
            false
        }
    }

    fn save_reminders(&self) {
        if let Err(e) = self.reminder_store.save(&self.reminders) {
            warn!("Failed to save reminders: {} ({})", e, e.suggestion());
        }
    }

    // ------------------------------------------------------------------------
    // Cloud custom mode
    // ------------------------------------------------------------------------

    fn cloud(&self) -> Result<&CloudSync<S>, SessionError> {
        self.cloud.as_ref().ok_or(SessionError::SyncNotConfigured)
    }

    /// Ensures the profile exists and loads the custom mode.
    pub async fn cloud_load(&mut self) -> Result<(), SessionError> {
        let result = match self.cloud.as_ref() {
            Some(cloud) => fetch_custom(cloud).await,
            None => Err(SyncError::NotConfigured),
        };

        match result {
            Ok(row) => {
                self.cloud_status = Some(
                    if row.is_some() {
                        CUSTOM_LOADED
                    } else {
                        CUSTOM_MISSING
                    }
                    .to_string(),
                );
                self.set_custom_row(row);
                self.settle();
                Ok(())
            }
            Err(e) => {
                if e.is_transient() {
                    warn!("Custom mode unavailable for now, retry with `pomodoro custom sync`: {}", e);
                } else {
                    warn!("Failed to load custom mode: {}", e);
                }
                self.cloud_status = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Creates the custom mode with default values.
    pub async fn cloud_create(&mut self) -> Result<(), SessionError> {
        if self.custom.is_some() {
            return Err(SessionError::CustomModeExists);
        }
        let cloud = self.cloud()?;
        let result = cloud
            .store
            .create(&cloud.user_id, &CustomModeDraft::default())
            .await;

        match result {
            Ok(row) => {
                info!("Custom mode created: {}", row.id);
                self.cloud_status = Some(CUSTOM_CREATED.to_string());
                self.set_custom_row(Some(row));
                self.settle();
                Ok(())
            }
            Err(e) => {
                warn!("Failed to create custom mode: {}", e);
                self.cloud_status = Some(CUSTOM_CREATE_FAILED.to_string());
                Err(e.into())
            }
        }
    }

    /// Saves edits to the custom mode.
    ///
    /// Refused while the timer runs. When custom is the active mode the new
    /// values take effect immediately as a fresh focus phase.
    pub async fn cloud_save(&mut self, params: &CustomModeParams) -> Result<(), SessionError> {
        self.cloud()?;
        let row = self.custom.as_ref().ok_or(SessionError::NoCustomMode)?;
        let mut draft = CustomModeDraft::from_row(row);

        if self.engine.get_state().is_running() {
            self.cloud_status = Some(SAVE_WHILE_RUNNING.to_string());
            return Err(SessionError::SaveWhileRunning);
        }

        draft.apply(params)?;
        let cloud = self.cloud()?;
        let result = cloud.store.update(&cloud.user_id, &draft).await;

        match result {
            Ok(row) => {
                debug!("Custom mode saved: {:?}", draft);
                self.cloud_status = Some(CUSTOM_SAVED.to_string());
                if self.mode == ModeKey::Custom {
                    self.message = None;
                    let config = modes::resolve(ModeKey::Custom, Some(&row.to_config()));
                    self.engine.replace_config(config);
                    self.engine.reset();
                }
                self.custom = Some(row);
                self.settle();
                Ok(())
            }
            Err(e) => {
                warn!("Failed to save custom mode: {}", e);
                self.cloud_status = Some(CUSTOM_SAVE_FAILED.to_string());
                Err(e.into())
            }
        }
    }

    fn set_custom_row(&mut self, row: Option<CustomModeRow>) {
        let before = self.custom.as_ref().map(|r| r.id.clone());
        self.custom = row;

        if self.mode != ModeKey::Custom {
            return;
        }
        let after = self.custom.as_ref().map(|r| r.id.clone());
        let config = modes::resolve(ModeKey::Custom, self.custom_config().as_ref());
        if before == after {
            self.engine.replace_config(config);
        } else {
            self.message = None;
            self.engine.change_mode(config);
        }
    }

    fn custom_config(&self) -> Option<crate::types::ModeConfig> {
        self.custom.as_ref().map(CustomModeRow::to_config)
    }

    fn apply_mode(&mut self, key: ModeKey) {
        if key == self.mode {
            return;
        }
        self.mode = key;
        self.message = None;
        let custom = self.custom_config();
        self.engine.change_mode(modes::resolve(key, custom.as_ref()));
    }

    // ------------------------------------------------------------------------
    // Settle pass
    // ------------------------------------------------------------------------

    fn settle(&mut self) {
        self.drain_events();
        self.reconcile_ambience();
        self.persist();
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                TimerEvent::Started { .. } => self.play(SoundEvent::Start),
                TimerEvent::FocusCompleted { .. } => {
                    self.play(SoundEvent::FocusComplete);
                    self.message = self
                        .picker
                        .pick_any(messages_for(self.mode).focus_complete)
                        .map(str::to_string);
                }
                TimerEvent::BreakCompleted { .. } => {
                    self.play(SoundEvent::BreakComplete);
                    self.message = self
                        .picker
                        .pick_any(messages_for(self.mode).break_complete)
                        .map(str::to_string);
                }
                TimerEvent::Skipped { counted, .. } => {
                    self.message = Some(
                        if counted {
                            SKIPPED_FOCUS_MESSAGE
                        } else {
                            SKIPPED_BREAK_MESSAGE
                        }
                        .to_string(),
                    );
                }
                TimerEvent::PhaseChanged { to, .. } => self.on_phase_changed(to),
                TimerEvent::Paused | TimerEvent::Reset | TimerEvent::ModeChanged { .. } => {}
            }
        }
    }

    fn play(&self, event: SoundEvent) {
        if !self.settings.sound_enabled {
            return;
        }
        if let Some(player) = self.player.as_ref() {
            if let Err(e) = player.play_event(event) {
                warn!("Failed to play cue: {}", e);
            }
        }
    }

    fn on_phase_changed(&mut self, to: Phase) {
        match to {
            Phase::ShortBreak => {
                if let Some(text) = self.picker.short_tip() {
                    self.show_notice(Notice {
                        kind: NoticeKind::ShortBreakTip,
                        text,
                    });
                }
            }
            Phase::LongBreak => self.show_long_prompt(),
            Phase::Focus => {
                self.dismiss();
            }
        }
    }

    fn show_long_prompt(&mut self) {
        let use_custom = self.mode == ModeKey::Custom;
        if let Some(text) = self.picker.long_idea(&self.reminders, use_custom) {
            self.show_notice(Notice {
                kind: NoticeKind::LongBreakPrompt,
                text,
            });
        }
    }

    fn show_notice(&mut self, notice: Notice) {
        self.notifier.show(&notice);
        self.notice = Some(notice);
    }

    fn reconcile_ambience(&mut self) {
        let state = self.engine.get_state();
        let inputs = AmbienceInputs {
            enabled: self.settings.ambience_enabled,
            kind: self.settings.ambience_type,
            play_mode: self.settings.ambience_play_mode,
            volume: self.settings.ambience_volume,
            phase: state.phase,
            is_running: state.is_running(),
        };
        let action = self.ambience.reconcile(&inputs);
        if action != AmbienceAction::Idle {
            debug!("Ambience {:?} ({})", action, self.ambience.backend_name());
        }
    }

    fn persist(&mut self) {
        self.settings.mode = self.mode;
        self.settings.focus_sessions_completed = self.engine.get_state().focus_sessions_completed;
        if self.persisted.as_ref() == Some(&self.settings) {
            return;
        }
        match self.settings_store.save(&self.settings) {
            Ok(()) => self.persisted = Some(self.settings.clone()),
            Err(e) => warn!("Failed to save settings: {} ({})", e, e.suggestion()),
        }
    }

    // ------------------------------------------------------------------------
    // Snapshot & shutdown
    // ------------------------------------------------------------------------

    /// Full status snapshot for IPC responses.
    pub fn snapshot(&self) -> ResponseData {
        let state = self.engine.get_state();
        ResponseData {
            phase: Some(state.phase),
            phase_label: Some(phase_label(state.phase).to_string()),
            remaining_seconds: Some(state.remaining_seconds),
            is_running: Some(state.is_running),
            focus_sessions_completed: Some(state.focus_sessions_completed),
            mode: Some(self.mode),
            mode_label: Some(state.config.label.clone()),
            long_break_every: Some(state.config.long_break_every),
            ui_mode: Some(self.settings.ui_mode),
            sound_enabled: Some(self.settings.sound_enabled),
            ambience: Some(AmbienceStatus {
                enabled: self.settings.ambience_enabled,
                kind: self.settings.ambience_type,
                play_mode: self.settings.ambience_play_mode,
                volume: self.settings.ambience_volume,
                playing: self.ambience.active_kind(),
            }),
            message: self.message.clone(),
            hint: Some(if state.is_running { RUNNING_HINT } else { IDLE_HINT }.to_string()),
            notice: self.notice.as_ref().map(|n| n.text.clone()),
            notice_kind: self.notice.as_ref().map(|n| n.kind.as_str().to_string()),
            cloud_status: self.cloud_status.clone(),
            custom_mode: self.custom.as_ref().map(CustomModeRow::summary),
            reminders: Some(self.reminders.clone()),
        }
    }

    /// Stops ambience, persists settings and releases the audio output.
    pub fn shutdown(&mut self) {
        self.ambience.stop();
        self.persist();
        self.player = None;
        AudioContext::shutdown();
        info!("Session shut down");
    }
}

async fn fetch_custom<S: CustomModeStore>(
    cloud: &CloudSync<S>,
) -> Result<Option<CustomModeRow>, SyncError> {
    cloud.store.ensure_profile(&cloud.user_id).await?;
    cloud.store.fetch(&cloud.user_id).await
}

// ============================================================================
// Tests
// ============================================================================
