//! Sound playback system for the Pomodoro Timer.
//!
//! This module provides audio capabilities, including:
//!
//! - Short synthesized cues for timer events
//! - Background ambience (rain, night, white noise) with eligibility rules
//! - A shared, lazily opened audio output
//! - Graceful degradation when audio is unavailable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────────┐
//! │   SoundPlayer    │     │ AmbienceController   │
//! │  (cue patterns)  │     │ (one active instance)│
//! └────────┬─────────┘     └──────────┬───────────┘
//!          │                          │ AmbienceBackend
//!          ▼                          ▼
//! ┌─────────────────────────────────────────────────┐
//! │  AudioContext (thread-local rodio OutputStream) │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod ambience;
mod context;
mod error;
mod player;
pub mod synth;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub use ambience::{
    clamp_volume, create_ambience_backend, should_play, AmbienceAction, AmbienceBackend,
    AmbienceCall, AmbienceController, AmbienceHandle, AmbienceInputs, MockAmbienceBackend,
    SilentAmbienceBackend,
};
pub use context::AudioContext;
pub use error::SoundError;
pub use player::{try_create_player, RodioSoundPlayer, SoundEvent};

/// Trait for cue playback implementations.
///
/// This trait abstracts the sound playback functionality, allowing for
/// different implementations (e.g., rodio-based, mock for testing).
pub trait SoundPlayer {
    /// Plays the cue for the given event.
    ///
    /// This method should be non-blocking; the sound plays in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if playback fails.
    fn play_event(&self, event: SoundEvent) -> Result<(), SoundError>;

    /// Returns true if sound playback is disabled.
    fn is_disabled(&self) -> bool;

    /// Enables sound playback.
    fn enable(&self);

    /// Disables sound playback.
    fn disable(&self);
}

impl SoundPlayer for RodioSoundPlayer {
    fn play_event(&self, event: SoundEvent) -> Result<(), SoundError> {
        RodioSoundPlayer::play_event(self, event)
    }

    fn is_disabled(&self) -> bool {
        RodioSoundPlayer::is_disabled(self)
    }

    fn enable(&self) {
        RodioSoundPlayer::enable(self)
    }

    fn disable(&self) {
        RodioSoundPlayer::disable(self)
    }
}

/// Mock sound player for testing.
///
/// Clones share state, so a test can inspect the player it handed over.
#[derive(Debug, Clone)]
pub struct MockSoundPlayer {
    play_calls: Arc<Mutex<Vec<SoundEvent>>>,
    disabled: Arc<AtomicBool>,
    should_fail: Arc<AtomicBool>,
}

impl Default for MockSoundPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSoundPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            play_calls: Arc::new(Mutex::new(Vec::new())),
            disabled: Arc::new(AtomicBool::new(false)),
            should_fail: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.get_play_calls().len()
    }

    #[must_use]
    pub fn get_play_calls(&self) -> Vec<SoundEvent> {
        self.play_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.play_calls.lock() {
            calls.clear();
        }
    }
}

impl SoundPlayer for MockSoundPlayer {
    fn play_event(&self, event: SoundEvent) -> Result<(), SoundError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        if self.disabled.load(Ordering::SeqCst) {
            return Ok(());
        }
        if let Ok(mut calls) = self.play_calls.lock() {
            calls.push(event);
        }
        Ok(())
    }

    fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    fn enable(&self) {
        self.disabled.store(false, Ordering::SeqCst);
    }

    fn disable(&self) {
        self.disabled.store(true, Ordering::SeqCst);
    }
}
