//! Sound cue player implementation using rodio.
//!
//! This module provides the `RodioSoundPlayer`, which renders the short tone
//! patterns for timer events on the shared audio context.

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::context::AudioContext;
use super::error::SoundError;
use super::synth::{CueSource, ToneStep};

// ============================================================================
// SoundEvent
// ============================================================================

/// Timer events that have an audible cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SoundEvent {
    /// Countdown started
    Start,
    /// Focus session finished
    FocusComplete,
    /// Break finished
    BreakComplete,
}

const START_PATTERN: [ToneStep; 2] = [
    ToneStep::square(0, 180.0, 28, 0.40),
    ToneStep::square(30, 240.0, 30, 0.36),
];

const FOCUS_COMPLETE_PATTERN: [ToneStep; 3] = [
    ToneStep::sine(0, 523.25, 190, 0.48),
    ToneStep::sine(150, 659.25, 210, 0.48),
    ToneStep::sine(330, 783.99, 240, 0.48),
];

const BREAK_COMPLETE_PATTERN: [ToneStep; 2] = [
    ToneStep::sine(0, 392.0, 210, 0.42),
    ToneStep::sine(190, 440.0, 200, 0.36),
];

impl SoundEvent {
    /// Tone pattern played for this event.
    pub fn pattern(&self) -> &'static [ToneStep] {
        match self {
            SoundEvent::Start => &START_PATTERN,
            SoundEvent::FocusComplete => &FOCUS_COMPLETE_PATTERN,
            SoundEvent::BreakComplete => &BREAK_COMPLETE_PATTERN,
        }
    }
}

// ============================================================================
// RodioSoundPlayer
// ============================================================================

/// A cue player backed by the shared rodio output stream.
///
/// Playback is non-blocking; cues continue in the background.
pub struct RodioSoundPlayer {
    ctx: Rc<AudioContext>,
    /// Whether sound playback is disabled.
    disabled: AtomicBool,
}

impl RodioSoundPlayer {
    /// Creates a new sound player on the shared audio context.
    ///
    /// # Arguments
    ///
    /// * `disabled` - If true, all cues are silently skipped.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn new(disabled: bool) -> Result<Self, SoundError> {
        let ctx = AudioContext::acquire()?;
        Ok(Self {
            ctx,
            disabled: AtomicBool::new(disabled),
        })
    }

    /// Plays the cue for `event`.
    ///
    /// # Errors
    ///
    /// Returns an error if no sink can be created on the output stream.
    pub fn play_event(&self, event: SoundEvent) -> Result<(), SoundError> {
        if self.disabled.load(Ordering::Relaxed) {
            debug!("Sound playback disabled, skipping {:?}", event);
            return Ok(());
        }

        let sink = self.ctx.new_sink()?;
        sink.append(CueSource::new(event.pattern()));
        sink.detach(); // Non-blocking: the cue finishes after this returns

        debug!("Cue {:?} started (detached)", event);
        Ok(())
    }

    /// Returns true if sound playback is currently disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    /// Enables sound playback.
    pub fn enable(&self) {
        self.disabled.store(false, Ordering::Relaxed);
        debug!("Sound playback enabled");
    }

    /// Disables sound playback.
    pub fn disable(&self) {
        self.disabled.store(true, Ordering::Relaxed);
        debug!("Sound playback disabled");
    }
}

impl std::fmt::Debug for RodioSoundPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioSoundPlayer")
            .field("disabled", &self.disabled.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Creates a cue player, returning None if audio is unavailable.
///
/// If audio initialization fails, a warning is logged and None is returned.
#[must_use]
pub fn try_create_player(disabled: bool) -> Option<RodioSoundPlayer> {
    match RodioSoundPlayer::new(disabled) {
        Ok(player) => Some(player),
        Err(e) => {
            warn!("Audio not available, sound cues disabled: {} ({})", e, e.suggestion());
            None
        }
    }
}
