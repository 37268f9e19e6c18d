//! Timer engine for the Pomodoro Timer.
//!
//! This module provides the phase state machine:
//! - Countdown driven by an external one-second `tick()`
//! - Completion transitions (Focus → ShortBreak/LongBreak → Focus)
//! - Skip/reset/mode-change semantics and session counting
//! - Event firing for sound cues, reminders and ambience
//!
//! The engine owns no scheduling primitive. Every operation is total.

use tokio::sync::mpsc;
use tracing::debug;

use super::clock::{next_break_after_focus, phase_duration};
use crate::types::{ModeConfig, Phase, TimerState};

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for sound cues, reminders and other observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Countdown started (or continued)
    Started {
        /// Phase that is now running
        phase: Phase,
    },
    /// Countdown paused
    Paused,
    /// A focus session finished naturally
    FocusCompleted {
        /// Break that follows
        next_phase: Phase,
        /// Counter after the increment
        focus_sessions_completed: u32,
    },
    /// A break finished naturally
    BreakCompleted {
        /// The break that just ended
        finished: Phase,
    },
    /// Returned to a full focus phase
    Reset,
    /// The current phase was skipped
    Skipped {
        from: Phase,
        to: Phase,
        /// Whether the skip counted as a completed focus session
        counted: bool,
    },
    /// Active mode configuration replaced
    ModeChanged {
        /// Label of the new mode
        label: String,
    },
    /// The current phase changed
    PhaseChanged { from: Phase, to: Phase },
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that manages the Pomodoro timer state and events.
pub struct TimerEngine {
    /// Current timer state
    state: TimerState,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates a new TimerEngine, idle at the start of a focus phase.
    pub fn new(config: ModeConfig, event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            state: TimerState::new(config),
            event_tx,
        }
    }

    /// Restores a previously persisted session counter.
    pub fn with_focus_sessions_completed(mut self, count: u32) -> Self {
        self.state.focus_sessions_completed = count;
        self
    }

    fn emit(&self, event: TimerEvent) {
        if let Err(e) = self.event_tx.send(event) {
            debug!("Timer event dropped, no receiver: {:?}", e.0);
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        let from = self.state.phase;
        self.state.phase = phase;
        self.state.remaining_seconds = phase_duration(phase, &self.state.config);
        if from != phase {
            self.emit(TimerEvent::PhaseChanged { from, to: phase });
        }
    }

    /// Counts a finished focus session and moves into the following break.
    fn advance_from_focus(&mut self) -> Phase {
        self.state.focus_sessions_completed = self.state.focus_sessions_completed.saturating_add(1);
        let next = next_break_after_focus(self.state.focus_sessions_completed, &self.state.config);
        self.set_phase(next);
        next
    }

    /// Starts the countdown. No-op if already running.
    ///
    /// A phase left at zero seconds is re-armed to its full duration first.
    pub fn start(&mut self) {
        if self.state.is_running {
            return;
        }

        if self.state.remaining_seconds == 0 {
            self.state.remaining_seconds = phase_duration(self.state.phase, &self.state.config);
        }
        self.state.is_running = true;
        debug!(
            "Timer started: {} ({}s)",
            self.state.phase.as_str(),
            self.state.remaining_seconds
        );

        self.emit(TimerEvent::Started {
            phase: self.state.phase,
        });
    }

    /// Pauses the countdown. No-op unless running.
    pub fn pause(&mut self) {
        if !self.state.is_running {
            return;
        }

        self.state.is_running = false;
        debug!("Timer paused at {}s", self.state.remaining_seconds);
        self.emit(TimerEvent::Paused);
    }

    /// Starts when idle, pauses when running.
    pub fn toggle(&mut self) {
        if self.state.is_running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Advances the countdown by one second.
    ///
    /// Ignored while idle. Reaching zero performs the completion transition in
    /// the same call and leaves the engine idle. Returns true on completion.
    pub fn tick(&mut self) -> bool {
        if !self.state.is_running {
            return false;
        }

        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        if self.state.remaining_seconds > 0 {
            return false;
        }

        self.complete();
        true
    }

    fn complete(&mut self) {
        self.state.is_running = false;

        let finished = self.state.phase;
        if finished.is_break() {
            self.set_phase(Phase::Focus);
            debug!("{} completed", finished.as_str());
            self.emit(TimerEvent::BreakCompleted { finished });
            return;
        }

        let next_phase = self.advance_from_focus();
        debug!(
            "Focus completed ({} total), next: {}",
            self.state.focus_sessions_completed,
            next_phase.as_str()
        );
        self.emit(TimerEvent::FocusCompleted {
            next_phase,
            focus_sessions_completed: self.state.focus_sessions_completed,
        });
    }

    /// Returns to a full focus phase. Never changes the session counter.
    pub fn reset(&mut self) {
        self.state.is_running = false;
        self.set_phase(Phase::Focus);
        self.emit(TimerEvent::Reset);
    }

    /// Skips the current phase.
    ///
    /// Skipping focus counts as a completed session; skipping a break returns
    /// to focus without counting.
    pub fn skip(&mut self) {
        self.state.is_running = false;
        let from = self.state.phase;

        let (to, counted) = if from.is_break() {
            self.set_phase(Phase::Focus);
            (Phase::Focus, false)
        } else {
            (self.advance_from_focus(), true)
        };

        debug!("Skipped {} -> {} (counted: {})", from.as_str(), to.as_str(), counted);
        self.emit(TimerEvent::Skipped { from, to, counted });
    }

    /// Swaps the active mode and fully resets to focus. The counter is kept.
    pub fn change_mode(&mut self, config: ModeConfig) {
        let label = config.label.clone();
        self.state.is_running = false;
        self.state.config = config;
        self.set_phase(Phase::Focus);
        // set_phase does not re-arm when the phase was already focus
        self.state.remaining_seconds = self.state.config.focus_sec;
        debug!("Mode changed: {}", label);
        self.emit(TimerEvent::ModeChanged { label });
    }

    /// Replaces the config of the same mode identity in place.
    ///
    /// Phase and running flag are kept; `remaining_seconds` is clamped into the
    /// new phase duration. Callers re-arm explicitly if they want a fresh phase.
    pub fn replace_config(&mut self, config: ModeConfig) {
        self.state.config = config;
        let limit = phase_duration(self.state.phase, &self.state.config);
        self.state.remaining_seconds = self.state.remaining_seconds.min(limit);
    }

    /// Returns a reference to the current timer state.
    pub fn get_state(&self) -> &TimerState {
        &self.state
    }

    /// Returns a mutable reference to the timer state (for testing).
    #[cfg(test)]
    pub fn get_state_mut(&mut self) -> &mut TimerState {
        &mut self.state
    }
}

// ============================================================================
// Tests
// ============================================================================
