//! Pure phase helpers: durations, labels, long-break cadence and formatting.

use crate::types::{ModeConfig, Phase};

/// Returns the full duration of `phase` in seconds under `config`.
pub fn phase_duration(phase: Phase, config: &ModeConfig) -> u32 {
    match phase {
        Phase::Focus => config.focus_sec,
        Phase::ShortBreak => config.short_break_sec,
        Phase::LongBreak => config.long_break_sec,
    }
}

/// Decides which break follows a finished focus session.
///
/// `completed` already includes the session that just finished. A cadence of
/// zero is treated as one.
pub fn next_break_after_focus(completed: u32, config: &ModeConfig) -> Phase {
    let every = config.long_break_every.max(1);
    if completed % every == 0 {
        Phase::LongBreak
    } else {
        Phase::ShortBreak
    }
}

/// Human-readable label for a phase.
pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Focus => "Focus",
        Phase::ShortBreak => "Short break",
        Phase::LongBreak => "Long break",
    }
}

/// Formats seconds as zero-padded `MM:SS`. Minutes are not wrapped at 60.
pub fn format_mmss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
