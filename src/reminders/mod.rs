//! Break reminders for the Pomodoro Timer.
//!
//! This module provides:
//! - Random selection that avoids showing the same item twice in a row
//! - The user's personal long-break reminders (at most three)
//! - The notification surface for break tips and long-break prompts

pub mod content;

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use content::{LONG_BREAK_IDEAS, SHORT_BREAK_TIPS};

/// Maximum number of personal long-break reminders.
pub const MAX_CUSTOM_REMINDERS: usize = 3;

/// Extra draws made when the first pick repeats the last shown item.
const REPEAT_RETRIES: usize = 5;

// ============================================================================
// Selection
// ============================================================================

/// Picks a random element, trying to avoid `last`.
///
/// Returns None for an empty list and the only element of a single-element
/// list. Otherwise the first draw is kept unless it equals `last`, in which
/// case up to five more draws are made. All five may still hit `last`; the
/// repeat is then accepted.
pub fn pick_avoid_repeat<'a, T, R>(list: &'a [T], last: Option<&str>, rng: &mut R) -> Option<&'a T>
where
    T: AsRef<str>,
    R: Rng + ?Sized,
{
    match list.len() {
        0 => None,
        1 => list.first(),
        len => {
            let candidate = &list[rng.random_range(0..len)];
            let Some(last) = last else {
                return Some(candidate);
            };
            if candidate.as_ref() != last {
                return Some(candidate);
            }
            for _ in 0..REPEAT_RETRIES {
                let next = &list[rng.random_range(0..len)];
                if next.as_ref() != last {
                    return Some(next);
                }
            }
            Some(candidate)
        }
    }
}

/// Keeps the last shown tip and idea so consecutive breaks vary.
#[derive(Debug)]
pub struct ReminderPicker {
    rng: StdRng,
    last_tip: Option<String>,
    last_idea: Option<String>,
}

impl Default for ReminderPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl ReminderPicker {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Deterministic picker for tests and simulations.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            last_tip: None,
            last_idea: None,
        }
    }

    /// Picks a short-break tip from the built-in list.
    pub fn short_tip(&mut self) -> Option<String> {
        let tip = pick_avoid_repeat(SHORT_BREAK_TIPS, self.last_tip.as_deref(), &mut self.rng)
            .map(|s| s.to_string())?;
        self.last_tip = Some(tip.clone());
        Some(tip)
    }

    /// Picks a long-break idea.
    ///
    /// The personal list is used when `use_custom` is set and it is non-empty;
    /// otherwise the built-in ideas.
    pub fn long_idea(&mut self, custom: &[String], use_custom: bool) -> Option<String> {
        let last = self.last_idea.as_deref();
        let idea = if use_custom && !custom.is_empty() {
            pick_avoid_repeat(custom, last, &mut self.rng).cloned()
        } else {
            pick_avoid_repeat(LONG_BREAK_IDEAS, last, &mut self.rng).map(|s| s.to_string())
        }?;
        self.last_idea = Some(idea.clone());
        Some(idea)
    }

    /// Uniform pick with no repeat avoidance.
    pub fn pick_any(&mut self, list: &[&'static str]) -> Option<&'static str> {
        if list.is_empty() {
            return None;
        }
        Some(list[self.rng.random_range(0..list.len())])
    }
}

// ============================================================================
// Personal reminders
// ============================================================================

/// Errors editing the personal reminder list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReminderError {
    #[error("リマインダーが空です")]
    Empty,

    #[error("リマインダーは最大{}件までです", MAX_CUSTOM_REMINDERS)]
    Full,

    #[error("リマインダー番号が範囲外です: {0}")]
    IndexOutOfRange(usize),
}

/// Trims a reminder, rejecting blank text.
pub fn normalize_reminder(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Appends a reminder after trimming.
pub fn add_reminder(list: &mut Vec<String>, text: &str) -> Result<(), ReminderError> {
    let text = normalize_reminder(text).ok_or(ReminderError::Empty)?;
    if list.len() >= MAX_CUSTOM_REMINDERS {
        return Err(ReminderError::Full);
    }
    list.push(text);
    Ok(())
}

/// Removes the reminder at `index`, returning it.
pub fn remove_reminder(list: &mut Vec<String>, index: usize) -> Result<String, ReminderError> {
    if index >= list.len() {
        return Err(ReminderError::IndexOutOfRange(index));
    }
    Ok(list.remove(index))
}

/// Cleans a loaded list: trims, drops blanks and caps the length.
pub fn sanitize_reminders(list: Vec<String>) -> Vec<String> {
    list.iter()
        .filter_map(|s| normalize_reminder(s))
        .take(MAX_CUSTOM_REMINDERS)
        .collect()
}

// ============================================================================
// Notices
// ============================================================================

/// Kind of break reminder shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeKind {
    /// Transient tip at the start of a short break
    ShortBreakTip,
    /// Prompt with an idea at the start of a long break
    LongBreakPrompt,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::ShortBreakTip => "shortBreakTip",
            NoticeKind::LongBreakPrompt => "longBreakPrompt",
        }
    }
}

/// A reminder payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

/// Surface that displays break reminders.
pub trait Notifier {
    fn show(&self, notice: &Notice);
    fn dismiss(&self);
}

/// Writes reminders to the daemon log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&self, notice: &Notice) {
        info!("[{}] {}", notice.kind.as_str(), notice.text);
    }

    fn dismiss(&self) {
        debug!("Notice dismissed");
    }
}

/// A call recorded by [`MockNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    Show(Notice),
    Dismiss,
}

/// Mock notifier for testing. Clones share the call log.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    calls: Arc<Mutex<Vec<NotifierCall>>>,
}

impl MockNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Notices shown so far, in order.
    #[must_use]
    pub fn shown(&self) -> Vec<Notice> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                NotifierCall::Show(n) => Some(n),
                NotifierCall::Dismiss => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: NotifierCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl Notifier for MockNotifier {
    fn show(&self, notice: &Notice) {
        self.record(NotifierCall::Show(notice.clone()));
    }

    fn dismiss(&self) {
        self.record(NotifierCall::Dismiss);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod pick_tests {
        use super::*;

        #[test]
        fn test_empty_list() {
            let mut rng = StdRng::seed_from_u64(1);
            let list: [&str; 0] = [];
            assert_eq!(pick_avoid_repeat(&list, None, &mut rng), None);
        }

        #[test]
        fn test_single_element_ignores_last() {
            let mut rng = StdRng::seed_from_u64(1);
            let list = ["only"];
            assert_eq!(pick_avoid_repeat(&list, Some("only"), &mut rng), Some(&"only"));
            assert_eq!(pick_avoid_repeat(&list, None, &mut rng), Some(&"only"));
        }

        #[test]
        fn test_two_elements_rarely_repeat() {
            let mut rng = StdRng::seed_from_u64(42);
            let list = ["a", "b"];
            let repeats = (0..1000)
                .filter(|_| pick_avoid_repeat(&list, Some("a"), &mut rng) == Some(&"a"))
                .count();
            // P(repeat) = 0.5^6 ≈ 1.6%
            assert!(repeats < 50, "too many repeats: {}", repeats);
        }

        #[test]
        fn test_result_is_member() {
            let mut rng = StdRng::seed_from_u64(7);
            for _ in 0..100 {
                let pick = pick_avoid_repeat(SHORT_BREAK_TIPS, None, &mut rng).unwrap();
                assert!(SHORT_BREAK_TIPS.contains(pick));
            }
        }

        #[test]
        fn test_works_with_owned_strings() {
            let mut rng = StdRng::seed_from_u64(3);
            let list = vec!["x".to_string(), "y".to_string()];
            let pick = pick_avoid_repeat(&list, Some("x"), &mut rng).unwrap();
            assert!(list.contains(pick));
        }
    }

    mod picker_tests {
        use super::*;

        #[test]
        fn test_short_tip_from_builtin() {
            let mut picker = ReminderPicker::with_seed(1);
            let tip = picker.short_tip().unwrap();
            assert!(SHORT_BREAK_TIPS.contains(&tip.as_str()));
        }

        #[test]
        fn test_long_idea_uses_custom_when_enabled() {
            let mut picker = ReminderPicker::with_seed(1);
            let custom = vec!["Call mom".to_string()];

            assert_eq!(picker.long_idea(&custom, true), Some("Call mom".to_string()));
            let builtin = picker.long_idea(&custom, false).unwrap();
            assert!(LONG_BREAK_IDEAS.contains(&builtin.as_str()));
        }

        #[test]
        fn test_long_idea_empty_custom_falls_back() {
            let mut picker = ReminderPicker::with_seed(9);
            let idea = picker.long_idea(&[], true).unwrap();
            assert!(LONG_BREAK_IDEAS.contains(&idea.as_str()));
        }

        #[test]
        fn test_consecutive_tips_mostly_differ() {
            let mut picker = ReminderPicker::with_seed(5);
            let mut same = 0;
            let mut prev = picker.short_tip();
            for _ in 0..200 {
                let next = picker.short_tip();
                if next == prev {
                    same += 1;
                }
                prev = next;
            }
            assert!(same <= 2);
        }

        #[test]
        fn test_pick_any() {
            let mut picker = ReminderPicker::with_seed(2);
            assert_eq!(picker.pick_any(&[]), None);
            assert_eq!(picker.pick_any(&["x"]), Some("x"));
        }
    }

    mod custom_reminder_tests {
        use super::*;

        #[test]
        fn test_add_trims() {
            let mut list = Vec::new();
            add_reminder(&mut list, "  Walk outside  ").unwrap();
            assert_eq!(list, vec!["Walk outside".to_string()]);
        }

        #[test]
        fn test_add_rejects_blank() {
            let mut list = Vec::new();
            assert_eq!(add_reminder(&mut list, "   "), Err(ReminderError::Empty));
            assert!(list.is_empty());
        }

        #[test]
        fn test_add_caps_at_three() {
            let mut list = Vec::new();
            for text in ["a", "b", "c"] {
                add_reminder(&mut list, text).unwrap();
            }
            assert_eq!(add_reminder(&mut list, "d"), Err(ReminderError::Full));
            assert_eq!(list.len(), 3);
        }

        #[test]
        fn test_remove() {
            let mut list = vec!["a".to_string(), "b".to_string()];
            assert_eq!(remove_reminder(&mut list, 0), Ok("a".to_string()));
            assert_eq!(
                remove_reminder(&mut list, 5),
                Err(ReminderError::IndexOutOfRange(5))
            );
            assert_eq!(list, vec!["b".to_string()]);
        }

        #[test]
        fn test_sanitize() {
            let list = vec![
                " a ".to_string(),
                "".to_string(),
                "b".to_string(),
                "c".to_string(),
                "d".to_string(),
            ];
            assert_eq!(sanitize_reminders(list), vec!["a", "b", "c"]);
        }

        #[test]
        fn test_error_messages() {
            assert!(ReminderError::Full.to_string().contains('3'));
            assert!(ReminderError::IndexOutOfRange(4).to_string().contains('4'));
        }
    }

    mod notifier_tests {
        use super::*;

        #[test]
        fn test_mock_notifier_records() {
            let notifier = MockNotifier::new();
            let notice = Notice {
                kind: NoticeKind::ShortBreakTip,
                text: "Sip some water.".to_string(),
            };

            notifier.show(&notice);
            notifier.dismiss();

            assert_eq!(
                notifier.calls(),
                vec![NotifierCall::Show(notice.clone()), NotifierCall::Dismiss]
            );
            assert_eq!(notifier.shown(), vec![notice]);
        }

        #[test]
        fn test_notice_kind_as_str() {
            assert_eq!(NoticeKind::ShortBreakTip.as_str(), "shortBreakTip");
            assert_eq!(NoticeKind::LongBreakPrompt.as_str(), "longBreakPrompt");
        }
    }
}
