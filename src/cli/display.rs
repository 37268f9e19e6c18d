//! Display utilities for the Pomodoro Timer CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Error messages
//! - Status display (dashboard and minimal views)
//! - Reminder and custom mode listings
//!
//! Each `show_*` prints what the matching `render_*` returns.

use std::fmt::Write as _;

use crate::daemon::clock::format_mmss;
use crate::types::{IpcResponse, ResponseData, UiMode};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the daemon's message for a command, if any.
    pub fn show_success(response: &IpcResponse) {
        if let Some(text) = Self::render_success(response) {
            println!("{}", text);
        }
    }

    /// Shows the current timer status in the view the daemon reports.
    pub fn show_status(response: &IpcResponse) {
        print!("{}", Self::render_status(response));
    }

    pub fn show_reminders(response: &IpcResponse) {
        print!("{}", Self::render_reminders(response));
    }

    pub fn show_custom_mode(response: &IpcResponse) {
        print!("{}", Self::render_custom_mode(response));
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    pub fn render_success(response: &IpcResponse) -> Option<String> {
        if response.message.is_empty() {
            return None;
        }
        let mut out = format!("* {}", response.message);
        if let Some(remaining) = response.data.as_ref().and_then(|d| d.remaining_seconds) {
            let _ = write!(out, "\n  残り時間: {}", format_mmss(remaining));
        }
        Some(out)
    }

    pub fn render_status(response: &IpcResponse) -> String {
        match &response.data {
            Some(data) if data.ui_mode == Some(UiMode::Minimal) => Self::render_minimal(data),
            Some(data) => Self::render_dashboard(data),
            None => "タイマーは起動していません\n".to_string(),
        }
    }

    fn running_label(data: &ResponseData) -> &'static str {
        if data.is_running.unwrap_or(false) {
            "実行中"
        } else {
            "一時停止中"
        }
    }

    fn render_minimal(data: &ResponseData) -> String {
        let icon = if data.is_running.unwrap_or(false) {
            ">"
        } else {
            "||"
        };
        format!(
            "{} {} {}\n",
            icon,
            data.phase_label.as_deref().unwrap_or("-"),
            format_mmss(data.remaining_seconds.unwrap_or(0))
        )
    }

    fn render_dashboard(data: &ResponseData) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "ポモドーロタイマー ステータス");
        let _ = writeln!(out, "─────────────────────────────");

        if let Some(label) = &data.mode_label {
            let _ = writeln!(out, "モード: {}", label);
        }
        let _ = writeln!(
            out,
            "フェーズ: {} ({})",
            data.phase_label.as_deref().unwrap_or("-"),
            Self::running_label(data)
        );
        if let Some(remaining) = data.remaining_seconds {
            let _ = writeln!(out, "残り時間: {}", format_mmss(remaining));
        }
        if let Some(count) = data.focus_sessions_completed {
            match data.long_break_every {
                Some(every) if every > 0 => {
                    let until_long = every - count % every;
                    let _ = writeln!(out, "完了セッション: {} (長い休憩まで {})", count, until_long);
                }
                _ => {
                    let _ = writeln!(out, "完了セッション: {}", count);
                }
            }
        }
        if let Some(sound) = data.sound_enabled {
            let _ = writeln!(out, "サウンド: {}", if sound { "オン" } else { "オフ" });
        }
        if let Some(ambience) = &data.ambience {
            let state = if !ambience.enabled {
                "オフ".to_string()
            } else {
                format!(
                    "{} ({}, {:.0}%){}",
                    ambience.kind.as_str(),
                    ambience.play_mode.as_str(),
                    ambience.volume * 100.0,
                    if ambience.playing.is_some() { " 再生中" } else { "" }
                )
            };
            let _ = writeln!(out, "環境音: {}", state);
        }
        if let Some(notice) = &data.notice {
            let title = match data.notice_kind.as_deref() {
                Some("longBreakPrompt") => "長い休憩のアイデア",
                _ => "休憩のヒント",
            };
            let _ = writeln!(out, "{}: {}", title, notice);
        }
        if let Some(message) = &data.message {
            let _ = writeln!(out, "{}", message);
        }
        if let Some(status) = &data.cloud_status {
            let _ = writeln!(out, "クラウド: {}", status);
        }
        if let Some(hint) = &data.hint {
            let _ = writeln!(out, "{}", hint);
        }
        out
    }

    pub fn render_reminders(response: &IpcResponse) -> String {
        let reminders = response
            .data
            .as_ref()
            .and_then(|d| d.reminders.as_deref())
            .unwrap_or_default();

        if reminders.is_empty() {
            return "リマインダーはありません\n".to_string();
        }
        reminders
            .iter()
            .enumerate()
            .map(|(i, text)| format!("{}. {}\n", i + 1, text))
            .collect()
    }

    pub fn render_custom_mode(response: &IpcResponse) -> String {
        let data = response.data.as_ref();
        let mut out = String::new();

        match data.and_then(|d| d.custom_mode.as_ref()) {
            Some(custom) => {
                let _ = writeln!(out, "カスタムモード");
                let _ = writeln!(out, "  集中: {}分", custom.focus_sec / 60);
                let _ = writeln!(out, "  短い休憩: {}分", custom.short_break_sec / 60);
                let _ = writeln!(out, "  長い休憩: {}分", custom.long_break_sec / 60);
                let _ = writeln!(out, "  長い休憩の間隔: {}回ごと", custom.long_break_every);
                let _ = writeln!(out, "  アクセント: {}", custom.accent_color);
            }
            None => {
                let _ = writeln!(out, "カスタムモードはまだ読み込まれていません");
            }
        }
        if let Some(status) = data.and_then(|d| d.cloud_status.as_ref()) {
            let _ = writeln!(out, "クラウド: {}", status);
        }
        out
    }
}

// ============================================================================
// Tests
// ============================================================================
