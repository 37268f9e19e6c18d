//! Command definitions for the Pomodoro Timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use clap::{Args, Parser, Subcommand};

use crate::sync::AccentColor;
use crate::types::{
    AmbienceParams, AmbiencePlayMode, AmbienceType, CustomModeParams, IpcRequest, ModeKey,
    UiMode,
};

// ============================================================================
// CLI Structure
// ============================================================================

/// Pomodoro Timer CLI - focus sessions with ambience and gentle break reminders
#[derive(Parser, Debug)]
#[command(
    name = "pomodoro",
    version,
    about = "環境音とリマインダー付きポモドーロタイマー",
    long_about = "ターミナルから操作するポモドーロタイマー。\n\
                  バックグラウンドのdaemonがタイマー・環境音・休憩リマインダーを管理します。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start (or continue) the countdown
    Start,

    /// Pause the countdown
    Pause,

    /// Start if paused, pause if running
    Toggle,

    /// Return to a full focus session
    Reset,

    /// Skip the current phase (skipping focus counts as a session)
    Skip,

    /// Show current timer status
    Status,

    /// Switch the timer mode
    Mode {
        #[arg(value_enum)]
        mode: ModeKey,
    },

    /// Turn sound cues on or off
    Sound {
        #[arg(value_enum)]
        state: Switch,
    },

    /// Configure background ambience
    Ambience(AmbienceArgs),

    /// Set the display mode (toggles when omitted)
    View {
        #[arg(value_enum)]
        mode: Option<UiMode>,
    },

    /// Manage long-break reminders
    #[command(subcommand)]
    Reminder(ReminderCommand),

    /// Manage the cloud custom mode
    #[command(subcommand)]
    Custom(CustomCommand),

    /// Run as daemon (background service)
    Daemon,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    /// The daemon request for this command. None for local-only commands.
    pub fn to_request(&self) -> Option<IpcRequest> {
        let request = match self {
            Commands::Start => IpcRequest::Start,
            Commands::Pause => IpcRequest::Pause,
            Commands::Toggle => IpcRequest::Toggle,
            Commands::Reset => IpcRequest::Reset,
            Commands::Skip => IpcRequest::Skip,
            Commands::Status => IpcRequest::Status,
            Commands::Mode { mode } => IpcRequest::Mode { mode: *mode },
            Commands::Sound { state } => IpcRequest::Sound {
                enabled: state.is_on(),
            },
            Commands::Ambience(args) => IpcRequest::Ambience {
                params: args.to_params(),
            },
            Commands::View { mode } => IpcRequest::View { ui_mode: *mode },
            Commands::Reminder(command) => match command {
                ReminderCommand::Add { text } => IpcRequest::ReminderAdd { text: text.clone() },
                ReminderCommand::Remove { number } => IpcRequest::ReminderRemove {
                    index: (*number as usize).saturating_sub(1),
                },
                ReminderCommand::List => IpcRequest::ReminderList,
                ReminderCommand::Another => IpcRequest::Another,
                ReminderCommand::Dismiss => IpcRequest::Dismiss,
            },
            Commands::Custom(command) => match command {
                CustomCommand::Show => IpcRequest::CustomShow,
                CustomCommand::Create => IpcRequest::CustomCreate,
                CustomCommand::Save(args) => IpcRequest::CustomSave {
                    params: args.to_params(),
                },
                CustomCommand::Sync => IpcRequest::Sync,
            },
            Commands::Daemon | Commands::Completions { .. } => return None,
        };
        Some(request)
    }
}

/// On/off argument
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Switch::On
    }
}

// ============================================================================
// Ambience Arguments
// ============================================================================

/// Arguments for the ambience command. Omitted options keep their value.
#[derive(Args, Debug, Clone, Default)]
pub struct AmbienceArgs {
    /// Enable ambience
    #[arg(long, conflicts_with = "off")]
    pub on: bool,

    /// Disable ambience
    #[arg(long)]
    pub off: bool,

    /// Ambience type
    #[arg(short, long, value_enum)]
    pub kind: Option<AmbienceType>,

    /// Play only during focus, or during breaks too
    #[arg(short, long, value_enum)]
    pub play_mode: Option<AmbiencePlayMode>,

    /// Volume (0.0-1.0)
    #[arg(long, value_parser = parse_volume)]
    pub volume: Option<f32>,
}

impl AmbienceArgs {
    pub fn to_params(&self) -> AmbienceParams {
        let enabled = match (self.on, self.off) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        AmbienceParams {
            enabled,
            kind: self.kind,
            play_mode: self.play_mode,
            volume: self.volume,
        }
    }
}

// ============================================================================
// Reminder Subcommands
// ============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum ReminderCommand {
    /// Add a personal long-break reminder (max 3)
    Add {
        #[arg(value_parser = validate_reminder)]
        text: String,
    },

    /// Remove a reminder by its number in `reminder list`
    Remove {
        #[arg(value_parser = clap::value_parser!(u32).range(1..=3))]
        number: u32,
    },

    /// List personal reminders
    List,

    /// Show another long-break idea
    Another,

    /// Dismiss the current break reminder
    Dismiss,
}

// ============================================================================
// Custom Mode Subcommands
// ============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum CustomCommand {
    /// Show the loaded custom mode
    Show,

    /// Create the custom mode with default values
    Create,

    /// Save edits to the custom mode (timer must be paused)
    Save(CustomSaveArgs),

    /// Reload the custom mode from the cloud
    Sync,
}

/// Arguments for `custom save`. Omitted options keep their value.
#[derive(Args, Debug, Clone, Default)]
pub struct CustomSaveArgs {
    /// Focus duration in minutes (1-180)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=180))]
    pub focus: Option<u32>,

    /// Short break duration in minutes (1-60)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=60))]
    pub short_break: Option<u32>,

    /// Long break duration in minutes (1-90)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=90))]
    pub long_break: Option<u32>,

    /// Long break after this many focus sessions (1-10)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub every: Option<u32>,

    /// Accent color
    #[arg(short, long, value_enum)]
    pub accent: Option<AccentColor>,
}

impl CustomSaveArgs {
    pub fn to_params(&self) -> CustomModeParams {
        CustomModeParams {
            focus_minutes: self.focus,
            short_break_minutes: self.short_break,
            long_break_minutes: self.long_break,
            long_break_every: self.every,
            accent_color: self.accent.map(|a| a.as_str().to_string()),
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates a reminder text.
///
/// - Must not be blank
/// - Must not exceed 120 characters
fn validate_reminder(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("リマインダーは空にできません".to_string());
    }
    if trimmed.chars().count() > 120 {
        return Err("リマインダーは120文字以内にしてください".to_string());
    }
    Ok(trimmed.to_string())
}

/// Parses a volume in `[0, 1]`.
fn parse_volume(s: &str) -> Result<f32, String> {
    let volume: f32 = s
        .parse()
        .map_err(|_| format!("音量は数値で指定してください: {}", s))?;
    if !(0.0..=1.0).contains(&volume) {
        return Err("音量は0.0から1.0の範囲で指定してください".to_string());
    }
    Ok(volume)
}

// ============================================================================
// Tests
// ============================================================================
