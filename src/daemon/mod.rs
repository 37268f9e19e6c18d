//! Daemon module for the Pomodoro Timer.
//!
//! This module contains the core daemon functionality:
//! - `clock`: Phase durations and long-break scheduling
//! - `modes`: Named presets and active-config resolution
//! - `timer`: Timer engine with state transitions and countdown logic
//! - `session`: Runtime owner wiring the engine to audio, reminders and storage
//! - `ipc`: Unix socket server and the daemon loop

pub mod clock;
pub mod ipc;
pub mod modes;
pub mod session;
pub mod timer;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::reminders::{LogNotifier, ReminderPicker};
use crate::sound::{create_ambience_backend, try_create_player, SoundPlayer};
use crate::storage::{DataPaths, JsonFileReminderStore, JsonFileSettingsStore};
use crate::sync::{RestCustomModeStore, SyncConfig};

pub use ipc::{handle_request, Daemon, IpcServer};
pub use session::{CloudSync, Session, SessionError, SessionParts};
pub use timer::{TimerEngine, TimerEvent};

/// Builds the production session under `paths` and serves until SIGINT/SIGTERM.
pub async fn run(paths: &DataPaths) -> Result<()> {
    std::fs::create_dir_all(&paths.root)
        .with_context(|| format!("Failed to create data directory: {:?}", paths.root))?;

    let cloud = match SyncConfig::from_env() {
        Some(config) => Some(CloudSync {
            store: RestCustomModeStore::new(&config).context("Failed to build sync client")?,
            user_id: config.user_id,
        }),
        None => {
            info!("Cloud sync not configured");
            None
        }
    };

    let mut session = Session::new(SessionParts {
        settings_store: Box::new(JsonFileSettingsStore::new(paths.settings())),
        reminder_store: Box::new(JsonFileReminderStore::new(paths.reminders())),
        player: try_create_player(false).map(|p| Box::new(p) as Box<dyn SoundPlayer>),
        ambience: create_ambience_backend(),
        notifier: Box::new(LogNotifier),
        picker: ReminderPicker::new(),
        cloud,
    });

    if session.is_sync_configured() {
        if let Err(e) = session.cloud_load().await {
            warn!("Initial cloud load failed: {}", e);
        }
    }

    let server = IpcServer::new(&paths.socket())?;
    Daemon::new(session, server).run(shutdown_signal()).await?;
    info!("Daemon stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}
