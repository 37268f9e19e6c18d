//! Cloud sync error types.

use thiserror::Error;

/// Errors talking to the custom-mode backend.
#[derive(Debug, Error)]
pub enum SyncError {
    /// One of the sync environment variables is missing.
    #[error("Sync is not configured (missing POMODORO_SYNC_* env vars).")]
    NotConfigured,

    /// The HTTP request could not be sent or timed out.
    #[error("Sync request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Sync error {status}: {message}")]
    Status { status: u16, message: String },

    /// The backend answered with an unexpected body.
    #[error("Unexpected sync response: {0}")]
    Decode(String),

    /// No custom mode exists for this account.
    #[error("No custom mode yet.")]
    NotFound,

    /// An edit carried an unknown accent color.
    #[error("Unknown accent color: {0}")]
    InvalidAccent(String),
}

impl SyncError {
    /// Returns true if retrying later might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
