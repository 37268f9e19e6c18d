//! Sound system error types.
//!
//! Audio is optional at runtime: every error here is recoverable and callers
//! degrade to silence instead of failing timer operations.

use thiserror::Error;

use crate::types::AmbienceType;

/// Errors that can occur in the sound playback system.
#[derive(Debug, Error)]
pub enum SoundError {
    /// Audio device is not available (e.g., no speakers connected).
    #[error("オーディオデバイスが利用できません: {0}")]
    DeviceNotAvailable(String),

    /// Failed to create an audio sink on the shared output stream.
    #[error("オーディオストリームの作成に失敗しました: {0}")]
    StreamError(String),

    /// Generic sound playback error.
    #[error("サウンド再生エラー: {0}")]
    PlaybackError(String),

    /// The requested ambience type has nothing to play.
    #[error("環境音の種類が再生できません: {}", .0.as_str())]
    UnsupportedAmbience(AmbienceType),
}

impl SoundError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_) | Self::StreamError(_))
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::DeviceNotAvailable(_) => "オーディオデバイスを接続してください",
            Self::StreamError(_) => "オーディオ設定を確認してください",
            Self::PlaybackError(_) => "デーモンを再起動してください",
            Self::UnsupportedAmbience(_) => "rain / night / white のいずれかを選択してください",
        }
    }
}
