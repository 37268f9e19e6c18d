//! Local storage error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reading or writing local preference files.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The home directory could not be determined.
    #[error("ホームディレクトリが見つかりません")]
    HomeNotFound,

    /// A file could not be read or written.
    #[error("ファイルの入出力に失敗しました: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Data could not be serialized.
    #[error("データのシリアライズに失敗しました: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::HomeNotFound => "環境変数 POMODORO_HOME でデータディレクトリを指定してください",
            Self::Io { .. } => "データディレクトリの権限を確認してください",
            Self::Serialize(_) => "設定ファイルを削除して再試行してください",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = StorageError::io(
            "/tmp/settings.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/settings.json"));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_suggestion() {
        assert!(StorageError::HomeNotFound
            .suggestion()
            .contains("POMODORO_HOME"));
    }
}
