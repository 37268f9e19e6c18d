//! IPC Client for communicating with the Pomodoro Timer daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::storage::DataPaths;
use crate::types::{IpcRequest, IpcResponse};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds. Cloud commands wait on the network.
const IO_TIMEOUT_SECS: u64 = 15;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: u64 = 65536;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
#[derive(Debug)]
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a new IPC client for the socket in the data directory.
    pub fn new() -> Result<Self> {
        let paths = DataPaths::resolve().context("データディレクトリを特定できません")?;
        Ok(Self::with_socket_path(paths.socket()))
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Sends a request and returns the daemon's successful response.
    ///
    /// Transport failures are retried with a linear backoff. An error answer
    /// from the daemon is returned immediately as an error.
    pub async fn send(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let response = self.send_request_with_retry(request).await?;

        if !response.is_success() {
            anyhow::bail!("{}", response.message);
        }

        Ok(response)
    }

    /// Sends a status query to the daemon.
    pub async fn status(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Status).await
    }

    /// Sends a request to the daemon with retry logic.
    async fn send_request_with_retry(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut attempt = 1;

        loop {
            match self.send_request(request).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < MAX_RETRIES => {
                    tracing::warn!("リクエスト失敗 (試行 {}/{}): {:#}", attempt, MAX_RETRIES, e);
                    let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Sends a single request to the daemon.
    async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        // Connect with timeout
        let mut stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("接続がタイムアウトしました")?
            .context("Daemonに接続できません。'pomodoro daemon' を起動してください")?;

        let payload =
            serde_json::to_vec(request).context("リクエストのシリアライズに失敗しました")?;

        let buffer = timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            Self::exchange(&mut stream, &payload),
        )
        .await
        .context("Daemonの応答がタイムアウトしました")??;

        if buffer.is_empty() {
            anyhow::bail!("Daemonからの応答がありませんでした");
        }

        serde_json::from_slice(&buffer).context("レスポンスのパースに失敗しました")
    }

    /// Writes one request, half-closes, and reads until the daemon hangs up.
    async fn exchange(stream: &mut UnixStream, payload: &[u8]) -> Result<Vec<u8>> {
        stream
            .write_all(payload)
            .await
            .context("リクエストの送信に失敗しました")?;
        stream
            .shutdown()
            .await
            .context("書き込み側のクローズに失敗しました")?;

        let mut buffer = Vec::new();
        stream
            .take(MAX_RESPONSE_SIZE)
            .read_to_end(&mut buffer)
            .await
            .context("レスポンスの受信に失敗しました")?;
        Ok(buffer)
    }
}

// ============================================================================
// Tests
// ============================================================================
