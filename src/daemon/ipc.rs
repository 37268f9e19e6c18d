//! IPC Server for the Pomodoro Timer.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request dispatch onto the daemon's [`Session`]
//! - The daemon loop multiplexing shutdown, ticks and connections

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time::{interval, timeout, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::sync::CustomModeStore;
use crate::types::{IpcRequest, IpcResponse, UiMode};

use super::clock::phase_label;
use super::session::{Session, SessionError};

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

/// Scheduler period
const TICK_PERIOD: Duration = Duration::from_secs(1);

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,

    /// The client closed the connection without sending anything
    #[error("Connection closed by client")]
    ConnectionClosed,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        // Remove existing socket file if present
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails, or the request
    /// exceeds the size limit.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE + 1];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            return Err(IpcError::ConnectionClosed.into());
        }
        if n > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer[..n])
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// Request dispatch
// ============================================================================

/// Applies `request` to the session and builds the response.
///
/// Every success carries a full status snapshot.
pub async fn handle_request<S: CustomModeStore>(
    session: &mut Session<S>,
    request: IpcRequest,
) -> IpcResponse {
    debug!("Handling request: {:?}", request);

    let outcome: Result<String, String> = match request {
        IpcRequest::Start => {
            session.start();
            Ok("タイマーを開始しました".to_string())
        }
        IpcRequest::Pause => {
            session.pause();
            Ok("タイマーを一時停止しました".to_string())
        }
        IpcRequest::Toggle => {
            session.toggle();
            Ok(if session.state().is_running() {
                "タイマーを開始しました"
            } else {
                "タイマーを一時停止しました"
            }
            .to_string())
        }
        IpcRequest::Reset => {
            session.reset();
            Ok("タイマーをリセットしました".to_string())
        }
        IpcRequest::Skip => {
            let from = session.state().phase;
            session.skip();
            Ok(format!("{}をスキップしました", phase_label(from)))
        }
        IpcRequest::Status | IpcRequest::ReminderList => Ok(String::new()),
        IpcRequest::Mode { mode } => session
            .set_mode(mode)
            .map(|()| format!("モードを{}に変更しました", session.state().config.label))
            .map_err(|e| e.to_string()),
        IpcRequest::Sound { enabled } => {
            session.set_sound(enabled);
            Ok(if enabled {
                "サウンドをオンにしました"
            } else {
                "サウンドをオフにしました"
            }
            .to_string())
        }
        IpcRequest::Ambience { params } => {
            session.set_ambience(&params);
            Ok("環境音の設定を更新しました".to_string())
        }
        IpcRequest::View { ui_mode } => {
            let mode = session.set_view(ui_mode);
            Ok(match mode {
                UiMode::Dashboard => "ダッシュボード表示に切り替えました",
                UiMode::Minimal => "ミニマル表示に切り替えました",
            }
            .to_string())
        }
        IpcRequest::ReminderAdd { text } => session
            .add_reminder(&text)
            .map(|()| "リマインダーを追加しました".to_string())
            .map_err(|e| e.to_string()),
        IpcRequest::ReminderRemove { index } => session
            .remove_reminder(index)
            .map(|removed| format!("リマインダーを削除しました: {}", removed))
            .map_err(|e| e.to_string()),
        IpcRequest::Another => session
            .another()
            .map(|notice| notice.text.clone())
            .map_err(|e| e.to_string()),
        IpcRequest::Dismiss => Ok(if session.dismiss() {
            "通知を閉じました"
        } else {
            "表示中の通知はありません"
        }
        .to_string()),
        IpcRequest::CustomShow => Ok(session.cloud_status().unwrap_or_default().to_string()),
        IpcRequest::CustomCreate => {
            let result = session.cloud_create().await;
            cloud_outcome(session, result)
        }
        IpcRequest::CustomSave { params } => {
            let result = session.cloud_save(&params).await;
            cloud_outcome(session, result)
        }
        IpcRequest::Sync => {
            let result = session.cloud_load().await;
            cloud_outcome(session, result)
        }
    };

    match outcome {
        Ok(message) => IpcResponse::success(message, Some(session.snapshot())),
        Err(message) => IpcResponse::error(message),
    }
}

/// Cloud results are reported through the session's cloud status.
fn cloud_outcome<S: CustomModeStore>(
    session: &Session<S>,
    result: Result<(), SessionError>,
) -> Result<String, String> {
    match result {
        Ok(()) => Ok(session.cloud_status().unwrap_or_default().to_string()),
        Err(e) => Err(session
            .cloud_status()
            .map(str::to_string)
            .unwrap_or_else(|| e.to_string())),
    }
}

// ============================================================================
// Daemon
// ============================================================================

/// A parsed request waiting for the loop, with the channel for its answer.
type PendingRequest = (IpcRequest, oneshot::Sender<IpcResponse>);

/// Requests read but not yet handled by the loop.
const PENDING_REQUESTS: usize = 16;

/// The daemon loop: one owner of the session, one select over all inputs.
///
/// Connections are read in their own tasks. Only parsed requests reach the
/// loop, so a slow client never holds up the tick.
pub struct Daemon<S> {
    session: Session<S>,
    server: IpcServer,
}

impl<S: CustomModeStore> Daemon<S> {
    pub fn new(session: Session<S>, server: IpcServer) -> Self {
        Self { session, server }
    }

    /// Runs until `shutdown` resolves, then shuts the session down.
    ///
    /// The tick interval is re-armed whenever the timer goes from idle to
    /// running, so the first decrement lands one period after the start.
    /// Connection tasks still in flight are aborted on return.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<Session<S>> {
        tokio::pin!(shutdown);

        let mut ticker = interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.reset();

        let (request_tx, mut request_rx) = mpsc::channel::<PendingRequest>(PENDING_REQUESTS);
        let mut connections = JoinSet::new();

        info!("Daemon listening on {:?}", self.server.socket_path());

        loop {
            let was_running = self.session.state().is_running();

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    if was_running && self.session.tick() {
                        debug!("Phase completed: now {}", self.session.state().phase.as_str());
                    }
                }
                Some((request, reply)) = request_rx.recv() => {
                    let response = handle_request(&mut self.session, request).await;
                    if reply.send(response).is_err() {
                        debug!("Client left before the response was ready");
                    }
                }
                accepted = self.server.accept() => match accepted {
                    Ok(stream) => {
                        connections.spawn(serve_connection(stream, request_tx.clone()));
                    }
                    Err(e) => warn!("Failed to accept connection: {:#}", e),
                },
                Some(joined) = connections.join_next() => {
                    if let Err(e) = joined {
                        warn!("Connection task failed: {}", e);
                    }
                }
            }

            if !was_running && self.session.state().is_running() {
                ticker.reset();
            }
        }

        connections.shutdown().await;
        self.session.shutdown();
        Ok(self.session)
    }
}

/// Reads one request, hands it to the loop and writes back the answer.
async fn serve_connection(mut stream: UnixStream, requests: mpsc::Sender<PendingRequest>) {
    let response = match IpcServer::receive_request(&mut stream).await {
        Ok(request) => {
            let (reply_tx, reply_rx) = oneshot::channel();
            if requests.send((request, reply_tx)).await.is_err() {
                return;
            }
            match reply_rx.await {
                Ok(response) => response,
                Err(_) => return,
            }
        }
        Err(e) => {
            warn!("Bad request: {:#}", e);
            IpcResponse::error(format!("不正なリクエストです: {}", e))
        }
    };

    if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
        warn!("Failed to send response: {:#}", e);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::daemon::session::{CloudSync, SessionParts};
    use crate::reminders::{MockNotifier, ReminderPicker};
    use crate::sound::{MockAmbienceBackend, MockSoundPlayer};
    use crate::storage::{MemoryReminderStore, MemorySettingsStore};
    use crate::sync::MemoryCustomModeStore;
    use crate::types::{ModeKey, Phase};

    // ------------------------------------------------------------------------
    // Helper functions
    // ------------------------------------------------------------------------

    fn create_temp_socket_path() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sock");
        (dir, path)
    }

    fn create_session(synced: bool) -> Session<MemoryCustomModeStore> {
        Session::new(SessionParts {
            settings_store: Box::new(MemorySettingsStore::new()),
            reminder_store: Box::new(MemoryReminderStore::new()),
            player: Some(Box::new(MockSoundPlayer::new())),
            ambience: Box::new(MockAmbienceBackend::new()),
            notifier: Box::new(MockNotifier::new()),
            picker: ReminderPicker::with_seed(1),
            cloud: synced.then(|| CloudSync {
                store: MemoryCustomModeStore::new(),
                user_id: "user-1".to_string(),
            }),
        })
    }

    async fn send_raw(path: PathBuf, raw: Vec<u8>) -> IpcResponse {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let mut stream = UnixStream::connect(&path).await.unwrap();
        stream.write_all(&raw).await.unwrap();
        stream.flush().await.unwrap();
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await.unwrap();
        serde_json::from_slice(&buffer).unwrap()
    }

    // ------------------------------------------------------------------------
    // IpcServer Tests
    // ------------------------------------------------------------------------

    mod ipc_server_tests {
        use super::*;

        #[tokio::test]
        async fn test_server_creation() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path);

            assert!(server.is_ok());
            assert!(socket_path.exists());
        }

        #[tokio::test]
        async fn test_server_removes_existing_socket() {
            let (_dir, socket_path) = create_temp_socket_path();
            std::fs::write(&socket_path, "dummy").unwrap();

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
        }

        #[tokio::test]
        async fn test_server_creates_parent_directory() {
            let dir = tempfile::tempdir().unwrap();
            let socket_path = dir.path().join("subdir").join("test.sock");

            let server = IpcServer::new(&socket_path);
            assert!(server.is_ok());
            assert!(socket_path.parent().unwrap().exists());
        }

        #[tokio::test]
        async fn test_receive_request_mode() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let request = r#"{"command":"mode","mode":"hard"}"#;
                stream.write_all(request.as_bytes()).await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await.unwrap();

            assert_eq!(
                request,
                IpcRequest::Mode {
                    mode: ModeKey::Hard
                }
            );
            client_handle.await.unwrap();
        }

        #[tokio::test]
        async fn test_receive_request_invalid_json() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                stream.write_all(b"not valid json").await.unwrap();
                stream.flush().await.unwrap();
            });

            let mut stream = server.accept().await.unwrap();
            let request = IpcServer::receive_request(&mut stream).await;

            assert!(request.is_err());
        }

        #[tokio::test]
        async fn test_receive_request_too_large() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let _client_handle = tokio::spawn(async move {
                let mut stream = UnixStream::connect(&client_path).await.unwrap();
                let padding = "x".repeat(MAX_REQUEST_SIZE * 2);
                let request = format!(r#"{{"command":"reminder_add","text":"{}"}}"#, padding);
                let _ = stream.write_all(request.as_bytes()).await;
            });

            let mut stream = server.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            let request = IpcServer::receive_request(&mut stream).await;

            let err = request.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<IpcError>(),
                Some(IpcError::RequestTooLarge)
            ));
        }

        #[tokio::test]
        async fn test_send_response() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();

            let client_path = socket_path.clone();
            let client_handle = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let mut stream = UnixStream::connect(&client_path).await.unwrap();

                let mut buffer = vec![0u8; 4096];
                let n = stream.read(&mut buffer).await.unwrap();
                let response: IpcResponse = serde_json::from_slice(&buffer[..n]).unwrap();
                response
            });

            let mut stream = server.accept().await.unwrap();
            let response = IpcResponse::success("Test message", None);
            IpcServer::send_response(&mut stream, &response)
                .await
                .unwrap();

            let received = client_handle.await.unwrap();
            assert_eq!(received.status, "success");
            assert_eq!(received.message, "Test message");
        }

        #[tokio::test]
        async fn test_server_drop_cleanup() {
            let (_dir, socket_path) = create_temp_socket_path();

            {
                let _server = IpcServer::new(&socket_path).unwrap();
                assert!(socket_path.exists());
            }

            assert!(!socket_path.exists());
        }
    }

    // ------------------------------------------------------------------------
    // handle_request Tests
    // ------------------------------------------------------------------------

    mod handle_request_tests {
        use super::*;

        #[tokio::test]
        async fn test_handle_status() {
            let mut session = create_session(false);

            let response = handle_request(&mut session, IpcRequest::Status).await;

            assert!(response.is_success());
            let data = response.data.unwrap();
            assert_eq!(data.phase, Some(Phase::Focus));
            assert_eq!(data.remaining_seconds, Some(1500));
            assert_eq!(data.is_running, Some(false));
            assert_eq!(data.focus_sessions_completed, Some(0));
        }

        #[tokio::test]
        async fn test_handle_start_and_toggle() {
            let mut session = create_session(false);

            let response = handle_request(&mut session, IpcRequest::Start).await;
            assert_eq!(response.message, "タイマーを開始しました");
            assert_eq!(response.data.unwrap().is_running, Some(true));

            let response = handle_request(&mut session, IpcRequest::Toggle).await;
            assert_eq!(response.message, "タイマーを一時停止しました");
        }

        #[tokio::test]
        async fn test_handle_skip() {
            let mut session = create_session(false);

            let response = handle_request(&mut session, IpcRequest::Skip).await;

            assert_eq!(response.message, "Focusをスキップしました");
            let data = response.data.unwrap();
            assert_eq!(data.phase, Some(Phase::ShortBreak));
            assert_eq!(data.notice_kind.as_deref(), Some("shortBreakTip"));
        }

        #[tokio::test]
        async fn test_handle_mode() {
            let mut session = create_session(false);

            let response = handle_request(
                &mut session,
                IpcRequest::Mode {
                    mode: ModeKey::Soft,
                },
            )
            .await;
            assert!(response.is_success());
            assert_eq!(response.data.unwrap().remaining_seconds, Some(1200));

            let response = handle_request(
                &mut session,
                IpcRequest::Mode {
                    mode: ModeKey::Custom,
                },
            )
            .await;
            assert!(!response.is_success());
            assert!(response.data.is_none());
        }

        #[tokio::test]
        async fn test_handle_view_toggles() {
            let mut session = create_session(false);

            let response = handle_request(&mut session, IpcRequest::View { ui_mode: None }).await;
            assert_eq!(response.data.unwrap().ui_mode, Some(UiMode::Minimal));

            let response = handle_request(&mut session, IpcRequest::View { ui_mode: None }).await;
            assert_eq!(response.data.unwrap().ui_mode, Some(UiMode::Dashboard));
        }

        #[tokio::test]
        async fn test_handle_reminders() {
            let mut session = create_session(false);

            let response = handle_request(
                &mut session,
                IpcRequest::ReminderAdd {
                    text: "Walk".to_string(),
                },
            )
            .await;
            assert!(response.is_success());

            let response = handle_request(&mut session, IpcRequest::ReminderList).await;
            assert_eq!(
                response.data.unwrap().reminders,
                Some(vec!["Walk".to_string()])
            );

            let response =
                handle_request(&mut session, IpcRequest::ReminderRemove { index: 5 }).await;
            assert!(!response.is_success());
        }

        #[tokio::test]
        async fn test_handle_dismiss_without_notice() {
            let mut session = create_session(false);
            let response = handle_request(&mut session, IpcRequest::Dismiss).await;
            assert_eq!(response.message, "表示中の通知はありません");
        }

        #[tokio::test]
        async fn test_handle_sync_not_configured() {
            let mut session = create_session(false);
            let response = handle_request(&mut session, IpcRequest::Sync).await;

            assert!(!response.is_success());
            assert!(response.message.starts_with("Sync is not configured"));
        }

        #[tokio::test]
        async fn test_handle_custom_create_and_save() {
            let mut session = create_session(true);

            let response = handle_request(&mut session, IpcRequest::CustomCreate).await;
            assert_eq!(response.message, "Custom mode created ✅");
            let custom = response.data.unwrap().custom_mode.unwrap();
            assert_eq!(custom.accent_color, "tomato");

            let response = handle_request(
                &mut session,
                IpcRequest::CustomSave {
                    params: crate::types::CustomModeParams {
                        focus_minutes: Some(45),
                        ..Default::default()
                    },
                },
            )
            .await;
            assert_eq!(response.message, "Saved ✅");
            assert_eq!(
                response.data.unwrap().custom_mode.unwrap().focus_sec,
                45 * 60
            );
        }
    }

    // ------------------------------------------------------------------------
    // Daemon loop Tests
    // ------------------------------------------------------------------------

    mod daemon_tests {
        use super::*;

        #[tokio::test]
        async fn test_daemon_serves_requests_until_shutdown() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();
            let daemon = Daemon::new(create_session(false), server);
            let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

            let client = async {
                let start = send_raw(socket_path.clone(), br#"{"command":"start"}"#.to_vec()).await;
                let status = send_raw(socket_path.clone(), br#"{"command":"status"}"#.to_vec()).await;
                let _ = stop_tx.send(());
                (start, status)
            };
            let shutdown = async {
                let _ = stop_rx.await;
            };

            let (result, (start, status)) = tokio::join!(daemon.run(shutdown), client);

            assert!(start.is_success());
            assert_eq!(status.data.unwrap().is_running, Some(true));
            assert!(result.is_ok());
            assert!(!socket_path.exists());
        }

        #[tokio::test]
        async fn test_daemon_answers_bad_request() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();
            let daemon = Daemon::new(create_session(false), server);
            let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

            let client = async {
                let response = send_raw(socket_path.clone(), b"garbage".to_vec()).await;
                let _ = stop_tx.send(());
                response
            };
            let shutdown = async {
                let _ = stop_rx.await;
            };

            let (_, response) = tokio::join!(daemon.run(shutdown), client);

            assert!(!response.is_success());
            assert!(response.message.starts_with("不正なリクエストです"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_daemon_ticks_once_per_second() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();
            let mut session = create_session(false);
            session.start();
            let daemon = Daemon::new(session, server);

            let shutdown = tokio::time::sleep(Duration::from_millis(3500));
            let session = daemon.run(shutdown).await.unwrap();

            assert_eq!(session.state().remaining_seconds, 1497);
        }

        #[tokio::test]
        async fn test_idle_client_does_not_block_requests() {
            let (_dir, socket_path) = create_temp_socket_path();
            let server = IpcServer::new(&socket_path).unwrap();
            let daemon = Daemon::new(create_session(false), server);
            let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

            let client = async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let _idle = UnixStream::connect(&socket_path).await.unwrap();
                let status = timeout(
                    Duration::from_secs(1),
                    send_raw(socket_path.clone(), br#"{"command":"status"}"#.to_vec()),
                )
                .await;
                let _ = stop_tx.send(());
                status
            };
            let shutdown = async {
                let _ = stop_rx.await;
            };

            let (result, status) = tokio::join!(daemon.run(shutdown), client);

            let status = status.expect("status should be answered while another client idles");
            assert!(status.is_success());
            assert!(result.is_ok());
        }
    }
}
