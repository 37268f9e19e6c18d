//! Integration tests for Daemon-CLI IPC communication.
//!
//! These tests verify communication between the CLI client and the daemon's
//! IPC server over a real Unix socket:
//! - Timer control via IPC
//! - Status snapshots via IPC
//! - Error answers and connection failures

use std::path::PathBuf;

use tempfile::TempDir;
use tokio::time::{timeout, Duration};

use ambient_pomodoro::cli::client::IpcClient;
use ambient_pomodoro::daemon::ipc::{handle_request, IpcServer};
use ambient_pomodoro::daemon::session::{CloudSync, Session, SessionParts};
use ambient_pomodoro::reminders::{MockNotifier, ReminderPicker};
use ambient_pomodoro::sound::{MockAmbienceBackend, MockSoundPlayer};
use ambient_pomodoro::storage::{MemoryReminderStore, MemorySettingsStore};
use ambient_pomodoro::sync::MemoryCustomModeStore;
use ambient_pomodoro::types::{AmbienceParams, AmbienceType, IpcRequest, ModeKey, Phase};

// ============================================================================
// Test Helpers
// ============================================================================

/// Creates a temporary socket path for testing.
fn create_temp_socket_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("integration_test.sock");
    (dir, path)
}

/// Creates a session backed by in-memory stores and mock audio.
fn create_session(synced: bool) -> Session<MemoryCustomModeStore> {
    Session::new(SessionParts {
        settings_store: Box::new(MemorySettingsStore::new()),
        reminder_store: Box::new(MemoryReminderStore::new()),
        player: Some(Box::new(MockSoundPlayer::new())),
        ambience: Box::new(MockAmbienceBackend::new()),
        notifier: Box::new(MockNotifier::new()),
        picker: ReminderPicker::with_seed(42),
        cloud: synced.then(|| CloudSync {
            store: MemoryCustomModeStore::new(),
            user_id: "integration-user".to_string(),
        }),
    })
}

/// Runs `count` request-response cycles on the server.
async fn serve(server: &IpcServer, session: &mut Session<MemoryCustomModeStore>, count: usize) {
    for _ in 0..count {
        let mut stream = server.accept().await.unwrap();
        let request = IpcServer::receive_request(&mut stream).await.unwrap();
        let response = handle_request(session, request).await;
        IpcServer::send_response(&mut stream, &response).await.unwrap();
    }
}

// ============================================================================
// Timer control
// ============================================================================

/// タイマー開始（IPC経由）
///
/// 期待結果: タイマーが開始され、成功レスポンスにスナップショットが含まれる
#[tokio::test]
async fn timer_start_via_ipc() {
    let (_dir, socket_path) = create_temp_socket_path();
    let server = IpcServer::new(&socket_path).unwrap();
    let mut session = create_session(false);
    let client = IpcClient::with_socket_path(socket_path.clone());

    let (_, response) = tokio::join!(
        serve(&server, &mut session, 1),
        client.send(&IpcRequest::Start)
    );

    let response = response.unwrap();
    assert!(response.is_success());
    assert_eq!(response.message, "タイマーを開始しました");
    let data = response.data.unwrap();
    assert_eq!(data.is_running, Some(true));
    assert_eq!(data.remaining_seconds, Some(1500));
    assert!(session.state().is_running());
}

/// 一時停止と再開（IPC経由）
#[tokio::test]
async fn timer_pause_and_continue_via_ipc() {
    let (_dir, socket_path) = create_temp_socket_path();
    let server = IpcServer::new(&socket_path).unwrap();
    let mut session = create_session(false);
    let client = IpcClient::with_socket_path(socket_path.clone());

    let requests = async {
        let started = client.send(&IpcRequest::Start).await.unwrap();
        let paused = client.send(&IpcRequest::Pause).await.unwrap();
        let toggled = client.send(&IpcRequest::Toggle).await.unwrap();
        (started, paused, toggled)
    };
    let (_, (started, paused, toggled)) = tokio::join!(serve(&server, &mut session, 3), requests);

    assert_eq!(started.data.unwrap().is_running, Some(true));
    assert_eq!(paused.data.unwrap().is_running, Some(false));
    assert_eq!(toggled.message, "タイマーを開始しました");
    assert!(session.state().is_running());
}

/// スキップ後のステータス（IPC経由）
///
/// 期待結果: 短い休憩に移り、セッション数とヒントが返る
#[tokio::test]
async fn status_after_skip_via_ipc() {
    let (_dir, socket_path) = create_temp_socket_path();
    let server = IpcServer::new(&socket_path).unwrap();
    let mut session = create_session(false);
    let client = IpcClient::with_socket_path(socket_path.clone());

    let requests = async {
        client.send(&IpcRequest::Skip).await.unwrap();
        client.status().await.unwrap()
    };
    let (_, status) = tokio::join!(serve(&server, &mut session, 2), requests);

    let data = status.data.unwrap();
    assert_eq!(data.phase, Some(Phase::ShortBreak));
    assert_eq!(data.phase_label.as_deref(), Some("Short break"));
    assert_eq!(data.remaining_seconds, Some(300));
    assert_eq!(data.focus_sessions_completed, Some(1));
    assert_eq!(
        data.message.as_deref(),
        Some("Skipped (counted). Take a break if you want.")
    );
    assert_eq!(data.notice_kind.as_deref(), Some("shortBreakTip"));
}

/// 環境音の設定（IPC経由）
#[tokio::test]
async fn ambience_settings_via_ipc() {
    let (_dir, socket_path) = create_temp_socket_path();
    let server = IpcServer::new(&socket_path).unwrap();
    let mut session = create_session(false);
    let client = IpcClient::with_socket_path(socket_path.clone());

    let requests = async {
        client
            .send(&IpcRequest::Ambience {
                params: AmbienceParams {
                    enabled: Some(true),
                    kind: Some(AmbienceType::White),
                    volume: Some(0.8),
                    ..AmbienceParams::default()
                },
            })
            .await
            .unwrap();
        client.send(&IpcRequest::Start).await.unwrap()
    };
    let (_, started) = tokio::join!(serve(&server, &mut session, 2), requests);

    let ambience = started.data.unwrap().ambience.unwrap();
    assert!(ambience.enabled);
    assert_eq!(ambience.kind, AmbienceType::White);
    assert_eq!(ambience.playing, Some(AmbienceType::White));
    assert!((ambience.volume - 0.8).abs() < f32::EPSILON);
}

// ============================================================================
// Errors
// ============================================================================

/// エラー応答はリトライされずにエラーになる
#[tokio::test]
async fn error_answer_via_ipc() {
    let (_dir, socket_path) = create_temp_socket_path();
    let server = IpcServer::new(&socket_path).unwrap();
    let mut session = create_session(false);
    let client = IpcClient::with_socket_path(socket_path.clone());

    let (_, result) = tokio::join!(
        serve(&server, &mut session, 1),
        client.send(&IpcRequest::Mode {
            mode: ModeKey::Custom
        })
    );

    let message = result.unwrap_err().to_string();
    assert!(message.contains("クラウド同期"), "got: {}", message);
    assert_eq!(session.mode(), ModeKey::Normal);
}

/// カスタムモードの作成と保存（IPC経由）
#[tokio::test]
async fn custom_mode_flow_via_ipc() {
    let (_dir, socket_path) = create_temp_socket_path();
    let server = IpcServer::new(&socket_path).unwrap();
    let mut session = create_session(true);
    let client = IpcClient::with_socket_path(socket_path.clone());

    let requests = async {
        let loaded = client.send(&IpcRequest::Sync).await.unwrap();
        let created = client.send(&IpcRequest::CustomCreate).await.unwrap();
        let switched = client
            .send(&IpcRequest::Mode {
                mode: ModeKey::Custom,
            })
            .await
            .unwrap();
        (loaded, created, switched)
    };
    let (_, (loaded, created, switched)) = tokio::join!(serve(&server, &mut session, 3), requests);

    assert_eq!(loaded.message, "No custom mode yet.");
    assert_eq!(created.message, "Custom mode created ✅");
    let data = switched.data.unwrap();
    assert_eq!(data.mode, Some(ModeKey::Custom));
    assert_eq!(data.mode_label.as_deref(), Some("Custom"));
}

/// Daemon未起動時の接続エラー
#[tokio::test]
async fn connection_error_without_daemon() {
    let (_dir, socket_path) = create_temp_socket_path();
    let client = IpcClient::with_socket_path(socket_path);

    let result = timeout(Duration::from_secs(10), client.status())
        .await
        .expect("retries should finish quickly");

    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Daemonに接続できません"), "got: {}", message);
}
