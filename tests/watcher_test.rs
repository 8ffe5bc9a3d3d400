use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod common;

use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;

use common::StubCompletion;
use cooker_mock::build_notification_router;
use cooker_mock::models::{CreateMockApi, HttpMethod};
use cooker_mock::notifications::SubscriberConnection;
use cooker_mock::repositories::{MockApiRepository, SceneRepository};
use cooker_mock::state::AppState;
use cooker_mock::store::MockRoot;
use cooker_mock::watcher::{ChangeEvent, ChangeKind, ChangeWatcher, Subscription, WatchOptions};

const OPTIONS: WatchOptions = WatchOptions {
    stability: Duration::from_millis(150),
    poll_interval: Duration::from_millis(25),
};

const WAIT: Duration = Duration::from_secs(10);

fn open_root() -> (TempDir, MockRoot) {
    let project = TempDir::new().unwrap();
    let root = MockRoot::open(project.path(), "cookerMockData").unwrap();
    (project, root)
}

fn channel(watcher: &ChangeWatcher) -> (mpsc::UnboundedReceiver<ChangeEvent>, Subscription) {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = watcher.subscribe(move |event| {
        let _ = tx.send(event.clone());
    });
    (rx, subscription)
}

/// Wait until an event of `kind` for `path` arrives, skipping others
async fn expect_event(
    rx: &mut mpsc::UnboundedReceiver<ChangeEvent>,
    kind: ChangeKind,
    path: &Path,
) {
    let found = tokio::time::timeout(WAIT, async {
        while let Some(event) = rx.recv().await {
            if event.kind == kind && event.path == path {
                return true;
            }
        }
        false
    })
    .await;

    assert_eq!(found, Ok(true), "no {:?} event for {}", kind, path.display());
}

async fn wait_until(check: impl Fn() -> bool) {
    let reached = tokio::time::timeout(WAIT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert!(reached.is_ok(), "condition not reached within {:?}", WAIT);
}

fn create_api(root: &MockRoot, path: &str) -> String {
    MockApiRepository::create(
        root,
        &CreateMockApi {
            path: path.to_string(),
            description: None,
            method: Some(HttpMethod::Get),
            scene: Some("default".to_string()),
            response: Some(json!({"ok": true})),
        },
    )
    .unwrap()
    .id
}

#[tokio::test]
async fn test_created_api_files_are_reported_as_added() {
    let (_project, root) = open_root();
    let watcher = ChangeWatcher::start(root.path(), OPTIONS).unwrap();
    let (mut rx, _subscription) = channel(&watcher);

    let id = create_api(&root, "/watched");

    expect_event(&mut rx, ChangeKind::Added, &root.config_path(&id)).await;
    expect_event(&mut rx, ChangeKind::Added, &root.scene_path(&id, "default")).await;
}

#[tokio::test]
async fn test_scene_rewrite_is_reported_as_changed() {
    let (_project, root) = open_root();
    let id = create_api(&root, "/existing");
    let watcher = ChangeWatcher::start(root.path(), OPTIONS).unwrap();
    let (mut rx, _subscription) = channel(&watcher);

    SceneRepository::set(&root, &id, "default", json!({"ok": false, "extra": [1, 2, 3]})).unwrap();

    expect_event(&mut rx, ChangeKind::Changed, &root.scene_path(&id, "default")).await;
}

#[tokio::test]
async fn test_deleted_api_files_are_reported_as_removed() {
    let (_project, root) = open_root();
    let id = create_api(&root, "/doomed");
    let watcher = ChangeWatcher::start(root.path(), OPTIONS).unwrap();
    let (mut rx, _subscription) = channel(&watcher);

    MockApiRepository::delete(&root, &id).unwrap();

    expect_event(&mut rx, ChangeKind::Removed, &root.scene_path(&id, "default")).await;
}

#[tokio::test]
async fn test_root_created_after_start_is_watched() {
    let project = TempDir::new().unwrap();
    let root_path: PathBuf = project.path().join("cookerMockData");
    let watcher = ChangeWatcher::start(&root_path, OPTIONS).unwrap();
    let (mut rx, _subscription) = channel(&watcher);

    let root = MockRoot::open(project.path(), "cookerMockData").unwrap();

    expect_event(&mut rx, ChangeKind::Added, &root.path().join(".env")).await;
}

#[tokio::test]
async fn test_missing_parent_is_an_error() {
    let project = TempDir::new().unwrap();

    let result = ChangeWatcher::start(project.path().join("a").join("b"), OPTIONS);

    assert!(result.is_err());
}

#[tokio::test]
async fn test_subscriber_connection_receives_file_change_messages() {
    let (_project, root) = open_root();
    let watcher = ChangeWatcher::start(root.path(), OPTIONS).unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let connection = SubscriberConnection::open(&watcher, move |text| tx.send(text).is_ok());

    let id = create_api(&root, "/notified");
    let config_path = root.config_path(&id).display().to_string();

    let message = tokio::time::timeout(WAIT, async {
        while let Some(text) = rx.recv().await {
            let message: Value = serde_json::from_str(&text).unwrap();
            if message["path"] == config_path.as_str() {
                return Some(message);
            }
        }
        None
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(message["type"], "FILE_CHANGE");
    assert!(message["timestamp"].is_string());

    connection.close();
    assert_eq!(watcher.listener_count(), 0);
}

#[tokio::test]
async fn test_closed_connections_stop_receiving() {
    let (_project, root) = open_root();
    let watcher = ChangeWatcher::start(root.path(), OPTIONS).unwrap();

    let closed_hits = Arc::new(Mutex::new(0));
    let hits = closed_hits.clone();
    let closed = SubscriberConnection::open(&watcher, move |_text| {
        *hits.lock().unwrap() += 1;
        true
    });
    closed.close();

    let (mut rx, _live) = channel(&watcher);
    let id = create_api(&root, "/after-close");
    expect_event(&mut rx, ChangeKind::Added, &root.config_path(&id)).await;

    assert_eq!(*closed_hits.lock().unwrap(), 0);
    assert_eq!(watcher.listener_count(), 3);
}

#[tokio::test]
async fn test_websocket_subscriber_receives_frames_and_cleans_up_on_close() {
    let project = TempDir::new().unwrap();
    let config = common::test_config(&project);
    let root = MockRoot::open(&config.project_root, &config.mock_data_dir_name).unwrap();
    let watcher = Arc::new(ChangeWatcher::start(root.path(), OPTIONS).unwrap());
    let state = AppState::with_services(
        config,
        watcher.clone(),
        Arc::new(StubCompletion::replying("{}")),
    )
    .unwrap();
    let server = TestServer::builder()
        .http_transport()
        .build(build_notification_router(state))
        .unwrap();

    let mut socket = server.get_websocket("/").await.into_websocket().await;
    wait_until(|| watcher.listener_count() == 3).await;

    let id = create_api(&root, "/over-the-wire");
    let config_path = root.config_path(&id).display().to_string();

    let message = tokio::time::timeout(WAIT, async {
        loop {
            let message: Value = socket.receive_json().await;
            if message["path"] == config_path.as_str() {
                return message;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(message["type"], "FILE_CHANGE");
    assert!(message["timestamp"].is_string());

    socket.close().await;
    wait_until(|| watcher.listener_count() == 0).await;
}
