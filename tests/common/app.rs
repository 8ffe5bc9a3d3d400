use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use cooker_mock::build_router;
use cooker_mock::config::Config;
use cooker_mock::error::{AppError, AppResult};
use cooker_mock::services::TextCompletion;
use cooker_mock::state::AppState;
use cooker_mock::watcher::ChangeWatcher;
use tempfile::TempDir;

/// Completion stub that answers every request with a fixed reply
pub struct StubCompletion {
    reply: Result<String, String>,
    pub payloads: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl StubCompletion {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            payloads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextCompletion for StubCompletion {
    async fn complete(&self, payload: &str) -> AppResult<String> {
        self.payloads.lock().unwrap().push(payload.to_string());
        self.reply.clone().map_err(AppError::Upstream)
    }
}

/// Test configuration rooted at a fresh temporary project directory
pub fn test_config(project: &TempDir) -> Config {
    let mut config = Config::for_project(project.path());
    config.port = 0;
    config.websocket_port = 0;
    config
}

/// Test application wrapper
#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub completion: Arc<StubCompletion>,
    // Removed when the app is dropped
    pub project: TempDir,
}

#[allow(dead_code)]
impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        Self::with_completion(StubCompletion::replying("{}")).await
    }

    /// Create a test application with a specific completion stub
    pub async fn with_completion(completion: StubCompletion) -> Self {
        let project = TempDir::new().expect("Failed to create project directory");
        let config = test_config(&project);

        // Detached watcher: HTTP tests do not need filesystem events
        let watcher = Arc::new(ChangeWatcher::detached(
            project.path().join(&config.mock_data_dir_name),
        ));
        let completion = Arc::new(completion);

        let state = AppState::with_services(config, watcher, completion.clone())
            .expect("Failed to create test app state");

        let router = build_router(state.clone());
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            state,
            completion,
            project,
        }
    }
}
