use serde_json::{json, Value};

use cooker_mock::models::{CreateMockApi, HttpMethod, MockApi};
use cooker_mock::repositories::{MockApiRepository, SceneRepository};
use cooker_mock::state::AppState;

/// Factory for creating test data
pub struct Factory<'a> {
    state: &'a AppState,
}

#[allow(dead_code)]
impl<'a> Factory<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Create a GET mock API with a single "default" scene
    pub fn create_mock_api(&self, path: &str) -> MockApi {
        self.create_mock_api_with_scene(path, "default", json!({"ok": true}))
    }

    /// Create a mock API whose first scene is `scene` with `body`
    pub fn create_mock_api_with_scene(&self, path: &str, scene: &str, body: Value) -> MockApi {
        let input = CreateMockApi {
            path: path.to_string(),
            description: Some(format!("Mock for {}", path)),
            method: Some(HttpMethod::Get),
            scene: Some(scene.to_string()),
            response: Some(body),
        };

        MockApiRepository::create(&self.state.root, &input).unwrap()
    }

    /// Create a mock API with no scenes
    pub fn create_bare_mock_api(&self, path: &str) -> MockApi {
        let input = CreateMockApi {
            path: path.to_string(),
            description: None,
            method: Some(HttpMethod::Post),
            scene: None,
            response: None,
        };

        MockApiRepository::create(&self.state.root, &input).unwrap()
    }

    /// Add another scene to an existing mock API
    pub fn add_scene(&self, api_id: &str, scene: &str, body: Value) {
        SceneRepository::create(&self.state.root, api_id, scene, body).unwrap();
    }
}
