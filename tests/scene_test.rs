mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{Factory, TestApp};

async fn selected_scene(app: &TestApp, api_id: &str) -> Value {
    let body: Value = app
        .server
        .get(&format!("/v1/mock-apis/{}", api_id))
        .await
        .json();
    body["scene"].clone()
}

#[tokio::test]
async fn test_list_scenes() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let api = factory.create_mock_api("/scenes");
    factory.add_scene(&api.id, "error", json!({"error": "boom"}));

    let response = app.server.get(&format!("/v1/scenes/{}", api.id)).await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "apiId": api.id,
        "scene": "default",
        "sceneList": ["default", "error"]
    }));
}

#[tokio::test]
async fn test_list_scenes_of_missing_api() {
    let app = TestApp::new().await;

    let response = app.server.get("/v1/scenes/ghost_ID_000000").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_scene_not_found() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let api = factory.create_mock_api("/scenes");

    let response = app
        .server
        .get(&format!("/v1/scenes/{}/missing", api.id))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

// Scenario A: create with a scene, read it back, delete it, selection cleared
#[tokio::test]
async fn test_scenario_create_read_delete_clears_selection() {
    let app = TestApp::new().await;

    let created = app
        .server
        .post("/v1/mock-apis")
        .json(&json!({
            "path": "/a",
            "method": "GET",
            "scene": "ok",
            "response": {"x": 1}
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let id = created.json::<Value>()["id"].as_str().unwrap().to_string();

    let scene = app.server.get(&format!("/v1/scenes/{}/ok", id)).await;
    scene.assert_status_ok();
    scene.assert_json(&json!({"x": 1}));

    app.server
        .delete(&format!("/v1/scenes/{}/ok", id))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert_eq!(selected_scene(&app, &id).await, Value::Null);
    let scenes: Value = app.server.get(&format!("/v1/scenes/{}", id)).await.json();
    assert_eq!(scenes["sceneList"], json!([]));
}

// Scenario B: the first scene of a scene-less API becomes selected
#[tokio::test]
async fn test_scenario_first_scene_is_selected() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let api = factory.create_bare_mock_api("/b");
    assert_eq!(selected_scene(&app, &api.id).await, Value::Null);

    let response = app
        .server
        .post(&format!("/v1/scenes/{}", api.id))
        .json(&json!({"scene": "first", "response": {"n": 1}}))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.assert_json(&json!({
        "apiId": api.id,
        "scene": "first",
        "response": {"n": 1}
    }));
    assert_eq!(selected_scene(&app, &api.id).await, "first");

    // A second scene does not steal the selection
    app.server
        .post(&format!("/v1/scenes/{}", api.id))
        .json(&json!({"scene": "second", "response": {"n": 2}}))
        .await
        .assert_status(StatusCode::CREATED);
    assert_eq!(selected_scene(&app, &api.id).await, "first");
}

// Scenario C: deleting the selected scene moves the selection to a remaining one
#[tokio::test]
async fn test_scenario_delete_selected_scene_reselects() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let api = factory.create_mock_api_with_scene("/c", "zeta", json!({}));
    factory.add_scene(&api.id, "alpha", json!({}));
    factory.add_scene(&api.id, "beta", json!({}));
    assert_eq!(selected_scene(&app, &api.id).await, "zeta");

    app.server
        .delete(&format!("/v1/scenes/{}/zeta", api.id))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert_eq!(selected_scene(&app, &api.id).await, "alpha");
}

// Scenario D: string and object bodies both land as parsed JSON
#[tokio::test]
async fn test_scenario_string_then_object_body() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let api = factory.create_mock_api("/d");

    app.server
        .put(&format!("/v1/scenes/{}/default", api.id))
        .json(&json!({"response": "{\"a\":1}"}))
        .await
        .assert_status_ok();

    let response = app
        .server
        .put(&format!("/v1/scenes/{}/default", api.id))
        .json(&json!({"response": {"a": 2}}))
        .await;
    response.assert_status_ok();

    let stored = app
        .state
        .root
        .files()
        .read_text(&app.state.root.scene_path(&api.id, "default"))
        .unwrap()
        .unwrap();
    assert_eq!(serde_json::from_str::<Value>(&stored).unwrap(), json!({"a": 2}));

    app.server
        .get(&format!("/v1/scenes/{}/default", api.id))
        .await
        .assert_json(&json!({"a": 2}));
}

#[tokio::test]
async fn test_create_scene_defaults_to_empty_object() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let api = factory.create_mock_api("/defaults");

    app.server
        .post(&format!("/v1/scenes/{}", api.id))
        .json(&json!({"scene": "blank"}))
        .await
        .assert_status(StatusCode::CREATED);

    app.server
        .get(&format!("/v1/scenes/{}/blank", api.id))
        .await
        .assert_json(&json!({}));
}

#[tokio::test]
async fn test_create_existing_scene_conflicts() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let api = factory.create_mock_api_with_scene("/dup", "default", json!({"keep": true}));

    let response = app
        .server
        .post(&format!("/v1/scenes/{}", api.id))
        .json(&json!({"scene": "default", "response": {"keep": false}}))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    app.server
        .get(&format!("/v1/scenes/{}/default", api.id))
        .await
        .assert_json(&json!({"keep": true}));
}

#[tokio::test]
async fn test_create_scene_with_invalid_name() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let api = factory.create_mock_api("/names");

    for name in ["", ".config", "../escape", "a\\b"] {
        let response = app
            .server
            .post(&format!("/v1/scenes/{}", api.id))
            .json(&json!({"scene": name, "response": {}}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_create_scene_with_malformed_body() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let api = factory.create_mock_api("/malformed");

    let response = app
        .server
        .post(&format!("/v1/scenes/{}", api.id))
        .json(&json!({"scene": "bad", "response": "{oops"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Malformed JSON");

    let scenes: Value = app.server.get(&format!("/v1/scenes/{}", api.id)).await.json();
    assert_eq!(scenes["sceneList"], json!(["default"]));
}

#[tokio::test]
async fn test_create_scene_for_missing_api() {
    let app = TestApp::new().await;

    let response = app
        .server
        .post("/v1/scenes/ghost_ID_000000")
        .json(&json!({"scene": "x", "response": {}}))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(!app.state.root.api_dir("ghost_ID_000000").exists());
}

#[tokio::test]
async fn test_update_missing_scene() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let api = factory.create_mock_api("/update");

    let response = app
        .server
        .put(&format!("/v1/scenes/{}/missing", api.id))
        .json(&json!({"response": {}}))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_scene_requires_response() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let api = factory.create_mock_api("/update");

    let response = app
        .server
        .put(&format!("/v1/scenes/{}/default", api.id))
        .json(&json!({}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_unselected_scene_keeps_selection() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let api = factory.create_mock_api("/keep");
    factory.add_scene(&api.id, "other", json!({}));

    app.server
        .delete(&format!("/v1/scenes/{}/other", api.id))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert_eq!(selected_scene(&app, &api.id).await, "default");
}

#[tokio::test]
async fn test_delete_missing_scene() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let api = factory.create_mock_api("/missing");

    let response = app
        .server
        .delete(&format!("/v1/scenes/{}/nope", api.id))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(selected_scene(&app, &api.id).await, "default");
}

#[tokio::test]
async fn test_update_scene_keeps_cleared_selection() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let api = factory.create_mock_api("/cleared");

    app.server
        .put(&format!("/v1/mock-apis/{}/scene", api.id))
        .json(&json!({"scene": null}))
        .await
        .assert_status_ok();

    app.server
        .put(&format!("/v1/scenes/{}/default", api.id))
        .json(&json!({"response": {"edited": true}}))
        .await
        .assert_status_ok();

    assert_eq!(selected_scene(&app, &api.id).await, Value::Null);
}
