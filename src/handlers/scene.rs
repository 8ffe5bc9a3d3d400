use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::models::Scene;
use crate::repositories::{MockApiRepository, SceneRepository};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSceneRequest {
    pub scene: String,
    /// Scene body, a JSON value or a JSON-encoded string. Defaults to `{}`.
    #[schema(value_type = Option<Object>)]
    pub response: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSceneRequest {
    #[schema(value_type = Object)]
    pub response: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SceneListResponse {
    pub api_id: String,
    /// Currently selected scene
    pub scene: Option<String>,
    pub scene_list: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SceneResponse {
    pub api_id: String,
    pub scene: String,
    #[schema(value_type = Object)]
    pub response: Value,
}

impl From<Scene> for SceneResponse {
    fn from(scene: Scene) -> Self {
        Self {
            api_id: scene.api_id,
            scene: scene.name,
            response: scene.body,
        }
    }
}

// ============ Handlers ============

/// List the scenes of a mock API
#[utoipa::path(
    get,
    path = "/v1/scenes/{api_id}",
    params(
        ("api_id" = String, Path, description = "Mock API ID")
    ),
    responses(
        (status = 200, description = "Scene names", body = SceneListResponse),
        (status = 404, description = "Mock API not found")
    ),
    tag = "Scenes"
)]
pub async fn list_scenes(
    State(state): State<AppState>,
    Path(api_id): Path<String>,
) -> AppResult<Json<SceneListResponse>> {
    let config = MockApiRepository::require_config(&state.root, &api_id)?;
    let scene_list = SceneRepository::list(&state.root, &api_id)?;

    Ok(Json(SceneListResponse {
        api_id,
        scene: config.scene,
        scene_list,
    }))
}

/// Get a scene body
#[utoipa::path(
    get,
    path = "/v1/scenes/{api_id}/{scene}",
    params(
        ("api_id" = String, Path, description = "Mock API ID"),
        ("scene" = String, Path, description = "Scene name")
    ),
    responses(
        (status = 200, description = "Parsed scene body"),
        (status = 404, description = "Mock API or scene not found")
    ),
    tag = "Scenes"
)]
pub async fn get_scene(
    State(state): State<AppState>,
    Path((api_id, scene)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let body = SceneRepository::get(&state.root, &api_id, &scene)?.ok_or_else(|| {
        AppError::NotFound(format!("Scene {} of mock API {}", scene, api_id))
    })?;
    Ok(Json(body))
}

/// Create a scene; the first scene of an API becomes its selected scene
#[utoipa::path(
    post,
    path = "/v1/scenes/{api_id}",
    params(
        ("api_id" = String, Path, description = "Mock API ID")
    ),
    request_body = CreateSceneRequest,
    responses(
        (status = 201, description = "Scene created successfully", body = SceneResponse),
        (status = 400, description = "Invalid scene name or malformed body"),
        (status = 404, description = "Mock API not found"),
        (status = 409, description = "Scene already exists")
    ),
    tag = "Scenes"
)]
pub async fn create_scene(
    State(state): State<AppState>,
    Path(api_id): Path<String>,
    Json(payload): Json<CreateSceneRequest>,
) -> AppResult<(StatusCode, Json<SceneResponse>)> {
    let body = payload
        .response
        .unwrap_or_else(|| Value::Object(Default::default()));

    let scene = SceneRepository::create(&state.root, &api_id, &payload.scene, body)?;
    Ok((StatusCode::CREATED, Json(scene.into())))
}

/// Replace a scene body
#[utoipa::path(
    put,
    path = "/v1/scenes/{api_id}/{scene}",
    params(
        ("api_id" = String, Path, description = "Mock API ID"),
        ("scene" = String, Path, description = "Scene name")
    ),
    request_body = UpdateSceneRequest,
    responses(
        (status = 200, description = "Scene updated successfully", body = SceneResponse),
        (status = 400, description = "Missing or malformed body"),
        (status = 404, description = "Mock API or scene not found")
    ),
    tag = "Scenes"
)]
pub async fn update_scene(
    State(state): State<AppState>,
    Path((api_id, scene)): Path<(String, String)>,
    Json(payload): Json<UpdateSceneRequest>,
) -> AppResult<Json<SceneResponse>> {
    let body = payload
        .response
        .ok_or_else(|| AppError::Validation("response is required".to_string()))?;

    let scene = SceneRepository::update(&state.root, &api_id, &scene, body)?;
    Ok(Json(scene.into()))
}

/// Delete a scene, moving or clearing the selection when needed
#[utoipa::path(
    delete,
    path = "/v1/scenes/{api_id}/{scene}",
    params(
        ("api_id" = String, Path, description = "Mock API ID"),
        ("scene" = String, Path, description = "Scene name")
    ),
    responses(
        (status = 204, description = "Scene deleted successfully"),
        (status = 404, description = "Mock API or scene not found")
    ),
    tag = "Scenes"
)]
pub async fn delete_scene(
    State(state): State<AppState>,
    Path((api_id, scene)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    SceneRepository::delete(&state.root, &api_id, &scene)?;
    Ok(StatusCode::NO_CONTENT)
}
