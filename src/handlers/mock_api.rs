use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::handlers::{ListOrder, ListParams};
use crate::models::{CreateMockApi, HttpMethod, MockApi, UpdateMockApi};
use crate::repositories::{MockApiRepository, SceneRepository};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMockApiRequest {
    /// Request path the mock answers, e.g. `/users/list`
    pub path: Option<String>,
    pub description: Option<String>,
    pub method: Option<HttpMethod>,
    /// Name of the first scene
    pub scene: Option<String>,
    /// Body of the first scene, a JSON value or a JSON-encoded string
    #[schema(value_type = Option<Object>)]
    pub response: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMockApiRequest {
    pub path: Option<String>,
    pub description: Option<String>,
    pub method: Option<HttpMethod>,
    /// Select this scene; does not change `lastModified`
    pub scene: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectSceneRequest {
    /// Scene to select, or null to clear the selection
    pub scene: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MockApiResponse {
    pub id: String,
    pub path: Option<String>,
    pub description: Option<String>,
    pub method: Option<HttpMethod>,
    /// Selected scene
    pub scene: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>)]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>)]
    pub last_modified: Option<OffsetDateTime>,
    pub scene_list: Vec<String>,
}

impl From<MockApi> for MockApiResponse {
    fn from(api: MockApi) -> Self {
        Self {
            id: api.id,
            path: api.config.path,
            description: api.config.description,
            method: api.config.method,
            scene: api.config.scene,
            created_at: api.config.created_at,
            last_modified: api.config.last_modified,
            scene_list: api.scene_list,
        }
    }
}

/// A mock API together with the body of its selected scene
#[derive(Debug, Serialize, ToSchema)]
pub struct MockApiWithSceneResponse {
    #[serde(flatten)]
    pub api: MockApiResponse,
    /// Active scene body, null when nothing is selected
    #[schema(value_type = Option<Object>)]
    pub response: Option<Value>,
}

// ============ Handlers ============

/// List all mock APIs
#[utoipa::path(
    get,
    path = "/v1/mock-apis",
    params(ListParams),
    responses(
        (status = 200, description = "List of mock APIs", body = Vec<MockApiResponse>)
    ),
    tag = "Mock APIs"
)]
pub async fn list_mock_apis(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<MockApiResponse>>> {
    let apis = match params.order.unwrap_or_default() {
        ListOrder::LastModified => MockApiRepository::list_by_last_modified(&state.root)?,
        ListOrder::Recent => MockApiRepository::list_by_recency(&state.root)?,
    };

    Ok(Json(apis.into_iter().map(|api| api.into()).collect()))
}

/// List all mock APIs with their active scene body
#[utoipa::path(
    get,
    path = "/v1/mock-apis/with-scene",
    responses(
        (status = 200, description = "Mock APIs with active scene bodies", body = Vec<MockApiWithSceneResponse>)
    ),
    tag = "Mock APIs"
)]
pub async fn list_mock_apis_with_scene(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<MockApiWithSceneResponse>>> {
    let root = state.root.clone();

    // Reads every selected scene file; keep it off the async workers
    let data = tokio::task::spawn_blocking(move || -> AppResult<Vec<MockApiWithSceneResponse>> {
        let apis = MockApiRepository::list_by_last_modified(&root)?;

        Ok(apis
            .into_iter()
            .map(|api| {
                let response = match SceneRepository::active(&root, &api.id) {
                    Ok(body) => body,
                    Err(e) => {
                        tracing::warn!(api_id = %api.id, error = %e, "Cannot read active scene");
                        None
                    }
                };
                MockApiWithSceneResponse {
                    api: api.into(),
                    response,
                }
            })
            .collect())
    })
    .await??;

    Ok(Json(data))
}

/// Get a mock API by id
#[utoipa::path(
    get,
    path = "/v1/mock-apis/{api_id}",
    params(
        ("api_id" = String, Path, description = "Mock API ID")
    ),
    responses(
        (status = 200, description = "Mock API details", body = MockApiResponse),
        (status = 404, description = "Mock API not found")
    ),
    tag = "Mock APIs"
)]
pub async fn get_mock_api(
    State(state): State<AppState>,
    Path(api_id): Path<String>,
) -> AppResult<Json<MockApiResponse>> {
    let api = MockApiRepository::find_by_id(&state.root, &api_id)?;
    Ok(Json(api.into()))
}

/// Create a mock API, optionally with a first scene
#[utoipa::path(
    post,
    path = "/v1/mock-apis",
    request_body = CreateMockApiRequest,
    responses(
        (status = 201, description = "Mock API created successfully", body = MockApiResponse),
        (status = 400, description = "Validation error or malformed response body")
    ),
    tag = "Mock APIs"
)]
pub async fn create_mock_api(
    State(state): State<AppState>,
    Json(payload): Json<CreateMockApiRequest>,
) -> AppResult<(StatusCode, Json<MockApiResponse>)> {
    let create_mock_api = CreateMockApi {
        path: payload.path.unwrap_or_default(),
        description: payload.description,
        method: payload.method,
        scene: payload.scene,
        response: payload.response,
    };

    let api = MockApiRepository::create(&state.root, &create_mock_api)?;
    Ok((StatusCode::CREATED, Json(api.into())))
}

/// Update a mock API's config
#[utoipa::path(
    put,
    path = "/v1/mock-apis/{api_id}",
    params(
        ("api_id" = String, Path, description = "Mock API ID")
    ),
    request_body = UpdateMockApiRequest,
    responses(
        (status = 200, description = "Mock API updated successfully", body = MockApiResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Mock API or scene not found")
    ),
    tag = "Mock APIs"
)]
pub async fn update_mock_api(
    State(state): State<AppState>,
    Path(api_id): Path<String>,
    Json(payload): Json<UpdateMockApiRequest>,
) -> AppResult<Json<MockApiResponse>> {
    let update_mock_api = UpdateMockApi {
        path: payload.path,
        description: payload.description,
        method: payload.method,
        scene: payload.scene,
    };

    let api = MockApiRepository::update(&state.root, &api_id, &update_mock_api)?;
    Ok(Json(api.into()))
}

/// Select (or clear) the scene served for a mock API
#[utoipa::path(
    put,
    path = "/v1/mock-apis/{api_id}/scene",
    params(
        ("api_id" = String, Path, description = "Mock API ID")
    ),
    request_body = SelectSceneRequest,
    responses(
        (status = 200, description = "Scene selected", body = MockApiResponse),
        (status = 404, description = "Mock API or scene not found")
    ),
    tag = "Mock APIs"
)]
pub async fn select_scene(
    State(state): State<AppState>,
    Path(api_id): Path<String>,
    Json(payload): Json<SelectSceneRequest>,
) -> AppResult<Json<MockApiResponse>> {
    MockApiRepository::select_scene(&state.root, &api_id, payload.scene.as_deref())?;
    let api = MockApiRepository::find_by_id(&state.root, &api_id)?;
    Ok(Json(api.into()))
}

/// Delete a mock API and all of its scenes
#[utoipa::path(
    delete,
    path = "/v1/mock-apis/{api_id}",
    params(
        ("api_id" = String, Path, description = "Mock API ID")
    ),
    responses(
        (status = 204, description = "Mock API deleted successfully"),
        (status = 404, description = "Mock API not found")
    ),
    tag = "Mock APIs"
)]
pub async fn delete_mock_api(
    State(state): State<AppState>,
    Path(api_id): Path<String>,
) -> AppResult<StatusCode> {
    MockApiRepository::delete(&state.root, &api_id)?;
    Ok(StatusCode::NO_CONTENT)
}
