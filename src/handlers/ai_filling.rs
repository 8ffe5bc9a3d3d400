use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::services::{fill_scene, FilledScene};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct AiFillingRequest {
    /// Scene body to fill. Text is passed through untouched so `//`
    /// directives and broken JSON reach the model as written.
    #[schema(value_type = Object)]
    pub response: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AiFillingResponse {
    /// Filled body, pretty-printed when it is valid JSON
    pub response: String,
    /// Whether `response` parsed as JSON
    pub valid: bool,
}

impl From<FilledScene> for AiFillingResponse {
    fn from(filled: FilledScene) -> Self {
        Self {
            response: filled.response,
            valid: filled.valid,
        }
    }
}

// ============ Handlers ============

/// Fill empty fields of a scene body with generated values
#[utoipa::path(
    post,
    path = "/v1/open-ai/ai-filling",
    request_body = AiFillingRequest,
    responses(
        (status = 200, description = "Completion reply", body = AiFillingResponse),
        (status = 400, description = "Missing body or OPENAI_API_KEY not configured"),
        (status = 502, description = "Completion service failed")
    ),
    tag = "AI Filling"
)]
pub async fn ai_filling(
    State(state): State<AppState>,
    Json(payload): Json<AiFillingRequest>,
) -> AppResult<Json<AiFillingResponse>> {
    let payload = match payload.response {
        Some(Value::String(text)) => text,
        Some(value) => serde_json::to_string_pretty(&value)
            .map_err(|e| AppError::Internal(e.to_string()))?,
        None => return Err(AppError::Validation("response is required".to_string())),
    };

    let filled = fill_scene(state.completion.as_ref(), &payload).await?;
    Ok(Json(filled.into()))
}
