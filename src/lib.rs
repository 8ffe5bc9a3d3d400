// Library crate for the cooker mock server
// Exports modules for use by the server binary and tests

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod notifications;
pub mod repositories;
pub mod services;
pub mod state;
pub mod store;
pub mod watcher;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    ai_filling, create_mock_api, create_scene, delete_mock_api, delete_scene, get_mock_api,
    get_scene, list_mock_apis, list_mock_apis_with_scene, list_scenes, notification_socket,
    select_scene, update_mock_api, update_scene,
};
use crate::state::AppState;

/// Build the REST router with the given state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Cooker mock server" }))
        // Mock API routes
        .route("/v1/mock-apis", get(list_mock_apis).post(create_mock_api))
        .route("/v1/mock-apis/with-scene", get(list_mock_apis_with_scene))
        .route(
            "/v1/mock-apis/{api_id}",
            get(get_mock_api)
                .put(update_mock_api)
                .delete(delete_mock_api),
        )
        .route("/v1/mock-apis/{api_id}/scene", put(select_scene))
        // Scene routes
        .route("/v1/scenes/{api_id}", get(list_scenes).post(create_scene))
        .route(
            "/v1/scenes/{api_id}/{scene}",
            get(get_scene).put(update_scene).delete(delete_scene),
        )
        // Text completion
        .route("/v1/open-ai/ai-filling", post(ai_filling))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Build the notification channel router, served on its own port
pub fn build_notification_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(notification_socket))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
