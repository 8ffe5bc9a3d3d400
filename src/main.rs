use std::future::IntoFuture;

use anyhow::Context;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use cooker_mock::config::Config;
use cooker_mock::handlers::{
    AiFillingRequest, AiFillingResponse, CreateMockApiRequest, CreateSceneRequest, ListOrder,
    MockApiResponse, MockApiWithSceneResponse, SceneListResponse, SceneResponse,
    SelectSceneRequest, UpdateMockApiRequest, UpdateSceneRequest,
};
use cooker_mock::models::HttpMethod;
use cooker_mock::state::AppState;
use cooker_mock::{build_notification_router, build_router, handlers};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::mock_api::list_mock_apis,
        handlers::mock_api::list_mock_apis_with_scene,
        handlers::mock_api::get_mock_api,
        handlers::mock_api::create_mock_api,
        handlers::mock_api::update_mock_api,
        handlers::mock_api::select_scene,
        handlers::mock_api::delete_mock_api,
        handlers::scene::list_scenes,
        handlers::scene::get_scene,
        handlers::scene::create_scene,
        handlers::scene::update_scene,
        handlers::scene::delete_scene,
        handlers::ai_filling::ai_filling,
    ),
    components(schemas(
        HttpMethod,
        ListOrder,
        CreateMockApiRequest,
        UpdateMockApiRequest,
        SelectSceneRequest,
        MockApiResponse,
        MockApiWithSceneResponse,
        CreateSceneRequest,
        UpdateSceneRequest,
        SceneListResponse,
        SceneResponse,
        AiFillingRequest,
        AiFillingResponse,
    )),
    tags(
        (name = "Mock APIs", description = "Mock API management endpoints"),
        (name = "Scenes", description = "Scene management endpoints"),
        (name = "AI Filling", description = "Generate values for empty scene fields")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    let addr = config.server_addr();
    let websocket_addr = config.websocket_addr();

    // Open the storage root and start the file watcher
    let state = AppState::new(config).context("Failed to initialize application state")?;
    tracing::info!(root = %state.root.path().display(), "Mock data root ready");

    // Build the main application router
    let app = build_router(state.clone())
        // Add Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    let notifications = build_notification_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let websocket_listener = tokio::net::TcpListener::bind(&websocket_addr)
        .await
        .with_context(|| format!("Failed to bind {}", websocket_addr))?;

    tracing::info!("Server started on http://{}", addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", addr);
    tracing::info!("Notification channel: ws://{}", websocket_addr);

    tokio::try_join!(
        axum::serve(listener, app).into_future(),
        axum::serve(websocket_listener, notifications).into_future(),
    )?;

    Ok(())
}
