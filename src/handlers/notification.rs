use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
};

use crate::notifications::serve_socket;
use crate::state::AppState;

/// Upgrade to a websocket that receives a `FILE_CHANGE` message for every
/// settled change under the mock data root
pub async fn notification_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let watcher = state.watcher.clone();
    ws.on_upgrade(move |socket| serve_socket(socket, watcher))
}
