use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use roomboard_gateway::connection;

use crate::messages;
use crate::state::AppState;
use crate::uploads;
use crate::votes;

/// Full HTTP + WebSocket surface.
pub fn router(state: AppState) -> Router {
    // GET takes a room id, PUT a message id; one pattern since the router
    // rejects differently named parameters at the same position.
    Router::new()
        .route("/messages", post(messages::create_message))
        .route(
            "/messages/{id}",
            get(messages::list_messages).put(messages::update_message),
        )
        .route("/messages/{id}/vote", post(votes::vote_message))
        .route(
            "/upload",
            post(uploads::upload_file).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .route("/ws/{room_id}", get(ws_upgrade))
        .route("/health", get(health))
        .nest_service("/uploads", ServeDir::new(&state.upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ws_upgrade(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| connection::handle_connection(socket, hub, room_id))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
