//! HTTP route definitions

use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::app::AppState;
use crate::http::skins::save_skin_handler;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;
use crate::ws::protocol::PlayerView;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - "*" for open local play, otherwise a
    // comma-separated origin list
    let cors = if state.config.client_origin.trim() == "*" {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let allowed_origins: Vec<header::HeaderValue> = state
            .config
            .client_origin
            .split(',')
            .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .route("/players", get(players_handler))
        .route("/player/:id", get(player_handler))
        .route("/scores", get(scores_handler))
        .route("/save-skin", post(save_skin_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    connections: usize,
    players: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        connections: state.connections.count(),
        players: state.game.player_count(),
    })
}

// ============================================================================
// World projections (read-only)
// ============================================================================

async fn fetch_players(state: &AppState) -> Result<Vec<PlayerView>, AppError> {
    state
        .game
        .players()
        .await
        .ok_or_else(|| AppError::Internal("game engine unavailable".to_string()))
}

async fn players_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlayerView>>, AppError> {
    Ok(Json(fetch_players(&state).await?))
}

#[derive(Serialize)]
struct PlayerProfile {
    id: Uuid,
    name: String,
    skin: String,
    score: u32,
    alive: bool,
}

async fn player_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerProfile>, AppError> {
    fetch_players(&state)
        .await?
        .into_iter()
        .find(|p| p.id == id)
        .map(|p| {
            Json(PlayerProfile {
                id: p.id,
                name: p.name,
                skin: p.skin,
                score: p.score,
                alive: p.alive,
            })
        })
        .ok_or_else(|| AppError::NotFound("player not found".to_string()))
}

#[derive(Serialize)]
struct ScoreRow {
    id: Uuid,
    name: String,
    score: u32,
}

async fn scores_handler(State(state): State<AppState>) -> Result<Json<Vec<ScoreRow>>, AppError> {
    let mut rows: Vec<ScoreRow> = fetch_players(&state)
        .await?
        .into_iter()
        .map(|p| ScoreRow {
            id: p.id,
            name: p.name,
            score: p.score,
        })
        .collect();
    rows.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(Json(rows))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
