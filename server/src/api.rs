use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use rps_protocol::LeaderboardEntry;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<usize>,
}

/// Read-only leaderboard routes, mounted both at the root and under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/leaderboard", get(leaderboard))
        .route("/leaderboard/:country_code", get(leaderboard_one))
}

pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let lobby = state.lobby.lock();
    Json(json!({
        "message": "server is up",
        "players": lobby.connection_count(),
        "playing": lobby.playing_count(),
        "rooms": lobby.room_count(),
        "countries": lobby.country_count(),
    }))
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Json<Vec<LeaderboardEntry>> {
    let cap = state.config.leaderboard_limit();
    let limit = params.limit.map_or(cap, |l| l.min(cap));
    Json(state.lobby.lock().leaderboard(limit))
}

pub async fn leaderboard_one(
    State(state): State<AppState>,
    Path(country_code): Path<String>,
) -> Result<Json<LeaderboardEntry>, ApiError> {
    state
        .lobby
        .lock()
        .leaderboard_entry(&country_code)
        .map(Json)
        .ok_or(ApiError::CountryNotFound(country_code))
}
