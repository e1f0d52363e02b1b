use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Reasons an intent is refused. Reported to the sender only; shared state is
/// left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LobbyError {
    #[error("bad json: {0}")]
    Malformed(String),
    #[error("player name cannot be empty")]
    EmptyName,
    #[error("you have already joined a game")]
    AlreadyJoined,
    #[error("join a game first")]
    NotJoined,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Country not found")]
    CountryNotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::CountryNotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
