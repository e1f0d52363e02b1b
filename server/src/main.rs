use anyhow::Context;
use axum::{
    http::{self, header},
    routing::get,
    Router,
};
use clap::Parser;
use parking_lot::Mutex;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod gateway;
mod leaderboard;
mod lobby;
mod registry;
mod resolver;
mod rooms;
#[cfg(test)]
mod tests;

use config::ServerConfig;
use lobby::Lobby;

#[derive(Clone)]
pub struct AppState {
    lobby: Arc<Mutex<Lobby>>,
    config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        AppState {
            lobby: Arc::new(Mutex::new(Lobby::new())),
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::status))
        .route("/ws", get(gateway::ws_handler))
        .merge(api::routes())
        .nest("/api", api::routes())
        .layer(
            CorsLayer::new()
                .allow_methods([http::Method::GET, http::Method::POST])
                .allow_headers([header::CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let addr = config.addr();
    let public_url = config.public_url();
    let state = AppState::new(config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "server listening");
    info!("leaderboard: {public_url}/api/leaderboard");
    info!("websocket: {}/ws", public_url.replacen("http", "ws", 1));

    axum::serve(listener, app(state)).await.context("server stopped")?;
    Ok(())
}
