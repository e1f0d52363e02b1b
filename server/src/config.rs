use clap::Parser;
use std::net::{IpAddr, SocketAddr};

/// Hard ceiling on leaderboard page size.
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

#[derive(Debug, Clone, Parser)]
#[command(name = "rps-server")]
#[command(about = "Rock-paper-scissors matchmaking server with a per-country leaderboard")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,
    /// Port for the server
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,
    /// Base URL clients should use for the read-only leaderboard API
    #[arg(long, env = "PUBLIC_API_URL")]
    pub public_url: Option<String>,
    /// Entries returned by `GET /leaderboard`
    #[arg(long, env = "LEADERBOARD_LIMIT", default_value_t = MAX_LEADERBOARD_LIMIT)]
    pub leaderboard_limit: usize,
    /// Fallback tracing filter when RUST_LOG is unset
    #[arg(long = "log", env = "LOG_FILTER", default_value = "info,tower_http=info")]
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 5000,
            public_url: None,
            leaderboard_limit: MAX_LEADERBOARD_LIMIT,
            log_filter: "info,tower_http=info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn public_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }

    pub fn leaderboard_limit(&self) -> usize {
        self.leaderboard_limit.clamp(1, MAX_LEADERBOARD_LIMIT)
    }
}
