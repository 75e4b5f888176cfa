//! Upstream data retrieval.
//!
//! Fetches pre-grouped situational rows from the players and teams
//! endpoints. Failures are returned to the caller as-is; nothing here
//! retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::SourceConfig;
use crate::models::{PlayersPayload, TeamsPayload};

pub const PLAYERS_PATH: &str = "api/players/";
pub const TEAMS_PATH: &str = "api/teams/";

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source of raw situational rows.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &'static str;

    async fn fetch_players(&self) -> Result<PlayersPayload, FetchError>;

    async fn fetch_teams(&self) -> Result<TeamsPayload, FetchError>;
}

/// Fetches rows over HTTP from a stats server.
pub struct HttpStatsSource {
    client: Client,
    base_url: Url,
}

impl HttpStatsSource {
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("rink-stats/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}{}: {}", self.base_url, path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.endpoint(path)?;
        info!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("Unknown").to_string()
            } else {
                body
            };
            warn!("Upstream {} returned {}", url, status);
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl StatsSource for HttpStatsSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_players(&self) -> Result<PlayersPayload, FetchError> {
        self.get_json(PLAYERS_PATH).await
    }

    async fn fetch_teams(&self) -> Result<TeamsPayload, FetchError> {
        self.get_json(TEAMS_PATH).await
    }
}

/// In-memory source serving fixed payloads.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    players: PlayersPayload,
    teams: TeamsPayload,
}

impl StaticSource {
    pub fn new(players: PlayersPayload, teams: TeamsPayload) -> Self {
        Self { players, teams }
    }
}

#[async_trait]
impl StatsSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_players(&self) -> Result<PlayersPayload, FetchError> {
        Ok(self.players.clone())
    }

    async fn fetch_teams(&self) -> Result<TeamsPayload, FetchError> {
        Ok(self.teams.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    async fn spawn_upstream(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn source_for(base_url: String) -> HttpStatsSource {
        HttpStatsSource::new(&SourceConfig {
            base_url,
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_join_keeps_base_path() {
        let source = source_for("http://stats.example.com/hockey".to_string());
        assert_eq!(
            source.endpoint(PLAYERS_PATH).unwrap().as_str(),
            "http://stats.example.com/hockey/api/players/"
        );
        assert_eq!(
            source.endpoint(TEAMS_PATH).unwrap().as_str(),
            "http://stats.example.com/hockey/api/teams/"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpStatsSource::new(&SourceConfig {
            base_url: "::nope".to_string(),
            timeout_seconds: 5,
        });
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_teams_over_http() {
        let app = Router::new().route(
            "/api/teams/",
            get(|| async {
                r#"{"teams": [{"team": "edm", "data": [{"score_sit": "0", "strength_sit": "ev5", "gf": "2"}]}]}"#
            }),
        );
        let source = source_for(spawn_upstream(app).await);

        let payload = source.fetch_teams().await.unwrap();
        assert_eq!(payload.teams.len(), 1);
        assert_eq!(payload.teams[0].team, "edm");
    }

    #[tokio::test]
    async fn test_upstream_status_error_is_surfaced() {
        let app = Router::new().route(
            "/api/players/",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Error running query") }),
        );
        let source = source_for(spawn_upstream(app).await);

        match source.fetch_players().await {
            Err(FetchError::HttpStatus { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Error running query");
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_json_is_surfaced() {
        let app = Router::new().route("/api/players/", get(|| async { "not json" }));
        let source = source_for(spawn_upstream(app).await);

        assert!(matches!(source.fetch_players().await, Err(FetchError::Json(_))));
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticSource::default();
        assert!(source.fetch_players().await.unwrap().players.is_empty());
        assert_eq!(source.name(), "static");
    }
}
