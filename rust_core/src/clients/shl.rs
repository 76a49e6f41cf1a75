use crate::error::FetchError;
use crate::models::{GameInfo, TeamStats, UpcomingGame};
use crate::providers::GameFeed;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.shl.se/api";

/// Client for the SHL gameday API.
#[derive(Debug, Clone)]
pub struct ShlClient {
    client: Client,
    base_url: String,
}

impl ShlClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        require_json: bool,
    ) -> Result<T, FetchError> {
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        if require_json {
            let content_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            if !content_type.contains("application/json") {
                return Err(FetchError::ContentType { url, content_type });
            }
        }

        resp.json::<T>()
            .await
            .map_err(|source| FetchError::Decode { url, source })
    }
}

impl Default for ShlClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, Duration::from_secs(15))
    }
}

#[async_trait]
impl GameFeed for ShlClient {
    async fn upcoming_live_games(&self) -> Result<Vec<UpcomingGame>, FetchError> {
        self.get_json(self.url("sports-v2/upcoming-live-games"), false)
            .await
    }

    async fn team_stats(&self, game_uuid: &str) -> Result<TeamStats, FetchError> {
        // This endpoint serves an HTML page for games it has no stats for.
        self.get_json(self.url(&format!("gameday/team-stats/{}", game_uuid)), true)
            .await
    }

    async fn game_info(&self, game_uuid: &str) -> Result<GameInfo, FetchError> {
        self.get_json(self.url(&format!("sports-v2/game-info/{}", game_uuid)), false)
            .await
    }

    async fn play_by_play(&self, game_uuid: &str) -> Result<Vec<Value>, FetchError> {
        self.get_json(self.url(&format!("gameday/play-by-play/{}", game_uuid)), false)
            .await
    }
}
