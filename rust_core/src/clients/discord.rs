use crate::error::NotifyError;
use crate::notify::Notifier;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://discord.com/api/v10";

/// Minimal Discord REST client: post messages as a bot.
///
/// REST only. There is no gateway session, so bot commands such as a `/ping`
/// health check are not served.
#[derive(Clone)]
pub struct DiscordClient {
    http: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for DiscordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
}

impl DiscordClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// The bot account the token belongs to.
    pub async fn current_user(&self) -> Result<DiscordUser, NotifyError> {
        let url = format!("{}/users/@me", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }
        Ok(resp.json::<DiscordUser>().await?)
    }
}

#[async_trait]
impl Notifier for DiscordClient {
    async fn send(&self, channel_id: u64, message: &str) -> Result<(), NotifyError> {
        let url = format!("{}/channels/{}/messages", self.base_url, channel_id);
        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(&CreateMessage { content: message })
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(NotifyError::ChannelNotFound(channel_id));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }
        Ok(())
    }
}
