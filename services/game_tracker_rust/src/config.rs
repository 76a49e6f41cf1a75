//! Configuration for the game tracker, loaded from environment variables.

use anyhow::{anyhow, Context, Result};
use puckwatch_rust_core::clients::{discord, shl};
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_TEAM_CODE: &str = "VLH";
pub const DEFAULT_ANNOUNCE_CHANNEL_ID: u64 = 1462165235677790434;
pub const DEFAULT_PLAY_BY_PLAY_DIR: &str = "data/play_by_play";

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    /// Games involving any of these teams are tracked.
    pub team_codes: Vec<String>,
    pub announce_channel_id: u64,
    /// Persist every fetched play-by-play snapshot to disk.
    pub play_by_play_logging: bool,
    pub play_by_play_dir: PathBuf,
    pub shl_api_base_url: String,
    pub discord_api_base_url: String,
    pub poll_interval_secs: u64,
    pub discovery_interval_secs: u64,
    pub http_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"<redacted>")
            .field("team_codes", &self.team_codes)
            .field("announce_channel_id", &self.announce_channel_id)
            .field("play_by_play_logging", &self.play_by_play_logging)
            .field("play_by_play_dir", &self.play_by_play_dir)
            .field("shl_api_base_url", &self.shl_api_base_url)
            .field("discord_api_base_url", &self.discord_api_base_url)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("discovery_interval_secs", &self.discovery_interval_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("shutdown_timeout_secs", &self.shutdown_timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow!("DISCORD_TOKEN must be set"))?;

        let mut seen = HashSet::new();
        let mut team_codes: Vec<String> = lookup("TEAM_CODES")
            .unwrap_or_default()
            .split(',')
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty() && seen.insert(code.clone()))
            .collect();
        if team_codes.is_empty() {
            team_codes.push(DEFAULT_TEAM_CODE.to_string());
        }

        Ok(Self {
            discord_token,
            team_codes,
            announce_channel_id: parse_number(
                &lookup,
                "ANNOUNCE_CHANNEL_ID",
                DEFAULT_ANNOUNCE_CHANNEL_ID,
            )?,
            play_by_play_logging: parse_bool(&lookup, "PLAY_BY_PLAY_LOGGING", true),
            play_by_play_dir: lookup("PLAY_BY_PLAY_DIR")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PLAY_BY_PLAY_DIR.to_string())
                .into(),
            shl_api_base_url: lookup("SHL_API_BASE_URL")
                .unwrap_or_else(|| shl::DEFAULT_BASE_URL.to_string()),
            discord_api_base_url: lookup("DISCORD_API_BASE_URL")
                .unwrap_or_else(|| discord::DEFAULT_API_BASE_URL.to_string()),
            poll_interval_secs: parse_positive(&lookup, "POLL_INTERVAL_SECS", 60)?,
            discovery_interval_secs: parse_positive(&lookup, "DISCOVERY_INTERVAL_SECS", 3600)?,
            http_timeout_secs: parse_number(&lookup, "HTTP_TIMEOUT_SECS", 15)?,
            shutdown_timeout_secs: parse_number(&lookup, "SHUTDOWN_TIMEOUT_SECS", 10)?,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// The subset the poll loops need.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            poll_interval: self.poll_interval(),
            channel_id: self.announce_channel_id,
        }
    }
}

/// Settings shared by every poll loop.
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
    pub channel_id: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            channel_id: DEFAULT_ANNOUNCE_CHANNEL_ID,
        }
    }
}

fn parse_number<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a non-negative integer, got {:?}", key, raw)),
        _ => Ok(default),
    }
}

/// Like `parse_number`, for intervals where zero would mean a busy loop.
fn parse_positive<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_number(lookup, key, default)? {
        0 => Err(anyhow!("{} must be greater than zero", key)),
        value => Ok(value),
    }
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        "" => default,
        _ => {
            warn!("Invalid {} value {:?}, using default {}", key, raw, default);
            default
        }
    }
}
