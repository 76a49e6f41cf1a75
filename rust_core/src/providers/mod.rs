//! Upstream data source abstraction
//!
//! Defines the `GameFeed` trait the tracker polls. `ShlClient` is the
//! production implementation; tests script their own.

use crate::error::FetchError;
use crate::models::{GameInfo, TeamStats, UpcomingGame};
use async_trait::async_trait;
use serde_json::Value;

/// Read-only access to the hockey gameday API.
#[async_trait]
pub trait GameFeed: Send + Sync {
    /// Games that are upcoming or currently live.
    async fn upcoming_live_games(&self) -> Result<Vec<UpcomingGame>, FetchError>;

    /// Per-game team stats, used to learn which teams are playing.
    async fn team_stats(&self, game_uuid: &str) -> Result<TeamStats, FetchError>;

    /// Per-game metadata, used for the scheduled start time.
    async fn game_info(&self, game_uuid: &str) -> Result<GameInfo, FetchError>;

    /// Full play-by-play snapshot for a game, newest event first, undecoded.
    async fn play_by_play(&self, game_uuid: &str) -> Result<Vec<Value>, FetchError>;
}
