//! Discovery loop: find upcoming/live games of the configured teams and hand
//! them to the tracker.

use crate::tracker::{until_shutdown, GameTracker};
use chrono::{DateTime, Utc};
use puckwatch_rust_core::models::parse_start_time;
use puckwatch_rust_core::{FetchError, GameFeed};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct GameDiscovery {
    feed: Arc<dyn GameFeed>,
    tracker: GameTracker,
    team_codes: Vec<String>,
}

impl GameDiscovery {
    pub fn new(feed: Arc<dyn GameFeed>, tracker: GameTracker, team_codes: Vec<String>) -> Self {
        Self {
            feed,
            tracker,
            team_codes,
        }
    }

    /// One pass over the upcoming games listing. Returns how many games were
    /// newly handed to the tracker.
    pub async fn run_discovery_cycle(&self) -> Result<usize, FetchError> {
        info!("Starting discovery cycle");
        let listing = self.feed.upcoming_live_games().await?;

        let mut seen = HashSet::new();
        let game_ids: Vec<String> = listing
            .into_iter()
            .filter_map(|game| game.game_uuid)
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();
        debug!("{} game(s) listed", game_ids.len());

        let mut team_games = Vec::new();
        for game_id in game_ids {
            if self.is_team_game(&game_id).await {
                team_games.push(game_id);
            }
        }
        info!(
            "Found {} game(s) for {}: {:?}",
            team_games.len(),
            self.team_codes.join(","),
            team_games
        );

        let mut added = 0;
        for game_id in team_games {
            if self.tracker.is_tracking(&game_id) {
                debug!("Game {} already tracked", game_id);
                continue;
            }
            if self.tracker.has_finished(&game_id) {
                debug!("Game {} already over", game_id);
                continue;
            }
            let Some(start_time) = self.start_time(&game_id).await else {
                continue;
            };
            if self.tracker.add_game(&game_id, start_time) {
                added += 1;
            }
        }
        Ok(added)
    }

    async fn is_team_game(&self, game_id: &str) -> bool {
        match self.feed.team_stats(game_id).await {
            Ok(stats) => self.team_codes.iter().any(|code| stats.has_team(code)),
            Err(e) if e.is_content_type() => {
                debug!("No team stats for game {}: {}", game_id, e);
                false
            }
            Err(e) => {
                warn!("Skipping game {}: {}", game_id, e);
                false
            }
        }
    }

    async fn start_time(&self, game_id: &str) -> Option<DateTime<Utc>> {
        let info = match self.feed.game_info(game_id).await {
            Ok(info) => info,
            Err(e) => {
                warn!("Skipping game {}, no game info: {}", game_id, e);
                return None;
            }
        };
        let Some(raw) = info.start_date_time() else {
            warn!("Skipping game {}, no start time", game_id);
            return None;
        };
        match parse_start_time(raw) {
            Ok(start) => {
                info!("Game {} starts at {}", game_id, start);
                Some(start)
            }
            Err(e) => {
                warn!("Skipping game {}: {}", game_id, e);
                None
            }
        }
    }

    /// Run a cycle now, then every `interval`, until shutdown.
    pub async fn run(self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!("Discovery loop started (interval: {}s)", interval.as_secs());
        loop {
            match until_shutdown(self.run_discovery_cycle(), &mut shutdown).await {
                None => break,
                Some(Ok(added)) => debug!("Discovery cycle added {} game(s)", added),
                Some(Err(e)) => error!("Error fetching upcoming games: {}", e),
            }
            if until_shutdown(tokio::time::sleep(interval), &mut shutdown)
                .await
                .is_none()
            {
                break;
            }
        }
        info!("Discovery loop stopped");
    }
}
