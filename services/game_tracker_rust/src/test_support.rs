//! In-memory fakes of the feed, notifier and snapshot store for unit tests.

use crate::persistence::SnapshotStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use puckwatch_rust_core::models::{GameInfo, TeamStats, UpcomingGame};
use puckwatch_rust_core::{FetchError, GameFeed, NotifyError, Notifier};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::io;

/// One scripted answer of the play-by-play endpoint.
#[derive(Debug, Clone)]
pub enum Step {
    Snapshot(Vec<Value>),
    Fail,
}

fn unavailable(url: &str) -> FetchError {
    FetchError::Status {
        url: url.to_string(),
        status: StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Feed answering from fixed tables. Each game's play-by-play script is
/// consumed one step per call; the last step repeats forever.
#[derive(Default)]
pub struct ScriptedFeed {
    upcoming: Vec<String>,
    upcoming_fails: bool,
    team_stats: HashMap<String, Option<(String, String)>>,
    starts: HashMap<String, String>,
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    play_by_play_calls: Mutex<HashMap<String, usize>>,
    game_info_calls: Mutex<usize>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upcoming(mut self, ids: &[&str]) -> Self {
        self.upcoming = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.upcoming_fails = true;
        self
    }

    pub fn with_teams(mut self, game_id: &str, home: &str, away: &str) -> Self {
        self.team_stats.insert(
            game_id.to_string(),
            Some((home.to_string(), away.to_string())),
        );
        self
    }

    /// Team stats endpoint answers with an HTML page for this game.
    pub fn with_html_team_stats(mut self, game_id: &str) -> Self {
        self.team_stats.insert(game_id.to_string(), None);
        self
    }

    pub fn with_start(mut self, game_id: &str, start: &str) -> Self {
        self.starts.insert(game_id.to_string(), start.to_string());
        self
    }

    pub fn with_script(self, game_id: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .insert(game_id.to_string(), steps.into_iter().collect());
        self
    }

    pub fn play_by_play_calls(&self, game_id: &str) -> usize {
        self.play_by_play_calls
            .lock()
            .get(game_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn game_info_calls(&self) -> usize {
        *self.game_info_calls.lock()
    }
}

#[async_trait]
impl GameFeed for ScriptedFeed {
    async fn upcoming_live_games(&self) -> Result<Vec<UpcomingGame>, FetchError> {
        if self.upcoming_fails {
            return Err(unavailable("upcoming-live-games"));
        }
        Ok(self
            .upcoming
            .iter()
            .map(|id| UpcomingGame {
                game_uuid: Some(id.clone()),
            })
            .collect())
    }

    async fn team_stats(&self, game_uuid: &str) -> Result<TeamStats, FetchError> {
        match self.team_stats.get(game_uuid) {
            Some(Some((home, away))) => Ok(serde_json::from_value(json!({
                "home": {"teamCode": home},
                "away": {"teamCode": away},
            }))
            .unwrap_or_default()),
            Some(None) => Err(FetchError::ContentType {
                url: format!("team-stats/{}", game_uuid),
                content_type: "text/html".to_string(),
            }),
            None => Err(unavailable("team-stats")),
        }
    }

    async fn game_info(&self, game_uuid: &str) -> Result<GameInfo, FetchError> {
        *self.game_info_calls.lock() += 1;
        let body = match self.starts.get(game_uuid) {
            Some(start) => json!({"gameInfo": {"startDateTime": start}}),
            None => json!({"gameInfo": {}}),
        };
        Ok(serde_json::from_value(body).unwrap_or_default())
    }

    async fn play_by_play(&self, game_uuid: &str) -> Result<Vec<Value>, FetchError> {
        *self
            .play_by_play_calls
            .lock()
            .entry(game_uuid.to_string())
            .or_insert(0) += 1;

        let mut scripts = self.scripts.lock();
        let Some(steps) = scripts.get_mut(game_uuid) else {
            return Ok(Vec::new());
        };
        let step = if steps.len() > 1 {
            steps.pop_front()
        } else {
            steps.front().cloned()
        };
        match step {
            Some(Step::Snapshot(events)) => Ok(events),
            Some(Step::Fail) => Err(unavailable("play-by-play")),
            None => Ok(Vec::new()),
        }
    }
}

/// Records every message; can simulate a missing channel.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(u64, String)>>,
    attempts: Mutex<usize>,
    channel_missing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_channel() -> Self {
        Self {
            channel_missing: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn channels(&self) -> Vec<u64> {
        self.sent.lock().iter().map(|(c, _)| *c).collect()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, channel_id: u64, message: &str) -> Result<(), NotifyError> {
        *self.attempts.lock() += 1;
        if self.channel_missing {
            return Err(NotifyError::ChannelNotFound(channel_id));
        }
        self.sent.lock().push((channel_id, message.to_string()));
        Ok(())
    }
}

/// Snapshot store keeping only event counts; optionally always failing.
#[derive(Default)]
pub struct MemoryStore {
    saved: Mutex<Vec<(String, usize)>>,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Vec<(String, usize)> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn persist(&self, game_id: &str, snapshot: &[Value]) -> io::Result<()> {
        if self.failing {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        self.saved.lock().push((game_id.to_string(), snapshot.len()));
        Ok(())
    }
}
