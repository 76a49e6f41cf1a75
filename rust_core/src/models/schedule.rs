//! Discovery payloads: upcoming games, per-game team stats and game info.

use super::{lenient, team_code, TeamRef};
use crate::error::ParseError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// Entry of the upcoming/live games listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingGame {
    #[serde(default, deserialize_with = "lenient")]
    pub game_uuid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamStats {
    #[serde(default, deserialize_with = "lenient")]
    home: Option<TeamRef>,
    #[serde(default, deserialize_with = "lenient")]
    away: Option<TeamRef>,
}

impl TeamStats {
    pub fn home_code(&self) -> Option<String> {
        team_code(self.home.clone())
    }

    pub fn away_code(&self) -> Option<String> {
        team_code(self.away.clone())
    }

    /// Whether either side of the game is the given team.
    pub fn has_team(&self, code: &str) -> bool {
        [self.home_code(), self.away_code()]
            .iter()
            .any(|side| side.as_deref() == Some(code))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameInfoBody {
    #[serde(default, deserialize_with = "lenient")]
    start_date_time: Option<String>,
}

/// Game metadata; only the scheduled start is used.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    #[serde(default, deserialize_with = "lenient")]
    game_info: Option<GameInfoBody>,
}

impl GameInfo {
    pub fn start_date_time(&self) -> Option<&str> {
        self.game_info
            .as_ref()
            .and_then(|info| info.start_date_time.as_deref())
    }
}

/// Parse a scheduled start time.
///
/// Accepts RFC 3339 (`Z` or explicit offset). A timestamp without offset is
/// taken as UTC.
pub fn parse_start_time(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| ParseError::InvalidStartTime(raw.to_string()))
}
