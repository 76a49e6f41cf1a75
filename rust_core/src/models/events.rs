//! Play-by-play events.
//!
//! A snapshot is the full list of events the upstream API knows for one game,
//! newest first. Events are decoded one at a time so a single malformed entry
//! only costs that entry.

use super::{lenient, team_code, TeamRef};
use crate::error::ParseError;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// `gameState` labels that mark a finished game.
pub const TERMINAL_GAME_STATES: [&str; 3] = ["GameEnded", "GameOver", "Final"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(default, deserialize_with = "lenient")]
    event_id: Option<i64>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    event_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    game_state: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    period: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    home_goals: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    away_goals: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    event_team: Option<TeamRef>,
    #[serde(default, deserialize_with = "lenient")]
    home_team: Option<TeamRef>,
    #[serde(default, deserialize_with = "lenient")]
    away_team: Option<TeamRef>,
    #[serde(default, deserialize_with = "lenient")]
    offence: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    finished: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    finished_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    real_world_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    started_at: Option<String>,
}

/// Period boundary payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodMarker {
    pub finished: bool,
    pub finished_at: Option<String>,
    pub real_world_time: Option<String>,
    pub started_at: Option<String>,
}

impl PeriodMarker {
    /// First non-empty timestamp among `finishedAt`, `realWorldTime`, `startedAt`.
    pub fn completion_timestamp(&self) -> Option<&str> {
        [&self.finished_at, &self.real_world_time, &self.started_at]
            .into_iter()
            .filter_map(|ts| ts.as_deref())
            .find(|ts| !ts.is_empty())
    }
}

/// Closed set of event kinds the tracker reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Goal,
    Penalty { offence: Option<String> },
    Period(PeriodMarker),
    /// Any other tag (shots, faceoffs, timeouts, ...), kept for logging.
    Other(Option<String>),
}

/// Identity of a finished period: period events carry no `eventId`.
///
/// Without any timestamp the key degrades to the period number alone, which
/// cannot tell two finished periods sharing a number apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodKey {
    pub period: i64,
    pub completed_at: Option<String>,
}

/// One decoded play-by-play event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayEvent {
    pub event_id: Option<i64>,
    pub period: Option<i64>,
    pub time: Option<String>,
    pub game_state: Option<String>,
    /// Team code of the team the event belongs to (scorer, penalized side).
    pub event_team: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_goals: Option<i64>,
    pub away_goals: Option<i64>,
    pub kind: EventKind,
}

impl PlayEvent {
    pub fn from_value(value: &Value) -> Result<Self, ParseError> {
        if !value.is_object() {
            return Err(ParseError::NotAnObject);
        }
        let raw = RawEvent::deserialize(value)?;

        let kind = match raw.event_type.as_deref() {
            Some("goal") => EventKind::Goal,
            Some("penalty") => EventKind::Penalty {
                offence: raw.offence,
            },
            Some("period") => EventKind::Period(PeriodMarker {
                finished: raw.finished == Some(true),
                finished_at: raw.finished_at,
                real_world_time: raw.real_world_time,
                started_at: raw.started_at,
            }),
            _ => EventKind::Other(raw.event_type),
        };

        Ok(Self {
            event_id: raw.event_id,
            period: raw.period,
            time: raw.time,
            game_state: raw.game_state,
            event_team: team_code(raw.event_team),
            home_team: team_code(raw.home_team),
            away_team: team_code(raw.away_team),
            home_goals: raw.home_goals,
            away_goals: raw.away_goals,
            kind,
        })
    }

    /// Whether the game state on this event is one of the terminal labels.
    pub fn is_terminal(&self) -> bool {
        self.game_state
            .as_deref()
            .map(|state| TERMINAL_GAME_STATES.contains(&state))
            .unwrap_or(false)
    }

    pub fn is_finished_period(&self) -> bool {
        matches!(&self.kind, EventKind::Period(marker) if marker.finished)
    }

    /// Key for a finished period event, `None` for everything else or when
    /// the period number is missing.
    pub fn period_key(&self) -> Option<PeriodKey> {
        let EventKind::Period(marker) = &self.kind else {
            return None;
        };
        if !marker.finished {
            return None;
        }
        Some(PeriodKey {
            period: self.period?,
            completed_at: marker.completion_timestamp().map(str::to_string),
        })
    }

    /// Home and away team codes, when the event carries both.
    pub fn teams(&self) -> Option<(&str, &str)> {
        match (self.home_team.as_deref(), self.away_team.as_deref()) {
            (Some(home), Some(away)) => Some((home, away)),
            _ => None,
        }
    }

    /// "HOME vs AWAY"
    pub fn matchup(&self) -> Option<String> {
        self.teams().map(|(home, away)| format!("{} vs {}", home, away))
    }

    /// "H-A" when both goal counts are present.
    pub fn score(&self) -> Option<String> {
        match (self.home_goals, self.away_goals) {
            (Some(home), Some(away)) => Some(format!("{}-{}", home, away)),
            _ => None,
        }
    }
}

/// Decode a raw snapshot, dropping (and logging) entries that are not events.
/// Order is preserved, so index 0 is still the newest decodable event.
pub fn decode_snapshot(game_id: &str, raw: &[Value]) -> Vec<PlayEvent> {
    raw.iter()
        .enumerate()
        .filter_map(|(index, value)| match PlayEvent::from_value(value) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping event #{} for game {}: {}", index, game_id, e);
                None
            }
        })
        .collect()
}
