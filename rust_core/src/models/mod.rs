// Shared models for the puckwatch services
//
// Upstream payloads are loosely typed: any field may be missing, null, or of
// an unexpected JSON type. Every field is decoded through `lenient`, so a bad
// field reads as absent instead of failing the whole record.

use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use serde_json::Value;

pub mod events;
pub mod schedule;

pub use events::{
    decode_snapshot, EventKind, PeriodKey, PeriodMarker, PlayEvent, TERMINAL_GAME_STATES,
};
pub use schedule::{parse_start_time, GameInfo, TeamStats, UpcomingGame};

/// Decode a field as `Some(T)` when it has the right shape, `None` otherwise.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// `teamCode` holder used by several payloads (`homeTeam`, `eventTeam`, ...).
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub(crate) struct TeamRef {
    #[serde(rename = "teamCode", default, deserialize_with = "lenient")]
    pub team_code: Option<String>,
}

pub(crate) fn team_code(team: Option<TeamRef>) -> Option<String> {
    team.and_then(|t| t.team_code)
}
