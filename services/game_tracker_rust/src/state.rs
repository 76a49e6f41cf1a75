use puckwatch_rust_core::models::PeriodKey;
use std::collections::HashSet;

/// Per-game progress, owned by the game's poll task and dropped with it.
#[derive(Debug, Clone, Default)]
pub struct GameTrackingState {
    /// Highest `eventId` already handled; `None` until the first snapshot
    /// containing an id-keyed event.
    pub(crate) high_watermark: Option<i64>,
    /// Finished periods already handled; `None` until the first snapshot.
    pub(crate) seen_period_keys: Option<HashSet<PeriodKey>>,
    pub(crate) start_announced: bool,
    pub(crate) game_over_announced: bool,
}

impl GameTrackingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn high_watermark(&self) -> Option<i64> {
        self.high_watermark
    }

    pub fn has_seen_period(&self, key: &PeriodKey) -> bool {
        self.seen_period_keys
            .as_ref()
            .map(|seen| seen.contains(key))
            .unwrap_or(false)
    }

    pub fn start_announced(&self) -> bool {
        self.start_announced
    }

    pub fn game_over_announced(&self) -> bool {
        self.game_over_announced
    }
}
