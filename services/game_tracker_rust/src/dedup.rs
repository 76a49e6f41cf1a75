//! Event deduplication
//!
//! Every poll returns the whole play-by-play so far. This module picks out
//! the events that have not been handled yet for the game.
//!
//! Two identity schemes are in play:
//! - id-keyed: any event with an integer `eventId`; ids grow monotonically,
//!   so a high watermark is enough.
//! - period-keyed: finished period events, which carry no id; they are
//!   remembered by `PeriodKey`.
//!
//! The first snapshot seen for a game only seeds state. Whatever happened
//! before the game was discovered is treated as already known.

use crate::state::GameTrackingState;
use puckwatch_rust_core::models::{PeriodKey, PlayEvent};
use std::collections::HashSet;

/// New events found in one snapshot, each list in announcement order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEvents {
    /// Ascending by `eventId`.
    pub id_keyed: Vec<PlayEvent>,
    /// Ascending by period number.
    pub period_ends: Vec<PlayEvent>,
}

impl NewEvents {
    pub fn len(&self) -> usize {
        self.id_keyed.len() + self.period_ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn extract_new_events(state: &mut GameTrackingState, snapshot: &[PlayEvent]) -> NewEvents {
    NewEvents {
        id_keyed: extract_new_id_events(state, snapshot),
        period_ends: extract_new_period_events(state, snapshot),
    }
}

/// Id-keyed events above the high watermark.
pub fn extract_new_id_events(
    state: &mut GameTrackingState,
    snapshot: &[PlayEvent],
) -> Vec<PlayEvent> {
    let Some(max_id) = snapshot.iter().filter_map(|e| e.event_id).max() else {
        return Vec::new();
    };

    let Some(watermark) = state.high_watermark else {
        state.high_watermark = Some(max_id);
        return Vec::new();
    };

    let mut new_events: Vec<PlayEvent> = snapshot
        .iter()
        .filter(|e| e.event_id.is_some_and(|id| id > watermark))
        .cloned()
        .collect();
    new_events.sort_by_key(|e| e.event_id);
    new_events.dedup_by_key(|e| e.event_id);

    // Never move backwards, even if the snapshot shrank.
    state.high_watermark = Some(watermark.max(max_id));
    new_events
}

/// Finished period events whose key has not been seen.
pub fn extract_new_period_events(
    state: &mut GameTrackingState,
    snapshot: &[PlayEvent],
) -> Vec<PlayEvent> {
    let finished: Vec<(PeriodKey, &PlayEvent)> = snapshot
        .iter()
        .filter_map(|e| e.period_key().map(|key| (key, e)))
        .collect();

    if state.seen_period_keys.is_none() {
        state.seen_period_keys = Some(finished.into_iter().map(|(key, _)| key).collect());
        return Vec::new();
    }
    let seen = state.seen_period_keys.get_or_insert_with(HashSet::new);

    let mut new_events: Vec<PlayEvent> = finished
        .into_iter()
        .filter(|(key, _)| seen.insert(key.clone()))
        .map(|(_, event)| event.clone())
        .collect();
    new_events.sort_by_key(|e| e.period.unwrap_or(0));
    new_events
}
