//! Game lifecycle signals.
//!
//! Three one-shot signals per game (start, period end, game over), each gated
//! by a flag in `GameTrackingState`. `process_snapshot` runs one polling cycle
//! worth of decisions and returns the notifications in dispatch order.

use crate::dedup::{extract_new_events, NewEvents};
use crate::formatters::Notification;
use crate::state::GameTrackingState;
use puckwatch_rust_core::models::{EventKind, PlayEvent};

/// Result of one polling cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    /// In dispatch order: start, id-keyed events, period ends, game over.
    pub notifications: Vec<Notification>,
    pub new_events: NewEvents,
    /// Set once the game-over signal has fired; the poll loop stops.
    pub game_over: bool,
}

/// Fires once, on the first snapshot holding any id-keyed event.
pub fn check_game_start(
    state: &mut GameTrackingState,
    snapshot: &[PlayEvent],
) -> Option<Notification> {
    if state.start_announced || !snapshot.iter().any(|e| e.event_id.is_some()) {
        return None;
    }
    state.start_announced = true;
    Some(Notification::GameStarted {
        matchup: snapshot.iter().find_map(PlayEvent::matchup),
    })
}

/// The newest event (`snapshot[0]`) carries a terminal game state.
pub fn is_game_over(snapshot: &[PlayEvent]) -> bool {
    snapshot.first().is_some_and(PlayEvent::is_terminal)
}

/// Fires once, when the newest event reports a terminal state.
pub fn check_game_over(
    state: &mut GameTrackingState,
    snapshot: &[PlayEvent],
) -> Option<Notification> {
    if state.game_over_announced || !is_game_over(snapshot) {
        return None;
    }
    state.game_over_announced = true;

    let teams = snapshot
        .iter()
        .find_map(|e| e.teams())
        .map(|(home, away)| (home.to_string(), away.to_string()));
    let score = snapshot.iter().find_map(PlayEvent::score);
    Some(Notification::GameOver { teams, score })
}

/// Notification for a new id-keyed event, if its kind is announced at all.
pub fn announcement_for(event: &PlayEvent) -> Option<Notification> {
    match &event.kind {
        EventKind::Goal => Some(Notification::Goal {
            matchup: event.matchup(),
            team: event.event_team.clone(),
            period: event.period,
            time: event.time.clone(),
            score: event.score(),
        }),
        EventKind::Penalty { offence } => Some(Notification::Penalty {
            matchup: event.matchup(),
            team: event.event_team.clone(),
            period: event.period,
            time: event.time.clone(),
            offence: offence.clone(),
        }),
        // Keyed period ends are announced through the period-key path.
        EventKind::Period(marker) if marker.finished && event.period_key().is_none() => {
            Some(period_end_for(event))
        }
        EventKind::Period(_) | EventKind::Other(_) => None,
    }
}

pub fn period_end_for(event: &PlayEvent) -> Notification {
    Notification::PeriodEnd {
        matchup: event.matchup(),
        period: event.period,
    }
}

/// Run every lifecycle decision for one fetched snapshot.
pub fn process_snapshot(state: &mut GameTrackingState, snapshot: &[PlayEvent]) -> CycleOutcome {
    let mut notifications = Vec::new();

    if let Some(started) = check_game_start(state, snapshot) {
        notifications.push(started);
    }

    let new_events = extract_new_events(state, snapshot);
    notifications.extend(new_events.id_keyed.iter().filter_map(announcement_for));
    notifications.extend(new_events.period_ends.iter().map(period_end_for));

    if let Some(over) = check_game_over(state, snapshot) {
        notifications.push(over);
    }

    CycleOutcome {
        notifications,
        new_events,
        game_over: state.game_over_announced,
    }
}
