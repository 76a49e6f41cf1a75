//! Per-game poll loops and the registry of running games.
//!
//! Each tracked game gets one tokio task which owns its `GameTrackingState`.
//! The registry only maps game id to task handle; a task removes its own
//! entry when it ends, whether it finished, returned early or was aborted.
//! Games that reached game over are remembered for the life of the tracker
//! and never polled again.

use crate::config::TrackerConfig;
use crate::formatters::{format_message, Notification};
use crate::lifecycle::process_snapshot;
use crate::persistence::SnapshotStore;
use crate::state::GameTrackingState;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use parking_lot::Mutex;
use puckwatch_rust_core::models::decode_snapshot;
use puckwatch_rust_core::{GameFeed, NotifyError, Notifier};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Registry = Arc<Mutex<HashMap<String, GameEntry>>>;

struct GameEntry {
    start_time: DateTime<Utc>,
    task: JoinHandle<()>,
}

/// How a poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    GameOver,
    Cancelled,
}

/// Outcome of `GameTracker::shutdown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Tasks that ran their cleanup within the timeout.
    pub drained: usize,
    /// Tasks still running at the deadline.
    pub aborted: usize,
}

/// Everything a poll task needs, cloned into it at spawn time.
#[derive(Clone)]
struct PollContext {
    feed: Arc<dyn GameFeed>,
    notifier: Arc<dyn Notifier>,
    store: Option<Arc<dyn SnapshotStore>>,
    config: TrackerConfig,
    games: Registry,
    finished: Arc<Mutex<HashSet<String>>>,
}

#[derive(Clone)]
pub struct GameTracker {
    ctx: PollContext,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl GameTracker {
    /// `store` is `None` when play-by-play logging is off.
    pub fn new(
        feed: Arc<dyn GameFeed>,
        notifier: Arc<dyn Notifier>,
        store: Option<Arc<dyn SnapshotStore>>,
        config: TrackerConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            ctx: PollContext {
                feed,
                notifier,
                store,
                config,
                games: Arc::new(Mutex::new(HashMap::new())),
                finished: Arc::new(Mutex::new(HashSet::new())),
            },
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    /// Start polling a game unless it is already tracked, already over, or
    /// shutdown began. Returns whether a new task was spawned.
    pub fn add_game(&self, game_id: &str, start_time: DateTime<Utc>) -> bool {
        let mut games = self.ctx.games.lock();
        if *self.shutdown_tx.borrow() {
            warn!("Shutting down, not tracking game {}", game_id);
            return false;
        }
        if games.contains_key(game_id) {
            debug!("Game already tracked: {}", game_id);
            return false;
        }
        if self.has_finished(game_id) {
            debug!("Game {} is already over", game_id);
            return false;
        }

        info!("Tracking game {} (starts {})", game_id, start_time);
        let task = tokio::spawn(monitor_game(
            self.ctx.clone(),
            game_id.to_string(),
            start_time,
            self.shutdown_tx.subscribe(),
        ));
        games.insert(game_id.to_string(), GameEntry { start_time, task });
        true
    }

    pub fn is_tracking(&self, game_id: &str) -> bool {
        self.ctx.games.lock().contains_key(game_id)
    }

    /// Whether the game's poll loop saw it end.
    pub fn has_finished(&self, game_id: &str) -> bool {
        self.ctx.finished.lock().contains(game_id)
    }

    /// Tracked games with their scheduled start, ordered by start time.
    pub fn tracked_games(&self) -> Vec<(String, DateTime<Utc>)> {
        let mut games: Vec<_> = self
            .ctx
            .games
            .lock()
            .iter()
            .map(|(id, entry)| (id.clone(), entry.start_time))
            .collect();
        games.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        games
    }

    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Cancel every poll task and wait up to `timeout` for them to clean up.
    /// Tasks still running after that are aborted.
    pub async fn shutdown(&self, timeout: Duration) -> ShutdownReport {
        self.shutdown_tx.send_replace(true);

        let entries: Vec<(String, GameEntry)> = self.ctx.games.lock().drain().collect();
        if entries.is_empty() {
            return ShutdownReport::default();
        }
        info!("Stopping {} game task(s)", entries.len());

        let abort_handles: Vec<_> = entries
            .iter()
            .map(|(_, entry)| entry.task.abort_handle())
            .collect();
        let total = abort_handles.len();
        let tasks = entries.into_iter().map(|(_, entry)| entry.task);

        if tokio::time::timeout(timeout, join_all(tasks)).await.is_ok() {
            return ShutdownReport {
                drained: total,
                aborted: 0,
            };
        }

        let mut aborted = 0;
        for handle in abort_handles {
            if !handle.is_finished() {
                handle.abort();
                aborted += 1;
            }
        }
        warn!(
            "{} game task(s) did not stop within {:?}, aborted",
            aborted, timeout
        );
        ShutdownReport {
            drained: total - aborted,
            aborted,
        }
    }
}

/// Removes the game's registry entry when the task ends, including on abort.
struct RegistryGuard {
    games: Registry,
    game_id: String,
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        self.games.lock().remove(&self.game_id);
    }
}

async fn monitor_game(
    ctx: PollContext,
    game_id: String,
    start_time: DateTime<Utc>,
    mut shutdown: watch::Receiver<bool>,
) {
    let _guard = RegistryGuard {
        games: ctx.games.clone(),
        game_id: game_id.clone(),
    };

    match run_game(&ctx, &game_id, start_time, &mut shutdown).await {
        Termination::GameOver => {
            // Recorded before the guard releases the registry entry.
            ctx.finished.lock().insert(game_id.clone());
            info!("Game {} is over, stopped tracking", game_id);
        }
        Termination::Cancelled => info!("Stopped tracking game {} (shutdown)", game_id),
    }
}

/// Scheduled, then polling until game over or cancellation.
async fn run_game(
    ctx: &PollContext,
    game_id: &str,
    start_time: DateTime<Utc>,
    shutdown: &mut watch::Receiver<bool>,
) -> Termination {
    if let Ok(wait) = (start_time - Utc::now()).to_std() {
        if !wait.is_zero() {
            info!("Game {} starts in {}s, waiting", game_id, wait.as_secs());
            if until_shutdown(tokio::time::sleep(wait), shutdown).await.is_none() {
                return Termination::Cancelled;
            }
        }
    }

    let mut state = GameTrackingState::new();
    loop {
        match until_shutdown(ctx.feed.play_by_play(game_id), shutdown).await {
            None => return Termination::Cancelled,
            Some(Err(e)) => warn!("Failed to fetch play-by-play for {}: {}", game_id, e),
            Some(Ok(raw)) => {
                if let Some(store) = &ctx.store {
                    match until_shutdown(store.persist(game_id, &raw), shutdown).await {
                        None => return Termination::Cancelled,
                        Some(Err(e)) => warn!("Failed to save play-by-play for {}: {}", game_id, e),
                        Some(Ok(())) => {}
                    }
                }

                let snapshot = decode_snapshot(game_id, &raw);
                let outcome = process_snapshot(&mut state, &snapshot);
                if !outcome.new_events.is_empty() {
                    info!("Game {}: {} new event(s)", game_id, outcome.new_events.len());
                }

                for notification in &outcome.notifications {
                    if until_shutdown(dispatch(ctx, game_id, notification), shutdown)
                        .await
                        .is_none()
                    {
                        return Termination::Cancelled;
                    }
                }

                if outcome.game_over {
                    return Termination::GameOver;
                }
            }
        }

        if until_shutdown(tokio::time::sleep(ctx.config.poll_interval), shutdown)
            .await
            .is_none()
        {
            return Termination::Cancelled;
        }
    }
}

async fn dispatch(ctx: &PollContext, game_id: &str, notification: &Notification) {
    let message = format_message(notification);
    match ctx.notifier.send(ctx.config.channel_id, &message).await {
        Ok(()) => info!("Game {}: sent {}: {}", game_id, notification.label(), message),
        Err(NotifyError::ChannelNotFound(channel_id)) => warn!(
            "Channel {} not found, dropping {} for game {}",
            channel_id,
            notification.label(),
            game_id
        ),
        Err(e) => warn!(
            "Failed to send {} for game {}: {}",
            notification.label(),
            game_id,
            e
        ),
    }
}

/// Run `fut` unless shutdown is signalled first; `None` means cancelled.
/// A dropped sender counts as shutdown.
pub(crate) async fn until_shutdown<F: Future>(
    fut: F,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<F::Output> {
    let stopped = async {
        let _ = shutdown.wait_for(|stopped| *stopped).await;
    };
    tokio::select! {
        biased;
        _ = stopped => None,
        out = fut => Some(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStore, RecordingNotifier, ScriptedFeed, Step};
    use chrono::Duration as ChronoDuration;
    use serde_json::json;

    const CHANNEL: u64 = 42;

    fn config() -> TrackerConfig {
        TrackerConfig {
            poll_interval: Duration::from_secs(60),
            channel_id: CHANNEL,
        }
    }

    fn tracker_with(
        feed: ScriptedFeed,
        notifier: RecordingNotifier,
        store: Option<Arc<MemoryStore>>,
    ) -> (GameTracker, Arc<ScriptedFeed>, Arc<RecordingNotifier>) {
        let feed = Arc::new(feed);
        let notifier = Arc::new(notifier);
        let tracker = GameTracker::new(
            feed.clone(),
            notifier.clone(),
            store.map(|s| s as Arc<dyn SnapshotStore>),
            config(),
        );
        (tracker, feed, notifier)
    }

    fn already_started() -> DateTime<Utc> {
        Utc::now() - ChronoDuration::minutes(5)
    }

    async fn advance(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_game_scenario() {
        let feed = ScriptedFeed::new().with_script(
            "g1",
            vec![
                Step::Snapshot(vec![json!({"eventId": 5, "type": "goal"})]),
                Step::Snapshot(vec![
                    json!({"eventId": 6, "type": "penalty", "offence": "HOOK",
                           "eventTeam": {"teamCode": "FBK"}}),
                    json!({"eventId": 5, "type": "goal"}),
                ]),
                Step::Snapshot(vec![
                    json!({"eventId": 7, "type": "other", "gameState": "GameEnded",
                           "homeTeam": {"teamCode": "VLH"}, "awayTeam": {"teamCode": "FBK"},
                           "homeGoals": 1, "awayGoals": 0}),
                    json!({"eventId": 6, "type": "penalty"}),
                    json!({"eventId": 5, "type": "goal"}),
                ]),
            ],
        );
        let (tracker, feed, notifier) = tracker_with(feed, RecordingNotifier::new(), None);

        assert!(tracker.add_game("g1", already_started()));
        advance(1).await;
        assert_eq!(notifier.messages(), vec!["Game started!"]);

        advance(60).await;
        assert_eq!(
            notifier.messages()[1..].to_vec(),
            vec!["Penalty - FBK - Hooking"]
        );

        advance(60).await;
        assert_eq!(notifier.messages().len(), 3);
        assert_eq!(notifier.messages()[2], "Match over - VLH 1-0 FBK");
        assert!(notifier.channels().iter().all(|c| *c == CHANNEL));

        // Loop ended: no further polls, registry entry gone.
        advance(600).await;
        assert!(!tracker.is_tracking("g1"));
        assert_eq!(feed.play_by_play_calls("g1"), 3);
        assert_eq!(notifier.messages().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_first_snapshot_ends_with_one_game_over() {
        let feed = ScriptedFeed::new().with_script(
            "g1",
            vec![Step::Snapshot(vec![
                json!({"eventId": 90, "gameState": "GameEnded"}),
            ])],
        );
        let (tracker, feed, notifier) = tracker_with(feed, RecordingNotifier::new(), None);

        tracker.add_game("g1", already_started());
        advance(300).await;

        assert_eq!(
            notifier.messages(),
            vec!["Game started!", "Match over - final score unknown"]
        );
        assert_eq!(feed.play_by_play_calls("g1"), 1);
        assert!(tracker.tracked_games().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_game_is_not_tracked_again() {
        let feed = ScriptedFeed::new().with_script(
            "g1",
            vec![Step::Snapshot(vec![json!({"eventId": 4, "gameState": "Final"})])],
        );
        let (tracker, feed, notifier) = tracker_with(feed, RecordingNotifier::new(), None);

        assert!(tracker.add_game("g1", already_started()));
        advance(1).await;
        assert!(tracker.has_finished("g1"));
        assert!(!tracker.is_tracking("g1"));

        assert!(!tracker.add_game("g1", already_started()));
        advance(600).await;
        assert_eq!(feed.play_by_play_calls("g1"), 1);
        assert_eq!(notifier.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_is_retried_next_interval() {
        let feed = ScriptedFeed::new().with_script(
            "g1",
            vec![
                Step::Fail,
                Step::Fail,
                Step::Snapshot(vec![json!({"eventId": 1, "type": "shot"})]),
            ],
        );
        let (tracker, feed, notifier) = tracker_with(feed, RecordingNotifier::new(), None);

        tracker.add_game("g1", already_started());
        advance(1).await;
        assert!(notifier.messages().is_empty());
        assert!(tracker.is_tracking("g1"));

        advance(120).await;
        assert_eq!(feed.play_by_play_calls("g1"), 3);
        assert_eq!(notifier.messages(), vec!["Game started!"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_scheduled_start() {
        let feed = ScriptedFeed::new()
            .with_script("g1", vec![Step::Snapshot(vec![json!({"eventId": 1})])]);
        let (tracker, feed, _notifier) = tracker_with(feed, RecordingNotifier::new(), None);

        tracker.add_game("g1", Utc::now() + ChronoDuration::minutes(30));
        advance(20 * 60).await;
        assert_eq!(feed.play_by_play_calls("g1"), 0);
        assert!(tracker.is_tracking("g1"));

        advance(11 * 60).await;
        assert!(feed.play_by_play_calls("g1") >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_add_is_ignored() {
        let (tracker, feed, _notifier) =
            tracker_with(ScriptedFeed::new(), RecordingNotifier::new(), None);

        assert!(tracker.add_game("g1", already_started()));
        assert!(!tracker.add_game("g1", already_started()));
        assert_eq!(tracker.tracked_games().len(), 1);

        advance(1).await;
        assert_eq!(feed.play_by_play_calls("g1"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_channel_does_not_stop_loop() {
        let feed = ScriptedFeed::new().with_script(
            "g1",
            vec![
                Step::Snapshot(vec![json!({"eventId": 1, "type": "shot"})]),
                Step::Snapshot(vec![json!({"eventId": 2, "gameState": "Final"})]),
            ],
        );
        let (tracker, feed, notifier) =
            tracker_with(feed, RecordingNotifier::with_missing_channel(), None);

        tracker.add_game("g1", already_started());
        advance(200).await;

        // Start and game over were attempted; both dropped.
        assert_eq!(notifier.attempts(), 2);
        assert!(notifier.messages().is_empty());
        assert_eq!(feed.play_by_play_calls("g1"), 2);
        assert!(!tracker.is_tracking("g1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshots_are_persisted_and_store_errors_ignored() {
        let feed = ScriptedFeed::new().with_script(
            "g1",
            vec![Step::Snapshot(vec![json!({"eventId": 1}), json!({"eventId": 2})])],
        );
        let store = Arc::new(MemoryStore::new());
        let (tracker, _feed, _notifier) =
            tracker_with(feed, RecordingNotifier::new(), Some(store.clone()));
        tracker.add_game("g1", already_started());
        advance(61).await;
        assert_eq!(store.saved(), vec![("g1".to_string(), 2), ("g1".to_string(), 2)]);

        let feed = ScriptedFeed::new()
            .with_script("g2", vec![Step::Snapshot(vec![json!({"eventId": 1})])]);
        let (tracker, _feed, notifier) = tracker_with(
            feed,
            RecordingNotifier::new(),
            Some(Arc::new(MemoryStore::failing())),
        );
        tracker.add_game("g2", already_started());
        advance(1).await;
        assert_eq!(notifier.messages(), vec!["Game started!"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_sleeping_tasks() {
        let feed = ScriptedFeed::new()
            .with_script("live", vec![Step::Snapshot(vec![json!({"eventId": 1})])]);
        let (tracker, feed, notifier) = tracker_with(feed, RecordingNotifier::new(), None);

        tracker.add_game("live", already_started());
        tracker.add_game("later", Utc::now() + ChronoDuration::hours(3));
        advance(1).await;
        assert_eq!(tracker.tracked_games().len(), 2);

        let report = tracker.shutdown(Duration::from_secs(10)).await;
        assert_eq!(
            report,
            ShutdownReport {
                drained: 2,
                aborted: 0
            }
        );
        assert!(tracker.tracked_games().is_empty());
        assert!(tracker.is_shutting_down());

        advance(600).await;
        assert_eq!(feed.play_by_play_calls("live"), 1);
        assert_eq!(feed.play_by_play_calls("later"), 0);
        assert_eq!(notifier.messages(), vec!["Game started!"]);

        assert!(!tracker.add_game("new", already_started()));
    }

    #[tokio::test]
    async fn test_until_shutdown_prefers_signal() {
        let (tx, mut rx) = watch::channel(false);
        assert_eq!(until_shutdown(async { 7 }, &mut rx).await, Some(7));

        tx.send_replace(true);
        assert_eq!(until_shutdown(async { 7 }, &mut rx).await, None);
    }
}
