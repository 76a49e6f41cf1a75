//! game_tracker_rust - live hockey game tracking and chat announcements
//!
//! Polls the play-by-play of every game the configured teams play, works out
//! which events are new since the last poll, and announces game start, goals,
//! penalties, period breaks and the final result.

pub mod config;
pub mod dedup;
pub mod discovery;
pub mod formatters;
pub mod lifecycle;
pub mod persistence;
pub mod state;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use config::{Config, TrackerConfig};
pub use discovery::GameDiscovery;
pub use formatters::Notification;
pub use persistence::{FileSnapshotStore, SnapshotStore};
pub use state::GameTrackingState;
pub use tracker::{GameTracker, ShutdownReport, Termination};
