//! Puckwatch Core - shared building blocks for the live hockey tracker.
//!
//! This crate provides:
//! - Wire models for the SHL gameday API (play-by-play events, game info, team stats)
//! - The `GameFeed` and `Notifier` seams the tracker depends on
//! - reqwest-backed clients for the SHL API and the Discord REST API
//! - The error taxonomy shared by all of the above

pub mod clients;
pub mod error;
pub mod models;
pub mod notify;
pub mod providers;

pub use error::{FetchError, NotifyError, ParseError};
pub use notify::Notifier;
pub use providers::GameFeed;
