//! Error taxonomy for upstream fetches, payload parsing and chat delivery.
//!
//! None of these are fatal to the tracker: a `FetchError` skips the current
//! cycle, a `ParseError` skips one game or event, a `NotifyError` drops one
//! message.

use thiserror::Error;

/// Failure to fetch a resource from the upstream API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("unexpected content type for {url}: {content_type}")]
    ContentType { url: String, content_type: String },

    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// True when the endpoint answered with something other than JSON.
    pub fn is_content_type(&self) -> bool {
        matches!(self, FetchError::ContentType { .. })
    }
}

/// Malformed upstream payload.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid play-by-play event: {0}")]
    InvalidEvent(#[from] serde_json::Error),

    #[error("play-by-play event is not an object")]
    NotAnObject,

    #[error("invalid start time {0:?}")]
    InvalidStartTime(String),
}

/// Failure to deliver a chat message.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("channel {0} not found")]
    ChannelNotFound(u64),

    #[error("chat request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("chat API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}
