//! Outbound chat seam.

use crate::error::NotifyError;
use async_trait::async_trait;

/// Delivers rendered text to a chat channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel_id: u64, message: &str) -> Result<(), NotifyError>;
}
