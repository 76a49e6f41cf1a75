//! Raw snapshot persistence (play-by-play logging).

use async_trait::async_trait;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const SNAPSHOT_FILE: &str = "play_by_play.json";

/// Write-only sink for raw snapshots. Nothing reads them back.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn persist(&self, game_id: &str, snapshot: &[Value]) -> io::Result<()>;
}

/// Keeps the latest snapshot of each game at `<root>/<game_id>/play_by_play.json`.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_path(&self, game_id: &str) -> io::Result<PathBuf> {
        let is_plain_segment = !game_id.is_empty()
            && game_id != "."
            && game_id != ".."
            && !game_id.contains(['/', '\\']);
        if !is_plain_segment {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("game id {:?} is not usable as a directory name", game_id),
            ));
        }
        Ok(self.root.join(game_id).join(SNAPSHOT_FILE))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn persist(&self, game_id: &str, snapshot: &[Value]) -> io::Result<()> {
        let path = self.snapshot_path(game_id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec_pretty(snapshot)?;
        tokio::fs::write(&path, content).await?;

        debug!("Saved {} events for game {} to {:?}", snapshot.len(), game_id, path);
        Ok(())
    }
}
