//! Checkpoint storage trait and types

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last upstream position whose mutation was committed and acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitCheckpoint {
    /// Upstream identifier (e.g. the JSONL file being replayed)
    pub source: String,
    /// Position of the last acknowledged record
    pub position: u64,
    /// Timestamp when the checkpoint was written
    pub committed_at: DateTime<Utc>,
}

impl CommitCheckpoint {
    pub fn new(source: impl Into<String>, position: u64) -> Self {
        Self {
            source: source.into(),
            position,
            committed_at: Utc::now(),
        }
    }
}

/// Trait for checkpoint storage operations.
///
/// One checkpoint is kept per source; storing replaces the previous one.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn store_checkpoint(&self, checkpoint: &CommitCheckpoint) -> Result<()>;

    /// Returns None if no checkpoint exists for `source`.
    async fn read_checkpoint(&self, source: &str) -> Result<Option<CommitCheckpoint>>;
}

/// Store that keeps nothing. Every run starts from the beginning.
pub struct NullStore;

#[async_trait]
impl CheckpointStore for NullStore {
    async fn store_checkpoint(&self, _checkpoint: &CommitCheckpoint) -> Result<()> {
        Ok(())
    }

    async fn read_checkpoint(&self, _source: &str) -> Result<Option<CommitCheckpoint>> {
        Ok(None)
    }
}
