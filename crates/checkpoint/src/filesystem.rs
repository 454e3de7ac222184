//! Filesystem-based checkpoint storage implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::store::{CheckpointStore, CommitCheckpoint};

/// Filesystem implementation of CheckpointStore trait.
///
/// Stores one JSON file per source in a directory. Files are replaced
/// atomically (write to a temporary file, then rename).
pub struct FilesystemStore {
    dir: PathBuf,
}

impl FilesystemStore {
    /// Create a new FilesystemStore with the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the directory path.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the checkpoint file for `source`.
    pub fn path_for(&self, source: &str) -> PathBuf {
        let name: String = source
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("checkpoint_{name}.json"))
    }
}

#[async_trait]
impl CheckpointStore for FilesystemStore {
    async fn store_checkpoint(&self, checkpoint: &CommitCheckpoint) -> Result<()> {
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create checkpoint directory {}", self.dir.display())
        })?;

        let path = self.path_for(&checkpoint.source);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(checkpoint)?)?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace checkpoint {}", path.display()))?;

        tracing::debug!(
            "Stored checkpoint {} for {} to {}",
            checkpoint.position,
            checkpoint.source,
            path.display()
        );
        Ok(())
    }

    async fn read_checkpoint(&self, source: &str) -> Result<Option<CommitCheckpoint>> {
        let path = self.path_for(source);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read checkpoint {}", path.display()))?;
        let checkpoint: CommitCheckpoint = serde_json::from_str(&content)
            .with_context(|| format!("Invalid checkpoint file {}", path.display()))?;
        Ok(Some(checkpoint))
    }
}
