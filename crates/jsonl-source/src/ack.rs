//! Checkpointing completion sink.

use checkpoint::{CheckpointStore, CommitCheckpoint};
use mutation_writer::{Command, CompletionSink};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Records the line number of every acknowledged command and persists the
/// latest one every `every` acknowledgments and on [`flush`](Self::flush).
///
/// Acknowledgments arrive in submission order, so the latest one is the
/// resume position.
pub struct CheckpointCompletion<S> {
    source: String,
    store: S,
    every: u64,
    last: AtomicU64,
    pending: AtomicU64,
    flushing: Mutex<()>,
}

impl<S: CheckpointStore> CheckpointCompletion<S> {
    /// `resume_from` is the position already checkpointed, if any.
    pub fn new(source: impl Into<String>, store: S, every: u64, resume_from: Option<u64>) -> Self {
        Self {
            source: source.into(),
            store,
            every: every.max(1),
            last: AtomicU64::new(resume_from.unwrap_or(0)),
            pending: AtomicU64::new(0),
            flushing: Mutex::new(()),
        }
    }

    /// Latest acknowledged line, or the resume position if nothing has been
    /// acknowledged yet.
    pub fn last_acknowledged(&self) -> Option<u64> {
        match self.last.load(Ordering::SeqCst) {
            0 => None,
            position => Some(position),
        }
    }

    /// Persist the latest acknowledged position if it has not been stored.
    pub async fn flush(&self) -> anyhow::Result<()> {
        let _guard = self.flushing.lock().await;
        let pending = self.pending.swap(0, Ordering::SeqCst);
        if pending == 0 {
            return Ok(());
        }

        let position = self.last.load(Ordering::SeqCst);
        let checkpoint = CommitCheckpoint::new(self.source.clone(), position);
        if let Err(e) = self.store.store_checkpoint(&checkpoint).await {
            self.pending.fetch_add(pending, Ordering::SeqCst);
            return Err(e);
        }
        tracing::debug!("Checkpointed {} at line {position}", self.source);
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: CheckpointStore> CompletionSink<u64> for CheckpointCompletion<S> {
    async fn on_completed(&self, command: Command<u64>) {
        self.last.store(command.reference, Ordering::SeqCst);
        let pending = self.pending.fetch_add(1, Ordering::SeqCst) + 1;
        if pending >= self.every {
            if let Err(e) = self.flush().await {
                tracing::warn!("Failed to store checkpoint for {}: {e:#}", self.source);
            }
        }
    }
}
