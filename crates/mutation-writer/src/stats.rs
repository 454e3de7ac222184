//! Pipeline counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters shared by producers and the applier task.
#[derive(Debug, Default)]
pub struct WriterStats {
    submitted: AtomicU64,
    dropped: AtomicU64,
    applied: AtomicU64,
    chunks: AtomicU64,
    statements: AtomicU64,
    retries: AtomicU64,
}

/// Point-in-time copy of [`WriterStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Commands enqueued.
    pub submitted: u64,
    /// Records intentionally discarded at compile time.
    pub dropped: u64,
    /// Commands committed and acknowledged.
    pub applied: u64,
    /// Chunk transactions committed.
    pub chunks: u64,
    /// Statements executed by committed transactions.
    pub statements: u64,
    /// Failed transaction attempts.
    pub retries: u64,
}

impl WriterStats {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self, commands: usize, statements: usize) {
        self.chunks.fetch_add(1, Ordering::Relaxed);
        self.applied.fetch_add(commands as u64, Ordering::Relaxed);
        self.statements.fetch_add(statements as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            chunks: self.chunks.load(Ordering::Relaxed),
            statements: self.statements.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }
}
