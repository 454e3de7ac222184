//! A sink that logs statements instead of executing them.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{SinkError, SqlSink, SqlStatement};

/// Logs every statement at info level and reports success.
#[derive(Debug, Default)]
pub struct DryRunSink {
    transactions: AtomicU64,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transactions "applied" so far.
    pub fn transactions(&self) -> u64 {
        self.transactions.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SqlSink for DryRunSink {
    async fn execute_transaction(&self, statements: &[SqlStatement]) -> Result<(), SinkError> {
        let n = self.transactions.fetch_add(1, Ordering::SeqCst) + 1;
        for statement in statements {
            tracing::info!("[dry-run] tx {n}: {statement}");
        }
        Ok(())
    }
}
