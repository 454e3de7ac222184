//! Applies chunks as single transactions with unbounded retry.

use sql_sink::{SinkError, SqlSink};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff::BackoffPolicy;
use crate::completion::CompletionSink;
use crate::merge::{self, MergeOptions, StatementPlan};
use crate::stats::WriterStats;
use crate::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApplyOutcome {
    Committed,
    /// Shutdown was requested while waiting to retry; nothing was
    /// acknowledged.
    Cancelled,
}

pub(crate) struct BatchApplier<S, C> {
    sink: S,
    completion: C,
    backoff: BackoffPolicy,
    merge: MergeOptions,
    stats: Arc<WriterStats>,
}

impl<S: SqlSink, C> BatchApplier<S, C> {
    pub(crate) fn new(
        sink: S,
        completion: C,
        backoff: BackoffPolicy,
        merge: MergeOptions,
        stats: Arc<WriterStats>,
    ) -> Self {
        Self {
            sink,
            completion,
            backoff,
            merge,
            stats,
        }
    }

    /// Apply `chunk` in one transaction, retrying the whole chunk until it
    /// commits, then acknowledge every command in chunk order.
    ///
    /// On [`ApplyOutcome::Committed`] the chunk is left empty for reuse. On
    /// [`ApplyOutcome::Cancelled`] it is left untouched.
    pub(crate) async fn apply<R>(
        &self,
        chunk: &mut Vec<Command<R>>,
        cancel: &CancellationToken,
    ) -> ApplyOutcome
    where
        C: CompletionSink<R>,
    {
        let plan = merge::plan(chunk, self.merge);
        debug!(
            "Applying chunk of {} commands as {} statements",
            chunk.len(),
            plan.statements.len()
        );

        let mut attempt: u32 = 0;
        while let Err(e) = self.sink.execute_transaction(&plan.statements).await {
            attempt = attempt.saturating_add(1);
            self.stats.record_retry();

            let culprit = failing_command(chunk, &plan, &e);
            let delay = self.backoff.delay(attempt);
            warn!(
                "Chunk of {} commands failed (attempt {attempt}, at {culprit}): {e}. Rolling back and retrying in {delay:?}",
                chunk.len(),
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Shutdown requested; abandoning unacknowledged chunk of {} commands", chunk.len());
                    return ApplyOutcome::Cancelled;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        if attempt > 0 {
            info!("Chunk committed after {attempt} failed attempts");
        }
        self.stats.record_commit(chunk.len(), plan.statements.len());

        for command in chunk.drain(..) {
            self.completion.on_completed(command).await;
        }

        ApplyOutcome::Committed
    }
}

fn failing_command<R>(chunk: &[Command<R>], plan: &StatementPlan, error: &SinkError) -> String {
    error
        .statement_index()
        .and_then(|index| plan.first_command(index))
        .or(Some(0))
        .and_then(|position| chunk.get(position))
        .map(Command::describe)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::tests::insert_command;
    use sql_sink::SqlStatement;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Fails the first `failures` transactions, records committed ones.
    #[derive(Default)]
    struct FlakySink {
        failures: AtomicU32,
        committed: Mutex<Vec<Vec<SqlStatement>>>,
    }

    #[async_trait::async_trait]
    impl SqlSink for FlakySink {
        async fn execute_transaction(&self, statements: &[SqlStatement]) -> Result<(), SinkError> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(SinkError::Statement {
                    index: 0,
                    source: anyhow::anyhow!("ORA-03113: end-of-file on communication channel"),
                });
            }
            self.committed.lock().unwrap().push(statements.to_vec());
            Ok(())
        }
    }

    fn applier(
        failures: u32,
        backoff: BackoffPolicy,
    ) -> (
        BatchApplier<Arc<FlakySink>, mpsc::UnboundedSender<Command<u64>>>,
        Arc<FlakySink>,
        mpsc::UnboundedReceiver<Command<u64>>,
        Arc<WriterStats>,
    ) {
        let sink = Arc::new(FlakySink {
            failures: AtomicU32::new(failures),
            ..Default::default()
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let stats = Arc::new(WriterStats::default());
        let applier = BatchApplier::new(
            Arc::clone(&sink),
            tx,
            backoff,
            MergeOptions::disabled(),
            Arc::clone(&stats),
        );
        (applier, sink, rx, stats)
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_whole_chunk_until_commit() {
        let (applier, sink, mut acks, stats) =
            applier(3, BackoffPolicy::Fixed(Duration::from_millis(100)));
        let mut chunk = vec![insert_command(1, "T", 1), insert_command(2, "T", 2)];
        let expected: Vec<_> = chunk.iter().map(Command::statement).collect();

        let outcome = applier.apply(&mut chunk, &CancellationToken::new()).await;
        assert_eq!(outcome, ApplyOutcome::Committed);
        assert!(chunk.is_empty());

        let committed = sink.committed.lock().unwrap().clone();
        assert_eq!(committed, vec![expected]);
        assert_eq!(stats.snapshot().retries, 3);
        assert_eq!(stats.snapshot().applied, 2);

        assert_eq!(acks.recv().await.unwrap().reference, 1);
        assert_eq!(acks.recv().await.unwrap().reference, 2);
        assert!(acks.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_acknowledges_nothing() {
        let (applier, sink, mut acks, _stats) =
            applier(u32::MAX, BackoffPolicy::Fixed(Duration::from_secs(30)));
        let mut chunk = vec![insert_command(1, "T", 1)];
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(95)).await;
                cancel.cancel();
            })
        };

        let outcome = applier.apply(&mut chunk, &cancel).await;
        canceller.await.unwrap();

        assert_eq!(outcome, ApplyOutcome::Cancelled);
        assert_eq!(chunk.len(), 1);
        assert!(sink.committed.lock().unwrap().is_empty());
        assert!(acks.try_recv().is_err());
    }

    #[test]
    fn test_failing_command_description() {
        let chunk = vec![insert_command(1, "T", 1), insert_command(2, "T", 2)];
        let plan = merge::plan(&chunk, MergeOptions::disabled());
        let error = SinkError::Statement {
            index: 1,
            source: anyhow::anyhow!("boom"),
        };
        assert_eq!(failing_command(&chunk, &plan, &error), "insert T ID=2");

        let error = SinkError::Transaction(anyhow::anyhow!("commit failed"));
        assert_eq!(failing_command(&chunk, &plan, &error), "insert T ID=1");
    }
}
