//! The writer handle and its single applier pipeline.

use mutation_types::Record;
use sql_sink::SqlSink;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::applier::{ApplyOutcome, BatchApplier};
use crate::batcher::{Batcher, Fill};
use crate::compiler::{compile, Compiled};
use crate::completion::CompletionSink;
use crate::config::WriterConfig;
use crate::error::Result;
use crate::merge::MergeOptions;
use crate::queue::{mutation_queue, QueueSender};
use crate::stats::{StatsSnapshot, WriterStats};
use crate::Command;

/// Producer-side handle: compiles records and enqueues them.
///
/// Cheap to clone; every upstream delivery context may hold its own clone.
/// The pipeline drains and stops once every clone has been dropped.
pub struct Writer<R> {
    queue: QueueSender<R>,
    stats: Arc<WriterStats>,
}

impl<R> Clone for Writer<R> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

/// Owner-side handle of the running pipeline task.
pub struct Pipeline {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    stats: Arc<WriterStats>,
}

impl<R: Send + 'static> Writer<R> {
    /// Start the pipeline on the current tokio runtime.
    pub fn spawn<S, C>(config: WriterConfig, sink: S, completion: C) -> Result<(Self, Pipeline)>
    where
        S: SqlSink + 'static,
        C: CompletionSink<R> + 'static,
    {
        config.validate()?;

        let stats = Arc::new(WriterStats::default());
        let (tx, rx) = mutation_queue(config.queue_capacity);
        let batcher = Batcher::new(rx, config.max_batch_size, config.batch_timeout);
        let merge = MergeOptions {
            enabled: config.merge_statements,
            max_rows: config.max_merge_rows,
        };
        let applier = BatchApplier::new(
            sink,
            completion,
            config.backoff.clone(),
            merge,
            Arc::clone(&stats),
        );
        let cancel = CancellationToken::new();

        info!(
            "Starting writer pipeline (queue capacity {}, batch size {}, batch timeout {:?}, merge {})",
            config.queue_capacity, config.max_batch_size, config.batch_timeout, config.merge_statements
        );
        let task = tokio::spawn(run_pipeline(
            batcher,
            applier,
            config.max_batch_size,
            cancel.clone(),
        ));

        let writer = Writer {
            queue: tx,
            stats: Arc::clone(&stats),
        };
        let pipeline = Pipeline {
            cancel,
            task,
            stats,
        };
        Ok((writer, pipeline))
    }
}

impl<R> Writer<R> {
    /// Compile `record` and enqueue it, waiting while the queue is full.
    ///
    /// Returns once the command is queued, not once it is applied; the
    /// completion sink reports application. Records that compile to nothing
    /// (keyless deletes and updates) are accepted and never acknowledged.
    pub async fn submit(&self, reference: R, record: Record) -> Result<()> {
        let compiled = match compile(&record)? {
            Compiled::Statement(compiled) => compiled,
            Compiled::Skipped(reason) => {
                debug!("Dropping {} on {}: {reason}", record.method, record.table);
                self.stats.record_dropped();
                return Ok(());
            }
        };

        self.queue
            .enqueue(Command::new(reference, record, compiled))
            .await?;
        self.stats.record_submitted();
        Ok(())
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Pipeline {
    /// Token that stops the pipeline when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Wait for the pipeline to finish and return its final counters. It
    /// finishes after every [`Writer`] clone is dropped and the queue is
    /// drained, or after cancellation.
    pub async fn join(self) -> StatsSnapshot {
        if let Err(e) = self.task.await {
            warn!("Writer pipeline task ended abnormally: {e}");
        }
        self.stats.snapshot()
    }

    /// Stop the pipeline. A chunk that is mid-transaction finishes; a chunk
    /// waiting to retry is abandoned without acknowledgment.
    pub async fn shutdown(self) -> StatsSnapshot {
        self.cancel.cancel();
        self.join().await
    }
}

async fn run_pipeline<R, S, C>(
    mut batcher: Batcher<R>,
    applier: BatchApplier<S, C>,
    max_batch_size: usize,
    cancel: CancellationToken,
) where
    S: SqlSink,
    C: CompletionSink<R>,
{
    let mut chunk = Vec::with_capacity(max_batch_size);
    loop {
        let fill = batcher.fill(&mut chunk, &cancel).await;
        if fill == Fill::Cancelled {
            break;
        }

        if !chunk.is_empty() && applier.apply(&mut chunk, &cancel).await == ApplyOutcome::Cancelled {
            break;
        }

        if fill == Fill::Closed {
            break;
        }
    }
    info!("Writer pipeline stopped");
}
