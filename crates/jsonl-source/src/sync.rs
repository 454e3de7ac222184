//! JSONL replay into the mutation writer

use anyhow::{Context, Result};
use checkpoint::CheckpointStore;
use mutation_types::Record;
use mutation_writer::{StatsSnapshot, Writer, WriterConfig, WriterError};
use sql_sink::SqlSink;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::ack::CheckpointCompletion;

/// Default number of acknowledgments between checkpoint writes
pub const DEFAULT_CHECKPOINT_EVERY: u64 = 1000;

/// JSONL source options
#[derive(Clone, Debug)]
pub struct SourceOpts {
    /// File holding one JSON-encoded record per line
    pub path: PathBuf,
    /// Acknowledgments between checkpoint writes
    pub checkpoint_every: u64,
}

impl SourceOpts {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
        }
    }
}

/// Line counts of one replay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Non-empty lines handed to the writer
    pub accepted: u64,
    /// Lines at or before the resume position
    pub skipped: u64,
    /// Lines rejected by the writer (declared key absent)
    pub rejected: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub replay: ReplaySummary,
    pub writer: StatsSnapshot,
    /// Last checkpointed line
    pub checkpoint: Option<u64>,
}

/// Submit every record in `reader` after line `skip_through`, using its
/// 1-based line number as the reference.
///
/// A record whose declared primary key is absent is logged and skipped.
/// Malformed JSON stops the replay.
pub async fn replay<R: AsyncBufRead + Unpin>(
    writer: &Writer<u64>,
    reader: R,
    source_name: &str,
    skip_through: u64,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    replay_into(writer, reader, source_name, skip_through, &mut summary).await?;
    Ok(summary)
}

/// Like [`replay`], counting into `summary` as lines are handled so the
/// counts survive the future being dropped.
async fn replay_into<R: AsyncBufRead + Unpin>(
    writer: &Writer<u64>,
    reader: R,
    source_name: &str,
    skip_through: u64,
    summary: &mut ReplaySummary,
) -> Result<()> {
    let mut lines = reader.lines();
    let mut line_no: u64 = 0;

    while let Some(line) = lines
        .next_line()
        .await
        .with_context(|| format!("Failed to read {source_name}"))?
    {
        line_no += 1;
        if line_no <= skip_through {
            summary.skipped += 1;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let record = Record::from_json(&line)
            .with_context(|| format!("Error parsing record at {source_name}:{line_no}"))?;

        match writer.submit(line_no, record).await {
            Ok(()) => summary.accepted += 1,
            Err(e @ WriterError::MissingPrimaryKey { .. }) => {
                tracing::warn!("Skipping {source_name}:{line_no}: {e}");
                summary.rejected += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to submit {source_name}:{line_no}"))
            }
        }
    }

    Ok(())
}

/// Replay a JSONL file through a writer pipeline over `sink`, resuming after
/// the checkpoint held in `store` and checkpointing acknowledged lines.
///
/// Cancelling `cancel` stops reading and abandons any chunk that is waiting
/// to retry. The checkpoint always reflects only committed lines.
pub async fn sync<S, C>(
    opts: &SourceOpts,
    writer_config: WriterConfig,
    sink: S,
    store: C,
    cancel: CancellationToken,
) -> Result<SyncSummary>
where
    S: SqlSink + 'static,
    C: CheckpointStore + 'static,
{
    let source_name = opts.path.display().to_string();
    tracing::info!("Processing JSONL from: {source_name}");

    let resume_from = store
        .read_checkpoint(&source_name)
        .await
        .with_context(|| format!("Failed to read checkpoint for {source_name}"))?
        .map(|checkpoint| checkpoint.position);
    if let Some(position) = resume_from {
        tracing::info!("Resuming {source_name} after line {position}");
    }

    let file = tokio::fs::File::open(&opts.path)
        .await
        .with_context(|| format!("Failed to open JSONL source: {source_name}"))?;

    let completion = Arc::new(CheckpointCompletion::new(
        source_name.clone(),
        store,
        opts.checkpoint_every,
        resume_from,
    ));
    let (writer, pipeline) = Writer::spawn(writer_config, sink, Arc::clone(&completion))?;

    let watcher = {
        let cancel = cancel.clone();
        let pipeline_cancel = pipeline.cancellation_token();
        tokio::spawn(async move {
            cancel.cancelled().await;
            pipeline_cancel.cancel();
        })
    };

    let mut summary = ReplaySummary::default();
    let replayed = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::info!("Shutdown requested; stopping replay of {source_name}");
            Ok(())
        }
        result = replay_into(
            &writer,
            BufReader::new(file),
            &source_name,
            resume_from.unwrap_or(0),
            &mut summary,
        ) => result,
    };

    drop(writer);
    let stats = pipeline.join().await;
    watcher.abort();

    completion
        .flush()
        .await
        .with_context(|| format!("Failed to store checkpoint for {source_name}"))?;

    replayed?;
    tracing::info!(
        "Completed {source_name}: {} records accepted, {} skipped, {} rejected, {} applied in {} transactions",
        summary.accepted,
        summary.skipped,
        summary.rejected,
        stats.applied,
        stats.chunks
    );

    Ok(SyncSummary {
        replay: summary,
        writer: stats,
        checkpoint: completion.last_acknowledged(),
    })
}
