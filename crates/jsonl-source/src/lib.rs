//! JSONL transport for oracle-sync
//!
//! Replays a file of JSON-encoded records (one per line) through the mutation
//! writer. Each record's line number is its reference; acknowledged line
//! numbers are checkpointed so an interrupted replay resumes after the last
//! committed line.

mod ack;
mod sync;

pub use ack::CheckpointCompletion;
pub use sync::{replay, sync, ReplaySummary, SourceOpts, SyncSummary, DEFAULT_CHECKPOINT_EVERY};
