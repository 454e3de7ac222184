//! Batched mutation writer.
//!
//! Turns schema-agnostic [`Record`](mutation_types::Record) mutations into
//! parameterized SQL and applies them through a [`SqlSink`](sql_sink::SqlSink):
//!
//! ```text
//! submit ──► compiler ──► bounded queue ──► batcher ──► applier ──► completion sink
//!  (many producers)                         (one task, one transaction at a time)
//! ```
//!
//! - Commands are applied in submission order, within and across chunks.
//! - A chunk is one transaction. Any failure rolls the whole chunk back and
//!   retries it after the configured backoff, forever.
//! - Each command is acknowledged exactly once per successful application,
//!   after its chunk commits.
//!
//! # Example
//!
//! ```rust,ignore
//! let (writer, pipeline) = Writer::spawn(WriterConfig::default(), sink, completions)?;
//! writer.submit(offset, record).await?;
//! drop(writer);
//! pipeline.join().await;
//! ```

mod applier;
mod batcher;
pub mod backoff;
mod command;
pub mod compiler;
mod completion;
pub mod config;
pub mod definition;
mod error;
pub mod merge;
mod queue;
mod stats;
mod writer;

pub use backoff::BackoffPolicy;
pub use command::Command;
pub use compiler::{compile, Compiled, CompiledStatement, SkipReason};
pub use completion::CompletionSink;
pub use config::WriterConfig;
pub use definition::{ColumnDef, RecordDefinition};
pub use error::{Result, WriterError};
pub use merge::{MergeOptions, StatementPlan};
pub use stats::{StatsSnapshot, WriterStats};
pub use writer::{Pipeline, Writer};
