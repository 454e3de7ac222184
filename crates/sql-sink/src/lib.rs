//! Transactional SQL sink abstraction.
//!
//! This crate defines the `SqlSink` trait that the mutation writer applies
//! chunks through. `oracle-sink` implements it for Oracle sessions; tests and
//! dry runs use the in-process implementations in [`dry_run`].
//!
//! Statements are plain named-parameter SQL text plus an ordered list of
//! `(binding name, value)` pairs, so the writer never depends on a driver.

pub mod dry_run;
mod error;
mod statement;
mod traits;

pub use dry_run::DryRunSink;
pub use error::SinkError;
pub use statement::SqlStatement;
pub use traits::SqlSink;
