//! Oracle backend for the mutation writer.
//!
//! [`oracle_connect`] builds a session pool from [`OracleOpts`] and returns an
//! [`OracleSink`], which executes each chunk's statements in a single
//! transaction. Every session has its date and timestamp formats pinned
//! (see [`SESSION_SETUP`]) before it carries any mutation.

mod bind;
mod connect;
mod error;
mod opts;
mod sink_impl;

pub use bind::BindValue;
pub use connect::{oracle_connect, oracle_connect_with_retries};
pub use error::OracleSinkError;
pub use opts::{DatabaseName, OracleOpts, DEFAULT_POOL_MAX, DEFAULT_POOL_MIN, DEFAULT_PORT};
pub use sink_impl::{OracleSink, SESSION_SETUP};
