//! Writer configuration.

use std::time::Duration;

use crate::backoff::BackoffPolicy;
use crate::error::{Result, WriterError};

/// Default mutation queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 2048;
/// Default maximum commands per chunk.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;
/// Default time a partially filled chunk may wait for more commands.
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_millis(50);
/// Default maximum commands coalesced into one merged statement.
pub const DEFAULT_MAX_MERGE_ROWS: usize = 100;
/// Oracle accepts at most this many expressions in an `IN` list.
pub const MAX_MERGE_ROWS_LIMIT: usize = 1000;

/// Configuration for the batched writer.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Capacity of the mutation queue. Producers wait when it is full.
    pub queue_capacity: usize,

    /// Maximum commands per chunk (count trigger).
    pub max_batch_size: usize,

    /// Maximum time between accepting the first command of a chunk and
    /// applying the chunk (time trigger).
    pub batch_timeout: Duration,

    /// Coalesce consecutive same-shape statements into multi-row statements.
    pub merge_statements: bool,

    /// Upper bound on commands per merged statement.
    pub max_merge_rows: usize,

    /// Delay between attempts of a failed chunk.
    pub backoff: BackoffPolicy,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
            merge_statements: false,
            max_merge_rows: DEFAULT_MAX_MERGE_ROWS,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl WriterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(WriterError::InvalidConfig(
                "queue_capacity must be greater than zero".to_string(),
            ));
        }
        if self.max_batch_size == 0 {
            return Err(WriterError::InvalidConfig(
                "max_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.batch_timeout.is_zero() {
            return Err(WriterError::InvalidConfig(
                "batch_timeout must be greater than zero".to_string(),
            ));
        }
        if self.merge_statements && self.max_merge_rows == 0 {
            return Err(WriterError::InvalidConfig(
                "max_merge_rows must be greater than zero when merging is enabled".to_string(),
            ));
        }
        if self.merge_statements && self.max_merge_rows > MAX_MERGE_ROWS_LIMIT {
            return Err(WriterError::InvalidConfig(format!(
                "max_merge_rows must not exceed {MAX_MERGE_ROWS_LIMIT}, got {}",
                self.max_merge_rows
            )));
        }
        let first_delay = match &self.backoff {
            BackoffPolicy::Fixed(delay) => *delay,
            BackoffPolicy::Exponential { initial, .. } => *initial,
        };
        if first_delay.is_zero() {
            return Err(WriterError::InvalidConfig(
                "retry backoff delay must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
