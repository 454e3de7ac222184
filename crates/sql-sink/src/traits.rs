//! SqlSink trait definition.

use std::sync::Arc;

use crate::{SinkError, SqlStatement};

/// Trait for applying statements to the target database.
///
/// An implementation opens one transaction, executes `statements` in order,
/// and commits. If any statement or the commit fails it must roll back before
/// returning the error, so that retrying the identical statement list is safe.
///
/// # Usage Pattern
///
/// The writer is generic over the sink:
///
/// ```ignore
/// let (writer, pipeline) = Writer::spawn(config, oracle_connect(&opts).await?, completion)?;
/// ```
#[async_trait::async_trait]
pub trait SqlSink: Send + Sync {
    /// Execute `statements` as one atomic transaction.
    async fn execute_transaction(&self, statements: &[SqlStatement]) -> Result<(), SinkError>;
}

#[async_trait::async_trait]
impl<S: SqlSink + ?Sized> SqlSink for Arc<S> {
    async fn execute_transaction(&self, statements: &[SqlStatement]) -> Result<(), SinkError> {
        (**self).execute_transaction(statements).await
    }
}
