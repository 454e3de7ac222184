use thiserror::Error;

/// Failure of one transaction attempt.
///
/// Every variant means the transaction was rolled back (or never opened) and
/// the database state is unchanged.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Executing the statement at `index` failed.
    #[error("Statement {index} failed: {source:#}")]
    Statement {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    /// Opening the session, committing or rolling back failed.
    #[error("Transaction failed: {0:#}")]
    Transaction(#[source] anyhow::Error),
}

impl SinkError {
    /// Index of the failing statement, when the failure is statement-level.
    pub fn statement_index(&self) -> Option<usize> {
        match self {
            SinkError::Statement { index, .. } => Some(*index),
            SinkError::Transaction(_) => None,
        }
    }
}
