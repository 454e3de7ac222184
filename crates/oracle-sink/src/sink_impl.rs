//! Implementation of SqlSink over an Oracle session pool.

use anyhow::anyhow;
use oracle::pool::Pool;
use oracle::Connection;
use sql_sink::{SinkError, SqlSink, SqlStatement};
use std::sync::{Arc, Mutex};

use crate::bind::Binds;

/// Statements run on every session before it is used for mutations.
pub const SESSION_SETUP: [&str; 2] = [
    "ALTER SESSION SET NLS_DATE_FORMAT = 'yyyy-mm-dd hh24:mi:ss'",
    "ALTER SESSION SET NLS_TIMESTAMP_FORMAT = 'yyyy-mm-dd hh24:mi:ss.ff'",
];

/// Pool-backed sink executing each chunk in one transaction.
///
/// A single session is held between transactions. After a failure it is
/// rolled back and handed back to the pool, and the next transaction takes
/// a freshly prepared one.
#[derive(Clone)]
pub struct OracleSink {
    inner: Arc<Inner>,
}

struct Inner {
    pool: Pool,
    session: Mutex<Option<Connection>>,
}

impl OracleSink {
    pub(crate) fn new(pool: Pool, session: Option<Connection>) -> Self {
        Self {
            inner: Arc::new(Inner {
                pool,
                session: Mutex::new(session),
            }),
        }
    }
}

/// Take a session from the pool and pin its date formats.
pub(crate) fn open_session(pool: &Pool) -> oracle::Result<Connection> {
    let conn = pool.get()?;
    for sql in SESSION_SETUP {
        conn.execute(sql, &[])?;
    }
    tracing::debug!("Prepared new Oracle session");
    Ok(conn)
}

fn run_transaction(conn: &Connection, statements: &[SqlStatement]) -> Result<(), SinkError> {
    for (index, statement) in statements.iter().enumerate() {
        tracing::trace!("Executing {statement}");
        let binds = Binds::new(&statement.binds);
        conn.execute_named(&statement.sql, &binds.named())
            .map_err(|e| SinkError::Statement {
                index,
                source: e.into(),
            })?;
    }
    conn.commit().map_err(|e| SinkError::Transaction(e.into()))
}

impl Inner {
    fn execute_blocking(&self, statements: &[SqlStatement]) -> Result<(), SinkError> {
        let mut slot = self
            .session
            .lock()
            .map_err(|_| SinkError::Transaction(anyhow!("session lock poisoned")))?;

        let conn = match slot.take() {
            Some(conn) => conn,
            None => open_session(&self.pool).map_err(|e| {
                SinkError::Transaction(anyhow::Error::new(e).context("failed to acquire session"))
            })?,
        };

        match run_transaction(&conn, statements) {
            Ok(()) => {
                *slot = Some(conn);
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = conn.rollback() {
                    tracing::warn!("Rollback failed, discarding session: {rollback}");
                }
                Err(e)
            }
        }
    }
}

#[async_trait::async_trait]
impl SqlSink for OracleSink {
    async fn execute_transaction(&self, statements: &[SqlStatement]) -> Result<(), SinkError> {
        let inner = Arc::clone(&self.inner);
        let statements = statements.to_vec();
        tokio::task::spawn_blocking(move || inner.execute_blocking(&statements))
            .await
            .map_err(|e| SinkError::Transaction(anyhow!("blocking database task failed: {e}")))?
    }
}
