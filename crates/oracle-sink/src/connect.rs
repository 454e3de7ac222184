use oracle::pool::PoolBuilder;
use std::time::Duration;

use crate::error::OracleSinkError;
use crate::opts::OracleOpts;
use crate::sink_impl::{open_session, OracleSink};

/// Default number of connection retry attempts
const DEFAULT_RETRY_ATTEMPTS: u32 = 5;
/// Default delay between retry attempts in seconds
const DEFAULT_RETRY_DELAY_SECS: u64 = 2;

pub async fn oracle_connect(opts: &OracleOpts) -> Result<OracleSink, OracleSinkError> {
    oracle_connect_with_retries(opts, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_SECS).await
}

/// Build the session pool and prepare a first session, retrying connection
/// failures up to `max_retries` times.
///
/// Invalid options fail immediately without retrying.
pub async fn oracle_connect_with_retries(
    opts: &OracleOpts,
    max_retries: u32,
    retry_delay_secs: u64,
) -> Result<OracleSink, OracleSinkError> {
    opts.validate()?;
    let connect_string = opts.connect_string()?;

    tracing::info!(
        host = %opts.host,
        port = opts.port,
        username = %opts.username,
        "Connecting to Oracle at {connect_string}"
    );

    let mut attempt = 1;
    loop {
        match try_connect(opts, &connect_string).await {
            Ok(sink) => {
                if attempt > 1 {
                    tracing::info!("Successfully connected to Oracle after {attempt} attempts");
                }
                return Ok(sink);
            }
            Err(e) if attempt < max_retries => {
                tracing::warn!(
                    "Failed to connect to Oracle (attempt {attempt}/{max_retries}): {e}. Retrying in {retry_delay_secs}s..."
                );
                tokio::time::sleep(Duration::from_secs(retry_delay_secs)).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!("Failed to connect to Oracle after {attempt} attempts: {e}");
                return Err(e);
            }
        }
    }
}

async fn try_connect(opts: &OracleOpts, connect_string: &str) -> Result<OracleSink, OracleSinkError> {
    let username = opts.username.clone();
    let password = opts.password.clone();
    let connect_string = connect_string.to_string();
    let (min, max) = (opts.pool_min, opts.pool_max);

    tokio::task::spawn_blocking(move || {
        let pool = PoolBuilder::new(username, password, connect_string.as_str())
            .min_connections(min)
            .max_connections(max)
            .build()
            .map_err(|source| OracleSinkError::Connect {
                connect_string: connect_string.clone(),
                source,
            })?;
        let session = open_session(&pool).map_err(OracleSinkError::Session)?;
        Ok(OracleSink::new(pool, Some(session)))
    })
    .await
    .map_err(|e| OracleSinkError::Task(e.to_string()))?
}
