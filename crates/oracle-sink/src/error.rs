use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleSinkError {
    #[error("only one of service_name or sid can be used")]
    ServiceNameAndSid,

    #[error("one of service_name or sid is required")]
    MissingDatabaseName,

    #[error("invalid session pool size (min {min}, max {max})")]
    InvalidPoolSize { min: u32, max: u32 },

    #[error("failed to connect to Oracle at '{connect_string}': {source}")]
    Connect {
        connect_string: String,
        #[source]
        source: oracle::Error,
    },

    #[error("failed to prepare session: {0}")]
    Session(#[source] oracle::Error),

    #[error("blocking database task failed: {0}")]
    Task(String),
}
