use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriterError {
    /// The record names a primary-key field that is not among its fields.
    #[error("Primary key field '{column}' not found in record for table '{table}'")]
    MissingPrimaryKey { table: String, column: String },

    /// The pipeline has stopped and no longer accepts commands.
    #[error("Writer pipeline is closed")]
    Closed,

    #[error("Invalid writer configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, WriterError>;
