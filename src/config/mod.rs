//! TOML configuration.
//!
//! ```toml
//! [database]
//! host = "db.local"
//! port = 1521
//! username = "gravity"
//! password = "secret"
//! service_name = "ORCLPDB1"
//!
//! [writer]
//! max_batch_size = 100
//! batch_timeout = "50ms"
//! merge_statements = true
//!
//! [writer.backoff]
//! policy = "exponential"
//! initial = "100ms"
//! max = "30s"
//!
//! [checkpoint]
//! dir = ".oracle-sync-checkpoints"
//! every = 1000
//! ```

pub mod duration;

use mutation_writer::config::{
    DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_MERGE_ROWS, DEFAULT_QUEUE_CAPACITY,
};
use mutation_writer::{BackoffPolicy, WriterConfig, WriterError};
use oracle_sink::{OracleOpts, OracleSinkError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use duration::parse_duration;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid duration for {field}: {source:#}")]
    Duration {
        field: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid database config: {0}")]
    Database(#[from] OracleSinkError),

    #[error("invalid writer config: {0}")]
    Writer(#[from] WriterError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: OracleOpts,
    #[serde(default)]
    pub writer: WriterSection,
    #[serde(default)]
    pub checkpoint: CheckpointSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WriterSection {
    pub queue_capacity: usize,
    pub max_batch_size: usize,
    pub batch_timeout: String,
    pub merge_statements: bool,
    pub max_merge_rows: usize,
    pub backoff: BackoffSection,
}

impl Default for WriterSection {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            batch_timeout: "50ms".to_string(),
            merge_statements: false,
            max_merge_rows: DEFAULT_MAX_MERGE_ROWS,
            backoff: BackoffSection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum BackoffSection {
    Fixed {
        #[serde(default = "default_fixed_delay")]
        delay: String,
    },
    Exponential {
        #[serde(default = "default_initial_delay")]
        initial: String,
        #[serde(default = "default_max_delay")]
        max: String,
        #[serde(default = "default_multiplier")]
        multiplier: f64,
    },
}

impl Default for BackoffSection {
    fn default() -> Self {
        BackoffSection::Fixed {
            delay: default_fixed_delay(),
        }
    }
}

fn default_fixed_delay() -> String {
    "1s".to_string()
}

fn default_initial_delay() -> String {
    "100ms".to_string()
}

fn default_max_delay() -> String {
    "30s".to_string()
}

fn default_multiplier() -> f64 {
    2.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckpointSection {
    pub dir: PathBuf,
    /// Acknowledgments between checkpoint writes
    pub every: u64,
}

impl Default for CheckpointSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".oracle-sync-checkpoints"),
            every: oracle_sync_jsonl_source::DEFAULT_CHECKPOINT_EVERY,
        }
    }
}

fn duration(field: &'static str, value: &str) -> Result<std::time::Duration, ConfigError> {
    parse_duration(value).map_err(|source| ConfigError::Duration { field, source })
}

impl BackoffSection {
    pub fn policy(&self) -> Result<BackoffPolicy, ConfigError> {
        match self {
            BackoffSection::Fixed { delay } => {
                Ok(BackoffPolicy::Fixed(duration("writer.backoff.delay", delay)?))
            }
            BackoffSection::Exponential {
                initial,
                max,
                multiplier,
            } => Ok(BackoffPolicy::Exponential {
                initial: duration("writer.backoff.initial", initial)?,
                max: duration("writer.backoff.max", max)?,
                multiplier: *multiplier,
            }),
        }
    }
}

impl WriterSection {
    pub fn writer_config(&self) -> Result<WriterConfig, ConfigError> {
        let config = WriterConfig {
            queue_capacity: self.queue_capacity,
            max_batch_size: self.max_batch_size,
            batch_timeout: duration("writer.batch_timeout", &self.batch_timeout)?,
            merge_statements: self.merge_statements,
            max_merge_rows: self.max_merge_rows,
            backoff: self.backoff.policy()?,
        };
        config.validate()?;
        Ok(config)
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check the whole configuration before anything connects.
    pub fn validate(&self) -> Result<WriterConfig, ConfigError> {
        let result = self
            .database
            .validate()
            .map_err(ConfigError::from)
            .and_then(|()| self.writer.writer_config());
        if let Err(e) = &result {
            tracing::error!("{e}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const MINIMAL: &str = r#"
[database]
host = "db.local"
username = "gravity"
password = "secret"
service_name = "ORCLPDB1"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.database.port, 1521);
        assert_eq!(config.checkpoint.every, 1000);

        let writer = config.validate().unwrap();
        assert_eq!(writer.queue_capacity, 2048);
        assert_eq!(writer.max_batch_size, 100);
        assert_eq!(writer.batch_timeout, Duration::from_millis(50));
        assert!(!writer.merge_statements);
        assert_eq!(writer.backoff, BackoffPolicy::Fixed(Duration::from_secs(1)));
    }

    #[test]
    fn test_writer_section() {
        let content = format!(
            r#"{MINIMAL}
[writer]
max_batch_size = 500
batch_timeout = "2s"
merge_statements = true
max_merge_rows = 50

[writer.backoff]
policy = "exponential"
initial = "200ms"
max = "1m"
multiplier = 3.0
"#
        );
        let writer = AppConfig::from_toml_str(&content)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(writer.max_batch_size, 500);
        assert_eq!(writer.batch_timeout, Duration::from_secs(2));
        assert!(writer.merge_statements);
        assert_eq!(writer.max_merge_rows, 50);
        assert_eq!(
            writer.backoff,
            BackoffPolicy::Exponential {
                initial: Duration::from_millis(200),
                max: Duration::from_secs(60),
                multiplier: 3.0,
            }
        );
    }

    #[test]
    fn test_service_name_and_sid_rejected() {
        let content = format!("{MINIMAL}sid = \"ORCL\"\n");
        let err = AppConfig::from_toml_str(&content)
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Database(OracleSinkError::ServiceNameAndSid)
        ));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let content = format!("{MINIMAL}\n[writer]\nmax_batch_size = 0\n");
        let err = AppConfig::from_toml_str(&content)
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Writer(WriterError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_retry_delay_rejected() {
        let content = format!("{MINIMAL}\n[writer.backoff]\npolicy = \"fixed\"\ndelay = \"0\"\n");
        let err = AppConfig::from_toml_str(&content)
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Writer(WriterError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_duration_rejected() {
        let content = format!("{MINIMAL}\n[writer]\nbatch_timeout = \"soon\"\n");
        let err = AppConfig::from_toml_str(&content)
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Duration {
                field: "writer.batch_timeout",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_database_table_is_parse_error() {
        assert!(matches!(
            AppConfig::from_toml_str("[writer]\nmax_batch_size = 10\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
