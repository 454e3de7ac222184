//! oracle-sync library
//!
//! Applies change-data-capture record mutations to an Oracle database.
//!
//! # Crates
//!
//! - `mutation_types` - record events and typed field values
//! - `mutation_writer` - compile, queue, batch, apply and acknowledge
//! - `sql_sink` - the transactional sink seam
//! - `oracle_sink` - the Oracle implementation of that seam
//! - `checkpoint` - persisted resume positions
//! - `oracle_sync_jsonl_source` - JSONL replay transport
//!
//! # CLI Usage
//!
//! ```bash
//! # Replay a JSONL file into Oracle
//! oracle-sync run --config oracle-sync.toml --input events.jsonl
//!
//! # Show the SQL each record compiles to
//! oracle-sync compile --input events.jsonl
//!
//! # Validate a configuration file
//! oracle-sync check-config --config oracle-sync.toml
//! ```

use clap::Parser;
use oracle_sink::OracleOpts;

pub mod config;

pub use config::{AppConfig, ConfigError};
pub use oracle_sync_jsonl_source as jsonl;

/// Database flags that override the `[database]` table of the config file.
#[derive(Parser, Clone, Debug, Default)]
pub struct DatabaseArgs {
    /// Oracle host
    #[arg(long = "db-host", env = "ORACLE_HOST")]
    pub host: Option<String>,

    /// Oracle listener port
    #[arg(long = "db-port", env = "ORACLE_PORT")]
    pub port: Option<u16>,

    /// Oracle username
    #[arg(long = "db-username", env = "ORACLE_USERNAME")]
    pub username: Option<String>,

    /// Oracle password
    #[arg(long = "db-password", env = "ORACLE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Service name (exclusive with --sid)
    #[arg(long, env = "ORACLE_SYNC_SERVICE_NAME")]
    pub service_name: Option<String>,

    /// SID (exclusive with --service-name)
    #[arg(long, env = "ORACLE_SYNC_SID")]
    pub sid: Option<String>,
}

impl DatabaseArgs {
    pub fn apply(&self, opts: &mut OracleOpts) {
        if let Some(host) = &self.host {
            opts.host = host.clone();
        }
        if let Some(port) = self.port {
            opts.port = port;
        }
        if let Some(username) = &self.username {
            opts.username = username.clone();
        }
        if let Some(password) = &self.password {
            opts.password = password.clone();
        }
        if let Some(service_name) = &self.service_name {
            opts.service_name = Some(service_name.clone());
        }
        if let Some(sid) = &self.sid {
            opts.sid = Some(sid.clone());
        }
    }
}
