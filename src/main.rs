//! Command-line interface for oracle-sync
//!
//! # Usage Examples
//!
//! ```bash
//! # Replay events into Oracle, resuming after the last checkpoint
//! oracle-sync run --config oracle-sync.toml --input events.jsonl
//!
//! # Same, with credentials from the environment
//! ORACLE_PASSWORD=secret oracle-sync run --config oracle-sync.toml --input events.jsonl
//!
//! # Run the whole pipeline without a database, logging each transaction
//! RUST_LOG=info oracle-sync run --config oracle-sync.toml --input events.jsonl --dry-run
//!
//! # Print the statement each record compiles to
//! oracle-sync compile --input events.jsonl
//! ```

use anyhow::Context;
use checkpoint::{FilesystemStore, NullStore};
use clap::{Parser, Subcommand};
use mutation_types::Record;
use mutation_writer::{compile, Compiled};
use oracle_sync::jsonl::{sync, SourceOpts, SyncSummary};
use oracle_sync::{AppConfig, DatabaseArgs};
use sql_sink::{DryRunSink, SqlStatement};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(name = "oracle-sync")]
#[command(about = "Apply change-data-capture record mutations to Oracle")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSONL file of records into Oracle
    Run {
        /// Configuration file
        #[arg(long, short, default_value = "oracle-sync.toml")]
        config: PathBuf,

        /// JSONL file with one record per line
        #[arg(long, short)]
        input: PathBuf,

        /// Database overrides
        #[command(flatten)]
        database: DatabaseArgs,

        /// Coalesce consecutive same-shape statements (overrides the config file)
        #[arg(long)]
        merge: bool,

        /// Directory to write checkpoint files (overrides the config file)
        #[arg(long)]
        checkpoint_dir: Option<PathBuf>,

        /// Start from the first line and do not write checkpoints
        #[arg(long)]
        no_checkpoint: bool,

        /// Log statements instead of executing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the SQL statement each record of a JSONL file compiles to
    Compile {
        /// JSONL file with one record per line
        #[arg(long, short)]
        input: PathBuf,
    },

    /// Validate a configuration file without connecting
    CheckConfig {
        /// Configuration file
        #[arg(long, short, default_value = "oracle-sync.toml")]
        config: PathBuf,

        /// Database overrides
        #[command(flatten)]
        database: DatabaseArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            input,
            database,
            merge,
            checkpoint_dir,
            no_checkpoint,
            dry_run,
        } => {
            let mut app = load_config(&config, &database)?;
            if merge {
                app.writer.merge_statements = true;
            }
            if let Some(dir) = checkpoint_dir {
                app.checkpoint.dir = dir;
            }
            let writer_config = app.validate()?;

            let opts = SourceOpts {
                path: input,
                checkpoint_every: app.checkpoint.every,
            };
            let cancel = shutdown_token();

            let summary = match (dry_run, no_checkpoint) {
                (true, true) => sync(&opts, writer_config, DryRunSink::new(), NullStore, cancel).await?,
                (true, false) => {
                    let store = FilesystemStore::new(&app.checkpoint.dir);
                    sync(&opts, writer_config, DryRunSink::new(), store, cancel).await?
                }
                (false, no_checkpoint) => {
                    let sink = oracle_sink::oracle_connect(&app.database)
                        .await
                        .context("Failed to connect to Oracle")?;
                    if no_checkpoint {
                        sync(&opts, writer_config, sink, NullStore, cancel).await?
                    } else {
                        let store = FilesystemStore::new(&app.checkpoint.dir);
                        sync(&opts, writer_config, sink, store, cancel).await?
                    }
                }
            };
            report(&summary);
        }
        Commands::Compile { input } => compile_file(&input)?,
        Commands::CheckConfig { config, database } => {
            let app = load_config(&config, &database)?;
            let writer_config = app.validate()?;
            let connect_string = app.database.connect_string()?;
            println!(
                "Configuration OK: {}@{connect_string} (pool {}..{} sessions)",
                app.database.username, app.database.pool_min, app.database.pool_max
            );
            println!("{writer_config:#?}");
        }
    }

    Ok(())
}

fn load_config(path: &Path, database: &DatabaseArgs) -> anyhow::Result<AppConfig> {
    let mut app = AppConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    database.apply(&mut app.database);
    Ok(app)
}

fn compile_file(input: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line_no = line_no + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record = Record::from_json(&line)
            .with_context(|| format!("Error parsing record at {}:{line_no}", input.display()))?;
        match compile(&record) {
            Ok(Compiled::Statement(compiled)) => {
                let statement = SqlStatement::new(compiled.sql, compiled.args.into_iter().collect());
                println!("{line_no}: {statement}");
            }
            Ok(Compiled::Skipped(reason)) => println!("{line_no}: skipped ({reason})"),
            Err(e) => println!("{line_no}: rejected ({e})"),
        }
    }
    Ok(())
}

/// Token cancelled on Ctrl+C.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received interrupt signal (Ctrl+C)");
                cancel.cancel();
            }
            Err(e) => tracing::warn!("Failed to install Ctrl+C handler: {e}"),
        }
    });
    token
}

fn report(summary: &SyncSummary) {
    info!(
        "Sync finished: {} accepted, {} rejected, {} dropped, {} applied, {} retries",
        summary.replay.accepted,
        summary.replay.rejected,
        summary.writer.dropped,
        summary.writer.applied,
        summary.writer.retries
    );
    match summary.checkpoint {
        Some(line) => info!("Last acknowledged line: {line}"),
        None => info!("No lines acknowledged"),
    }
}
