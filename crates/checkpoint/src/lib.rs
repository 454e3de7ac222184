//! Checkpoint management for oracle-sync
//!
//! Records the last upstream position whose mutation was committed to the
//! database and acknowledged, so a restarted transport can resume after it.
//!
//! ## Storage Backends
//!
//! - `FilesystemStore` - Stores checkpoints as JSON files
//! - `NullStore` - Stores nothing

mod filesystem;
pub mod store;


pub use filesystem::FilesystemStore;
pub use store::{CheckpointStore, CommitCheckpoint, NullStore};
