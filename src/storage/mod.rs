//! SQLite storage.
//!
//! Handles the single database file shared by ingestion and the query
//! layer:
//! - Schema creation
//! - Fresh per-call read-only connections
//! - Transactional battle writes

mod sqlite;

pub use sqlite::*;

use std::path::PathBuf;
use thiserror::Error;

/// File name of the statistics database inside the data directory.
pub const DATABASE_FILE: &str = "daily_stats.db";

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database not found: {0}")]
    DatabaseNotFound(PathBuf),
}

/// Configuration for storage paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Path of the statistics database.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
