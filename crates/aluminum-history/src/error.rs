//! History error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History file not found: {}", .0.display())]
    HistoryNotFound(PathBuf),

    #[error("Unsupported operating system: {0}")]
    UnsupportedPlatform(String),

    #[error("Could not resolve the {0} directory")]
    MissingDirectory(&'static str),

    #[error("Unsupported export format: {0} (use 'json' or 'csv')")]
    UnsupportedFormat(String),

    #[error("History reader is closed")]
    Closed,

    #[error("Backup failed: {0}")]
    Backup(String),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
