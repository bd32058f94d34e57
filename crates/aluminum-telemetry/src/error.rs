//! Telemetry error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Storage error: {0}")]
    Storage(#[from] aluminum_storage::StorageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server rejected upload with status {0}")]
    Rejected(u16),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
