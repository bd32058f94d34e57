//! Core error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] aluminum_storage::StorageError),

    #[error("History error: {0}")]
    History(#[from] aluminum_history::HistoryError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] aluminum_telemetry::TelemetryError),

    #[error("Utility error: {0}")]
    Utility(#[from] aluminum_utility::UtilityError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
