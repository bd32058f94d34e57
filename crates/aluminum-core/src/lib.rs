//! Aluminum Core
//!
//! Configuration and logging shared by the Aluminum tools, plus re-exports of
//! the component crates so front ends depend on a single crate.

mod config;
mod error;

pub use config::{default_config_path, Config, WipeConfig};
pub use error::CoreError;

pub use aluminum_history::{
    HistoryError, HistoryReader, HistoryRemover, ProfileLocation, WipeOptions, WipeOutcome,
    WipeReport,
};
pub use aluminum_storage::{
    BookmarkStore, CacheStore, Database, HistoryStore, StorageError, SystemDataStore,
};
pub use aluminum_telemetry::{SystemDataCompiler, TelemetryError, TelemetrySettings};
pub use aluminum_utility::{Calculator, CodingUtility, UtilityError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` when `verbose`.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}
