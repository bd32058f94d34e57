//! Aluminum System Data Compiler
//!
//! Gathers hardware, OS, network, browser and performance data into a
//! `SystemReport`, stores it in the local data store and, when the user has
//! opted in, uploads it to a configured endpoint.
//!
//! Nothing leaves the machine unless `TelemetrySettings::upload_enabled` (or
//! `lookup_public_ip`) is set.

mod collector;
mod compiler;
mod error;
mod report;
mod settings;
mod transport;

pub use collector::{detect_gpu, SystemCollector};
pub use compiler::{CompileSummary, SystemDataCompiler, UploadStatus};
pub use error::TelemetryError;
pub use report::{
    generate_user_agent, BrowserInfo, CpuInfo, DiskInfo, DiskIo, Extension, GpuInfo,
    HardwareInfo, MemoryInfo, NetworkInfo, NetworkIo, OsInfo, PerformanceMetrics, Plugin,
    SystemReport,
    ALUMINUM_VERSION, BROWSER_NAME,
};
pub use settings::TelemetrySettings;
pub use transport::Transport;

pub type Result<T> = std::result::Result<T, TelemetryError>;
