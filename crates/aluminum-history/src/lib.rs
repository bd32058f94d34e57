//! Aluminum History Tools
//!
//! Works against the browser profile's own `History` file:
//! - Resolve the profile location per platform
//! - Query, search, analyse and export visits from a snapshot copy
//! - Remove history atomically (backup, shred, vacuum, restore on failure)

mod error;
mod profile;
mod reader;
mod time;
mod wipe;

pub use error::HistoryError;
pub use profile::{Platform, ProfileLocation, HISTORY_FILE};
pub use reader::{BrowsingStats, DayVisits, DomainVisits, ExportFormat, HistoryReader, VisitEntry};
pub use time::{datetime_to_webkit, webkit_to_datetime, WEBKIT_EPOCH_OFFSET_SECS};
pub use wipe::{
    shred_file, HistoryRemover, WipeOptions, WipeOutcome, WipeReport, CREDENTIAL_FILES,
    RELATED_FILES,
};

pub type Result<T> = std::result::Result<T, HistoryError>;
