//! Aluminum Storage Layer
//!
//! SQLite-backed persistence for the browser's local data: visit history,
//! bookmarks, settings, the page cache and compiled system data reports.
//! One connection per `Database` handle, shared by every store.

mod bookmarks;
mod cache;
mod database;
mod error;
mod history;
mod migrations;
mod system_data;

pub use bookmarks::{Bookmark, BookmarkStore, DEFAULT_FOLDER};
pub use cache::CacheStore;
pub use database::{Database, DatabaseStatistics};
pub use error::StorageError;
pub use history::{HistoryEntry, HistoryStore};
pub use system_data::{SystemDataRecord, SystemDataStore};

pub type Result<T> = std::result::Result<T, StorageError>;

/// Current time in the fixed-width RFC 3339 form used for every stored timestamp.
///
/// Fixed width keeps lexical and chronological order identical, which the
/// range deletes rely on.
pub fn timestamp_now() -> String {
    format_timestamp(chrono::Utc::now())
}

pub fn format_timestamp(dt: chrono::DateTime<chrono::Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> chrono::DateTime<chrono::Utc> {
    use chrono::{DateTime, NaiveDateTime, Utc};

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // SQLite CURRENT_TIMESTAMP form, found in older data files
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|naive| naive.and_utc())
        })
        .unwrap_or_else(|_| Utc::now())
}
