//! Bookmarks with folder grouping and JSON import/export

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::database::Database;
use crate::{parse_timestamp, timestamp_now, Result};

pub const DEFAULT_FOLDER: &str = "root";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub added_at: DateTime<Utc>,
    pub folder: String,
}

impl Bookmark {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let added_str: String = row.get(3)?;
        Ok(Self {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            added_at: parse_timestamp(&added_str),
            folder: row.get(4)?,
        })
    }
}

/// Shape accepted by `import_json`; only url and title are required
#[derive(Debug, Deserialize)]
struct ImportedBookmark {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    folder: Option<String>,
}

fn normalize_folder(folder: Option<&str>) -> String {
    folder
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_FOLDER)
        .to_string()
}

pub struct BookmarkStore {
    db: Database,
}

impl BookmarkStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Add a bookmark. Re-adding the same url to the same folder replaces its title.
    pub fn add(&self, url: &str, title: &str, folder: Option<&str>) -> Result<()> {
        let folder = normalize_folder(folder);
        let now = timestamp_now();

        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO bookmarks (url, title, added_at, folder) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![url, title, now, folder],
            )?;
            Ok(())
        })?;

        tracing::info!(title = %title, url = %url, folder = %folder, "Added bookmark");
        Ok(())
    }

    /// All bookmarks, or only those in `folder`
    pub fn list(&self, folder: Option<&str>) -> Result<Vec<Bookmark>> {
        self.db.with_connection(|conn| {
            let bookmarks = match folder {
                Some(folder) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, url, title, added_at, folder FROM bookmarks
                         WHERE folder = ?1 ORDER BY id",
                    )?;
                    let rows = stmt
                        .query_map([folder], Bookmark::from_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, url, title, added_at, folder FROM bookmarks ORDER BY id",
                    )?;
                    let rows = stmt
                        .query_map([], Bookmark::from_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
            };
            Ok(bookmarks)
        })
    }

    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let bookmarks = self.list(None)?;
        let json = serde_json::to_string_pretty(&bookmarks)?;
        std::fs::write(path, json)?;

        tracing::info!(path = %path.display(), count = bookmarks.len(), "Bookmarks exported");
        Ok(bookmarks.len())
    }

    /// Import bookmarks from a JSON array. Returns the number of bookmarks read.
    pub fn import_json<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let imported: Vec<ImportedBookmark> = serde_json::from_str(&contents)?;
        let now = timestamp_now();

        self.db.transaction(|conn| {
            let mut stmt = conn.prepare(
                "INSERT OR REPLACE INTO bookmarks (url, title, added_at, folder) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for bookmark in &imported {
                let folder = normalize_folder(bookmark.folder.as_deref());
                stmt.execute(rusqlite::params![bookmark.url, bookmark.title, now, folder])?;
            }
            Ok(())
        })?;

        tracing::info!(path = %path.display(), count = imported.len(), "Bookmarks imported");
        Ok(imported.len())
    }
}

impl Clone for BookmarkStore {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
