//! Local visit history

use chrono::{DateTime, Duration, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::{format_timestamp, parse_timestamp, timestamp_now, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub visited_at: DateTime<Utc>,
    pub visit_count: i64,
}

impl HistoryEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let visited_str: String = row.get(3)?;
        Ok(Self {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            visited_at: parse_timestamp(&visited_str),
            visit_count: row.get(4)?,
        })
    }
}

pub struct HistoryStore {
    db: Database,
}

impl HistoryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record a visit to a URL, bumping the visit count of known URLs
    pub fn record_visit(&self, url: &str, title: &str) -> Result<()> {
        let now = timestamp_now();
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO history (url, title, visited_at, visit_count) VALUES (?1, ?2, ?3, 1)
                 ON CONFLICT(url) DO UPDATE SET
                     title = CASE WHEN excluded.title != '' THEN excluded.title ELSE history.title END,
                     visited_at = excluded.visited_at,
                     visit_count = history.visit_count + 1",
                rusqlite::params![url, title, now],
            )?;
            Ok(())
        })?;

        tracing::debug!(url = %url, "Recorded visit");
        Ok(())
    }

    /// Most recently visited entries first
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, url, title, visited_at, visit_count FROM history
                 ORDER BY visited_at DESC
                 LIMIT ?1",
            )?;

            let entries = stmt
                .query_map([limit as i64], HistoryEntry::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
    }

    /// Case-insensitive substring search over url and title.
    ///
    /// SQLite's `LOWER` and `LIKE` only fold ASCII, so matching happens here
    /// with Unicode lowercasing on both sides.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let needle = query.to_lowercase();

        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, url, title, visited_at, visit_count FROM history
                 ORDER BY visited_at DESC",
            )?;

            let mut entries = Vec::new();
            for entry in stmt.query_map([], HistoryEntry::from_row)? {
                let entry = entry?;
                if entry.url.to_lowercase().contains(&needle)
                    || entry.title.to_lowercase().contains(&needle)
                {
                    entries.push(entry);
                    if entries.len() >= limit {
                        break;
                    }
                }
            }
            Ok(entries)
        })
    }

    pub fn most_visited(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, url, title, visited_at, visit_count FROM history
                 ORDER BY visit_count DESC, visited_at DESC
                 LIMIT ?1",
            )?;

            let entries = stmt
                .query_map([limit as i64], HistoryEntry::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
    }

    /// Delete the entry for `url`. Returns whether anything was removed.
    pub fn delete_url(&self, url: &str) -> Result<bool> {
        let removed = self.db.with_connection(|conn| {
            Ok(conn.execute("DELETE FROM history WHERE url = ?1", [url])?)
        })?;

        tracing::info!(url = %url, removed, "Deleted history entry");
        Ok(removed > 0)
    }

    /// Clear history. `None` removes everything, `Some(days)` keeps the last `days` days.
    pub fn clear(&self, older_than_days: Option<u32>) -> Result<usize> {
        let removed = self.db.with_connection(|conn| match older_than_days {
            None => Ok(conn.execute("DELETE FROM history", [])?),
            Some(days) => {
                // A cutoff before the earliest representable time matches nothing
                let Some(cutoff) = Utc::now().checked_sub_signed(Duration::days(i64::from(days)))
                else {
                    return Ok(0);
                };
                Ok(conn.execute(
                    "DELETE FROM history WHERE visited_at < ?1",
                    [format_timestamp(cutoff)],
                )?)
            }
        })?;

        match older_than_days {
            None => tracing::info!(removed, "Cleared history completely"),
            Some(days) => tracing::info!(removed, days, "Cleared history older than cutoff"),
        }
        Ok(removed)
    }
}

impl Clone for HistoryStore {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_store() {
        let db = Database::open_in_memory().unwrap();
        let store = HistoryStore::new(db);

        store.record_visit("https://example.com", "Example").unwrap();
        store.record_visit("https://rust-lang.org", "Rust").unwrap();
        store.record_visit("https://example.com", "").unwrap(); // Second visit

        let results = store.search("EXAMPLE", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].visit_count, 2);
        assert_eq!(results[0].title, "Example");

        let recent = store.recent(10).unwrap();
        assert_eq!(recent.len(), 2);

        let top = store.most_visited(1).unwrap();
        assert_eq!(top[0].url, "https://example.com");
    }

    #[test]
    fn test_delete_url() {
        let store = HistoryStore::new(Database::open_in_memory().unwrap());
        store.record_visit("https://example.com", "Example").unwrap();

        assert!(store.delete_url("https://example.com").unwrap());
        assert!(!store.delete_url("https://example.com").unwrap());
        assert!(store.recent(10).unwrap().is_empty());
    }

    #[test]
    fn test_clear_older_than() {
        let db = Database::open_in_memory().unwrap();
        let store = HistoryStore::new(db.clone());
        store.record_visit("https://fresh.example", "Fresh").unwrap();

        let stale = format_timestamp(Utc::now() - Duration::days(30));
        db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO history (url, title, visited_at) VALUES ('https://stale.example', 'Stale', ?1)",
                [stale],
            )?;
            Ok(())
        })
        .unwrap();

        assert_eq!(store.clear(Some(7)).unwrap(), 1);
        let remaining = store.recent(10).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].url, "https://fresh.example");

        assert_eq!(store.clear(None).unwrap(), 1);
    }

    #[test]
    fn test_clear_with_huge_day_count_keeps_everything() {
        let store = HistoryStore::new(Database::open_in_memory().unwrap());
        store.record_visit("https://example.com", "Example").unwrap();

        assert_eq!(store.clear(Some(u32::MAX)).unwrap(), 0);
        assert_eq!(store.recent(10).unwrap().len(), 1);
    }

    #[test]
    fn test_search_folds_non_ascii_case() {
        let store = HistoryStore::new(Database::open_in_memory().unwrap());
        store
            .record_visit("https://ens.example/", "ÉCOLE Normale")
            .unwrap();
        store.record_visit("https://other.example/", "Other").unwrap();

        let results = store.search("école", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "ÉCOLE Normale");
        assert!(store.search("école", 0).unwrap().is_empty());
    }
}
