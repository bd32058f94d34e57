//! Page content cache keyed by URL

use rusqlite::OptionalExtension;

use crate::database::Database;
use crate::{timestamp_now, Result};

pub struct CacheStore {
    db: Database,
}

impl CacheStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Add or replace the cached content for `url`
    pub fn put(&self, url: &str, content: &[u8]) -> Result<()> {
        let now = timestamp_now();
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO cache (url, content, last_updated) VALUES (?1, ?2, ?3)",
                rusqlite::params![url, content, now],
            )?;
            Ok(())
        })?;

        tracing::debug!(url = %url, bytes = content.len(), "Added to cache");
        Ok(())
    }

    pub fn get(&self, url: &str) -> Result<Option<Vec<u8>>> {
        self.db.with_connection(|conn| {
            let content = conn
                .query_row("SELECT content FROM cache WHERE url = ?1", [url], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(content)
        })
    }

    pub fn clear(&self) -> Result<usize> {
        let removed = self
            .db
            .with_connection(|conn| Ok(conn.execute("DELETE FROM cache", [])?))?;

        tracing::info!(removed, "Cache cleared");
        Ok(removed)
    }
}

impl Clone for CacheStore {
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
    fn test_cache() {
        let cache = CacheStore::new(Database::open_in_memory().unwrap());
        assert!(cache.get("https://example.com").unwrap().is_none());

        cache.put("https://example.com", b"<html>v1</html>").unwrap();
        cache.put("https://example.com", b"<html>v2</html>").unwrap();
        assert_eq!(
            cache.get("https://example.com").unwrap().as_deref(),
            Some(&b"<html>v2</html>"[..])
        );

        assert_eq!(cache.clear().unwrap(), 1);
        assert!(cache.get("https://example.com").unwrap().is_none());
    }
}
