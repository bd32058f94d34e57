//! Database connection and operations

use parking_lot::Mutex;
use rusqlite::backup::Progress;
use rusqlite::{Connection, DatabaseName, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::migrations::run_migrations;
use crate::{timestamp_now, Result, StorageError};

pub struct Database {
    conn: Arc<Mutex<Connection>>,
    /// Backing file; `None` for in-memory databases
    path: Option<PathBuf>,
}

/// Summary counters over the whole data store
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStatistics {
    pub total_history_entries: i64,
    pub total_bookmarks: i64,
    pub cached_pages: i64,
    pub system_reports: i64,
    pub database_size_bytes: u64,
    pub most_recent_visit: Option<String>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;

        // WAL mode so readers don't block the browser writing alongside us
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        tracing::debug!(path = %path.display(), "Opened data store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = timestamp_now();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, updated_at],
            )?;
            Ok(())
        })?;

        tracing::info!(key = %key, "Updated setting");
        Ok(())
    }

    /// Rebuild the database file to reclaim free pages
    pub fn optimize(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute_batch("VACUUM")?;
            Ok(())
        })?;

        tracing::info!("Database optimized");
        Ok(())
    }

    /// Copy the live database into `backup_path` using SQLite's online backup
    pub fn backup_to<P: AsRef<Path>>(&self, backup_path: P) -> Result<()> {
        let backup_path = backup_path.as_ref();
        if let Some(parent) = backup_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        self.with_connection(|conn| {
            conn.backup(DatabaseName::Main, backup_path, None)?;
            Ok(())
        })?;

        tracing::info!(path = %backup_path.display(), "Database backed up");
        Ok(())
    }

    /// Replace the live database contents with those of `backup_path`
    pub fn restore_from<P: AsRef<Path>>(&self, backup_path: P) -> Result<()> {
        let backup_path = backup_path.as_ref();
        if !backup_path.exists() {
            return Err(StorageError::BackupNotFound(backup_path.to_path_buf()));
        }

        let mut conn = self.conn.lock();
        conn.restore(DatabaseName::Main, backup_path, None::<fn(Progress)>)?;
        drop(conn);

        tracing::info!(path = %backup_path.display(), "Database restored");
        Ok(())
    }

    /// Size of the backing file in bytes (0 for in-memory databases)
    pub fn size_bytes(&self) -> Result<u64> {
        match &self.path {
            Some(path) => Ok(std::fs::metadata(path)?.len()),
            None => Ok(0),
        }
    }

    pub fn statistics(&self) -> Result<DatabaseStatistics> {
        let database_size_bytes = self.size_bytes()?;

        self.with_connection(|conn| {
            let count = |table: &str| -> Result<i64> {
                let sql = format!("SELECT COUNT(*) FROM {table}");
                Ok(conn.query_row(&sql, [], |row| row.get(0))?)
            };

            let most_recent_visit: Option<String> =
                conn.query_row("SELECT MAX(visited_at) FROM history", [], |row| row.get(0))?;

            Ok(DatabaseStatistics {
                total_history_entries: count("history")?,
                total_bookmarks: count("bookmarks")?,
                cached_pages: count("cache")?,
                system_reports: count("system_data")?,
                database_size_bytes,
                most_recent_visit,
            })
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            path: self.path.clone(),
        }
    }
}
