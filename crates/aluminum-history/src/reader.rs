//! Read-side access to a profile's `History` database
//!
//! The browser keeps `History` locked while running, so queries go against a
//! snapshot copied next to it. Deletions are applied to the live file and
//! mirrored into the snapshot.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::{Connection, Row};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::HistoryError;
use crate::profile::HISTORY_FILE;
use crate::time::{datetime_to_webkit, webkit_to_datetime, WEBKIT_EPOCH_OFFSET_SECS};
use crate::Result;

const SNAPSHOT_SUFFIX: &str = "_snapshot";

const ENTRY_COLUMNS: &str = "id, url, title, visit_count, last_visit_time";

#[derive(Debug, Clone, Serialize)]
pub struct VisitEntry {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub visit_count: i64,
    pub last_visit_time: DateTime<Utc>,
}

impl VisitEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let title: Option<String> = row.get(2)?;
        let visit_count: Option<i64> = row.get(3)?;
        let last_visit: Option<i64> = row.get(4)?;

        Ok(Self {
            id: row.get(0)?,
            url: row.get(1)?,
            title: title.unwrap_or_default(),
            visit_count: visit_count.unwrap_or(0),
            last_visit_time: webkit_to_datetime(last_visit.unwrap_or(0)),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BrowsingStats {
    pub total_urls: i64,
    pub total_visits: i64,
    pub avg_visits_per_url: f64,
    pub most_recent_visit: Option<DateTime<Utc>>,
    pub oldest_visit: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainVisits {
    pub domain: String,
    pub visits: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayVisits {
    pub date: NaiveDate,
    pub visits: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = HistoryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(HistoryError::UnsupportedFormat(s.to_string())),
        }
    }
}

pub struct HistoryReader {
    live_path: PathBuf,
    snapshot_path: PathBuf,
    /// Taken on close so the snapshot can be removed after the connection ends
    conn: Option<Connection>,
}

impl HistoryReader {
    /// Open the `History` file inside `profile_dir`
    pub fn open(profile_dir: &Path) -> Result<Self> {
        Self::open_file(&profile_dir.join(HISTORY_FILE))
    }

    pub fn open_file(history_path: &Path) -> Result<Self> {
        if !history_path.is_file() {
            return Err(HistoryError::HistoryNotFound(history_path.to_path_buf()));
        }

        let mut snapshot_name = history_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| HISTORY_FILE.into());
        snapshot_name.push(SNAPSHOT_SUFFIX);
        let snapshot_path = history_path.with_file_name(snapshot_name);

        std::fs::copy(history_path, &snapshot_path)?;
        let conn = match Connection::open(&snapshot_path) {
            Ok(conn) => conn,
            Err(e) => {
                let _ = std::fs::remove_file(&snapshot_path);
                return Err(e.into());
            }
        };

        tracing::debug!(
            history = %history_path.display(),
            snapshot = %snapshot_path.display(),
            "Opened history snapshot"
        );

        Ok(Self {
            live_path: history_path.to_path_buf(),
            snapshot_path,
            conn: Some(conn),
        })
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(HistoryError::Closed)
    }

    fn query_entries<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<VisitEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let entries = stmt
            .query_map(params, VisitEntry::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Entries ordered by last visit, newest first. `limit: None` returns all.
    pub fn entries(&self, limit: Option<usize>, offset: usize) -> Result<Vec<VisitEntry>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM urls
                 ORDER BY last_visit_time DESC
                 LIMIT ?1 OFFSET ?2"
            ),
            rusqlite::params![limit, offset as i64],
        )
    }

    /// Entries whose url or title contains `keyword`
    pub fn search(&self, keyword: &str, limit: usize) -> Result<Vec<VisitEntry>> {
        let pattern = format!("%{keyword}%");
        self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM urls
                 WHERE url LIKE ?1 OR title LIKE ?1
                 ORDER BY last_visit_time DESC
                 LIMIT ?2"
            ),
            rusqlite::params![pattern, limit as i64],
        )
    }

    pub fn most_visited(&self, limit: usize) -> Result<Vec<VisitEntry>> {
        self.query_entries(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM urls
                 ORDER BY visit_count DESC, last_visit_time DESC
                 LIMIT ?1"
            ),
            [limit as i64],
        )
    }

    pub fn stats(&self) -> Result<BrowsingStats> {
        let (total_urls, total_visits, newest, oldest): (i64, i64, Option<i64>, Option<i64>) =
            self.conn()?.query_row(
                "SELECT COUNT(*), COALESCE(SUM(visit_count), 0), MAX(last_visit_time), MIN(last_visit_time)
                 FROM urls",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        let avg_visits_per_url = if total_urls > 0 {
            total_visits as f64 / total_urls as f64
        } else {
            0.0
        };

        Ok(BrowsingStats {
            total_urls,
            total_visits,
            avg_visits_per_url,
            most_recent_visit: newest.map(webkit_to_datetime),
            oldest_visit: oldest.map(webkit_to_datetime),
        })
    }

    /// Delete one url row. Returns whether the live file contained it.
    pub fn delete_entry(&self, id: i64) -> Result<bool> {
        let live = Connection::open(&self.live_path)?;
        let removed = live.execute("DELETE FROM urls WHERE id = ?1", [id])?;
        self.conn()?.execute("DELETE FROM urls WHERE id = ?1", [id])?;

        tracing::info!(id, removed, "Deleted history entry");
        Ok(removed > 0)
    }

    /// Delete every url row. Returns the number removed from the live file.
    pub fn clear(&self) -> Result<usize> {
        let live = Connection::open(&self.live_path)?;
        let removed = live.execute("DELETE FROM urls", [])?;
        self.conn()?.execute("DELETE FROM urls", [])?;

        tracing::info!(removed, "Cleared browsing history");
        Ok(removed)
    }

    /// Write every entry to `output` in the chosen format
    pub fn export(&self, output: &Path, format: ExportFormat) -> Result<usize> {
        let entries = self.entries(None, 0)?;

        match format {
            ExportFormat::Json => {
                let json = serde_json::to_string_pretty(&entries)?;
                std::fs::write(output, json)?;
            }
            ExportFormat::Csv => {
                let mut writer = csv::Writer::from_path(output)?;
                for entry in &entries {
                    writer.serialize(entry)?;
                }
                writer.flush()?;
            }
        }

        tracing::info!(
            path = %output.display(),
            format = format.as_str(),
            count = entries.len(),
            "History exported"
        );
        Ok(entries.len())
    }

    /// Visit counts summed per host, busiest first
    pub fn domain_visits(&self) -> Result<Vec<DomainVisits>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT url, visit_count FROM urls")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<i64>>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut totals: HashMap<String, i64> = HashMap::new();
        for (url, visits) in rows {
            *totals.entry(domain_of(&url)).or_insert(0) += visits.unwrap_or(0);
        }

        let mut domains: Vec<DomainVisits> = totals
            .into_iter()
            .map(|(domain, visits)| DomainVisits { domain, visits })
            .collect();
        domains.sort_by(|a, b| b.visits.cmp(&a.visits).then_with(|| a.domain.cmp(&b.domain)));
        Ok(domains)
    }

    /// Number of urls last visited on each day, oldest day first.
    /// Both bounds are inclusive whole days.
    pub fn visit_timeline(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<DayVisits>> {
        let lower = start
            .map(|d| datetime_to_webkit(d.and_time(NaiveTime::MIN).and_utc()))
            .unwrap_or(i64::MIN);
        let upper = end
            .and_then(|d| d.succ_opt())
            .map(|d| datetime_to_webkit(d.and_time(NaiveTime::MIN).and_utc()))
            .unwrap_or(i64::MAX);

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT DATE(last_visit_time / 1000000 - {WEBKIT_EPOCH_OFFSET_SECS}, 'unixepoch') AS visit_date,
                    COUNT(*)
             FROM urls
             WHERE last_visit_time >= ?1 AND last_visit_time < ?2
             GROUP BY visit_date
             ORDER BY visit_date"
        ))?;
        let rows = stmt
            .query_map(rusqlite::params![lower, upper], |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(date, visits)| {
                let date = NaiveDate::parse_from_str(date.as_deref()?, "%Y-%m-%d").ok()?;
                Some(DayVisits { date, visits })
            })
            .collect())
    }

    /// Close the snapshot connection and remove the snapshot file
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| e)?;
            if self.snapshot_path.exists() {
                std::fs::remove_file(&self.snapshot_path)?;
            }
        }
        Ok(())
    }
}

impl Drop for HistoryReader {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!(
                snapshot = %self.snapshot_path.display(),
                error = %e,
                "Failed to remove history snapshot"
            );
        }
    }
}

/// Host (and port, when present) of `url`; empty for unparsable urls
fn domain_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            let host = parsed.host_str()?.to_string();
            Some(match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host,
            })
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn webkit(y: i32, m: u32, d: u32, h: u32) -> i64 {
        datetime_to_webkit(Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap())
    }

    fn fixture_profile() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join(HISTORY_FILE)).unwrap();
        conn.execute_batch(
            "CREATE TABLE urls (
                id INTEGER PRIMARY KEY,
                url LONGVARCHAR,
                title LONGVARCHAR,
                visit_count INTEGER DEFAULT 0 NOT NULL,
                typed_count INTEGER DEFAULT 0 NOT NULL,
                last_visit_time INTEGER NOT NULL,
                hidden INTEGER DEFAULT 0 NOT NULL
            );",
        )
        .unwrap();

        let rows = [
            (1, "https://www.python.org/doc", "Python Docs", 5, webkit(2024, 3, 1, 9)),
            (2, "https://www.python.org/", "Welcome to Python", 3, webkit(2024, 3, 2, 10)),
            (3, "https://crates.io/crates/serde", "serde", 10, webkit(2024, 3, 2, 18)),
            (4, "http://localhost:8080/admin", "Admin", 1, webkit(2024, 3, 4, 7)),
        ];
        for (id, url, title, visits, last) in rows {
            conn.execute(
                "INSERT INTO urls (id, url, title, visit_count, last_visit_time) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, url, title, visits, last],
            )
            .unwrap();
        }
        dir
    }

    #[test]
    fn test_missing_history() {
        let dir = tempfile::tempdir().unwrap();
        let err = HistoryReader::open(dir.path()).err().unwrap();
        assert!(matches!(err, HistoryError::HistoryNotFound(_)));
    }

    #[test]
    fn test_entries_and_paging() {
        let profile = fixture_profile();
        let reader = HistoryReader::open(profile.path()).unwrap();

        let all = reader.entries(None, 0).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].id, 4);

        let page = reader.entries(Some(2), 1).unwrap();
        assert_eq!(page.iter().map(|e| e.id).collect::<Vec<_>>(), vec![3, 2]);
    }

    #[test]
    fn test_search_and_most_visited() {
        let profile = fixture_profile();
        let reader = HistoryReader::open(profile.path()).unwrap();

        let results = reader.search("python", 10).unwrap();
        assert_eq!(results.len(), 2);

        let top = reader.most_visited(1).unwrap();
        assert_eq!(top[0].url, "https://crates.io/crates/serde");
    }

    #[test]
    fn test_stats() {
        let profile = fixture_profile();
        let reader = HistoryReader::open(profile.path()).unwrap();

        let stats = reader.stats().unwrap();
        assert_eq!(stats.total_urls, 4);
        assert_eq!(stats.total_visits, 19);
        assert!((stats.avg_visits_per_url - 4.75).abs() < 1e-9);
        assert_eq!(
            stats.oldest_visit,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_stats_on_empty_history() {
        let profile = fixture_profile();
        let reader = HistoryReader::open(profile.path()).unwrap();
        reader.clear().unwrap();

        let stats = reader.stats().unwrap();
        assert_eq!(stats.total_urls, 0);
        assert_eq!(stats.total_visits, 0);
        assert_eq!(stats.avg_visits_per_url, 0.0);
        assert!(stats.most_recent_visit.is_none());
    }

    #[test]
    fn test_domain_visits() {
        let profile = fixture_profile();
        let reader = HistoryReader::open(profile.path()).unwrap();

        let domains = reader.domain_visits().unwrap();
        assert_eq!(
            domains[0],
            DomainVisits {
                domain: "crates.io".to_string(),
                visits: 10
            }
        );
        assert_eq!(domains[1].domain, "www.python.org");
        assert_eq!(domains[1].visits, 8);
        assert_eq!(domains[2].domain, "localhost:8080");
    }

    #[test]
    fn test_visit_timeline() {
        let profile = fixture_profile();
        let reader = HistoryReader::open(profile.path()).unwrap();

        let all = reader.visit_timeline(None, None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].visits, 2);

        let day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let bounded = reader.visit_timeline(Some(day), Some(day)).unwrap();
        assert_eq!(bounded, vec![DayVisits { date: day, visits: 2 }]);
    }

    #[test]
    fn test_delete_reaches_live_file() {
        let profile = fixture_profile();
        let reader = HistoryReader::open(profile.path()).unwrap();

        assert!(reader.delete_entry(3).unwrap());
        assert!(!reader.delete_entry(3).unwrap());
        assert_eq!(reader.entries(None, 0).unwrap().len(), 3);
        reader.close().unwrap();

        let reopened = HistoryReader::open(profile.path()).unwrap();
        assert_eq!(reopened.entries(None, 0).unwrap().len(), 3);
    }

    #[test]
    fn test_export_formats() {
        let profile = fixture_profile();
        let reader = HistoryReader::open(profile.path()).unwrap();

        let json_path = profile.path().join("export.json");
        assert_eq!(reader.export(&json_path, ExportFormat::Json).unwrap(), 4);
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 4);

        let csv_path = profile.path().join("export.csv");
        reader.export(&csv_path, ExportFormat::Csv).unwrap();
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert!(csv.starts_with("id,url,title,visit_count,last_visit_time"));
        assert_eq!(csv.lines().count(), 5);

        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_snapshot_removed_on_drop() {
        let profile = fixture_profile();
        let snapshot = profile.path().join("History_snapshot");
        {
            let _reader = HistoryReader::open(profile.path()).unwrap();
            assert!(snapshot.exists());
        }
        assert!(!snapshot.exists());
    }
}
