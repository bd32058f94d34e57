//! Atomic history removal
//!
//! Sequence: backup, shred `History`, remove related files, vacuum
//! `Web Data`, clear the cache. Any failure after the backup restores every
//! backed up file.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::HistoryError;
use crate::profile::ProfileLocation;
use crate::Result;

/// Files cleared together with `History`
pub const RELATED_FILES: &[&str] = &["History-journal", "Visited Links", "Top Sites", "Shortcuts"];

/// Saved logins and autofill data, only removed on request
pub const CREDENTIAL_FILES: &[&str] = &["Login Data", "Web Data"];

const WEB_DATA_FILE: &str = "Web Data";

const SHRED_CHUNK: usize = 64 * 1024;

const MAX_BACKUP_SUFFIX: u32 = 1000;

#[derive(Debug, Clone)]
pub struct WipeOptions {
    /// Directory that receives the timestamped backup folder
    pub backup_root: PathBuf,
    /// Also remove `Login Data` and `Web Data`
    pub include_credentials: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WipeOutcome {
    Completed,
    /// `History` did not exist; nothing was touched
    NothingToRemove,
    RolledBack { error: String, restored: bool },
}

#[derive(Debug, Clone, Serialize)]
pub struct WipeReport {
    pub history_file: PathBuf,
    pub backup_dir: Option<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub vacuumed: Option<PathBuf>,
    pub cache_cleared: bool,
    pub outcome: WipeOutcome,
}

impl WipeReport {
    fn new(history_file: PathBuf) -> Self {
        Self {
            history_file,
            backup_dir: None,
            removed: Vec::new(),
            vacuumed: None,
            cache_cleared: false,
            outcome: WipeOutcome::Completed,
        }
    }
}

pub struct HistoryRemover {
    location: ProfileLocation,
    options: WipeOptions,
}

impl HistoryRemover {
    pub fn new(location: ProfileLocation, options: WipeOptions) -> Self {
        Self { location, options }
    }

    fn related_paths(&self) -> Vec<PathBuf> {
        let profile = self.location.profile_dir();
        let mut names: Vec<&str> = RELATED_FILES.to_vec();
        if self.options.include_credentials {
            names.extend_from_slice(CREDENTIAL_FILES);
        }
        names.into_iter().map(|name| profile.join(name)).collect()
    }

    /// Run the full removal sequence.
    ///
    /// Errors before anything destructive happens (backup failures) are
    /// returned as `Err`. Failures afterwards are rolled back and reported in
    /// the outcome.
    pub fn run(&self) -> Result<WipeReport> {
        let history_file = self.location.history_file();
        let mut report = WipeReport::new(history_file.clone());

        tracing::info!(
            profile = %self.location.profile_dir().display(),
            "Starting history removal"
        );

        if !history_file.exists() {
            tracing::warn!(path = %history_file.display(), "History file not found");
            report.outcome = WipeOutcome::NothingToRemove;
            return Ok(report);
        }

        let backup_dir = create_backup_dir(&self.options.backup_root)?;
        let backed_up = self.create_backup(&history_file, &backup_dir)?;
        report.backup_dir = Some(backup_dir.clone());

        if let Err(e) = self.remove_all(&history_file, &mut report) {
            tracing::error!(error = %e, "History removal failed, restoring backup");
            let restored = restore_backup(&backup_dir, &backed_up, self.location.profile_dir());
            report.outcome = WipeOutcome::RolledBack {
                error: e.to_string(),
                restored,
            };
            return Ok(report);
        }

        tracing::info!(removed = report.removed.len(), "History removal completed");
        Ok(report)
    }

    /// Copy `History` and every present related path into `backup_dir`.
    /// Returns the file names that were backed up.
    fn create_backup(&self, history_file: &Path, backup_dir: &Path) -> Result<Vec<String>> {
        let mut backed_up = Vec::new();
        let candidates = std::iter::once(history_file.to_path_buf()).chain(self.related_paths());
        for source in candidates.filter(|p| p.exists()) {
            let Some(name) = source.file_name() else {
                continue;
            };
            copy_recursive(&source, &backup_dir.join(name))
                .map_err(|e| HistoryError::Backup(format!("{}: {e}", source.display())))?;
            backed_up.push(name.to_string_lossy().into_owned());
        }

        tracing::info!(
            path = %backup_dir.display(),
            files = backed_up.len(),
            "Backup created"
        );
        Ok(backed_up)
    }

    fn remove_all(&self, history_file: &Path, report: &mut WipeReport) -> Result<()> {
        shred_file(history_file)?;
        report.removed.push(history_file.to_path_buf());

        for path in self.related_paths() {
            if path.is_file() {
                shred_file(&path)?;
            } else if path.is_dir() {
                fs::remove_dir_all(&path)?;
                tracing::info!(path = %path.display(), "Removed directory");
            } else {
                continue;
            }
            report.removed.push(path);
        }

        let web_data = self.location.profile_dir().join(WEB_DATA_FILE);
        if web_data.is_file() {
            vacuum_database(&web_data)?;
            report.vacuumed = Some(web_data);
        }

        report.cache_cleared = clear_cache(&self.location.cache_dir())?;
        Ok(())
    }
}

/// Overwrite a file with random bytes, flush it to disk and delete it
pub fn shred_file(path: &Path) -> Result<()> {
    let len = fs::metadata(path)?.len();

    {
        let mut file = OpenOptions::new().write(true).open(path)?;
        let mut buf = vec![0u8; SHRED_CHUNK];
        let mut remaining = len;
        while remaining > 0 {
            let n = remaining.min(SHRED_CHUNK as u64) as usize;
            OsRng.fill_bytes(&mut buf[..n]);
            file.write_all(&buf[..n])?;
            remaining -= n as u64;
        }
        file.sync_all()?;
    }

    fs::remove_file(path)?;
    tracing::info!(path = %path.display(), bytes = len, "File shredded");
    Ok(())
}

fn vacuum_database(path: &Path) -> Result<()> {
    let conn = rusqlite::Connection::open(path)?;
    conn.execute_batch("VACUUM")?;
    conn.close().map_err(|(_, e)| e)?;

    tracing::info!(path = %path.display(), "Vacuumed database");
    Ok(())
}

/// Empty the cache directory. Returns false when it does not exist.
fn clear_cache(cache_dir: &Path) -> Result<bool> {
    if !cache_dir.exists() {
        tracing::warn!(path = %cache_dir.display(), "Cache directory not found");
        return Ok(false);
    }

    fs::remove_dir_all(cache_dir)?;
    fs::create_dir_all(cache_dir)?;
    tracing::info!(path = %cache_dir.display(), "Cleared cache directory");
    Ok(true)
}

/// Best-effort restore of every backed up entry. Returns whether all succeeded.
fn restore_backup(backup_dir: &Path, names: &[String], profile_dir: &Path) -> bool {
    let mut all_restored = true;

    for name in names {
        let source = backup_dir.join(name);
        let target = profile_dir.join(name);
        match copy_recursive(&source, &target) {
            Ok(()) => tracing::info!(path = %target.display(), "Restored from backup"),
            Err(e) => {
                all_restored = false;
                tracing::error!(path = %target.display(), error = %e, "Failed to restore backup");
            }
        }
    }

    all_restored
}

fn copy_recursive(source: &Path, target: &Path) -> std::io::Result<()> {
    if source.is_dir() {
        fs::create_dir_all(target)?;
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &target.join(entry.file_name()))?;
        }
    } else {
        fs::copy(source, target)?;
    }
    Ok(())
}

/// Create a fresh `Aluminum_History_Backup_<unix time>` folder under `root`.
/// Wipes within the same second get a `_1`, `_2`, ... suffix; an existing
/// folder is never reused.
fn create_backup_dir(root: &Path) -> Result<PathBuf> {
    let backup_err = |path: &Path, e: std::io::Error| {
        HistoryError::Backup(format!("{}: {e}", path.display()))
    };
    fs::create_dir_all(root).map_err(|e| backup_err(root, e))?;

    let base = format!("Aluminum_History_Backup_{}", Utc::now().timestamp());
    for suffix in 0..MAX_BACKUP_SUFFIX {
        let candidate = match suffix {
            0 => root.join(&base),
            n => root.join(format!("{base}_{n}")),
        };
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(backup_err(&candidate, e)),
        }
    }

    Err(HistoryError::Backup(format!(
        "{}: no free backup folder name for {base}",
        root.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        _root: tempfile::TempDir,
        location: ProfileLocation,
        backup_root: PathBuf,
    }

    fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let profile = root.path().join("User Data").join("Default");
        fs::create_dir_all(&profile).unwrap();
        fs::write(profile.join("History"), b"history-bytes").unwrap();
        fs::write(profile.join("Visited Links"), b"links").unwrap();
        fs::create_dir_all(profile.join("Shortcuts")).unwrap();
        fs::write(profile.join("Shortcuts").join("entry"), b"shortcut").unwrap();
        fs::write(profile.join("Login Data"), b"logins").unwrap();

        let cache = root.path().join("User Data").join("Cache");
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join("data_0"), b"cached").unwrap();

        let backup_root = root.path().join("backups");
        Fixture {
            location: ProfileLocation::new(profile),
            backup_root,
            _root: root,
        }
    }

    fn remover(fixture: &Fixture, include_credentials: bool) -> HistoryRemover {
        HistoryRemover::new(
            fixture.location.clone(),
            WipeOptions {
                backup_root: fixture.backup_root.clone(),
                include_credentials,
            },
        )
    }

    #[test]
    fn test_shred_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        fs::write(&path, vec![7u8; SHRED_CHUNK * 2 + 13]).unwrap();

        shred_file(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_successful_wipe() {
        let fixture = fixture();
        let report = remover(&fixture, false).run().unwrap();

        assert_eq!(report.outcome, WipeOutcome::Completed);
        let profile = fixture.location.profile_dir();
        assert!(!profile.join("History").exists());
        assert!(!profile.join("Visited Links").exists());
        assert!(!profile.join("Shortcuts").exists());
        assert!(profile.join("Login Data").exists());
        assert_eq!(report.removed.len(), 3);

        let cache = fixture.location.cache_dir();
        assert!(report.cache_cleared);
        assert!(cache.exists());
        assert_eq!(fs::read_dir(&cache).unwrap().count(), 0);

        let backup_dir = report.backup_dir.unwrap();
        assert_eq!(fs::read(backup_dir.join("History")).unwrap(), b"history-bytes");
        assert!(backup_dir.join("Shortcuts").join("entry").exists());
    }

    #[test]
    fn test_credentials_removed_on_request() {
        let fixture = fixture();
        let report = remover(&fixture, true).run().unwrap();

        assert_eq!(report.outcome, WipeOutcome::Completed);
        assert!(!fixture.location.profile_dir().join("Login Data").exists());
    }

    #[test]
    fn test_missing_history_is_noop() {
        let fixture = fixture();
        fs::remove_file(fixture.location.history_file()).unwrap();

        let report = remover(&fixture, false).run().unwrap();
        assert_eq!(report.outcome, WipeOutcome::NothingToRemove);
        assert!(report.backup_dir.is_none());
        assert!(fixture.location.profile_dir().join("Visited Links").exists());
    }

    #[test]
    fn test_failure_restores_backup() {
        let fixture = fixture();
        // Not a SQLite file, so the vacuum step fails after History is gone
        fs::write(
            fixture.location.profile_dir().join("Web Data"),
            vec![b'x'; 4096],
        )
        .unwrap();

        let report = remover(&fixture, false).run().unwrap();
        match &report.outcome {
            WipeOutcome::RolledBack { restored, .. } => assert!(*restored),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let profile = fixture.location.profile_dir();
        assert_eq!(fs::read(profile.join("History")).unwrap(), b"history-bytes");
        assert_eq!(fs::read(profile.join("Visited Links")).unwrap(), b"links");
        assert!(profile.join("Shortcuts").join("entry").exists());
    }

    #[test]
    fn test_back_to_back_wipes_keep_both_backups() {
        let fixture = fixture();
        let first = remover(&fixture, false).run().unwrap();

        let history = fixture.location.history_file();
        fs::write(&history, b"second-history").unwrap();
        let second = remover(&fixture, false).run().unwrap();

        let first_dir = first.backup_dir.unwrap();
        let second_dir = second.backup_dir.unwrap();
        assert_ne!(first_dir, second_dir);
        assert_eq!(fs::read(first_dir.join("History")).unwrap(), b"history-bytes");
        assert_eq!(fs::read(second_dir.join("History")).unwrap(), b"second-history");
    }

    #[test]
    fn test_backup_dir_skips_existing_folder() {
        let root = tempfile::tempdir().unwrap();
        let first = create_backup_dir(root.path()).unwrap();
        fs::write(first.join("History"), b"keep").unwrap();

        let second = create_backup_dir(root.path()).unwrap();
        assert_ne!(first, second);
        assert!(second.exists());
        assert_eq!(fs::read(first.join("History")).unwrap(), b"keep");
    }
}
