//! Tool configuration

use aluminum_history::{ProfileLocation, WipeOptions};
use aluminum_storage::Database;
use aluminum_telemetry::TelemetrySettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::Result;

const DATABASE_FILE: &str = "aluminum_data.db";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WipeConfig {
    /// Also remove saved logins and autofill data
    pub include_credentials: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the local data store
    pub data_dir: PathBuf,
    /// Data store location; defaults to `<data_dir>/aluminum_data.db`
    pub database_path: Option<PathBuf>,
    /// Browser profile override; detected per platform when unset
    pub profile_dir: Option<PathBuf>,
    /// Where history backups are written before a wipe
    pub backup_root: PathBuf,
    pub wipe: WipeConfig,
    pub telemetry: TelemetrySettings,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        let backup_root = dirs::home_dir().unwrap_or_else(|| data_dir.clone());

        Self {
            data_dir,
            database_path: None,
            profile_dir: None,
            backup_root,
            wipe: WipeConfig::default(),
            telemetry: TelemetrySettings::default(),
        }
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Aluminum"))
            .unwrap_or_else(|| PathBuf::from(".aluminum"))
    }

    /// Load from `path`, or from the default location when present.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) if !path.exists() => {
                return Err(CoreError::ConfigNotFound(path.to_path_buf()))
            }
            Some(path) => path.to_path_buf(),
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => path,
                None => {
                    tracing::debug!("No configuration file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DATABASE_FILE))
    }

    /// Open the local data store, creating its directory if needed
    pub fn open_database(&self) -> Result<Database> {
        let path = self.database_path();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Database::open(&path)?)
    }

    pub fn profile_location(&self) -> Result<ProfileLocation> {
        Ok(ProfileLocation::resolve(self.profile_dir.as_deref())?)
    }

    pub fn wipe_options(&self, include_credentials: bool) -> WipeOptions {
        WipeOptions {
            backup_root: self.backup_root.clone(),
            include_credentials: include_credentials || self.wipe.include_credentials,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::default_data_dir())
    }
}

/// `<config_dir>/aluminum/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("aluminum").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/tmp/aluminum-data"

[telemetry]
upload_enabled = true
endpoint = "https://telemetry.example.test/report"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/aluminum-data"));
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/aluminum-data/aluminum_data.db")
        );
        assert!(config.telemetry.upload_enabled);
        assert!(config.telemetry.anonymize);
        assert!(!config.telemetry.lookup_public_ip);
        assert!(!config.wipe.include_credentials);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(CoreError::ConfigNotFound(p)) if p == missing
        ));
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "data_dir = [").unwrap();
        assert!(matches!(Config::load(Some(&path)), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_wipe_options_merge_flag() {
        let mut config = Config::new(PathBuf::from("/data"));
        config.backup_root = PathBuf::from("/backups");
        assert!(!config.wipe_options(false).include_credentials);
        assert!(config.wipe_options(true).include_credentials);

        config.wipe.include_credentials = true;
        let options = config.wipe_options(false);
        assert!(options.include_credentials);
        assert_eq!(options.backup_root, PathBuf::from("/backups"));
    }

    #[test]
    fn test_open_database_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().join("nested").join("data"));

        let db = config.open_database().unwrap();
        assert_eq!(db.path(), Some(config.database_path().as_path()));
        assert!(config.database_path().exists());
    }
}
