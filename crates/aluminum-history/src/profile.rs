//! Browser profile location

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::HistoryError;
use crate::Result;

pub const HISTORY_FILE: &str = "History";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Result<Self> {
        if cfg!(target_os = "windows") {
            Ok(Platform::Windows)
        } else if cfg!(target_os = "macos") {
            Ok(Platform::MacOs)
        } else if cfg!(target_os = "linux") {
            Ok(Platform::Linux)
        } else {
            Err(HistoryError::UnsupportedPlatform(
                std::env::consts::OS.to_string(),
            ))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::MacOs => "macos",
            Platform::Linux => "linux",
        }
    }

    /// Default profile directory below the platform's base directory
    ///
    /// `base` is `%LOCALAPPDATA%` on Windows, `~/Library/Application Support`
    /// on macOS and `~/.config` on Linux.
    pub fn profile_dir_in(&self, base: &Path) -> PathBuf {
        match self {
            Platform::Windows => base.join("Aluminum").join("User Data").join("Default"),
            Platform::MacOs => base.join("Aluminum").join("Default"),
            Platform::Linux => base.join("aluminum").join("Default"),
        }
    }

    fn base_dir(&self) -> Result<PathBuf> {
        match self {
            Platform::Windows => {
                dirs::data_local_dir().ok_or(HistoryError::MissingDirectory("local app data"))
            }
            Platform::MacOs => dirs::home_dir()
                .map(|home| home.join("Library").join("Application Support"))
                .ok_or(HistoryError::MissingDirectory("home")),
            Platform::Linux => dirs::home_dir()
                .map(|home| home.join(".config"))
                .ok_or(HistoryError::MissingDirectory("home")),
        }
    }
}

/// A browser profile directory and the files inside it we care about
#[derive(Debug, Clone)]
pub struct ProfileLocation {
    profile_dir: PathBuf,
}

impl ProfileLocation {
    pub fn new(profile_dir: impl Into<PathBuf>) -> Self {
        Self {
            profile_dir: profile_dir.into(),
        }
    }

    /// Default profile for the running platform
    pub fn detect() -> Result<Self> {
        let platform = Platform::current()?;
        let base = platform.base_dir()?;
        let location = Self::new(platform.profile_dir_in(&base));

        tracing::debug!(
            platform = platform.as_str(),
            profile = %location.profile_dir.display(),
            "Resolved profile directory"
        );
        Ok(location)
    }

    /// Use `override_dir` when configured, otherwise detect
    pub fn resolve(override_dir: Option<&Path>) -> Result<Self> {
        match override_dir {
            Some(dir) => Ok(Self::new(dir)),
            None => Self::detect(),
        }
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    pub fn history_file(&self) -> PathBuf {
        self.profile_dir.join(HISTORY_FILE)
    }

    /// Cache lives next to the profile, one level up
    pub fn cache_dir(&self) -> PathBuf {
        self.profile_dir
            .parent()
            .unwrap_or(&self.profile_dir)
            .join("Cache")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_dirs() {
        let base = Path::new("/base");
        assert_eq!(
            Platform::Windows.profile_dir_in(base),
            PathBuf::from("/base/Aluminum/User Data/Default")
        );
        assert_eq!(
            Platform::MacOs.profile_dir_in(base),
            PathBuf::from("/base/Aluminum/Default")
        );
        assert_eq!(
            Platform::Linux.profile_dir_in(base),
            PathBuf::from("/base/aluminum/Default")
        );
    }

    #[test]
    fn test_location_paths() {
        let location = ProfileLocation::new("/home/user/.config/aluminum/Default");
        assert_eq!(
            location.history_file(),
            PathBuf::from("/home/user/.config/aluminum/Default/History")
        );
        assert_eq!(
            location.cache_dir(),
            PathBuf::from("/home/user/.config/aluminum/Cache")
        );
    }

    #[test]
    fn test_resolve_prefers_override() {
        let location = ProfileLocation::resolve(Some(Path::new("/tmp/profile"))).unwrap();
        assert_eq!(location.profile_dir(), Path::new("/tmp/profile"));
    }
}
