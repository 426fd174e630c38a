//! Profile persistence.

use std::fs;
use std::path::{Path, PathBuf};

use super::auth::{atomic_write, ApiKeyStore};
use super::profile::{ProfileConfig, ProfileType};
use super::version::is_dev;
use crate::error::{ClauderockError, Result};

/// Name of the profile that always exists and cannot be removed.
pub const DEFAULT_PROFILE: &str = "default";

const PROFILE_MODE: u32 = 0o644;

/// Load and save named profiles.
pub trait ConfigStore: Send + Sync {
    fn load(&self, name: &str) -> Result<ProfileConfig>;
    fn save(&self, name: &str, config: &ProfileConfig) -> Result<()>;
}

/// One JSON file per profile under `{home}/profiles`, plus a pointer file
/// naming the active profile.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    base_dir: PathBuf,
}

impl FileProfileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn profiles_dir(&self) -> PathBuf {
        self.base_dir.join("profiles")
    }

    fn current_file(&self) -> PathBuf {
        self.base_dir.join("current-profile.txt")
    }

    fn legacy_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    fn profile_path(&self, name: &str) -> Result<PathBuf> {
        validate_profile_name(name)?;
        Ok(self.profiles_dir().join(format!("{name}.json")))
    }

    /// Profile names, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(self.profiles_dir()) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(ClauderockError::Io(err)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            if let Some(name) = file_name.to_string_lossy().strip_suffix(".json") {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.profile_path(name)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// The active profile name, `default` when none was chosen.
    pub fn current(&self) -> Result<String> {
        match fs::read_to_string(self.current_file()) {
            Ok(raw) => {
                let name = raw.trim();
                Ok(if name.is_empty() {
                    DEFAULT_PROFILE.to_string()
                } else {
                    name.to_string()
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(DEFAULT_PROFILE.to_string())
            }
            Err(err) => Err(ClauderockError::Io(err)),
        }
    }

    pub fn set_current(&self, name: &str) -> Result<()> {
        if !self.exists(name) {
            return Err(profile_missing(name));
        }
        atomic_write(&self.current_file(), name.as_bytes(), PROFILE_MODE)
    }

    /// Delete a profile and, for API profiles, its stored key.
    pub fn delete(&self, name: &str, keys: &ApiKeyStore) -> Result<()> {
        if name == DEFAULT_PROFILE {
            return Err(ClauderockError::InvalidArgument(
                "cannot delete default profile".into(),
            ));
        }
        if self.current()? == name {
            return Err(ClauderockError::InvalidArgument(
                "cannot delete active profile, switch to another profile first".into(),
            ));
        }

        let config = self.load(name)?;
        if config.effective_type() == ProfileType::Api && !config.api_key_id.is_empty() {
            if let Err(err) = keys.delete(&config.api_key_id) {
                tracing::warn!(profile = name, error = %err, "failed to delete stored API key");
            }
        }

        fs::remove_file(self.profile_path(name)?)?;
        Ok(())
    }

    /// Rename a profile, moving the active pointer along with it.
    pub fn rename(&self, old: &str, new: &str) -> Result<()> {
        if old == DEFAULT_PROFILE {
            return Err(ClauderockError::InvalidArgument(
                "cannot rename default profile".into(),
            ));
        }
        if !self.exists(old) {
            return Err(profile_missing(old));
        }
        if self.exists(new) {
            return Err(profile_exists(new));
        }

        fs::rename(self.profile_path(old)?, self.profile_path(new)?)?;
        if self.current()? == old {
            self.set_current(new)?;
        }
        Ok(())
    }

    /// Copy a profile. API profiles get their own copy of the stored key.
    pub fn copy(&self, source: &str, dest: &str, keys: &ApiKeyStore) -> Result<()> {
        if self.exists(dest) {
            return Err(profile_exists(dest));
        }
        let mut config = self.load(source)?;
        if config.effective_type() == ProfileType::Api && !config.api_key_id.is_empty() {
            config.api_key_id = keys.duplicate(&config.api_key_id)?;
        }
        self.save(dest, &config)
    }

    /// Import a single-file `config.json` from before profiles existed.
    ///
    /// Runs once: the legacy file is renamed to `config.json.bak` and an
    /// existing `default` profile is never overwritten.
    pub fn import_legacy(&self) -> Result<bool> {
        let legacy = self.legacy_file();
        if !legacy.is_file() || self.exists(DEFAULT_PROFILE) {
            return Ok(false);
        }

        let raw = fs::read_to_string(&legacy)?;
        let config: ProfileConfig = serde_json::from_str(&raw).map_err(|e| {
            ClauderockError::Configuration(format!("failed to parse legacy config: {e}"))
        })?;
        self.save(DEFAULT_PROFILE, &config)?;
        self.set_current(DEFAULT_PROFILE)?;

        let mut backup = legacy.clone().into_os_string();
        backup.push(".bak");
        if let Err(err) = fs::rename(&legacy, &backup) {
            tracing::warn!(error = %err, "could not rename legacy config to .bak");
        }
        tracing::info!("imported legacy config.json as the default profile");
        Ok(true)
    }

    /// Load the active profile, creating a fresh one when it does not exist yet.
    ///
    /// Returns the profile name alongside its (unmigrated) contents.
    pub fn load_or_create_current(&self, running_version: &str) -> Result<(String, ProfileConfig)> {
        self.import_legacy()?;
        let name = self.current()?;
        if self.exists(&name) {
            let config = self.load(&name)?;
            return Ok((name, config));
        }

        let version = if is_dev(running_version) {
            ""
        } else {
            running_version
        };
        let config = ProfileConfig::fresh(version);
        self.save(&name, &config)?;
        self.set_current(&name)?;
        tracing::info!(profile = %name, "created new profile");
        Ok((name, config))
    }
}

impl ConfigStore for FileProfileStore {
    fn load(&self, name: &str) -> Result<ProfileConfig> {
        let path = self.profile_path(name)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(profile_missing(name))
            }
            Err(err) => return Err(ClauderockError::Io(err)),
        };
        serde_json::from_str(&raw).map_err(|e| {
            ClauderockError::Configuration(format!("failed to parse profile '{name}': {e}"))
        })
    }

    fn save(&self, name: &str, config: &ProfileConfig) -> Result<()> {
        let path = self.profile_path(name)?;
        let serialized = serde_json::to_vec_pretty(config)?;
        atomic_write(&path, &serialized, PROFILE_MODE)
    }
}

/// Reject names that would escape the profiles directory.
pub fn validate_profile_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ClauderockError::InvalidArgument(format!(
            "invalid profile name '{name}' (use letters, digits, '-', '_' or '.')"
        )))
    }
}

fn profile_missing(name: &str) -> ClauderockError {
    ClauderockError::Configuration(format!("profile '{name}' does not exist"))
}

fn profile_exists(name: &str) -> ClauderockError {
    ClauderockError::InvalidArgument(format!("profile '{name}' already exists"))
}
