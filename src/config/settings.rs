//! Host settings: `{home}/settings.toml` layered under `CLAUDEROCK_*` env vars.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ClauderockError, Result};

pub const HOME_ENV: &str = "CLAUDEROCK_HOME";
pub const CLAUDE_PATH_ENV: &str = "CLAUDEROCK_CLAUDE_PATH";
pub const VALIDATION_TIMEOUT_ENV: &str = "CLAUDEROCK_VALIDATION_TIMEOUT_SECS";

const DEFAULT_VALIDATION_TIMEOUT_SECS: u64 = 15;

/// `~/.clauderock`, or `$CLAUDEROCK_HOME` when set.
pub fn default_home_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".clauderock"))
        .unwrap_or_else(|| PathBuf::from(".clauderock"))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Explicit path to the `claude` binary.
    pub claude_path: Option<PathBuf>,
    /// Upper bound on the background model validation.
    pub validation_timeout_secs: u64,
    /// Where session records are appended.
    pub usage_log: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            claude_path: None,
            validation_timeout_secs: DEFAULT_VALIDATION_TIMEOUT_SECS,
            usage_log: None,
        }
    }
}

impl Settings {
    /// Read `settings.toml` in `home` (if present), then apply env overrides.
    pub fn load(home: &Path) -> Result<Self> {
        let path = home.join("settings.toml");
        let mut settings = match std::fs::read_to_string(&path) {
            Ok(raw) => toml::from_str(&raw).map_err(|e| {
                ClauderockError::Configuration(format!("invalid {}: {e}", path.display()))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(ClauderockError::Io(err)),
        };
        settings.apply_env()?;
        Ok(settings)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(path) = std::env::var_os(CLAUDE_PATH_ENV).filter(|v| !v.is_empty()) {
            self.claude_path = Some(PathBuf::from(path));
        }
        if let Ok(raw) = std::env::var(VALIDATION_TIMEOUT_ENV) {
            self.validation_timeout_secs = raw.trim().parse().map_err(|_| {
                ClauderockError::Configuration(format!(
                    "{VALIDATION_TIMEOUT_ENV} must be a number of seconds, got '{raw}'"
                ))
            })?;
        }
        Ok(())
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_secs(self.validation_timeout_secs)
    }

    pub fn usage_log_path(&self, home: &Path) -> PathBuf {
        self.usage_log
            .clone()
            .unwrap_or_else(|| home.join("usage.jsonl"))
    }

    /// The configured `claude` binary, else the first one on `PATH`.
    pub fn claude_binary(&self) -> Result<PathBuf> {
        if let Some(path) = &self.claude_path {
            return Ok(path.clone());
        }
        which::which("claude").map_err(|e| {
            ClauderockError::Launch(format!("claude binary not found in PATH: {e}"))
        })
    }
}
