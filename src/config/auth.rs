//! File-backed API key storage for direct-API profiles.
//!
//! Profiles never hold the key itself, only a generated key id that
//! addresses an entry in `credentials.json`.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{ClauderockError, Result};

const CREDENTIAL_FILE_VERSION: u32 = 1;

/// Stores API keys under generated ids.
#[derive(Debug, Clone)]
pub struct ApiKeyStore {
    path: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CredentialFile {
    version: u32,
    keys: BTreeMap<String, String>,
}

impl ApiKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `{home}/credentials.json`.
    pub fn in_home(home: &Path) -> Self {
        Self::new(home.join("credentials.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A fresh key id.
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn store(&self, id: &str, api_key: &str) -> Result<()> {
        let mut file = self.read()?;
        file.keys.insert(id.to_string(), api_key.to_string());
        self.write(&file)
    }

    pub fn get(&self, id: &str) -> Result<String> {
        self.read()?.keys.remove(id).ok_or_else(|| {
            ClauderockError::Authentication(format!(
                "no API key stored for id {id}; run 'clauderock manage config set api-key <key>'"
            ))
        })
    }

    /// Remove a key. Removing an unknown id is not an error.
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut file = self.read()?;
        if file.keys.remove(id).is_some() {
            self.write(&file)?;
        }
        Ok(())
    }

    /// Copy the key stored under `id` to a new id and return the new id.
    pub fn duplicate(&self, id: &str) -> Result<String> {
        let key = self.get(id)?;
        let new_id = Self::generate_id();
        self.store(&new_id, &key)?;
        Ok(new_id)
    }

    fn read(&self) -> Result<CredentialFile> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CredentialFile {
                    version: CREDENTIAL_FILE_VERSION,
                    keys: BTreeMap::new(),
                })
            }
            Err(err) => return Err(ClauderockError::Io(err)),
        };

        let file: CredentialFile = serde_json::from_str(&raw)?;
        if file.version != CREDENTIAL_FILE_VERSION {
            return Err(ClauderockError::Configuration(format!(
                "Unsupported credentials file version {} at {}",
                file.version,
                self.path.display()
            )));
        }
        Ok(file)
    }

    fn write(&self, file: &CredentialFile) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(file)?;
        atomic_write(&self.path, &serialized, 0o600)
    }
}

/// Write `data` to a temp file next to `path`, then rename it into place.
pub(crate) fn atomic_write(path: &Path, data: &[u8], mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file_name = path.file_name().ok_or_else(|| {
        ClauderockError::Configuration(format!("path {} has no file name", path.display()))
    })?;

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_name = format!(
        ".{}.tmp-{}-{nonce}",
        file_name.to_string_lossy(),
        std::process::id()
    );
    let temp_path = path.with_file_name(temp_name);

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;

    let write_result = (|| -> std::io::Result<()> {
        let mut temp_file = options.open(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.sync_all()?;
        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(ClauderockError::Io(err));
    }

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(ClauderockError::Io(err));
    }

    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;

    Ok(())
}
