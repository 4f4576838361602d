//! Persistent credential storage.
//!
//! Credentials outlive the process: a login in one `shop-cli` invocation is
//! picked up by the next one's hydration pass. The session store is the only
//! writer; the HTTP adapter only reads.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use onlineshop_core::{Credentials, CustomerId, deserialize_optional_lenient_id};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from reading or writing persisted credentials.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The credential file could not be read, written, or removed.
    #[error("credential file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The credential file is not valid JSON.
    #[error("credential file is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Key/value storage for the `token` + `userId` pair.
pub trait CredentialStore: Send + Sync {
    /// Read the persisted credentials, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn load(&self) -> Result<Option<Credentials>, StorageError>;

    /// Persist credentials, replacing any previous pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn save(&self, credentials: &Credentials) -> Result<(), StorageError>;

    /// Remove persisted credentials. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if existing credentials cannot be removed.
    fn clear(&self) -> Result<(), StorageError>;
}

/// On-disk shape. Both fields are optional so a half-written file can be
/// recognised and ignored instead of failing to parse.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Persisted {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_lenient_id")]
    user_id: Option<CustomerId>,
}

/// Credentials stored as a small JSON file.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write never leaves a truncated file behind. On unix the file
/// is created with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by `path`. Nothing is touched until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }

        let persisted: Persisted = serde_json::from_str(&raw)?;
        match (persisted.token, persisted.user_id) {
            (Some(token), Some(user_id)) if !token.is_empty() => {
                Ok(Some(Credentials::new(SecretString::from(token), user_id)))
            }
            (None, None) => Ok(None),
            _ => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Credential file holds only one of token/userId, ignoring it"
                );
                Ok(None)
            }
        }
    }

    fn save(&self, credentials: &Credentials) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let body = serde_json::to_vec_pretty(&Persisted {
            token: Some(credentials.token().expose_secret().to_string()),
            user_id: Some(credentials.user_id()),
        })?;

        let temp_path = self.temp_path();
        {
            let mut file = open_private(&temp_path).map_err(|e| self.io_error(e))?;
            file.write_all(&body).map_err(|e| self.io_error(e))?;
            file.sync_all().map_err(|e| self.io_error(e))?;
        }
        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            self.io_error(e)
        })?;

        tracing::debug!(path = %self.path.display(), "Saved credentials");
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Cleared credentials");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; a leftover temp file keeps its old bits.
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// In-process store for tests and embedders that manage persistence elsewhere.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<Option<Credentials>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `credentials`.
    #[must_use]
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: Mutex::new(Some(credentials)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credentials>, StorageError> {
        Ok(self
            .credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, credentials: &Credentials) -> Result<(), StorageError> {
        *self
            .credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self
            .credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn creds(token: &str, id: i64) -> Credentials {
        Credentials::new(SecretString::from(token), CustomerId::new(id))
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested/credentials.json"));

        store.save(&creds("tok-1", 7)).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.token().expose_secret(), "tok-1");
        assert_eq!(loaded.user_id(), CustomerId::new(7));

        store.save(&creds("tok-2", 8)).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.token().expose_secret(), "tok-2");
        assert!(!store.temp_path().exists());

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_wire_format() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.save(&creds("abc", 7)).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["token"], "abc");
        assert_eq!(raw["userId"], 7);
    }

    #[test]
    fn test_file_store_accepts_string_user_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"token": "abc", "userId": "12"}"#).unwrap();

        let loaded = FileCredentialStore::new(&path).load().unwrap().unwrap();
        assert_eq!(loaded.user_id(), CustomerId::new(12));
    }

    #[test]
    fn test_file_store_partial_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileCredentialStore::new(&path);

        std::fs::write(&path, r#"{"token": "abc"}"#).unwrap();
        assert!(store.load().unwrap().is_none());

        std::fs::write(&path, r#"{"userId": 3}"#).unwrap();
        assert!(store.load().unwrap().is_none());

        std::fs::write(&path, r#"{"token": "", "userId": 3}"#).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileCredentialStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Format(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.save(&creds("abc", 1)).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&creds("abc", 2)).unwrap();
        assert_eq!(store.load().unwrap().unwrap().user_id(), CustomerId::new(2));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
