//! Durable storage for the single bearer credential.
//!
//! The store is a capability handed to the gateway and session manager, so
//! tests can swap in [`MemoryTokenStore`] while the CLI uses a file or the OS
//! keychain. Nothing here tracks expiry; only the server decides validity.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use keyring::Entry;
use thiserror::Error;
use tracing::debug;

/// Well-known key the credential is stored under
pub const TOKEN_KEY: &str = "token";

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

/// Keychain service name
const SERVICE_NAME: &str = "leetreview";

/// Opaque bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Token storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token storage is corrupt: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// `save`/`load`/`clear` over one credential slot.
pub trait TokenStore: Send + Sync {
    fn save(&self, credential: &Credential) -> Result<(), StoreError>;

    fn load(&self) -> Result<Option<Credential>, StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

/// In-process store; forgets everything when dropped
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(Credential::new(token))),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Credential>> {
        // A poisoned slot still holds a valid Option
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        *self.slot() = Some(credential.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<Credential>, StoreError> {
        Ok(self.slot().clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot() = None;
        Ok(())
    }
}

/// Key/value JSON file in the data directory, laid out like browser local
/// storage so other keys written next to the token survive.
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(STORAGE_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if entries.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            create_private_dir(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        let mut file = open_private(&self.path)?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }
}

/// Create `dir` (and parents) readable only by the current user
#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

/// Truncate or create `path` with owner-only permissions. A file left with
/// wider permissions by an older version is tightened.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create(true).truncate(true).open(path)
}

impl TokenStore for FileTokenStore {
    fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_entries()?;
        entries.insert(TOKEN_KEY.to_string(), credential.as_str().to_string());
        self.write_entries(&entries)?;
        debug!(path = ?self.path, "Token saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<Credential>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_entries()?;
        Ok(entries
            .remove(TOKEN_KEY)
            .filter(|t| !t.is_empty())
            .map(Credential::from))
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_entries()?;
        if entries.remove(TOKEN_KEY).is_some() {
            self.write_entries(&entries)?;
            debug!(path = ?self.path, "Token cleared");
        }
        Ok(())
    }
}

/// OS keychain entry holding the token
pub struct KeyringTokenStore {
    account: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self {
            account: TOKEN_KEY.to_string(),
        }
    }

    /// Separate keychain slot, e.g. per API host
    pub fn for_account(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<Entry, StoreError> {
        Ok(Entry::new(SERVICE_NAME, &self.account)?)
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        self.entry()?.set_password(credential.as_str())?;
        Ok(())
    }

    fn load(&self) -> Result<Option<Credential>, StoreError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(Credential::from(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
