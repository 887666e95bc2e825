use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Credential file name in cache directory
const CREDENTIAL_FILE: &str = "credential.json";

/// Keychain service name
const SERVICE_NAME: &str = "shelfdesk";

/// Keychain account the token is stored under. There is only ever one.
const KEYRING_ACCOUNT: &str = "session-token";

/// The session token together with the absolute instant it stops being valid.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.to_string(),
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// The token, if it has not expired yet.
    fn into_live_token(self) -> Option<String> {
        if self.is_expired() {
            None
        } else {
            Some(self.token)
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Persistence for the single session credential.
///
/// `load` returns the token only while it is unexpired, but never deletes an
/// expired value itself; removal happens through `save` (overwrite) or `clear`.
pub trait CredentialStore {
    /// Persist `token` until `expires_at`, replacing whatever was stored.
    fn save(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// The stored token, if present and unexpired.
    fn load(&self) -> Option<String>;

    /// Remove the stored credential immediately.
    fn clear(&self) -> Result<()>;
}

impl<T: CredentialStore + ?Sized> CredentialStore for Box<T> {
    fn save(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        (**self).save(token, expires_at)
    }

    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

// ============================================================================
// File backend
// ============================================================================

/// Stores the credential as JSON in the cache directory.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(CREDENTIAL_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read credential file")?;
        let credential =
            serde_json::from_str(&contents).context("Failed to parse credential file")?;
        Ok(Some(credential))
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&Credential::new(token, expires_at))?;
        std::fs::write(&self.path, contents).context("Failed to write credential file")?;
        Ok(())
    }

    fn load(&self) -> Option<String> {
        match self.read() {
            Ok(credential) => credential.and_then(Credential::into_live_token),
            Err(e) => {
                warn!(error = %e, path = ?self.path, "Ignoring unreadable credential file");
                None
            }
        }
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove credential file")?;
        }
        Ok(())
    }
}

// ============================================================================
// OS keychain backend
// ============================================================================

/// Stores the credential as a JSON string in the OS keychain.
pub struct KeyringCredentialStore {
    account: String,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self {
            account: KEYRING_ACCOUNT.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.account).context("Failed to create keyring entry")
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn save(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let contents = serde_json::to_string(&Credential::new(token, expires_at))?;
        self.entry()?
            .set_password(&contents)
            .context("Failed to store token in keychain")?;
        Ok(())
    }

    fn load(&self) -> Option<String> {
        let entry = match self.entry() {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Keychain unavailable");
                return None;
            }
        };
        match entry.get_password() {
            Ok(contents) => match serde_json::from_str::<Credential>(&contents) {
                Ok(credential) => credential.into_live_token(),
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed keychain credential");
                    None
                }
            },
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read token from keychain");
                None
            }
        }
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Keeps the credential in memory only; nothing survives the process.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw stored credential, expired or not.
    pub fn stored(&self) -> Option<Credential> {
        self.credential.lock().ok().and_then(|c| c.clone())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let mut slot = self
            .credential
            .lock()
            .map_err(|_| anyhow::anyhow!("Credential lock poisoned"))?;
        *slot = Some(Credential::new(token, expires_at));
        Ok(())
    }

    fn load(&self) -> Option<String> {
        self.stored().and_then(Credential::into_live_token)
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self
            .credential
            .lock()
            .map_err(|_| anyhow::anyhow!("Credential lock poisoned"))?;
        *slot = None;
        Ok(())
    }
}
