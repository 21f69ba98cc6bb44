//! Session state and credential persistence
//!
//! The session store owns the three persisted credential fields: email,
//! refresh token, and access token. They are created together by login,
//! the access token alone is replaced by refresh, and all three are
//! destroyed together by logout; partial credential sets never exist.
//!
//! Persistence is a seam: [`CredentialStore`] abstracts the backing
//! storage so embedders can keep credentials in memory, in a JSON file,
//! or in a platform keystore of their own.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use crate::error::{Error, Result};

/// The persisted credential set
///
/// Invariant: a `Credentials` value always carries all three fields; the
/// logged-in predicate is simply "a credential set is present".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email, kept for re-authentication prompts
    pub email: String,
    /// Long-lived opaque token exchanged for new access tokens
    pub refresh_token: String,
    /// Short-lived opaque bearer token for protected calls
    pub access_token: String,
}

/// Backing storage for the credential set
///
/// Implementations must treat the three fields as a unit: `save` replaces
/// the whole set, `clear` removes the whole set. Methods are synchronous;
/// the stored document is three strings, so blocking writes are fine even
/// on an async runtime.
pub trait CredentialStore: Send + Sync {
    /// Load the persisted credential set, if any.
    fn load(&self) -> Result<Option<Credentials>>;

    /// Persist the credential set, replacing any previous one.
    fn save(&self, credentials: &Credentials) -> Result<()>;

    /// Remove the persisted credential set.
    fn clear(&self) -> Result<()>;
}

/// In-memory credential store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credentials>>,
}

impl MemoryCredentialStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Credentials>> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credentials>> {
        Ok(self.lock().clone())
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        *self.lock() = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock() = None;
        Ok(())
    }
}

/// File-backed credential store
///
/// Stores the credential set as a single JSON document. Writes go through
/// a temporary file in the same directory followed by a rename, so a
/// crash mid-write can never leave a torn document on disk.
#[derive(Debug)]
pub struct JsonFileCredentialStore {
    path: PathBuf,
}

impl JsonFileCredentialStore {
    /// Create a store backed by the given file path.
    ///
    /// The file does not need to exist yet; `load` treats a missing file
    /// as "no credentials".
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl CredentialStore for JsonFileCredentialStore {
    fn load(&self) -> Result<Option<Credentials>> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Store(e)),
        };
        let credentials = serde_json::from_slice(&raw)?;
        Ok(Some(credentials))
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        let raw = serde_json::to_vec_pretty(credentials)?;
        let temp = self.temp_path();
        std::fs::write(&temp, raw)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Store(e)),
        }
    }
}

/// Shared session state
///
/// Holds the current credential set in memory (loaded once from the
/// backing store) and writes every mutation through to the store. Shared
/// by `Arc` between the client, the request pipeline, and the refresh
/// coordinator; only this type and the refresh coordinator ever mutate
/// credentials.
pub struct SessionStore {
    backing: Box<dyn CredentialStore>,
    current: RwLock<Option<Credentials>>,
}

impl SessionStore {
    /// Open a session store, loading any persisted credentials.
    pub fn open(backing: Box<dyn CredentialStore>) -> Result<Self> {
        let current = backing.load()?;
        Ok(Self {
            backing,
            current: RwLock::new(current),
        })
    }

    /// Store a freshly issued credential set (login path).
    pub fn store_login(&self, email: &str, refresh_token: &str, access_token: &str) -> Result<()> {
        let credentials = Credentials {
            email: email.to_string(),
            refresh_token: refresh_token.to_string(),
            access_token: access_token.to_string(),
        };
        self.backing.save(&credentials)?;
        *self.write() = Some(credentials);
        Ok(())
    }

    /// Replace only the access token (refresh path).
    ///
    /// A refresh landing after logout is dropped rather than resurrecting
    /// a partial credential set.
    pub fn set_access_token(&self, access_token: &str) -> Result<()> {
        let mut guard = self.write();
        if let Some(credentials) = guard.as_mut() {
            credentials.access_token = access_token.to_string();
            self.backing.save(credentials)?;
        }
        Ok(())
    }

    /// Destroy all three credential fields as a unit (logout path).
    pub fn clear(&self) -> Result<()> {
        self.backing.clear()?;
        *self.write() = None;
        Ok(())
    }

    /// True iff an access token is present. Never touches the network.
    pub fn is_logged_in(&self) -> bool {
        self.read().is_some()
    }

    /// Snapshot of the current access token.
    pub fn access_token(&self) -> Option<String> {
        self.read().as_ref().map(|c| c.access_token.clone())
    }

    /// Snapshot of the current refresh token.
    pub fn refresh_token(&self) -> Option<String> {
        self.read().as_ref().map(|c| c.refresh_token.clone())
    }

    /// Snapshot of the logged-in account email.
    pub fn email(&self) -> Option<String> {
        self.read().as_ref().map(|c| c.email.clone())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Credentials>> {
        match self.current.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Credentials>> {
        match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_credentials() -> Credentials {
        Credentials {
            email: "a@b.com".to_string(),
            refresh_token: "R1".to_string(),
            access_token: "T1".to_string(),
        }
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&sample_credentials()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample_credentials()));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_round_trips_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let store = JsonFileCredentialStore::new(&path);
        store.save(&sample_credentials()).unwrap();

        // A second instance over the same path sees the saved set
        let reopened = JsonFileCredentialStore::new(&path);
        assert_eq!(reopened.load().unwrap(), Some(sample_credentials()));
    }

    #[test]
    fn file_store_missing_file_is_no_credentials() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileCredentialStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_clear_removes_the_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let store = JsonFileCredentialStore::new(&path);

        store.save(&sample_credentials()).unwrap();
        assert!(path.exists());

        store.clear().unwrap();
        assert!(!path.exists());

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn file_store_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let store = JsonFileCredentialStore::new(&path);

        store.save(&sample_credentials()).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["session.json".to_string()]);
    }

    #[test]
    fn file_store_corrupt_document_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = JsonFileCredentialStore::new(&path);
        assert!(matches!(store.load(), Err(Error::Serialization(_))));
    }

    #[test]
    fn session_login_logout_lifecycle() {
        let session = SessionStore::open(Box::new(MemoryCredentialStore::new())).unwrap();
        assert!(!session.is_logged_in());

        session.store_login("a@b.com", "R1", "T1").unwrap();
        assert!(session.is_logged_in());
        assert_eq!(session.email().as_deref(), Some("a@b.com"));
        assert_eq!(session.refresh_token().as_deref(), Some("R1"));
        assert_eq!(session.access_token().as_deref(), Some("T1"));

        session.clear().unwrap();
        assert!(!session.is_logged_in());
        assert!(session.email().is_none());
        assert!(session.refresh_token().is_none());
        assert!(session.access_token().is_none());
    }

    #[test]
    fn set_access_token_touches_only_the_access_token() {
        let session = SessionStore::open(Box::new(MemoryCredentialStore::new())).unwrap();
        session.store_login("a@b.com", "R1", "T1").unwrap();

        session.set_access_token("T2").unwrap();

        assert_eq!(session.access_token().as_deref(), Some("T2"));
        assert_eq!(session.refresh_token().as_deref(), Some("R1"));
        assert_eq!(session.email().as_deref(), Some("a@b.com"));
    }

    #[test]
    fn set_access_token_after_clear_is_dropped() {
        let session = SessionStore::open(Box::new(MemoryCredentialStore::new())).unwrap();
        session.store_login("a@b.com", "R1", "T1").unwrap();
        session.clear().unwrap();

        session.set_access_token("T2").unwrap();

        assert!(!session.is_logged_in());
        assert!(session.access_token().is_none());
    }

    #[test]
    fn session_open_loads_persisted_credentials() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        {
            let session =
                SessionStore::open(Box::new(JsonFileCredentialStore::new(&path))).unwrap();
            session.store_login("a@b.com", "R1", "T1").unwrap();
        }

        let session = SessionStore::open(Box::new(JsonFileCredentialStore::new(&path))).unwrap();
        assert!(session.is_logged_in());
        assert_eq!(session.access_token().as_deref(), Some("T1"));
    }

    #[test]
    fn session_mutations_write_through_to_the_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let session = SessionStore::open(Box::new(JsonFileCredentialStore::new(&path))).unwrap();

        session.store_login("a@b.com", "R1", "T1").unwrap();
        session.set_access_token("T2").unwrap();

        let on_disk = JsonFileCredentialStore::new(&path).load().unwrap().unwrap();
        assert_eq!(on_disk.access_token, "T2");
        assert_eq!(on_disk.refresh_token, "R1");
    }
}
