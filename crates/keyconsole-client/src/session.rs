//! Session context holding the persisted bearer token
//!
//! The token lives in a [`TokenStore`] and is read again on every request,
//! so a token written by another process (or a later login) takes effect on
//! the very next call.

use crate::error::{ClientError, ClientResult};
use keyconsole_core::{SessionConfig, TokenStoreKind};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Persistent key/value storage for the bearer token
pub trait TokenStore: Send + Sync + fmt::Debug {
    /// Read the current token, `None` when logged out
    fn load(&self) -> ClientResult<Option<String>>;

    /// Persist a token, replacing any previous one
    fn store(&self, token: &str) -> ClientResult<()>;

    /// Remove the token
    fn clear(&self) -> ClientResult<()>;
}

/// Token store that lives only as long as the process
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTokenStore")
            .field("has_token", &self.token.read().is_some())
            .finish()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> ClientResult<Option<String>> {
        Ok(self.token.read().clone())
    }

    fn store(&self, token: &str) -> ClientResult<()> {
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.token.write() = None;
        Ok(())
    }
}

/// Token store backed by a JSON object on disk, the token kept under a fixed key
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
    key: String,
}

impl FileTokenStore {
    /// Create a store for `path`, using `key` as the entry name
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> ClientResult<Map<String, Value>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(ClientError::session(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            ClientError::session(format!("corrupt session file {}: {e}", self.path.display()))
        })
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClientError::session(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let body = serde_json::to_string_pretty(entries)
            .map_err(|e| ClientError::session(e.to_string()))?;
        let staging = self.path.with_extension("json.tmp");
        write_private(&staging, body.as_bytes())
            .and_then(|()| std::fs::rename(&staging, &self.path))
            .map_err(|e| {
                ClientError::session(format!("failed to write {}: {e}", self.path.display()))
            })
    }
}

/// Write `contents` to a fresh file readable by the owner only
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    // a leftover staging file keeps its old mode
    let _ = std::fs::remove_file(path);
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> ClientResult<Option<String>> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(&self.key)
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(ToString::to_string))
    }

    fn store(&self, token: &str) -> ClientResult<()> {
        let mut entries = self.read_entries()?;
        entries.insert(self.key.clone(), Value::String(token.to_string()));
        self.write_entries(&entries)
    }

    fn clear(&self) -> ClientResult<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(&self.key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// Process-wide session context handed to the HTTP client
#[derive(Debug, Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
}

impl Session {
    /// Wrap a token store
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Session kept in memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// Build the session store described by the configuration
    pub fn from_config(config: &SessionConfig) -> ClientResult<Self> {
        match config.store {
            TokenStoreKind::Memory => Ok(Self::in_memory()),
            TokenStoreKind::File => {
                let path = config.resolved_path()?;
                debug!(path = %path.display(), "using file session store");
                Ok(Self::new(Arc::new(FileTokenStore::new(
                    path,
                    config.token_key.clone(),
                ))))
            }
        }
    }

    /// Read the token afresh from the store
    pub fn token(&self) -> ClientResult<Option<String>> {
        self.store.load()
    }

    /// Read the token, failing with [`ClientError::MissingToken`] when absent
    pub fn require_token(&self) -> ClientResult<String> {
        self.token()?.ok_or(ClientError::MissingToken)
    }

    /// Whether a token is currently stored
    pub fn is_authenticated(&self) -> bool {
        matches!(self.token(), Ok(Some(_)))
    }

    /// Start a session with a freshly issued token
    pub fn login(&self, token: &str) -> ClientResult<()> {
        if token.trim().is_empty() {
            return Err(ClientError::invalid_request("empty access token"));
        }
        self.store.store(token)?;
        info!("session started");
        Ok(())
    }

    /// End the session, forgetting the token
    pub fn logout(&self) -> ClientResult<()> {
        self.store.clear()?;
        info!("session cleared");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_memory_session_lifecycle() {
        let session = Session::in_memory();
        assert!(!session.is_authenticated());
        assert!(matches!(
            session.require_token(),
            Err(ClientError::MissingToken)
        ));

        session.login("tok-1").unwrap();
        assert_eq!(session.require_token().unwrap(), "tok-1");

        session.logout().unwrap();
        assert_eq!(session.token().unwrap(), None);
    }

    #[test]
    fn test_login_rejects_blank_token() {
        let session = Session::in_memory();
        assert!(session.login("   ").is_err());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_file_store_keeps_other_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let store = FileTokenStore::new(&path, "access_token");
        store.store("tok-2").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok-2"));

        let raw: Map<String, Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.get("theme"), Some(&Value::String("dark".to_string())));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        let raw: Map<String, Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.contains_key("theme"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        FileTokenStore::new(&path, "access_token").store("secret").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_store_missing_file_means_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("absent.json"), "access_token");
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path, "access_token");
        assert!(matches!(store.load(), Err(ClientError::Session { .. })));
    }

    #[test]
    fn test_token_rotation_is_seen_on_next_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let session = Session::new(Arc::new(FileTokenStore::new(&path, "access_token")));
        session.login("old").unwrap();

        // another writer rotates the token behind the session's back
        FileTokenStore::new(&path, "access_token")
            .store("new")
            .unwrap();

        assert_eq!(session.require_token().unwrap(), "new");
    }
}
