//! Durable storage for the session's bearer token.
//!
//! There is exactly one slot, named [`TOKEN_SLOT`].  It is read at bootstrap,
//! written on login, and removed on logout or when the stored token is
//! rejected.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::BearerToken;

/// The fixed name of the token slot.
pub const TOKEN_SLOT: &str = "token";

/// A single named slot holding the current bearer token.
pub trait TokenStore: Send {
    /// Read the stored token, if any.
    fn load(&self) -> Result<Option<BearerToken>>;

    /// Replace the stored token.
    fn save(&mut self, token: &BearerToken) -> Result<()>;

    /// Remove the stored token.  Removing an empty slot succeeds.
    fn remove(&mut self) -> Result<()>;
}

/// Resolve the directory krisbot keeps its state in.
///
/// Priority:
/// 1. `KRISBOT_DATA_DIR` environment variable
/// 2. `~/.krisbot`
/// 3. `.krisbot` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("KRISBOT_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".krisbot");
    }
    PathBuf::from(".krisbot")
}

/// Token slot backed by a file named `token` in a data directory.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store the token under `dir`.  The directory is created on first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TOKEN_SLOT),
        }
    }

    /// Store the token under [`resolve_data_dir`].
    pub fn in_default_dir() -> Self {
        Self::new(resolve_data_dir())
    }

    /// The file holding the token.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<BearerToken>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(BearerToken::new(token)))
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::io(
                format!("failed to read {}", self.path.display()),
                err,
            )),
        }
    }

    fn save(&mut self, token: &BearerToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                Error::io(format!("failed to create {}", parent.display()), err)
            })?;
        }
        fs::write(&self.path, token.as_str())
            .map_err(|err| Error::io(format!("failed to write {}", self.path.display()), err))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).map_err(|err| {
                Error::io(format!("failed to restrict {}", self.path.display()), err)
            })?;
        }
        Ok(())
    }

    fn remove(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::io(
                format!("failed to remove {}", self.path.display()),
                err,
            )),
        }
    }
}

/// Token slot that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<BearerToken>,
}

impl MemoryTokenStore {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot already holding `token`.
    pub fn with_token(token: BearerToken) -> Self {
        Self { token: Some(token) }
    }

    /// The stored token.
    pub fn token(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<BearerToken>> {
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &BearerToken) -> Result<()> {
        self.token = Some(token.clone());
        Ok(())
    }

    fn remove(&mut self) -> Result<()> {
        self.token = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = FileTokenStore::new(dir.path().join("nested"));
        assert_eq!(store.load().unwrap(), None);

        store.save(&BearerToken::new("abc")).unwrap();
        assert_eq!(store.path(), dir.path().join("nested").join(TOKEN_SLOT));
        assert_eq!(store.load().unwrap(), Some(BearerToken::new("abc")));

        store.save(&BearerToken::new("def")).unwrap();
        assert_eq!(store.load().unwrap(), Some(BearerToken::new("def")));

        store.remove().unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn file_store_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut store = FileTokenStore::new(dir.path());
        store.remove().unwrap();
        store.remove().unwrap();
    }

    #[test]
    fn file_store_ignores_blank_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(TOKEN_SLOT), "  \n").unwrap();
        let store = FileTokenStore::new(dir.path());
        assert_eq!(store.load().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let mut store = FileTokenStore::new(dir.path());
        store.save(&BearerToken::new("abc")).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn memory_store() {
        let mut store = MemoryTokenStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save(&BearerToken::new("abc")).unwrap();
        assert_eq!(store.token(), Some(&BearerToken::new("abc")));
        store.remove().unwrap();
        assert_eq!(store.token(), None);
    }
}
