//! Session token storage.
//!
//! The backend hands out an opaque bearer token on login; every outbound
//! request must reflect the current token without threading it through call
//! sites. The gateway owns a [`TokenStore`] injected at construction, so
//! tests can swap in an in-memory store.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Accessor for the persisted session token.
///
/// `clear` is best-effort: the caller never needs to know whether a token
/// existed before. `store` can fail (disk), which callers surface.
pub trait TokenStore: Send + Sync {
    /// Read the current token, if one is stored.
    fn load(&self) -> Option<String>;

    /// Persist a new token, replacing any previous one.
    fn store(&self, token: &str) -> io::Result<()>;

    /// Destroy the stored token.
    fn clear(&self);
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn store(&self, token: &str) -> io::Result<()> {
        (**self).store(token)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Token persisted as a single line at `~/.platewatch/session`.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store at the default location under the home directory.
    pub fn new() -> Option<Self> {
        dirs::home_dir().map(|home| Self {
            path: home.join(".platewatch").join("session"),
        })
    }

    /// Store at an explicit path (used by tests).
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn store(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)
    }

    fn clear(&self) {
        let _ = fs::remove_file(&self.path);
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory token store for unit and integration tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: Mutex::new(token.map(str::to_string)),
        }
    }

    pub fn empty() -> Self {
        Self::new(None)
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn store(&self, token: &str) -> io::Result<()> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) {
        *self.token.lock().unwrap() = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
