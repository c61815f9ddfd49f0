//! Persisted subset of the store.
//!
//! `{user, token, cart, wishlist, addresses, language}` survive restarts as
//! a versioned JSON document. Orders are never written: they are
//! server-authoritative and re-fetched after startup.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use bazaar_core::{Address, CartItem, Language, ProductId, User};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::token::SessionToken;

/// Schema version written by this build.
pub const CURRENT_VERSION: u32 = 1;

/// Errors that can occur when loading or saving persisted state.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed state document: {0}")]
    Format(#[from] serde_json::Error),

    /// Written by a newer build; refusing to guess at its layout.
    #[error("State version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// The on-disk document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Missing in documents written before versioning; read as 0.
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<SessionToken>,
    #[serde(default)]
    pub cart: Vec<CartItem>,
    #[serde(default)]
    pub wishlist: Vec<ProductId>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub language: Language,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            user: None,
            token: None,
            cart: Vec::new(),
            wishlist: Vec::new(),
            addresses: Vec::new(),
            language: Language::default(),
        }
    }
}

impl PersistedState {
    /// Parse a document, upgrading older versions.
    ///
    /// # Errors
    ///
    /// Returns `Format` for malformed JSON and `UnsupportedVersion` for a
    /// document from a newer build.
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let state: Self = serde_json::from_str(json)?;
        state.migrate()
    }

    /// Serialize as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `Format` if serialization fails.
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn migrate(mut self) -> Result<Self, PersistError> {
        if self.version > CURRENT_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_VERSION,
            });
        }
        // Version 0 had the same fields, just no tag
        if self.version == 0 {
            debug!("Upgrading untagged state document to version {CURRENT_VERSION}");
            self.version = CURRENT_VERSION;
        }
        Ok(self)
    }
}

// =============================================================================
// Storage Backends
// =============================================================================

/// Where the persisted document lives.
pub trait StateStorage: Send + Sync {
    /// Load the document, or the default guest state if none was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read or parsed.
    fn load(&self) -> Result<PersistedState, PersistError>;

    /// Replace the stored document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn save(&self, state: &PersistedState) -> Result<(), PersistError>;
}

/// JSON file on disk, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
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

impl StateStorage for FileStorage {
    fn load(&self) -> Result<PersistedState, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(json) => PersistedState::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No saved state, starting as guest");
                Ok(PersistedState::default())
            }
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, state: &PersistedState) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let json = state.to_json()?;
        let temp = self.temp_path();
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&temp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp, &self.path)
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&temp);
            self.io_error(e)
        })?;

        debug!(path = %self.path.display(), "State saved");
        Ok(())
    }
}

/// In-memory document, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: Mutex<Option<String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw saved JSON, if anything was saved.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> Result<PersistedState, PersistError> {
        self.raw()
            .map_or_else(|| Ok(PersistedState::default()), |json| PersistedState::from_json(&json))
    }

    fn save(&self, state: &PersistedState) -> Result<(), PersistError> {
        let json = state.to_json()?;
        *self
            .document
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(json);
        Ok(())
    }
}
