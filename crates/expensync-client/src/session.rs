//! Persisted session state: access token, refresh token, and cached user.
//!
//! # Design
//! - A string-keyed [`KeyValueStore`] stands in for browser local storage.
//! - Every mutation goes through [`KeyValueStore::apply`] so multi-key updates
//!   land together and readers never observe a half-written token.
//! - [`SessionStore`] owns the key names; nothing else touches them.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use thiserror::Error;

/// Storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "token";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key for the cached user profile.
pub const USER_KEY: &str = "user";

const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];

/// Errors raised by session persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading the backing file failed.
    #[error("failed to read session file {path}")]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing the backing file failed.
    #[error("failed to write session file {path}")]
    Write {
        /// File that could not be written.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The backing file did not contain a JSON object of strings.
    #[error("session file {path} is corrupt")]
    Corrupt {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// A single pending change: `Some` writes the value, `None` removes the key.
pub type Change<'a> = (&'a str, Option<&'a str>);

/// String-keyed persistent storage.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Apply every change atomically with respect to concurrent readers.
    ///
    /// # Errors
    ///
    /// Returns an error when the changes cannot be persisted.
    fn apply(&self, changes: &[Change<'_>]) -> Result<(), StoreError>;
}

/// Volatile store used by tests and short-lived processes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `pairs`.
    #[must_use]
    pub fn with_values<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = pairs
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn apply(&self, changes: &[Change<'_>]) -> Result<(), StoreError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        apply_changes(&mut values, changes);
        Ok(())
    }
}

/// JSON-file store; the native analogue of browser local storage.
///
/// Each [`KeyValueStore::apply`] rewrites the file while holding the write
/// lock, so the file and the in-memory map never disagree and concurrent
/// writers cannot interleave a token pair. The I/O is synchronous: the file
/// is a few hundred bytes and is written only on login, refresh and logout.
/// Callers that write from hot async paths should move the call onto
/// `tokio::task::spawn_blocking`.
pub struct FileStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open `path`, loading existing values when the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let write_err = |source: io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let bytes = serde_json::to_vec_pretty(values).map_err(|err| write_err(io::Error::other(err)))?;
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, bytes).map_err(write_err)?;
        fs::rename(&staging, &self.path).map_err(write_err)
    }
}

impl fmt::Debug for FileStore {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn apply(&self, changes: &[Change<'_>]) -> Result<(), StoreError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = values.clone();
        apply_changes(&mut next, changes);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}

fn apply_changes(values: &mut BTreeMap<String, String>, changes: &[Change<'_>]) {
    for (key, value) in changes {
        match value {
            Some(value) => {
                values.insert((*key).to_string(), (*value).to_string());
            }
            None => {
                values.remove(*key);
            }
        }
    }
}

/// Typed view over the session keys of a [`KeyValueStore`].
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Wrap a backing store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Session backed by a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Current access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.non_empty(ACCESS_TOKEN_KEY)
    }

    /// Current refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.non_empty(REFRESH_TOKEN_KEY)
    }

    /// Cached user profile, if one was stored and still parses.
    #[must_use]
    pub fn user(&self) -> Option<Value> {
        self.non_empty(USER_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
    }

    /// Whether an access token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Persist the tokens (and user, when provided) issued by a login.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot persist the change.
    pub fn store_login(
        &self,
        access_token: &str,
        refresh_token: &str,
        user: Option<&Value>,
    ) -> Result<(), StoreError> {
        let user = user.map(Value::to_string);
        self.store.apply(&[
            (ACCESS_TOKEN_KEY, Some(access_token)),
            (REFRESH_TOKEN_KEY, Some(refresh_token)),
            (USER_KEY, user.as_deref()),
        ])
    }

    /// Persist a refreshed access token, rotating the refresh token when provided.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot persist the change.
    pub fn store_refreshed(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), StoreError> {
        match refresh_token {
            Some(refresh_token) => self.store.apply(&[
                (ACCESS_TOKEN_KEY, Some(access_token)),
                (REFRESH_TOKEN_KEY, Some(refresh_token)),
            ]),
            None => self.store.apply(&[(ACCESS_TOKEN_KEY, Some(access_token))]),
        }
    }

    /// Remove every session key. Safe to call without a session.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot persist the change.
    pub fn clear(&self) -> Result<(), StoreError> {
        let changes: Vec<Change<'_>> = SESSION_KEYS.iter().map(|key| (*key, None)).collect();
        self.store.apply(&changes)
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.store
            .get(key)
            .filter(|value| !value.trim().is_empty())
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
