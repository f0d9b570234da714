//! Settings store.
//!
//! # Layout
//! ```text
//! <db_folder>/netpanel.json
//!     { "schema_version": 1,
//!       "settings": { "webPort": "2053", ... },
//!       "users": [ { "id": 1, "username": "admin", "password": "admin" } ] }
//! ```
//!
//! A document without `schema_version` is a legacy flat key/value store
//! (version 0). It opens read/write as-is; `migrate` rewrites it.
//!
//! # Design Decisions
//! - Settings are stored as strings; typing happens in `service::setting`
//! - Every mutation is persisted before it returns (temp file + rename)
//! - The handle is cheap to clone and shared by all services

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("database file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode database: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("database lock poisoned")]
    Poisoned,
}

/// A panel login account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub username: String,
    pub password: String,
}

impl User {
    fn default_admin() -> Self {
        Self {
            id: 1,
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

/// On-disk document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            settings: BTreeMap::new(),
            users: vec![User::default_admin()],
        }
    }
}

impl Store {
    /// Decode a document, accepting the legacy flat layout.
    fn decode(value: Value) -> Result<Self, serde_json::Error> {
        let is_current = value
            .as_object()
            .is_some_and(|map| map.contains_key("schema_version"));
        if is_current {
            return serde_json::from_value(value);
        }

        let Value::Object(map) = value else {
            return serde_json::from_value(value);
        };

        let mut store = Store {
            schema_version: 0,
            settings: BTreeMap::new(),
            users: Vec::new(),
        };
        for (key, value) in map {
            if key == "users" {
                store.users = serde_json::from_value(value)?;
                continue;
            }
            let text = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            store.settings.insert(key, text);
        }
        if store.users.is_empty() {
            store.users.push(User::default_admin());
        }
        Ok(store)
    }
}

struct Inner {
    path: PathBuf,
    store: Mutex<Store>,
}

/// Shared handle to the settings store.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.inner.path).finish()
    }
}

impl Database {
    /// Open the store at `path`, creating it with defaults if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref().to_path_buf();

        let store = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| DatabaseError::Io {
                path: path.clone(),
                source,
            })?;
            let value: Value = serde_json::from_str(&content).map_err(|source| {
                DatabaseError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?;
            Store::decode(value).map_err(|source| DatabaseError::Corrupt {
                path: path.clone(),
                source,
            })?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| DatabaseError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            let store = Store::default();
            write_store(&path, &store)?;
            tracing::info!(path = %path.display(), "Created settings store");
            store
        };

        tracing::debug!(
            path = %path.display(),
            schema_version = store.schema_version,
            settings = store.settings.len(),
            "Settings store opened"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                store: Mutex::new(store),
            }),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn schema_version(&self) -> Result<u32, DatabaseError> {
        Ok(self.lock()?.schema_version)
    }

    /// Raw stored value of a setting, `None` if unset.
    pub fn get_setting(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.lock()?.settings.get(key).cloned())
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.update(|store| {
            store.settings.insert(key.to_string(), value.to_string());
        })
    }

    /// Drop every stored setting so all keys fall back to their defaults.
    pub fn clear_settings(&self) -> Result<(), DatabaseError> {
        self.update(|store| store.settings.clear())
    }

    pub fn users(&self) -> Result<Vec<User>, DatabaseError> {
        Ok(self.lock()?.users.clone())
    }

    /// Snapshot of the whole document.
    pub fn snapshot(&self) -> Result<Store, DatabaseError> {
        Ok(self.lock()?.clone())
    }

    /// Apply `f` to the document and persist the result.
    ///
    /// The in-memory document is only replaced once the write succeeded.
    pub fn update<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&mut Store) -> T,
    {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        let out = f(&mut next);
        write_store(&self.inner.path, &next)?;
        *guard = next;
        Ok(out)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>, DatabaseError> {
        self.inner.store.lock().map_err(|_| DatabaseError::Poisoned)
    }
}

fn write_store(path: &Path, store: &Store) -> Result<(), DatabaseError> {
    let encoded = serde_json::to_vec_pretty(store).map_err(DatabaseError::Encode)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, encoded).map_err(|source| DatabaseError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| DatabaseError::Io {
        path: path.to_path_buf(),
        source,
    })
}
