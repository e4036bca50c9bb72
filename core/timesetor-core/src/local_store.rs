//! Durable key/value storage for session mirroring.
//!
//! Plays the role browser local storage plays for the web client: string keys,
//! string values, survives restarts.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": { "token": "...", "userId": "42", "settings": "{}" }
//! }
//! ```
//!
//! Empty, corrupt, or future-version files load as an empty store with a
//! warning. Writes go through a temp file + rename, so a crash never leaves a
//! half-written file behind.

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;
use tracing::warn;

const FILE_VERSION: u32 = 1;

/// String key/value storage shared by the stores.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Writes several keys at once. Implementations may persist them in a
    /// single write.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Removes several keys at once.
    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory
// ─────────────────────────────────────────────────────────────────────────────

/// Volatile store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// JSON file store with an in-memory cache. Every mutation rewrites the file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`. A missing file is an empty store; the file
    /// is only created on the first write.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(load_entries(path)?),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let mut entries = lock(&self.entries);
        let mut next = entries.clone();
        if !apply(&mut next) {
            return Ok(());
        }
        write_entries(&self.path, &next)?;
        *entries = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value.to_string())])
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.remove_many(&[key])
    }

    fn set_many(&self, new_entries: &[(&str, String)]) -> Result<()> {
        self.mutate(|entries| {
            let mut changed = false;
            for (key, value) in new_entries {
                if entries.get(*key) != Some(value) {
                    entries.insert((*key).to_string(), value.clone());
                    changed = true;
                }
            }
            changed
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        self.mutate(|entries| {
            let mut changed = false;
            for key in keys {
                changed |= entries.remove(*key).is_some();
            }
            changed
        })
    }
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let content = fs_err::read_to_string(path).map_err(|source| ClientError::Io {
        context: format!("reading {}", path.display()),
        source,
    })?;

    if content.trim().is_empty() {
        warn!(path = %path.display(), "Empty local storage file, starting empty");
        return Ok(BTreeMap::new());
    }

    match serde_json::from_str::<StoreFile>(&content) {
        Ok(file) if file.version == FILE_VERSION => Ok(file.entries),
        Ok(file) => {
            warn!(
                path = %path.display(),
                version = file.version,
                expected = FILE_VERSION,
                "Unsupported local storage version, starting empty"
            );
            Ok(BTreeMap::new())
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Corrupt local storage file, starting empty");
            Ok(BTreeMap::new())
        }
    }
}

fn write_entries(path: &Path, entries: &BTreeMap<String, String>) -> Result<()> {
    let file = StoreFile {
        version: FILE_VERSION,
        entries: entries.clone(),
    };
    let content = serde_json::to_string_pretty(&file).map_err(|source| ClientError::Json {
        context: "serializing local storage".to_string(),
        source,
    })?;

    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs_err::create_dir_all(parent_dir).map_err(|source| ClientError::Io {
        context: format!("creating {}", parent_dir.display()),
        source,
    })?;

    let io_err = |context: &str, source: std::io::Error| ClientError::Io {
        context: format!("{} {}", context, path.display()),
        source,
    };
    let mut temp_file =
        NamedTempFile::new_in(parent_dir).map_err(|e| io_err("creating temp file for", e))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| io_err("writing", e))?;
    temp_file.flush().map_err(|e| io_err("flushing", e))?;
    temp_file
        .persist(path)
        .map_err(|e| io_err("persisting", e.error))?;
    Ok(())
}
