//! Storage configuration and path management for the TimeSetor client.
//!
//! All file paths the client touches are decided here. Production code uses
//! [`StorageConfig::resolve`], which points at `~/.timesetor/` unless
//! `TIMESETOR_HOME` says otherwise. Tests use [`StorageConfig::with_root`]
//! with a temp directory.

use crate::error::{ClientError, Result};
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "TIMESETOR_HOME";
const DEFAULT_DIR_NAME: &str = ".timesetor";

/// Central configuration for all client storage paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Root directory for all client data (default: ~/.timesetor)
    root: PathBuf,
}

impl StorageConfig {
    /// Resolves the root from `TIMESETOR_HOME`, falling back to the home
    /// directory.
    pub fn resolve() -> Result<Self> {
        if let Some(root) = std::env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::with_root(PathBuf::from(root)));
        }
        let home = dirs::home_dir().ok_or(ClientError::HomeDirNotFound)?;
        Ok(Self::with_root(home.join(DEFAULT_DIR_NAME)))
    }

    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the root directory for client data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to local-storage.json (mirrored session keys).
    pub fn local_storage_file(&self) -> PathBuf {
        self.root.join("local-storage.json")
    }

    /// Path to config.toml (client preferences).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Directories
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to logs/ directory (rotated CLI logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Ensures the root directory and standard subdirectories exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.root.clone(), self.logs_dir()] {
            fs_err::create_dir_all(&dir).map_err(|source| ClientError::Io {
                context: format!("creating {}", dir.display()),
                source,
            })?;
        }
        Ok(())
    }
}
