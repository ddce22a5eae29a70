//! Per-user store of every downloaded binary, keyed by version.
//!
//! Layout under the cache root:
//!
//! ```text
//! ~/.uzp-cache/
//!   uzp-linux-amd64-v1.0.6
//!   uzp-linux-amd64-v2.0.0
//!   version.txt            # last materialized version, no `v` prefix
//! ```
//!
//! Entries are never evicted; only [`LocalCache::clear`] removes them. Nothing
//! here is locked, so two installers writing the same entry at once may race.

use crate::error::InstallError;
use crate::version::strip_tag;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const VERSION_FILE: &str = "version.txt";

#[derive(Debug, Clone)]
pub struct LocalCache {
    root: PathBuf,
}

impl LocalCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.uzp-cache`
    pub fn default_root() -> Option<PathBuf> {
        Some(dirs::home_dir()?.join(".uzp-cache"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, binary_name: &str, version: &str) -> PathBuf {
        self.root.join(format!("{binary_name}-{version}"))
    }

    pub fn has(&self, binary_name: &str, version: &str) -> bool {
        self.entry_path(binary_name, version).is_file()
    }

    pub fn copy_out(
        &self,
        binary_name: &str,
        version: &str,
        dest: &Path,
    ) -> Result<(), InstallError> {
        let entry = self.entry_path(binary_name, version);
        match fs::copy(&entry, dest) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound && !entry.exists() => {
                Err(InstallError::CacheCorrupt { path: entry })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Copies a freshly downloaded binary into the cache and records its version.
    pub fn store(
        &self,
        binary_name: &str,
        version: &str,
        source: &Path,
    ) -> Result<PathBuf, InstallError> {
        fs::create_dir_all(&self.root)?;
        let entry = self.entry_path(binary_name, version);
        fs::copy(source, &entry)?;
        self.record_version(version)?;
        tracing::debug!(entry = %entry.display(), "cached binary");
        Ok(entry)
    }

    /// Last version written by [`record_version`](Self::record_version), without the `v`.
    pub fn installed_version(&self) -> Option<String> {
        let content = fs::read_to_string(self.root.join(VERSION_FILE)).ok()?;
        let version = content.trim();
        if version.is_empty() {
            None
        } else {
            Some(version.to_string())
        }
    }

    pub fn record_version(&self, version: &str) -> Result<(), InstallError> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.root.join(VERSION_FILE), strip_tag(version))?;
        Ok(())
    }

    /// Removes every cached binary and the version marker.
    pub fn clear(&self) -> Result<bool, InstallError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
