//! Deciding what to do with an existing installation.

use crate::version::{strip_tag, versions_match};
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstalledVersion {
    Known(String),
    Unknown,
}

impl fmt::Display for InstalledVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstalledVersion::Known(version) => write!(f, "v{}", strip_tag(version)),
            InstalledVersion::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingInstall {
    pub version: InstalledVersion,
}

impl ExistingInstall {
    /// The binary's presence is the truth source; its version comes from
    /// the cache marker when one was recorded.
    pub fn detect(binary_path: &Path, recorded: Option<String>) -> Option<Self> {
        if fs::symlink_metadata(binary_path).is_err() {
            return None;
        }

        let version = match recorded {
            Some(version) => InstalledVersion::Known(version),
            None => InstalledVersion::Unknown,
        };
        Some(Self { version })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing installed yet.
    Install,
    /// An explicit version was requested; replace whatever is there.
    Override { previous: InstalledVersion },
    /// Latest requested and already installed.
    Skip,
    /// Latest requested and something older (or unknown) is installed.
    Update { previous: InstalledVersion },
}

impl Action {
    pub fn replaces_existing(&self) -> bool {
        matches!(self, Action::Override { .. } | Action::Update { .. })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Install => f.write_str("install"),
            Action::Override { .. } => f.write_str("override"),
            Action::Skip => f.write_str("skip"),
            Action::Update { .. } => f.write_str("update"),
        }
    }
}

pub fn reconcile(
    existing: Option<&ExistingInstall>,
    requested: Option<&str>,
    resolved_tag: &str,
) -> Action {
    let Some(existing) = existing else {
        return Action::Install;
    };

    if requested.is_some() {
        return Action::Override {
            previous: existing.version.clone(),
        };
    }

    match &existing.version {
        InstalledVersion::Known(version) if versions_match(version, resolved_tag) => Action::Skip,
        previous => Action::Update {
            previous: previous.clone(),
        },
    }
}

/// Removal failures are logged and swallowed; the following write either
/// overwrites the file or fails on its own.
pub fn remove_existing(binary_path: &Path) -> bool {
    match fs::remove_file(binary_path) {
        Ok(()) => true,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => true,
        Err(err) => {
            tracing::warn!(
                path = %binary_path.display(),
                error = %err,
                "could not remove existing binary, continuing"
            );
            false
        }
    }
}
