//! Installer configuration.
//!
//! Defaults first, then environment overrides, then whatever the CLI sets
//! on the resulting struct.

use crate::cache::LocalCache;
use crate::error::InstallError;
use crate::source::github::DEFAULT_API_BASE;
use std::path::PathBuf;

pub const DEFAULT_REPO: &str = "hungnguyen18/uzp-cli";
pub const DEFAULT_BINARY: &str = "uzp";

pub const ENV_CACHE_DIR: &str = "UZP_CACHE_DIR";
pub const ENV_INSTALL_DIR: &str = "UZP_INSTALL_DIR";
pub const ENV_LINK_DIR: &str = "UZP_LINK_DIR";
pub const ENV_API_BASE: &str = "UZP_GITHUB_API";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerConfig {
    /// `owner/name` of the GitHub repository publishing releases.
    pub repo: String,
    pub binary: String,
    pub api_base: String,
    pub github_token: Option<String>,
    pub install_dir: PathBuf,
    pub cache_dir: PathBuf,
    /// `None` discovers npm's global bin directory.
    pub link_dir: Option<PathBuf>,
    pub link: bool,
}

impl InstallerConfig {
    pub fn from_env() -> Result<Self, InstallError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, InstallError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let cache_dir = match var(ENV_CACHE_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => LocalCache::default_root().ok_or_else(|| {
                InstallError::Config("could not determine home directory".to_string())
            })?,
        };

        let install_dir = match var(ENV_INSTALL_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => default_install_dir().ok_or_else(|| {
                InstallError::Config("could not determine local data directory".to_string())
            })?,
        };

        Ok(Self {
            repo: DEFAULT_REPO.to_string(),
            binary: DEFAULT_BINARY.to_string(),
            api_base: var(ENV_API_BASE).unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            github_token: var(ENV_GITHUB_TOKEN),
            install_dir,
            cache_dir,
            link_dir: var(ENV_LINK_DIR).map(PathBuf::from),
            link: true,
        })
    }

    pub fn releases_url(&self) -> String {
        format!("https://github.com/{}/releases", self.repo)
    }

    pub fn repo_url(&self) -> String {
        format!("https://github.com/{}", self.repo)
    }
}

fn default_install_dir() -> Option<PathBuf> {
    Some(dirs::data_local_dir()?.join("uzp").join("bin"))
}
