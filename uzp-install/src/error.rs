use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("unsupported platform: {os}")]
    UnsupportedPlatform { os: String },
    #[error("unsupported architecture: {arch}")]
    UnsupportedArch { arch: String },
    #[error("{}", no_release_message(version.as_deref(), releases_url))]
    NoReleaseFound {
        version: Option<String>,
        releases_url: String,
    },
    #[error("no release assets found for {release}. Please upload binaries to the GitHub release")]
    NoAssetsPublished { release: String },
    #[error("GitHub API error: status {status}: {body}")]
    RegistryError { status: u16, body: String },
    #[error("failed to parse GitHub release data: {0}")]
    MalformedResponse(String),
    #[error("binary not found for platform: {asset}. Available assets: {}", available.join(", "))]
    AssetNotFoundForPlatform {
        asset: String,
        available: Vec<String>,
    },
    #[error("HTTP {status} while downloading {url}")]
    HttpError { status: u16, url: String },
    #[error("too many redirects ({hops}) while downloading {url}")]
    TooManyRedirects { url: String, hops: usize },
    #[error("network error: {0}")]
    Network(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache entry vanished: {}", path.display())]
    CacheCorrupt { path: PathBuf },
    #[error("could not create symlink {}: {reason}", link.display())]
    LinkFailure { link: PathBuf, reason: String },
    #[error("configuration error: {0}")]
    Config(String),
}

fn no_release_message(version: Option<&str>, releases_url: &str) -> String {
    match version {
        Some(version) => {
            format!("version {version} not found. Check available versions at: {releases_url}")
        }
        None => {
            format!("no GitHub releases found at {releases_url}. Please create a release first")
        }
    }
}

/// What the user can do about a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// The maintainer has to publish a release with binaries.
    PublishRelease,
    /// Local state is suspect; wipe the cache and run again.
    ClearCache,
    /// Build from source.
    ManualBuild,
}

impl InstallError {
    pub fn remediation(&self) -> Remediation {
        match self {
            InstallError::NoReleaseFound { version: None, .. }
            | InstallError::NoAssetsPublished { .. } => Remediation::PublishRelease,
            InstallError::Io(_) | InstallError::CacheCorrupt { .. } => Remediation::ClearCache,
            _ => Remediation::ManualBuild,
        }
    }

    /// Errors that degrade the install instead of failing it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, InstallError::LinkFailure { .. })
    }
}
