//! The install flow: look up the release, reconcile with what is already
//! installed, materialize the binary from the cache or the network, then
//! link it onto the PATH.

use crate::cache::LocalCache;
use crate::config::InstallerConfig;
use crate::error::InstallError;
use crate::fetch::{DownloadProgress, Fetch, HttpFetcher};
use crate::link::PathLinker;
use crate::platform::Platform;
use crate::reconcile::{reconcile, remove_existing, Action, ExistingInstall};
use crate::source::github::INSTALLER_USER_AGENT;
use crate::source::{GithubReleases, ReleaseLookup, ReleaseMetadata};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// What to install, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub platform: Platform,
    /// `None` installs the latest release.
    pub requested: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Download,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked(PathBuf),
    Failed(String),
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub action: Action,
    pub version: String,
    pub origin: Origin,
    pub binary_path: PathBuf,
    pub sha256: String,
    pub link: LinkOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    UpToDate { version: String, binary_path: PathBuf },
    Installed(InstallReport),
}

/// Progress notifications for whoever renders the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallEvent {
    LookingUp { requested: Option<String> },
    ReleaseResolved { tag: String },
    Reconciled { action: Action },
    ExistingRemoved { removed: bool },
    CacheHit { tag: String },
    Downloading { asset: String, size_bytes: u64 },
    Progress(DownloadProgress),
}

pub struct Installer<L, F> {
    config: InstallerConfig,
    lookup: L,
    fetcher: F,
    cache: LocalCache,
    linker: PathLinker,
}

impl Installer<GithubReleases, HttpFetcher> {
    pub fn from_config(config: InstallerConfig) -> Self {
        let lookup = GithubReleases::new(
            &config.repo,
            &config.api_base,
            config.github_token.as_deref(),
        );
        Self::new(config, lookup, HttpFetcher::new(INSTALLER_USER_AGENT))
    }
}

impl<L: ReleaseLookup, F: Fetch> Installer<L, F> {
    pub fn new(config: InstallerConfig, lookup: L, fetcher: F) -> Self {
        let cache = LocalCache::new(config.cache_dir.clone());
        let linker = PathLinker::new(config.link_dir.clone());
        Self {
            config,
            lookup,
            fetcher,
            cache,
            linker,
        }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn binary_path(&self, platform: &Platform) -> PathBuf {
        self.config
            .install_dir
            .join(platform.executable_name(&self.config.binary))
    }

    pub fn run(
        &self,
        target: &TargetSpec,
        events: &mut dyn FnMut(InstallEvent),
    ) -> Result<Outcome, InstallError> {
        let requested = target.requested.as_deref();
        events(InstallEvent::LookingUp {
            requested: target.requested.clone(),
        });
        let release = self.lookup_release(requested)?;
        let tag = release.tag.clone();
        events(InstallEvent::ReleaseResolved { tag: tag.clone() });

        let binary_path = self.binary_path(&target.platform);
        let existing = ExistingInstall::detect(&binary_path, self.cache.installed_version());
        let action = reconcile(existing.as_ref(), requested, &tag);
        tracing::info!(%action, %tag, ?existing, "reconciled installation");
        events(InstallEvent::Reconciled {
            action: action.clone(),
        });

        if action == Action::Skip {
            return Ok(Outcome::UpToDate {
                version: tag,
                binary_path,
            });
        }

        if action.replaces_existing() {
            let removed = remove_existing(&binary_path);
            events(InstallEvent::ExistingRemoved { removed });
        }

        fs::create_dir_all(&self.config.install_dir)?;
        let origin = self.materialize(&target.platform, &release, &binary_path, events)?;
        set_executable(&binary_path)?;
        let sha256 = sha256_file(&binary_path)?;

        let link = self.link(&target.platform, &binary_path)?;

        Ok(Outcome::Installed(InstallReport {
            action,
            version: tag,
            origin,
            binary_path,
            sha256,
            link,
        }))
    }

    fn lookup_release(&self, requested: Option<&str>) -> Result<ReleaseMetadata, InstallError> {
        match requested {
            Some(version) => self.lookup.fetch_by_version(version),
            None => self.lookup.fetch_latest(),
        }
    }

    /// Puts the binary at `dest` and records its version as installed.
    fn materialize(
        &self,
        platform: &Platform,
        release: &ReleaseMetadata,
        dest: &Path,
        events: &mut dyn FnMut(InstallEvent),
    ) -> Result<Origin, InstallError> {
        let asset_name = platform.asset_name(&self.config.binary);
        let tag = &release.tag;

        if self.cache.has(&asset_name, tag) {
            events(InstallEvent::CacheHit { tag: tag.clone() });
            self.cache.copy_out(&asset_name, tag, dest)?;
            self.cache.record_version(tag)?;
            return Ok(Origin::Cache);
        }

        let asset = release.find_asset(&asset_name)?;
        events(InstallEvent::Downloading {
            asset: asset.name.clone(),
            size_bytes: asset.size_bytes,
        });
        self.fetcher
            .download(&asset.download_url, dest, &mut |progress| {
                events(InstallEvent::Progress(progress))
            })?;
        self.cache.store(&asset_name, tag, dest)?;
        Ok(Origin::Download)
    }

    fn link(&self, platform: &Platform, binary_path: &Path) -> Result<LinkOutcome, InstallError> {
        if !self.config.link {
            return Ok(LinkOutcome::Disabled);
        }

        let name = platform.executable_name(&self.config.binary);
        match self.linker.link(binary_path, &name) {
            Ok(link) => Ok(LinkOutcome::Linked(link)),
            Err(err) if err.is_recoverable() => {
                tracing::warn!(error = %err, "binary installed but not linked onto PATH");
                Ok(LinkOutcome::Failed(err.to_string()))
            }
            Err(err) => Err(err),
        }
    }
}

fn set_executable(path: &Path) -> Result<(), InstallError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)?;
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}

pub fn sha256_file(path: &Path) -> Result<String, InstallError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
