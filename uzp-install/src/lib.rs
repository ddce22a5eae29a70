pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod installer;
pub mod link;
pub mod output;
pub mod platform;
pub mod reconcile;
pub mod source;
pub mod version;

pub use cache::LocalCache;
pub use config::InstallerConfig;
pub use error::{InstallError, Remediation};
pub use fetch::{DownloadProgress, Fetch, HttpFetcher};
pub use installer::{
    InstallEvent, InstallReport, Installer, LinkOutcome, Origin, Outcome, TargetSpec,
};
pub use link::PathLinker;
pub use platform::Platform;
pub use reconcile::{Action, ExistingInstall, InstalledVersion};
pub use source::{AssetDescriptor, GithubReleases, ReleaseLookup, ReleaseMetadata};
