use crate::error::InstallError;

#[path = "github.rs"]
pub mod github;

pub use github::GithubReleases;

/// A registry that publishes tagged releases with downloadable assets.
pub trait ReleaseLookup {
    fn fetch_latest(&self) -> Result<ReleaseMetadata, InstallError>;

    fn fetch_by_version(&self, version: &str) -> Result<ReleaseMetadata, InstallError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseMetadata {
    pub tag: String,
    pub assets: Vec<AssetDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub name: String,
    pub download_url: String,
    pub size_bytes: u64,
}

impl ReleaseMetadata {
    /// Exact name match; release assets are named per platform.
    pub fn find_asset(&self, asset_name: &str) -> Result<&AssetDescriptor, InstallError> {
        self.assets
            .iter()
            .find(|asset| asset.name == asset_name)
            .ok_or_else(|| InstallError::AssetNotFoundForPlatform {
                asset: asset_name.to_string(),
                available: self.assets.iter().map(|asset| asset.name.clone()).collect(),
            })
    }
}
