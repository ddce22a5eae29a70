use crate::source::{AssetDescriptor, ReleaseMetadata};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Option<Vec<Asset>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(default)]
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

impl From<Asset> for AssetDescriptor {
    fn from(asset: Asset) -> Self {
        Self {
            name: asset.name,
            download_url: asset.browser_download_url,
            size_bytes: asset.size,
        }
    }
}

impl Release {
    /// `None` when the release has no assets attached.
    pub fn into_metadata(self) -> Option<ReleaseMetadata> {
        let assets = self.assets.filter(|assets| !assets.is_empty())?;
        Some(ReleaseMetadata {
            tag: self.tag_name,
            assets: assets.into_iter().map(AssetDescriptor::from).collect(),
        })
    }
}
