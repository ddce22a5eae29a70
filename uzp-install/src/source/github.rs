#[path = "github/api.rs"]
mod api;

use crate::error::InstallError;
use crate::source::{ReleaseLookup, ReleaseMetadata};
use crate::version::to_tag;
use api::Release;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const INSTALLER_USER_AGENT: &str = "uzp-npm-installer";

/// Release lookup against the GitHub REST API.
pub struct GithubReleases {
    client: Client,
    api_base: String,
    repo: String,
}

impl GithubReleases {
    pub fn new(repo: &str, api_base: &str, token: Option<&str>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(INSTALLER_USER_AGENT));

        if let Some(token) = token {
            if let Ok(value) = HeaderValue::from_str(&format!("token {token}")) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(None::<Duration>)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
        }
    }

    pub fn releases_url(&self) -> String {
        format!("https://github.com/{}/releases", self.repo)
    }

    fn fetch_release(
        &self,
        path: &str,
        version: Option<&str>,
    ) -> Result<ReleaseMetadata, InstallError> {
        let url = format!("{}/repos/{}/releases/{path}", self.api_base, self.repo);
        tracing::debug!(%url, "querying release registry");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| InstallError::Network(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(InstallError::NoReleaseFound {
                version: version.map(str::to_string),
                releases_url: self.releases_url(),
            });
        }

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(InstallError::RegistryError {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .map_err(|err| InstallError::Network(err.to_string()))?;
        let release: Release = serde_json::from_str(&body)
            .map_err(|err| InstallError::MalformedResponse(err.to_string()))?;

        let tag = release.tag_name.clone();
        let metadata = release
            .into_metadata()
            .ok_or_else(|| InstallError::NoAssetsPublished {
                release: version.map(to_tag).unwrap_or(tag),
            })?;

        tracing::debug!(
            tag = %metadata.tag,
            assets = metadata.assets.len(),
            "release metadata fetched"
        );
        Ok(metadata)
    }
}

impl ReleaseLookup for GithubReleases {
    fn fetch_latest(&self) -> Result<ReleaseMetadata, InstallError> {
        self.fetch_release("latest", None)
    }

    fn fetch_by_version(&self, version: &str) -> Result<ReleaseMetadata, InstallError> {
        let tag = to_tag(version);
        self.fetch_release(&format!("tags/{tag}"), Some(version))
    }
}
