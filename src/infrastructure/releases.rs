//! GitHub release feed for the self-update check.

use std::io;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::infrastructure::traits::ReleaseSource;

const GITHUB_API: &str = "https://api.github.com";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A published release as returned by the GitHub API.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Release {
    #[serde(rename = "tag_name")]
    pub tag: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

impl Release {
    /// First asset that Alfred can install.
    pub fn workflow_asset(&self) -> Option<&ReleaseAsset> {
        self.assets
            .iter()
            .find(|a| a.name.ends_with(".alfredworkflow") || a.name.ends_with(".alfred5workflow"))
    }
}

/// Releases of a GitHub repository (`owner/name`).
pub struct GitHubReleases {
    repo: String,
    client: Client,
}

fn http_err(e: reqwest::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

impl GitHubReleases {
    pub fn new(repo: impl Into<String>) -> io::Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(http_err)?;
        Ok(Self {
            repo: repo.into(),
            client,
        })
    }
}

impl ReleaseSource for GitHubReleases {
    fn releases(&self) -> io::Result<Vec<Release>> {
        let url = format!("{}/repos/{}/releases", GITHUB_API, self.repo);
        debug!("releases: GET {}", url);
        self.client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<Vec<Release>>())
            .map_err(http_err)
    }

    fn download(&self, url: &str, dest: &Path) -> io::Result<()> {
        debug!("download: {} -> {}", url, dest.display());
        let bytes = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(http_err)?;
        std::fs::write(dest, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_github_payload_when_deserializing_then_maps_fields() {
        let json = r#"[{
            "tag_name": "v1.2.0",
            "prerelease": false,
            "draft": false,
            "html_url": "https://github.com/deanishe/alfred-services/releases/v1.2.0",
            "assets": [
                {"name": "checksums.txt", "browser_download_url": "https://example.com/checksums.txt"},
                {"name": "MacOS-Services-1.2.0.alfredworkflow", "browser_download_url": "https://example.com/wf"}
            ]
        }]"#;
        let releases: Vec<Release> = serde_json::from_str(json).expect("valid payload");
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].tag, "v1.2.0");
        assert_eq!(
            releases[0].workflow_asset().map(|a| a.download_url.as_str()),
            Some("https://example.com/wf")
        );
    }

    #[test]
    fn given_release_without_workflow_asset_when_workflow_asset_then_none() {
        let release = Release {
            tag: "v1.0.0".into(),
            prerelease: false,
            draft: false,
            assets: vec![ReleaseAsset {
                name: "source.zip".into(),
                download_url: "https://example.com/source.zip".into(),
            }],
        };
        assert!(release.workflow_asset().is_none());
    }
}
