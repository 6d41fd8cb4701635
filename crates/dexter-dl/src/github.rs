//! Minimal GitHub releases client used as the update manifest's release
//! provider.

use serde::Deserialize;

use crate::{error::DownloadError, http::Http};

const API_BASE: &str = "https://api.github.com";

#[derive(Debug, Clone, Deserialize)]
pub struct GithubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    pub published_at: String,
    pub assets: Vec<GithubAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl GithubAsset {
    pub fn fetch_text(&self) -> Result<String, DownloadError> {
        Http::text(&self.browser_download_url)
    }
}

/// Fetches up to `limit` recent releases for `owner/repo`, most recent first
/// (as returned by the GitHub API), optionally authenticated via the
/// `GITHUB_TOKEN` environment variable.
pub fn fetch_releases(project: &str, limit: u32) -> Result<Vec<GithubRelease>, DownloadError> {
    let url = format!("{API_BASE}/repos/{project}/releases?per_page={limit}");
    Http::json(&url)
}

/// Finds the first asset on `release` whose name matches `name` exactly.
pub fn find_asset<'a>(release: &'a GithubRelease, name: &str) -> Option<&'a GithubAsset> {
    release.assets.iter().find(|a| a.name == name)
}
