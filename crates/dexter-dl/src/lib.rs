pub mod error;
pub mod github;
pub mod http;
pub mod http_client;
pub mod manifest;
pub mod provider;
pub mod signature;
pub mod types;

pub use error::{DownloadError, Result};
pub use github::{fetch_releases, find_asset, GithubAsset, GithubRelease};
pub use http::{download_and_verify, Http};
pub use manifest::{
    validate_manifest, Artifact, Channel, Compatibility, Components, PackageType, UpdateManifest,
};
pub use provider::{ManifestProvider, ManifestProviderConfig};
pub use types::Progress;
