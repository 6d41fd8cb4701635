//! `ManifestProvider`: discovers, verifies, and selects the best release
//! manifest for the host's channel, platform, and arch preference.

use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::{
    error::DownloadError,
    github::{self, GithubRelease},
    manifest::{validate_manifest, Artifact, Channel, PackageType, UpdateManifest},
    signature,
};

const MAX_RELEASES: u32 = 15;

#[derive(Debug, Clone)]
pub struct ManifestProviderConfig {
    pub project: String,
    pub manifest_asset_name: String,
    pub signature_asset_name: Option<String>,
    pub public_key_pem: Option<String>,
    pub package_type_preference: Vec<PackageType>,
    pub platform: String,
    pub arch: String,
}

pub struct ManifestProvider {
    config: ManifestProviderConfig,
}

impl ManifestProvider {
    pub fn new(config: ManifestProviderConfig) -> Self {
        Self { config }
    }

    /// Returns the best candidate manifest for `channel`, or `None` when no
    /// release yielded a structurally valid, signed, platform-matching
    /// manifest. Individual release failures are logged and skipped rather
    /// than aborting the whole check.
    pub fn check(&self, channel: Channel) -> Result<Option<UpdateManifest>, DownloadError> {
        let releases = github::fetch_releases(&self.config.project, MAX_RELEASES)?;

        let mut best: Option<UpdateManifest> = None;

        for release in releases.iter().filter(|r| !r.draft) {
            if channel == Channel::Stable && release.prerelease {
                continue;
            }

            match self.validate_candidate(release) {
                Ok(manifest) => {
                    let keep = match &best {
                        None => true,
                        Some(current) => {
                            dexter_core::version::compare(&manifest.version, &current.version)
                                .map(|ord| ord == Ordering::Greater)
                                .unwrap_or(false)
                        }
                    };
                    if keep {
                        best = Some(manifest);
                    }
                }
                Err(err) => {
                    warn!(tag = %release.tag_name, error = %err, "skipping candidate release");
                }
            }
        }

        Ok(best)
    }

    fn validate_candidate(&self, release: &GithubRelease) -> Result<UpdateManifest, DownloadError> {
        let manifest_asset = github::find_asset(release, &self.config.manifest_asset_name)
            .ok_or(DownloadError::InvalidResponse)?;
        let manifest_text = manifest_asset.fetch_text()?;

        if let Some(key) = &self.config.public_key_pem {
            let signature_asset = self
                .config
                .signature_asset_name
                .as_ref()
                .and_then(|name| github::find_asset(release, name))
                .ok_or(DownloadError::SignatureMissing)?;
            let sig_b64 = signature_asset.fetch_text()?;
            signature::verify(manifest_text.as_bytes(), sig_b64.trim(), key)?;
        }

        let mut manifest: UpdateManifest = serde_json::from_str(&manifest_text)
            .map_err(|err| DownloadError::ManifestInvalid(err.to_string()))?;

        validate_manifest(&manifest)?;
        select_artifact(
            &mut manifest,
            &self.config.platform,
            &self.config.arch,
            &self.config.package_type_preference,
        )?;

        debug!(version = %manifest.version, "candidate manifest accepted");
        Ok(manifest)
    }
}

/// Selects the artifact matching `platform`/`arch`, preferring `preference`
/// order among matches, tie-breaking to `appimage` then the first remaining
/// match. Copies the selection into the manifest's legacy
/// `downloadUrl`/`checksumSha256` fields.
fn select_artifact(
    manifest: &mut UpdateManifest,
    platform: &str,
    arch: &str,
    preference: &[PackageType],
) -> Result<(), DownloadError> {
    let artifacts = manifest.artifacts.clone().unwrap_or_default();
    let matches: Vec<&Artifact> = artifacts
        .iter()
        .filter(|a| a.platform == platform && a.arch == arch)
        .collect();

    if matches.is_empty() {
        return Err(DownloadError::NoArtifactForPlatform);
    }

    let selected = preference
        .iter()
        .find_map(|pt| matches.iter().find(|a| a.package_type == *pt))
        .or_else(|| matches.iter().find(|a| a.package_type == PackageType::Appimage))
        .or_else(|| matches.first())
        .copied()
        .cloned()
        .expect("matches is non-empty");

    manifest.download_url = selected.download_url.clone();
    manifest.checksum_sha256 = selected.checksum_sha256.clone();
    manifest.selected_artifact = Some(selected);

    Ok(())
}
