//! The `UpdateManifest` data model and structural validation.

use serde::{Deserialize, Serialize};

use crate::error::DownloadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Stable,
    Rc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Appimage,
    Deb,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Artifact {
    pub platform: String,
    pub arch: String,
    #[serde(rename = "packageType")]
    pub package_type: PackageType,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    #[serde(rename = "checksumSha256")]
    pub checksum_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Components {
    #[serde(rename = "appVersion")]
    pub app_version: String,
    #[serde(rename = "coreVersion")]
    pub core_version: String,
    #[serde(rename = "uiVersion")]
    pub ui_version: String,
    #[serde(rename = "ipcContractVersion")]
    pub ipc_contract_version: u32,
    #[serde(rename = "userDataSchemaVersion")]
    pub user_data_schema_version: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Compatibility {
    pub strategy: String,
    #[serde(rename = "requiresRestart")]
    pub requires_restart: bool,
    #[serde(rename = "ipcContractCompatible")]
    pub ipc_contract_compatible: bool,
    #[serde(rename = "userDataSchemaCompatible")]
    pub user_data_schema_compatible: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpdateManifest {
    pub version: String,
    pub channel: Channel,
    pub provider: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    #[serde(rename = "releaseNotes")]
    pub release_notes: String,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    #[serde(rename = "checksumSha256")]
    pub checksum_sha256: String,
    pub components: Components,
    pub compatibility: Compatibility,
    #[serde(default)]
    pub artifacts: Option<Vec<Artifact>>,
    #[serde(rename = "selectedArtifact", default)]
    pub selected_artifact: Option<Artifact>,
}

const KNOWN_PROVIDERS: &[&str] = &["github"];

fn is_64_hex(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validates a parsed manifest's structural requirements: semver version,
/// 64-hex checksum, known provider, and a present compatibility block.
/// Field presence is already enforced by `serde` at parse time; this layer
/// checks the values themselves.
pub fn validate_manifest(manifest: &UpdateManifest) -> Result<(), DownloadError> {
    if dexter_core::version::parse_lenient(&manifest.version).is_err() {
        return Err(DownloadError::ManifestInvalid(format!(
            "version '{}' is not valid semver",
            manifest.version
        )));
    }

    if !is_64_hex(&manifest.checksum_sha256) {
        return Err(DownloadError::ManifestInvalid(
            "checksumSha256 is not 64 hex characters".to_string(),
        ));
    }

    if !KNOWN_PROVIDERS.contains(&manifest.provider.as_str()) {
        return Err(DownloadError::ManifestInvalid(format!(
            "unknown provider '{}'",
            manifest.provider
        )));
    }

    if let Some(artifacts) = &manifest.artifacts {
        for artifact in artifacts {
            if !is_64_hex(&artifact.checksum_sha256) {
                return Err(DownloadError::ManifestInvalid(format!(
                    "artifact for {}/{} has an invalid checksum",
                    artifact.platform, artifact.arch
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> UpdateManifest {
        UpdateManifest {
            version: "1.2.3".to_string(),
            channel: Channel::Stable,
            provider: "github".to_string(),
            published_at: "2026-01-01T00:00:00Z".to_string(),
            release_notes: "notes".to_string(),
            download_url: "https://example.com/a.AppImage".to_string(),
            checksum_sha256: "a".repeat(64),
            components: Components {
                app_version: "1.2.3".to_string(),
                core_version: "1.2.3".to_string(),
                ui_version: "1.2.3".to_string(),
                ipc_contract_version: 2,
                user_data_schema_version: 2,
            },
            compatibility: Compatibility {
                strategy: "standard".to_string(),
                requires_restart: true,
                ipc_contract_compatible: true,
                user_data_schema_compatible: true,
                notes: None,
            },
            artifacts: None,
            selected_artifact: None,
        }
    }

    #[test]
    fn test_valid_manifest_passes() {
        assert!(validate_manifest(&sample_manifest()).is_ok());
    }

    #[test]
    fn test_invalid_version_rejected() {
        let mut m = sample_manifest();
        m.version = "not-semver".to_string();
        assert!(validate_manifest(&m).is_err());
    }

    #[test]
    fn test_short_checksum_rejected() {
        let mut m = sample_manifest();
        m.checksum_sha256 = "abc123".to_string();
        assert!(validate_manifest(&m).is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut m = sample_manifest();
        m.provider = "gitlab".to_string();
        assert!(validate_manifest(&m).is_err());
    }

    #[test]
    fn test_round_trip_serialize_deserialize_is_unchanged() {
        let m = sample_manifest();
        let json = serde_json::to_string(&m).unwrap();
        let parsed: UpdateManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(m, parsed);
    }
}
