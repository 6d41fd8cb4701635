//! Stages an available manifest's selected artifact onto disk and prunes
//! old staged versions, driving the `available -> staged` transition.

use std::path::{Path, PathBuf};

use dexter_dl::{DownloadError, UpdateManifest};

use crate::error::UpdateError;
use crate::state::UpdateStateMachine;

/// Number of staged versions kept under the downloads directory, always
/// including whichever one is currently staged.
const KEEP_STAGED_VERSIONS: usize = 3;

/// Downloads and verifies the manifest's selected artifact, writes a
/// sibling `manifest.json`, prunes old staged versions, and drives the
/// state machine to `staged` (or `error` on failure).
pub fn run_download(machine: &mut UpdateStateMachine, downloads_dir: &Path) -> Result<PathBuf, UpdateError> {
    let manifest = machine
        .state()
        .available
        .clone()
        .ok_or(UpdateError::NoUpdateAvailableForDownload)?;

    machine.begin_download()?;

    match stage_artifact(&manifest, downloads_dir) {
        Ok(artifact_path) => {
            prune_staged_versions(downloads_dir, &manifest.version, KEEP_STAGED_VERSIONS);
            machine.complete_download(artifact_path.clone())?;
            Ok(artifact_path)
        }
        Err(err) => {
            machine.fail_download(err.to_string())?;
            Err(UpdateError::DownloadFailed(err.to_string()))
        }
    }
}

fn stage_artifact(manifest: &UpdateManifest, downloads_dir: &Path) -> Result<PathBuf, DownloadError> {
    let version_dir = downloads_dir.join(&manifest.version);
    std::fs::create_dir_all(&version_dir)?;

    let file_name = artifact_file_name(&manifest.download_url);
    let artifact_path = version_dir.join(&file_name);

    dexter_dl::http::download_and_verify(
        &manifest.download_url,
        &artifact_path,
        &manifest.checksum_sha256,
        None,
    )?;

    let manifest_json = serde_json::to_string_pretty(manifest).map_err(|_| DownloadError::InvalidResponse)?;
    std::fs::write(version_dir.join("manifest.json"), manifest_json)?;

    Ok(artifact_path)
}

fn artifact_file_name(download_url: &str) -> String {
    download_url
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("artifact.bin")
        .to_string()
}

/// Removes version directories beyond the newest `keep` (by directory name,
/// compared as semver), always keeping `current_version`.
fn prune_staged_versions(downloads_dir: &Path, current_version: &str, keep: usize) {
    let Ok(entries) = std::fs::read_dir(downloads_dir) else {
        return;
    };

    let mut versions: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();

    versions.sort_by(|a, b| {
        dexter_core::version::compare(a, b).unwrap_or(std::cmp::Ordering::Equal)
    });
    versions.reverse();

    let mut kept = 0;
    for version in versions {
        let is_current = version == current_version;
        if is_current || kept < keep {
            kept += 1;
            continue;
        }
        let _ = std::fs::remove_dir_all(downloads_dir.join(version));
    }
}
