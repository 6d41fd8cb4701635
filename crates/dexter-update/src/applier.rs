//! Selects and runs the applier variant matching a staged artifact.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dexter_events::{ApplyStage, DexterEvent, EventSinkHandle, OperationId};
use dexter_process::command::CommandRunner;

use crate::apply_attempt::{ApplyMode, PackageType, UpdateApplyAttempt};
use crate::error::UpdateError;

static NEXT_OP_ID: AtomicU64 = AtomicU64::new(1);

fn next_op_id() -> OperationId {
    NEXT_OP_ID.fetch_add(1, Ordering::Relaxed)
}

/// How long the AppImage applier waits after spawning the new image before
/// exiting the current process, so the new instance's boot-health
/// handshake isn't racing this instance's teardown.
const APPIMAGE_RELAUNCH_DELAY: Duration = Duration::from_millis(120);

pub struct UpdateApplier {
    runner: CommandRunner,
    events: EventSinkHandle,
}

impl UpdateApplier {
    pub fn new(events: EventSinkHandle) -> Self {
        Self {
            runner: CommandRunner::new(),
            events,
        }
    }

    /// Applies a staged artifact, recording the attempt before taking any
    /// action that could end this process. For the AppImage variant, a
    /// successful return means the caller should exit immediately: the new
    /// image is already launched.
    pub async fn apply(
        &self,
        staged_artifact_path: &Path,
        target_version: &str,
        previous_version: &str,
        require_boot_healthy_handshake: bool,
    ) -> Result<ApplyMode, UpdateError> {
        let op_id = next_op_id();
        let package_type = package_type_for(staged_artifact_path)?;
        let mode = mode_for(package_type);

        self.events.emit(DexterEvent::UpdateApply {
            op_id,
            stage: ApplyStage::Starting {
                mode: mode_label(mode).to_string(),
            },
        });

        let rollback_artifact_path = if package_type == PackageType::Deb {
            rollback_deb_for(previous_version)
        } else {
            None
        };

        UpdateApplyAttempt {
            target_version: target_version.to_string(),
            previous_version: previous_version.to_string(),
            mode,
            package_type,
            require_boot_healthy_handshake,
            staged_artifact_path: Some(staged_artifact_path.to_path_buf()),
            rollback_artifact_path,
            created_at: chrono::Utc::now(),
        }
        .record()?;

        let result = match mode {
            ApplyMode::LinuxAppimage => self.apply_appimage(staged_artifact_path).await,
            ApplyMode::LinuxDebAssist | ApplyMode::LinuxDebPkexec => {
                self.apply_deb(staged_artifact_path).await
            }
            ApplyMode::Relaunch => Err(UpdateError::RestartUnavailable),
        };

        match &result {
            Ok(()) => self.events.emit(DexterEvent::UpdateApply {
                op_id,
                stage: ApplyStage::HandedOff,
            }),
            Err(err) => self.events.emit(DexterEvent::UpdateApply {
                op_id,
                stage: ApplyStage::Failed {
                    message: err.to_string(),
                },
            }),
        }

        result.map(|()| mode)
    }

    async fn apply_appimage(&self, artifact_path: &Path) -> Result<(), UpdateError> {
        set_executable(artifact_path)?;

        tokio::time::sleep(APPIMAGE_RELAUNCH_DELAY).await;

        let path = artifact_path.to_str().ok_or_else(|| {
            UpdateError::RestartFailed("staged artifact path is not valid UTF-8".to_string())
        })?;

        self.runner
            .spawn_detached(path, &[], &HashMap::new())
            .map_err(UpdateError::RestartFailed)
    }

    async fn apply_deb(&self, artifact_path: &Path) -> Result<(), UpdateError> {
        let path = artifact_path.to_str().ok_or_else(|| {
            UpdateError::RestartFailed("staged artifact path is not valid UTF-8".to_string())
        })?;

        self.runner
            .spawn_detached("xdg-open", &[path.to_string()], &HashMap::new())
            .map_err(UpdateError::RestartFailed)
    }
}

/// Locates the `.deb` staged for `previous_version` under the update
/// downloads directory, so a failed `.deb` apply can be rolled back
/// automatically. Returns `None` if the previous version's staging
/// directory is missing or was pruned, or holds no `.deb`.
fn rollback_deb_for(previous_version: &str) -> Option<PathBuf> {
    let version_dir = dexter_config::paths::update_downloads_dir().join(previous_version);
    std::fs::read_dir(&version_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("deb"))
                .unwrap_or(false)
        })
}

fn package_type_for(path: &Path) -> Result<PackageType, UpdateError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("appimage") => Ok(PackageType::Appimage),
        Some(ext) if ext.eq_ignore_ascii_case("deb") => Ok(PackageType::Deb),
        _ => Err(UpdateError::NoStagedUpdate),
    }
}

fn mode_for(package_type: PackageType) -> ApplyMode {
    match package_type {
        PackageType::Appimage => ApplyMode::LinuxAppimage,
        PackageType::Deb => ApplyMode::LinuxDebAssist,
    }
}

fn mode_label(mode: ApplyMode) -> &'static str {
    match mode {
        ApplyMode::LinuxAppimage => "linux-appimage",
        ApplyMode::LinuxDebPkexec => "linux-deb-pkexec",
        ApplyMode::LinuxDebAssist => "linux-deb-assist",
        ApplyMode::Relaunch => "relaunch",
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<(), UpdateError> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<(), UpdateError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use dexter_events::CollectorSink;
    use serial_test::serial;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_appimage_extension_maps_to_linux_appimage_mode() {
        let path = PathBuf::from("/tmp/dexter-1.1.0.AppImage");
        let pt = package_type_for(&path).unwrap();
        assert_eq!(mode_for(pt), ApplyMode::LinuxAppimage);
    }

    #[test]
    fn test_deb_extension_maps_to_assisted_mode() {
        let path = PathBuf::from("/tmp/dexter-1.1.0.deb");
        let pt = package_type_for(&path).unwrap();
        assert_eq!(mode_for(pt), ApplyMode::LinuxDebAssist);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let path = PathBuf::from("/tmp/dexter-1.1.0.tar.gz");
        assert!(matches!(
            package_type_for(&path),
            Err(UpdateError::NoStagedUpdate)
        ));
    }

    #[test]
    fn test_set_executable_adds_exec_bits() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("staged.AppImage");
        std::fs::write(&file_path, b"fake").unwrap();
        std::fs::set_permissions(&file_path, std::fs::Permissions::from_mode(0o600)).unwrap();

        set_executable(&file_path).unwrap();

        let mode = std::fs::metadata(&file_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[tokio::test]
    #[serial]
    async fn test_apply_records_attempt_before_failing_on_missing_artifact() {
        let dir = tempdir().unwrap();
        std::env::set_var("DEXTER_DATA_HOME", dir.path());

        let events = Arc::new(CollectorSink::default());
        let applier = UpdateApplier::new(events);
        let missing = dir.path().join("does-not-exist.AppImage");

        let result = applier.apply(&missing, "1.1.0", "1.0.0", true).await;
        assert!(result.is_err());

        let recorded = UpdateApplyAttempt::load().unwrap();
        assert!(recorded.is_some());
        assert_eq!(recorded.unwrap().target_version, "1.1.0");

        std::env::remove_var("DEXTER_DATA_HOME");
    }

    #[tokio::test]
    #[serial]
    async fn test_apply_records_rollback_path_for_previous_deb() {
        let dir = tempdir().unwrap();
        std::env::set_var("DEXTER_DATA_HOME", dir.path());

        let previous_version_dir = dexter_config::paths::update_downloads_dir().join("1.0.0");
        std::fs::create_dir_all(&previous_version_dir).unwrap();
        let previous_deb = previous_version_dir.join("dexter-1.0.0.deb");
        std::fs::write(&previous_deb, b"fake").unwrap();

        let events = Arc::new(CollectorSink::default());
        let applier = UpdateApplier::new(events);
        let staged = dir.path().join("dexter-1.1.0.deb");
        std::fs::write(&staged, b"fake").unwrap();

        let _ = applier.apply(&staged, "1.1.0", "1.0.0", true).await;

        let recorded = UpdateApplyAttempt::load().unwrap().unwrap();
        assert_eq!(recorded.rollback_artifact_path, Some(previous_deb));

        std::env::remove_var("DEXTER_DATA_HOME");
    }

    #[tokio::test]
    #[serial]
    async fn test_apply_leaves_rollback_path_none_for_appimage_targets() {
        let dir = tempdir().unwrap();
        std::env::set_var("DEXTER_DATA_HOME", dir.path());

        let events = Arc::new(CollectorSink::default());
        let applier = UpdateApplier::new(events);
        let missing = dir.path().join("does-not-exist.AppImage");

        let _ = applier.apply(&missing, "1.1.0", "1.0.0", true).await;

        let recorded = UpdateApplyAttempt::load().unwrap().unwrap();
        assert_eq!(recorded.rollback_artifact_path, None);

        std::env::remove_var("DEXTER_DATA_HOME");
    }
}
