//! The single outstanding apply attempt record, persisted so a post-apply
//! restart can validate what it was expecting to become.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UpdateError;

/// Which applier variant handled a staged artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplyMode {
    LinuxAppimage,
    LinuxDebPkexec,
    LinuxDebAssist,
    Relaunch,
}

/// Package type of the staged artifact, mirrors `dexter_dl::PackageType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Appimage,
    Deb,
}

/// Records the one outstanding apply attempt. A new attempt always
/// overwrites the prior record in full: there is never more than one
/// outstanding attempt at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplyAttempt {
    pub target_version: String,
    pub previous_version: String,
    pub mode: ApplyMode,
    pub package_type: PackageType,
    pub require_boot_healthy_handshake: bool,
    pub staged_artifact_path: Option<PathBuf>,
    pub rollback_artifact_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
}

impl UpdateApplyAttempt {
    pub fn load() -> Result<Option<Self>, UpdateError> {
        let path = dexter_config::paths::update_apply_attempt_path();
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(|err| {
                UpdateError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
            })?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(UpdateError::Io(err)),
        }
    }

    /// Overwrites any existing apply-attempt record with this one.
    pub fn record(&self) -> Result<(), UpdateError> {
        let path = dexter_config::paths::update_apply_attempt_path();
        Ok(dexter_config::atomic::write_json_atomic(&path, self)?)
    }

    /// Clears the outstanding attempt once boot-health validation has
    /// resolved it, one way or another.
    pub fn clear() -> Result<(), UpdateError> {
        let path = dexter_config::paths::update_apply_attempt_path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(UpdateError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use tempfile::tempdir;

    use super::*;

    fn with_data_home<F: FnOnce()>(f: F) {
        let dir = tempdir().unwrap();
        std::env::set_var("DEXTER_DATA_HOME", dir.path());
        f();
        std::env::remove_var("DEXTER_DATA_HOME");
    }

    fn sample(target: &str) -> UpdateApplyAttempt {
        UpdateApplyAttempt {
            target_version: target.to_string(),
            previous_version: "1.0.0".to_string(),
            mode: ApplyMode::LinuxAppimage,
            package_type: PackageType::Appimage,
            require_boot_healthy_handshake: true,
            staged_artifact_path: Some(PathBuf::from("/tmp/dexter-1.1.0.AppImage")),
            rollback_artifact_path: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    #[serial]
    fn test_load_missing_returns_none() {
        with_data_home(|| {
            assert!(UpdateApplyAttempt::load().unwrap().is_none());
        });
    }

    #[test]
    #[serial]
    fn test_record_then_load_round_trips() {
        with_data_home(|| {
            sample("1.1.0").record().unwrap();
            let loaded = UpdateApplyAttempt::load().unwrap().unwrap();
            assert_eq!(loaded.target_version, "1.1.0");
        });
    }

    #[test]
    #[serial]
    fn test_recording_a_second_attempt_overwrites_the_first() {
        with_data_home(|| {
            sample("1.1.0").record().unwrap();
            sample("1.2.0").record().unwrap();
            let loaded = UpdateApplyAttempt::load().unwrap().unwrap();
            assert_eq!(loaded.target_version, "1.2.0");
        });
    }

    #[test]
    #[serial]
    fn test_clear_removes_the_record() {
        with_data_home(|| {
            sample("1.1.0").record().unwrap();
            UpdateApplyAttempt::clear().unwrap();
            assert!(UpdateApplyAttempt::load().unwrap().is_none());
        });
    }

    #[test]
    #[serial]
    fn test_clear_on_missing_record_is_not_an_error() {
        with_data_home(|| {
            UpdateApplyAttempt::clear().unwrap();
        });
    }
}
