//! Persisted update state and the state machine that drives its transitions.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use dexter_dl::UpdateManifest;
use dexter_events::{DexterEvent, EventSinkHandle, UpdateCheckStatus};
use serde::{Deserialize, Serialize};

use crate::compat::CompatibilityGate;
use crate::error::UpdateError;

/// Update pipeline phase, persisted verbatim in `UpdateState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Idle,
    Checking,
    Available,
    Downloading,
    Staged,
    UpToDate,
    Error,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Idle
    }
}

impl From<Phase> for dexter_events::UpdatePhase {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Idle => dexter_events::UpdatePhase::Idle,
            Phase::Checking => dexter_events::UpdatePhase::Checking,
            Phase::Available => dexter_events::UpdatePhase::Available,
            Phase::Downloading => dexter_events::UpdatePhase::Downloading,
            Phase::Staged => dexter_events::UpdatePhase::Staged,
            Phase::UpToDate => dexter_events::UpdatePhase::UpToDate,
            Phase::Error => dexter_events::UpdatePhase::Error,
        }
    }
}

/// The persisted update state, flushed to disk on every transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateState {
    pub phase: Phase,
    #[serde(default)]
    pub provider: String,
    pub checked_at: Option<DateTime<Utc>>,
    pub available: Option<UpdateManifest>,
    pub staged_version: Option<String>,
    pub staged_artifact_path: Option<PathBuf>,
    pub last_error: Option<String>,
    pub last_error_code: Option<String>,
}

impl UpdateState {
    pub fn load() -> Result<Self, UpdateError> {
        let path = dexter_config::paths::update_state_path();
        Ok(dexter_config::atomic::read_json_or_default(&path)?)
    }

    pub fn save(&self) -> Result<(), UpdateError> {
        let path = dexter_config::paths::update_state_path();
        Ok(dexter_config::atomic::write_json_atomic(&path, self)?)
    }
}

/// Drives `UpdateState` through the fixed check/download/apply transition
/// table, flushing to disk and emitting events on every transition.
pub struct UpdateStateMachine {
    state: UpdateState,
    events: EventSinkHandle,
}

impl UpdateStateMachine {
    pub fn new(provider: &str, events: EventSinkHandle) -> Result<Self, UpdateError> {
        let mut state = UpdateState::load()?;
        if state.provider.is_empty() {
            state.provider = provider.to_string();
        }
        Ok(Self { state, events })
    }

    pub fn state(&self) -> &UpdateState {
        &self.state
    }

    /// Starts a check. Returns `false` without changing anything if a staged
    /// update is already pending apply: no re-check happens while an apply
    /// is outstanding.
    pub fn begin_check(&mut self) -> Result<bool, UpdateError> {
        if self.state.phase == Phase::Staged {
            return Ok(false);
        }
        self.transition(Phase::Checking)?;
        Ok(true)
    }

    /// Finishes a check started with `begin_check`, applying the
    /// compatibility gate to any candidate manifest.
    pub fn finish_check(
        &mut self,
        outcome: Result<Option<UpdateManifest>, UpdateError>,
        gate: &CompatibilityGate,
        current_version: &str,
    ) -> Result<(), UpdateError> {
        if self.state.phase != Phase::Checking {
            return Ok(());
        }

        self.state.checked_at = Some(Utc::now());

        match outcome {
            Err(err) => self.fail(err),
            Ok(None) => {
                self.state.available = None;
                self.events.emit(DexterEvent::UpdateCheck {
                    status: UpdateCheckStatus::UpToDate {
                        version: current_version.to_string(),
                    },
                });
                self.transition(Phase::UpToDate)
            }
            Ok(Some(manifest)) => match gate.evaluate(&manifest) {
                Ok(()) => {
                    self.events.emit(DexterEvent::UpdateCheck {
                        status: UpdateCheckStatus::Available {
                            current_version: current_version.to_string(),
                            new_version: manifest.version.clone(),
                        },
                    });
                    self.state.available = Some(manifest);
                    self.transition(Phase::Available)
                }
                Err(err) => self.fail(err),
            },
        }
    }

    /// Moves `available -> downloading`. Fails if no candidate is staged
    /// for download.
    pub fn begin_download(&mut self) -> Result<(), UpdateError> {
        if self.state.phase != Phase::Available {
            return Err(UpdateError::NoUpdateAvailableForDownload);
        }
        self.transition(Phase::Downloading)
    }

    /// Moves `downloading -> staged` once the artifact has been verified on
    /// disk.
    pub fn complete_download(&mut self, artifact_path: PathBuf) -> Result<(), UpdateError> {
        let version = self
            .state
            .available
            .as_ref()
            .map(|m| m.version.clone())
            .unwrap_or_default();
        self.state.staged_version = Some(version);
        self.state.staged_artifact_path = Some(artifact_path);
        self.transition(Phase::Staged)
    }

    /// Moves `downloading -> error(download_failed)`.
    pub fn fail_download(&mut self, message: String) -> Result<(), UpdateError> {
        self.fail(UpdateError::DownloadFailed(message))
    }

    /// Records a failed apply/restart without leaving the staged phase:
    /// the applier owns retry policy, the state machine just surfaces the
    /// last error it reported.
    pub fn record_apply_failure(&mut self, err: &UpdateError) -> Result<(), UpdateError> {
        self.state.last_error = Some(err.to_string());
        self.state.last_error_code = Some(err.error_code().as_str().to_string());
        self.state.save()
    }

    /// Resets to `idle` after a successful apply has been fully observed,
    /// clearing the staged-artifact bookkeeping.
    pub fn reset_after_apply(&mut self) -> Result<(), UpdateError> {
        self.state.available = None;
        self.state.staged_version = None;
        self.state.staged_artifact_path = None;
        self.state.last_error = None;
        self.state.last_error_code = None;
        self.transition(Phase::Idle)
    }

    fn fail(&mut self, err: UpdateError) -> Result<(), UpdateError> {
        self.state.last_error = Some(err.to_string());
        self.state.last_error_code = Some(err.error_code().as_str().to_string());
        self.events.emit(DexterEvent::UpdateCheck {
            status: UpdateCheckStatus::Blocked {
                code: err.error_code().as_str().to_string(),
                reason: err.to_string(),
            },
        });
        self.transition(Phase::Error)
    }

    fn transition(&mut self, to: Phase) -> Result<(), UpdateError> {
        let from = self.state.phase;
        self.state.phase = to;
        self.events.emit(DexterEvent::UpdatePhase {
            from: from.into(),
            to: to.into(),
        });
        self.state.save()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dexter_events::CollectorSink;
    use serial_test::serial;
    use tempfile::tempdir;

    use super::*;

    fn with_data_home<F: FnOnce()>(f: F) {
        let dir = tempdir().unwrap();
        std::env::set_var("DEXTER_DATA_HOME", dir.path());
        f();
        std::env::remove_var("DEXTER_DATA_HOME");
    }

    fn manifest(version: &str, ipc_ok: bool, schema_ok: bool, schema_version: u32) -> UpdateManifest {
        use dexter_dl::{Channel, Compatibility, Components};
        UpdateManifest {
            version: version.to_string(),
            channel: Channel::Stable,
            provider: "github".to_string(),
            published_at: "2026-01-01T00:00:00Z".to_string(),
            release_notes: String::new(),
            download_url: "https://example.com/a.AppImage".to_string(),
            checksum_sha256: "a".repeat(64),
            components: Components {
                app_version: version.to_string(),
                core_version: version.to_string(),
                ui_version: version.to_string(),
                ipc_contract_version: 1,
                user_data_schema_version: schema_version,
            },
            compatibility: Compatibility {
                strategy: "standard".to_string(),
                requires_restart: false,
                ipc_contract_compatible: ipc_ok,
                user_data_schema_compatible: schema_ok,
                notes: None,
            },
            artifacts: None,
            selected_artifact: None,
        }
    }

    #[test]
    #[serial]
    fn test_no_candidate_goes_up_to_date() {
        with_data_home(|| {
            let events = Arc::new(CollectorSink::default());
            let mut machine = UpdateStateMachine::new("github", events).unwrap();
            assert!(machine.begin_check().unwrap());
            machine
                .finish_check(Ok(None), &CompatibilityGate::new(1), "1.0.0")
                .unwrap();
            assert_eq!(machine.state().phase, Phase::UpToDate);
        });
    }

    #[test]
    #[serial]
    fn test_valid_candidate_becomes_available() {
        with_data_home(|| {
            let events = Arc::new(CollectorSink::default());
            let mut machine = UpdateStateMachine::new("github", events).unwrap();
            machine.begin_check().unwrap();
            machine
                .finish_check(
                    Ok(Some(manifest("1.1.0", true, true, 1))),
                    &CompatibilityGate::new(1),
                    "1.0.0",
                )
                .unwrap();
            assert_eq!(machine.state().phase, Phase::Available);
            assert!(machine.state().available.is_some());
        });
    }

    #[test]
    #[serial]
    fn test_incompatible_candidate_goes_to_error_with_code() {
        with_data_home(|| {
            let events = Arc::new(CollectorSink::default());
            let mut machine = UpdateStateMachine::new("github", events).unwrap();
            machine.begin_check().unwrap();
            machine
                .finish_check(
                    Ok(Some(manifest("1.1.0", false, true, 1))),
                    &CompatibilityGate::new(1),
                    "1.0.0",
                )
                .unwrap();
            assert_eq!(machine.state().phase, Phase::Error);
            assert_eq!(
                machine.state().last_error_code.as_deref(),
                Some("ipc_incompatible")
            );
        });
    }

    #[test]
    #[serial]
    fn test_schema_migration_unavailable_blocks_with_from_to_in_message() {
        with_data_home(|| {
            let events = Arc::new(CollectorSink::default());
            let mut machine = UpdateStateMachine::new("github", events).unwrap();
            machine.begin_check().unwrap();
            machine
                .finish_check(
                    Ok(Some(manifest("1.1.0", true, false, 3))),
                    &CompatibilityGate::new(2),
                    "1.0.0",
                )
                .unwrap();
            assert_eq!(machine.state().phase, Phase::Error);
            assert_eq!(
                machine.state().last_error_code.as_deref(),
                Some("schema_migration_unavailable")
            );
            assert!(machine.state().last_error.as_ref().unwrap().contains("2 -> 3"));
        });
    }

    #[test]
    #[serial]
    fn test_staged_rejects_further_checks() {
        with_data_home(|| {
            let events = Arc::new(CollectorSink::default());
            let mut machine = UpdateStateMachine::new("github", events).unwrap();
            machine.begin_check().unwrap();
            machine
                .finish_check(
                    Ok(Some(manifest("1.1.0", true, true, 1))),
                    &CompatibilityGate::new(1),
                    "1.0.0",
                )
                .unwrap();
            machine.begin_download().unwrap();
            machine
                .complete_download(PathBuf::from("/tmp/dexter-1.1.0.AppImage"))
                .unwrap();
            assert_eq!(machine.state().phase, Phase::Staged);

            assert!(!machine.begin_check().unwrap());
            assert_eq!(machine.state().phase, Phase::Staged);
        });
    }

    #[test]
    #[serial]
    fn test_download_without_available_candidate_is_rejected() {
        with_data_home(|| {
            let events = Arc::new(CollectorSink::default());
            let mut machine = UpdateStateMachine::new("github", events).unwrap();
            let result = machine.begin_download();
            assert!(matches!(result, Err(UpdateError::NoUpdateAvailableForDownload)));
        });
    }

    #[test]
    #[serial]
    fn test_state_is_persisted_across_machine_instances() {
        with_data_home(|| {
            {
                let events = Arc::new(CollectorSink::default());
                let mut machine = UpdateStateMachine::new("github", events).unwrap();
                machine.begin_check().unwrap();
            }
            let events = Arc::new(CollectorSink::default());
            let machine = UpdateStateMachine::new("github", events).unwrap();
            assert_eq!(machine.state().phase, Phase::Checking);
        });
    }
}
