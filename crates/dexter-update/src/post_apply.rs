//! Validates an apply attempt against the version actually running after
//! restart, and guards the narrow automatic `.deb` rollback path.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dexter_events::{DexterEvent, EventSinkHandle, RollbackStage, ValidationOutcome};
use dexter_process::command::CommandRunner;
use tokio::sync::Notify;

use crate::apply_attempt::{PackageType, UpdateApplyAttempt};
use crate::error::UpdateError;

/// Boot-health protocol timings and the opt-in automatic-rollback flag.
#[derive(Debug, Clone)]
pub struct PostApplyConfig {
    pub boot_healthy_grace: Duration,
    pub boot_healthy_stability: Duration,
    pub auto_deb_rollback_on_boot_failure: bool,
}

impl PostApplyConfig {
    /// `boot_healthy_grace_ms` is clamped to a 1000ms floor regardless of
    /// what's configured.
    pub fn new(
        boot_healthy_grace_ms: u64,
        boot_healthy_stability_ms: u64,
        auto_deb_rollback_on_boot_failure: bool,
    ) -> Self {
        Self {
            boot_healthy_grace: Duration::from_millis(boot_healthy_grace_ms.max(1000)),
            boot_healthy_stability: Duration::from_millis(boot_healthy_stability_ms),
            auto_deb_rollback_on_boot_failure,
        }
    }
}

impl Default for PostApplyConfig {
    fn default() -> Self {
        Self::new(15_000, 2_000, false)
    }
}

/// Coordinates the post-apply boot-health handshake: waits for the host to
/// call `mark_boot_healthy`, and on failure decides whether an automatic
/// `.deb` rollback is eligible.
pub struct PostApplyCoordinator {
    config: PostApplyConfig,
    events: EventSinkHandle,
    runner: CommandRunner,
    notify: Arc<Notify>,
}

impl PostApplyCoordinator {
    pub fn new(config: PostApplyConfig, events: EventSinkHandle) -> Self {
        Self {
            config,
            events,
            runner: CommandRunner::new(),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Called by the host once it considers itself healthy. `source` names
    /// the caller (e.g. `"ipc-bridge"`, `"self-check"`) for logging.
    pub fn mark_boot_healthy(&self, source: &str) {
        tracing::info!(source, "boot-healthy signal received");
        self.notify.notify_waiters();
    }

    /// Validates the outstanding apply attempt, if any, against the
    /// currently running version. Blocks up to the grace timer waiting for
    /// `mark_boot_healthy`, then (if it arrived) the stability window
    /// before declaring the apply stable.
    pub async fn validate(&self, current_version: &str) -> Result<ValidationOutcome, UpdateError> {
        let attempt = match UpdateApplyAttempt::load()? {
            Some(attempt) => attempt,
            None => {
                self.emit(ValidationOutcome::NotApplied);
                return Ok(ValidationOutcome::NotApplied);
            }
        };

        if current_version != attempt.target_version {
            let outcome = ValidationOutcome::UnexpectedVersion {
                expected: attempt.target_version.clone(),
                actual: current_version.to_string(),
            };
            self.emit(outcome.clone());
            UpdateApplyAttempt::clear()?;
            return Ok(outcome);
        }

        if !attempt.require_boot_healthy_handshake {
            UpdateApplyAttempt::clear()?;
            self.emit(ValidationOutcome::Stable);
            return Ok(ValidationOutcome::Stable);
        }

        let outcome = match tokio::time::timeout(self.config.boot_healthy_grace, self.notify.notified()).await {
            Err(_) => ValidationOutcome::BootFailed,
            Ok(()) => {
                tokio::time::sleep(self.config.boot_healthy_stability).await;
                ValidationOutcome::Stable
            }
        };

        self.emit(outcome.clone());

        match &outcome {
            ValidationOutcome::Stable => UpdateApplyAttempt::clear()?,
            ValidationOutcome::BootFailed => {
                if self.maybe_schedule_rollback(&attempt) {
                    UpdateApplyAttempt::clear()?;
                }
            }
            _ => {}
        }

        Ok(outcome)
    }

    /// Returns `true` if a rollback was scheduled (and the outstanding
    /// attempt should be cleared because this process is about to be
    /// superseded).
    fn maybe_schedule_rollback(&self, attempt: &UpdateApplyAttempt) -> bool {
        let eligible = self.config.auto_deb_rollback_on_boot_failure
            && attempt.package_type == PackageType::Deb
            && attempt
                .rollback_artifact_path
                .as_ref()
                .map(|path| is_in_downloads_dir(path) && has_deb_suffix(path))
                .unwrap_or(false);

        if !eligible {
            self.events.emit(DexterEvent::UpdateRollback {
                stage: RollbackStage::Skipped {
                    reason: "rollback guard conditions were not met".to_string(),
                },
            });
            return false;
        }

        let path = attempt.rollback_artifact_path.clone().unwrap();
        self.events.emit(DexterEvent::UpdateRollback {
            stage: RollbackStage::Scheduled {
                artifact_path: path.to_string_lossy().to_string(),
            },
        });

        let path_str = path.to_string_lossy().to_string();
        let spawned = self.runner.spawn_detached(
            "pkexec",
            &["apt".to_string(), "install".to_string(), "-y".to_string(), path_str],
            &HashMap::new(),
        );
        if spawned.is_err() {
            self.events.emit(DexterEvent::UpdateRollback {
                stage: RollbackStage::Skipped {
                    reason: "failed to spawn rollback installer".to_string(),
                },
            });
            return false;
        }

        true
    }

    fn emit(&self, outcome: ValidationOutcome) {
        self.events.emit(DexterEvent::UpdateValidation { outcome });
    }
}

fn is_in_downloads_dir(path: &Path) -> bool {
    path.starts_with(dexter_config::paths::update_downloads_dir())
}

fn has_deb_suffix(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("deb"))
        .unwrap_or(false)
}
