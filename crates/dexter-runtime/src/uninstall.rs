//! `UninstallOrchestrator` (C7): tears down the app package, optionally the
//! runtime, and optionally user data, gated by a fixed confirmation token.

use std::path::{Path, PathBuf};

use dexter_core::error_code::ErrorCode;
use dexter_events::{DexterEvent, EventSinkHandle, UninstallStage};
use dexter_exec::{
    executor::{Action, PrivilegedExecutor},
    strategy::StrategyContext,
};
use dexter_process::probe::EnvironmentProbe;

use crate::progress::next_op_id;

/// The fixed token callers must echo back to confirm a destructive uninstall.
pub const UNINSTALL_CONFIRMATION_TOKEN: &str = "UNINSTALL-DEXTER";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageMode {
    Remove,
    Purge,
}

#[derive(Debug, Clone)]
pub struct UninstallRequest {
    pub package_mode: PackageMode,
    pub remove_user_data: bool,
    pub remove_runtime_system: bool,
    pub remove_runtime_user_data: bool,
    pub confirmation_token: String,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct UninstallReport {
    pub performed: Vec<String>,
    pub warnings: Vec<String>,
    pub next_steps: Vec<String>,
    pub error_code: Option<ErrorCode>,
}

/// Resolves `path` to absolute form and rejects it unless it is strictly
/// inside `home` — never equal to `home` or `/`, and never escaping `home`
/// via a `..`-relative component.
pub fn is_safe_cleanup_path(path: &Path, home: &Path) -> bool {
    if path == Path::new("/") || path == home {
        return false;
    }

    let Ok(relative) = path.strip_prefix(home) else {
        return false;
    };

    !relative
        .components()
        .any(|c| c == std::path::Component::ParentDir)
}

pub struct UninstallOrchestrator {
    probe: EnvironmentProbe,
    executor: PrivilegedExecutor,
    events: EventSinkHandle,
    helper_path: Option<String>,
    app_name: String,
    home: PathBuf,
}

impl UninstallOrchestrator {
    pub fn new(
        events: EventSinkHandle,
        helper_path: Option<String>,
        app_name: &str,
        home: PathBuf,
    ) -> Self {
        Self {
            probe: EnvironmentProbe::new(),
            executor: PrivilegedExecutor::new(),
            events,
            helper_path,
            app_name: app_name.to_string(),
            home,
        }
    }

    pub async fn uninstall(&self, request: UninstallRequest) -> UninstallReport {
        let op_id = next_op_id();

        if request.confirmation_token != UNINSTALL_CONFIRMATION_TOKEN {
            self.events.emit(DexterEvent::Uninstall {
                op_id,
                stage: UninstallStage::InvalidToken,
            });
            return UninstallReport {
                performed: self.requested_steps(&request),
                warnings: Vec::new(),
                next_steps: vec!["confirmation token did not match".to_string()],
                error_code: Some(ErrorCode::InvalidConfirmation),
            };
        }

        let mut report = UninstallReport::default();

        let package_step = match request.package_mode {
            PackageMode::Remove => "remove-app-package",
            PackageMode::Purge => "purge-app-package",
        };
        let package_shell = match request.package_mode {
            PackageMode::Remove => format!("apt-get remove -y {}", self.app_name),
            PackageMode::Purge => format!("apt-get purge -y {}", self.app_name),
        };

        let mut plan = vec![Action {
            helper_action: package_step.to_string(),
            shell_command: package_shell,
        }];

        if request.remove_runtime_system {
            plan.push(Action {
                helper_action: "uninstall-dexter-runtime".to_string(),
                shell_command:
                    "systemctl stop ollama; systemctl disable ollama; rm -rf /usr/share/ollama; deluser ollama; delgroup ollama"
                        .to_string(),
            });
        }

        let ctx = StrategyContext {
            helper_path: self.helper_path.clone(),
            requires_apt_get: true,
        };

        for action in &plan {
            self.events.emit(DexterEvent::Uninstall {
                op_id,
                stage: UninstallStage::Running {
                    step: action.helper_action.clone(),
                },
            });
        }

        let outcome = self.executor.execute(&plan, &ctx, &self.probe, None).await;

        if outcome.ok {
            for action in &plan {
                report.performed.push(action.helper_action.clone());
                self.events.emit(DexterEvent::Uninstall {
                    op_id,
                    stage: UninstallStage::StepComplete {
                        step: action.helper_action.clone(),
                    },
                });
            }
        } else {
            report.warnings.push(format!(
                "privileged teardown did not complete: {:?}",
                outcome.error_code
            ));
            report.next_steps = outcome.next_steps;
            report.error_code = outcome.error_code;
        }

        let mut candidate_paths = Vec::new();
        if request.remove_user_data {
            candidate_paths.push(self.home.join(format!(".config/{}", self.app_name)));
            candidate_paths.push(self.home.join(format!(".cache/{}", self.app_name)));
            candidate_paths.push(self.home.join(format!(".local/share/{}", self.app_name)));
        }
        if request.remove_runtime_user_data {
            candidate_paths.push(self.home.join(".ollama"));
        }

        for path in candidate_paths {
            if !is_safe_cleanup_path(&path, &self.home) {
                self.events.emit(DexterEvent::Uninstall {
                    op_id,
                    stage: UninstallStage::UnsafePath {
                        path: path.display().to_string(),
                    },
                });
                report
                    .warnings
                    .push(format!("skipped unsafe cleanup path: {}", path.display()));
                continue;
            }

            if let Err(err) = remove_with_retry(&path) {
                report
                    .warnings
                    .push(format!("failed to remove {}: {err}", path.display()));
            } else {
                report.performed.push(format!("remove:{}", path.display()));
            }
        }

        self.events.emit(DexterEvent::Uninstall {
            op_id,
            stage: UninstallStage::Complete {
                performed: report.performed.clone(),
                warnings: report.warnings.clone(),
            },
        });

        report
    }

    /// Names the steps `request` asks for, in the same naming scheme as
    /// `report.performed` uses once they actually run. Lets a caller whose
    /// confirmation token was rejected replay the same request once it has
    /// the right token, without having to reconstruct the plan itself.
    fn requested_steps(&self, request: &UninstallRequest) -> Vec<String> {
        let mut steps = vec![match request.package_mode {
            PackageMode::Remove => "remove-app-package".to_string(),
            PackageMode::Purge => "purge-app-package".to_string(),
        }];

        if request.remove_runtime_system {
            steps.push("uninstall-dexter-runtime".to_string());
        }

        if request.remove_user_data {
            steps.push(format!(
                "remove:{}",
                self.home.join(format!(".config/{}", self.app_name)).display()
            ));
            steps.push(format!(
                "remove:{}",
                self.home.join(format!(".cache/{}", self.app_name)).display()
            ));
            steps.push(format!(
                "remove:{}",
                self.home.join(format!(".local/share/{}", self.app_name)).display()
            ));
        }

        if request.remove_runtime_user_data {
            steps.push(format!("remove:{}", self.home.join(".ollama").display()));
        }

        steps
    }
}

/// Recursively removes `path`, retrying briefly since a just-stopped service
/// may still hold a file open for a moment.
fn remove_with_retry(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let mut last_err = None;
    for attempt in 0..3 {
        match std::fs::remove_dir_all(path) {
            Ok(()) => return Ok(()),
            Err(err) => {
                last_err = Some(err);
                if attempt < 2 {
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
        }
    }
    Err(last_err.unwrap())
}
