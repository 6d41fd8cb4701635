//! `RuntimeOrchestrator` (C6): composes status and drives install/start/repair.

use std::collections::HashMap;

use dexter_core::error_code::ErrorCode;
use dexter_events::{DexterEvent, EventSinkHandle, RuntimeAction, RuntimeStage};
use dexter_exec::{
    executor::{Action, PrivilegedExecutor},
    strategy::StrategyContext,
};
use dexter_process::{command::CommandRunner, probe::EnvironmentProbe};

use crate::{
    progress::{next_op_id, parse_percent},
    status::{compose_status, check_reachable, RuntimeStatus},
};

const INSTALL_ACTION: &str = "install-ollama";
const INSTALL_SHELL_COMMAND: &str = "curl -fsSL https://ollama.com/install.sh | sh";
const START_ACTION: &str = "start-ollama-service";
const START_SHELL_COMMAND: &str = "systemctl start ollama || service ollama start";
const RESTART_ACTION: &str = "restart-ollama-service";
const RESTART_SHELL_COMMAND: &str = "systemctl restart ollama || service ollama restart";

#[derive(Debug, Clone)]
pub struct RuntimeActionOutcome {
    pub ok: bool,
    pub error_code: Option<ErrorCode>,
    pub next_steps: Vec<String>,
    pub notes: Vec<String>,
}

pub struct RuntimeOrchestrator {
    probe: EnvironmentProbe,
    executor: PrivilegedExecutor,
    runner: CommandRunner,
    events: EventSinkHandle,
    helper_path: Option<String>,
    binary_name: String,
}

impl RuntimeOrchestrator {
    pub fn new(events: EventSinkHandle, helper_path: Option<String>, binary_name: &str) -> Self {
        Self {
            probe: EnvironmentProbe::new(),
            executor: PrivilegedExecutor::new(),
            runner: CommandRunner::new(),
            events,
            helper_path,
            binary_name: binary_name.to_string(),
        }
    }

    pub async fn status(&self, endpoint: &str) -> RuntimeStatus {
        compose_status(
            &self.probe,
            endpoint,
            &self.binary_name,
            self.helper_path.as_deref(),
        )
        .await
    }

    /// Installs the runtime. `approved_prompt` must be true: this method
    /// does not itself gate on permission policy, it trusts the caller
    /// already resolved the `runtime.install` scope.
    pub async fn install(&self, approved_prompt: bool) -> RuntimeActionOutcome {
        let op_id = next_op_id();
        self.emit(op_id, RuntimeAction::Install, RuntimeStage::Starting);

        if !approved_prompt {
            let message = "installation requires explicit approval".to_string();
            self.emit(
                op_id,
                RuntimeAction::Install,
                RuntimeStage::Error {
                    message: message.clone(),
                },
            );
            return RuntimeActionOutcome {
                ok: false,
                error_code: None,
                next_steps: vec![message],
                notes: Vec::new(),
            };
        }

        let plan = vec![Action {
            helper_action: INSTALL_ACTION.to_string(),
            shell_command: INSTALL_SHELL_COMMAND.to_string(),
        }];
        let ctx = StrategyContext {
            helper_path: self.helper_path.clone(),
            requires_apt_get: false,
        };

        let events = self.events.clone();
        let mut on_line = |line: &str| {
            let percent = parse_percent(line);
            events.emit(DexterEvent::Runtime {
                op_id,
                action: RuntimeAction::Install,
                stage: RuntimeStage::Progress {
                    percent,
                    message: Some(line.to_string()),
                },
            });
        };

        let outcome = self
            .executor
            .execute(&plan, &ctx, &self.probe, Some(&mut on_line))
            .await;

        self.finish(op_id, RuntimeAction::Install, outcome.ok, outcome.error_code);

        RuntimeActionOutcome {
            ok: outcome.ok,
            error_code: outcome.error_code,
            next_steps: outcome.next_steps,
            notes: Vec::new(),
        }
    }

    /// Short-circuits if already reachable; refuses (without error) for a
    /// remote endpoint; otherwise tries a privileged service start, falling
    /// back to a direct unprivileged spawn.
    pub async fn start(&self, endpoint: &str, is_local: bool) -> RuntimeActionOutcome {
        let op_id = next_op_id();
        self.emit(op_id, RuntimeAction::Start, RuntimeStage::Starting);

        if check_reachable(endpoint) {
            self.emit(op_id, RuntimeAction::Start, RuntimeStage::Done);
            return RuntimeActionOutcome {
                ok: true,
                error_code: None,
                next_steps: Vec::new(),
                notes: vec!["runtime is already reachable".to_string()],
            };
        }

        if !is_local {
            let note = "endpoint is remote; dexter will not attempt to start it".to_string();
            self.emit(
                op_id,
                RuntimeAction::Start,
                RuntimeStage::Done,
            );
            return RuntimeActionOutcome {
                ok: true,
                error_code: None,
                next_steps: Vec::new(),
                notes: vec![note],
            };
        }

        let plan = vec![Action {
            helper_action: START_ACTION.to_string(),
            shell_command: START_SHELL_COMMAND.to_string(),
        }];
        let ctx = StrategyContext {
            helper_path: self.helper_path.clone(),
            requires_apt_get: false,
        };

        let privileged = self.executor.execute(&plan, &ctx, &self.probe, None).await;
        if privileged.ok {
            self.finish(op_id, RuntimeAction::Start, true, None);
            return RuntimeActionOutcome {
                ok: true,
                error_code: None,
                next_steps: Vec::new(),
                notes: Vec::new(),
            };
        }

        let host = host_from_endpoint(endpoint);
        let mut overrides = HashMap::new();
        overrides.insert("OLLAMA_HOST".to_string(), host);

        match self
            .runner
            .spawn_detached(&self.binary_name, &["serve".to_string()], &overrides)
        {
            Ok(()) => {
                self.finish(op_id, RuntimeAction::Start, true, None);
                RuntimeActionOutcome {
                    ok: true,
                    error_code: None,
                    next_steps: Vec::new(),
                    notes: vec!["started via direct unprivileged spawn".to_string()],
                }
            }
            Err(err) => {
                self.finish(
                    op_id,
                    RuntimeAction::Start,
                    false,
                    Some(ErrorCode::ShellSpawnError),
                );
                RuntimeActionOutcome {
                    ok: false,
                    error_code: Some(ErrorCode::ShellSpawnError),
                    next_steps: vec![err],
                    notes: Vec::new(),
                }
            }
        }
    }

    /// Restart-or-start: tries a privileged service restart, falling
    /// through to `start()` when the restart path is unavailable.
    pub async fn repair(&self, endpoint: &str, is_local: bool) -> RuntimeActionOutcome {
        let op_id = next_op_id();
        self.emit(op_id, RuntimeAction::Repair, RuntimeStage::Starting);

        let plan = vec![Action {
            helper_action: RESTART_ACTION.to_string(),
            shell_command: RESTART_SHELL_COMMAND.to_string(),
        }];
        let ctx = StrategyContext {
            helper_path: self.helper_path.clone(),
            requires_apt_get: false,
        };

        let restart = self.executor.execute(&plan, &ctx, &self.probe, None).await;
        if restart.ok {
            self.finish(op_id, RuntimeAction::Repair, true, None);
            return RuntimeActionOutcome {
                ok: true,
                error_code: None,
                next_steps: Vec::new(),
                notes: Vec::new(),
            };
        }

        self.start(endpoint, is_local).await
    }

    fn emit(&self, op_id: u64, action: RuntimeAction, stage: RuntimeStage) {
        self.events.emit(DexterEvent::Runtime {
            op_id,
            action,
            stage,
        });
    }

    fn finish(&self, op_id: u64, action: RuntimeAction, ok: bool, error_code: Option<ErrorCode>) {
        if ok {
            self.emit(op_id, action, RuntimeStage::Done);
        } else if let Some(code) = error_code {
            self.events.emit(DexterEvent::PrivilegedCommandFailed {
                op_id,
                classification: code.as_str().to_string(),
            });
            self.emit(
                op_id,
                action,
                RuntimeStage::Error {
                    message: code.as_str().to_string(),
                },
            );
        } else {
            self.emit(
                op_id,
                action,
                RuntimeStage::Error {
                    message: "action failed".to_string(),
                },
            );
        }
    }
}

fn host_from_endpoint(endpoint: &str) -> String {
    endpoint
        .split("://")
        .nth(1)
        .unwrap_or(endpoint)
        .trim_end_matches('/')
        .to_string()
}
