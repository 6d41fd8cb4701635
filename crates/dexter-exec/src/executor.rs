//! Executes a planned action sequence under the selected privilege strategy,
//! short-circuiting on the first failure.

use std::time::Duration;

use dexter_core::error_code::{classify_failure, ErrorCode};
use dexter_process::{command::CommandRunner, probe::EnvironmentProbe};

use crate::strategy::{select_strategy, Strategy, StrategyContext};

/// A single step of a privileged plan. `helper_action` names the fixed
/// subcommand the helper script exposes for this step (e.g.
/// `install-ollama`); `shell_command` is the equivalent raw shell invocation
/// used when falling back to bare `pkexec`/`sudo`.
#[derive(Debug, Clone)]
pub struct Action {
    pub helper_action: String,
    pub shell_command: String,
}

#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub ok: bool,
    pub strategy: Option<Strategy>,
    pub stdout: String,
    pub stderr: String,
    pub error_code: Option<ErrorCode>,
    pub next_steps: Vec<String>,
}

/// Per-action timeout (§5: "install: 20 min" is the *runtime install's*
/// overall ceiling; each action within a plan is bounded to 10 minutes).
const ACTION_TIMEOUT: Duration = Duration::from_secs(10 * 60);

pub struct PrivilegedExecutor {
    runner: CommandRunner,
}

impl Default for PrivilegedExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PrivilegedExecutor {
    pub fn new() -> Self {
        Self {
            runner: CommandRunner::new(),
        }
    }

    pub async fn execute(
        &self,
        plan: &[Action],
        ctx: &StrategyContext,
        probe: &EnvironmentProbe,
        mut on_line: Option<&mut (dyn FnMut(&str) + Send)>,
    ) -> ExecutionOutcome {
        let (strategy, helper_path) = match select_strategy(probe, ctx).await {
            Ok(pair) => pair,
            Err(failure) => {
                return ExecutionOutcome {
                    ok: false,
                    strategy: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    error_code: Some(failure.error_code),
                    next_steps: failure.next_steps,
                };
            }
        };

        let mut stdout_all = Vec::new();
        let mut stderr_all = Vec::new();

        for action in plan {
            let (command, args) = build_invocation(strategy, helper_path.as_deref(), action);

            let output = self
                .runner
                .run(
                    &command,
                    &args,
                    ACTION_TIMEOUT,
                    &Default::default(),
                    on_line.as_deref_mut(),
                )
                .await;

            stdout_all.push(output.stdout.clone());
            stderr_all.push(output.stderr.clone());

            let succeeded = !output.timed_out && output.exit_code == Some(0);
            if !succeeded {
                let combined = format!("{}\n{}", output.stdout, output.stderr);
                let code = classify_failure(output.timed_out, output.exit_code, &combined);
                return ExecutionOutcome {
                    ok: false,
                    strategy: Some(strategy),
                    stdout: stdout_all.join("\n"),
                    stderr: stderr_all.join("\n"),
                    error_code: Some(code),
                    next_steps: next_steps_for(code),
                };
            }
        }

        ExecutionOutcome {
            ok: true,
            strategy: Some(strategy),
            stdout: stdout_all.join("\n"),
            stderr: stderr_all.join("\n"),
            error_code: None,
            next_steps: Vec::new(),
        }
    }
}

fn build_invocation(
    strategy: Strategy,
    helper_path: Option<&str>,
    action: &Action,
) -> (String, Vec<String>) {
    match strategy {
        Strategy::PkexecHelper => {
            let helper = helper_path.unwrap_or_default().to_string();
            (
                "pkexec".to_string(),
                vec![helper, action.helper_action.clone()],
            )
        }
        Strategy::Pkexec => (
            "pkexec".to_string(),
            vec!["sh".to_string(), "-c".to_string(), action.shell_command.clone()],
        ),
        Strategy::SudoNonInteractive => (
            "sudo".to_string(),
            vec![
                "-n".to_string(),
                "sh".to_string(),
                "-c".to_string(),
                action.shell_command.clone(),
            ],
        ),
    }
}

fn next_steps_for(code: ErrorCode) -> Vec<String> {
    match code {
        ErrorCode::SudoPolicyDenied => vec![
            "This account is not permitted to run sudo.".to_string(),
            "Ask an administrator to grant sudo access, or run the installer manually:"
                .to_string(),
            "curl -fsSL https://ollama.com/install.sh | sudo sh".to_string(),
        ],
        ErrorCode::SudoTtyRequired => vec![
            "sudo requires an interactive terminal here.".to_string(),
            "Open a terminal and run:".to_string(),
            "curl -fsSL https://ollama.com/install.sh | sudo sh".to_string(),
        ],
        ErrorCode::PrivilegeRequired => vec![
            "The privileged action was denied.".to_string(),
            "Re-run from a terminal with sudo, or check PolicyKit configuration.".to_string(),
        ],
        ErrorCode::Timeout => vec!["The privileged action timed out. Try again.".to_string()],
        _ => vec!["The privileged action failed. Check the output for details.".to_string()],
    }
}
