//! Child process spawning with enforced timeouts and sanitized line streaming.

use std::{
    cell::RefCell,
    collections::HashMap,
    process::Stdio,
    rc::Rc,
    sync::Arc,
    time::Duration,
};

use nix::{
    sys::signal::{self, Signal},
    unistd::Pid,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
    time::timeout,
};
use tracing::{debug, warn};

use crate::sanitize::LineBuffer;

/// How long to wait between a graceful termination signal and a hard kill.
const GRACE_PERIOD: Duration = Duration::from_millis(1500);

/// Builds the child's environment from the parent's and caller overrides.
/// Injected so tests can sandbox what a spawned command sees.
pub type EnvBuilder =
    Arc<dyn Fn(&HashMap<String, String>, &HashMap<String, String>) -> HashMap<String, String> + Send + Sync>;

fn default_env_builder() -> EnvBuilder {
    Arc::new(|parent, overrides| {
        let mut env = parent.clone();
        env.extend(overrides.clone());
        env
    })
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

pub struct CommandRunner {
    env_builder: EnvBuilder,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner {
    pub fn new() -> Self {
        Self {
            env_builder: default_env_builder(),
        }
    }

    pub fn with_env_builder(env_builder: EnvBuilder) -> Self {
        Self { env_builder }
    }

    /// Runs `command args...` with a hard timeout, streaming sanitized
    /// stdout/stderr lines to `on_line` as they arrive. Never returns an
    /// `Err` for spawn or execution failures — those are folded into the
    /// returned `CommandOutput`.
    pub async fn run(
        &self,
        command: &str,
        args: &[String],
        timeout_duration: Duration,
        env_overrides: &HashMap<String, String>,
        on_line: Option<&mut (dyn FnMut(&str) + Send)>,
    ) -> CommandOutput {
        let parent_env: HashMap<String, String> = std::env::vars().collect();
        let child_env = (self.env_builder)(&parent_env, env_overrides);

        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(&child_env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                return CommandOutput {
                    exit_code: None,
                    stdout: String::new(),
                    stderr: format!("failed to spawn '{command}': {err}"),
                    timed_out: false,
                };
            }
        };

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        // Owned outside the timeout-wrapped future below so whatever was
        // read before a timeout fires and cancels the read+wait future is
        // still available to return as partial output.
        let stdout_all = Rc::new(RefCell::new(String::new()));
        let stderr_all = Rc::new(RefCell::new(String::new()));
        let on_line = Rc::new(RefCell::new(on_line));

        let read_stdout = drain_pipe(stdout_pipe, stdout_all.clone(), on_line.clone());
        let read_stderr = drain_pipe(stderr_pipe, stderr_all.clone(), on_line.clone());

        let outcome = timeout(timeout_duration, async {
            tokio::join!(read_stdout, read_stderr);
            child.wait().await
        })
        .await;

        let stdout_final = Rc::try_unwrap(stdout_all)
            .map(RefCell::into_inner)
            .unwrap_or_else(|rc| rc.borrow().clone());
        let stderr_final = Rc::try_unwrap(stderr_all)
            .map(RefCell::into_inner)
            .unwrap_or_else(|rc| rc.borrow().clone());

        match outcome {
            Ok(Ok(status)) => CommandOutput {
                exit_code: status.code(),
                stdout: stdout_final,
                stderr: stderr_final,
                timed_out: false,
            },
            Ok(Err(err)) => CommandOutput {
                exit_code: None,
                stdout: stdout_final,
                stderr: format!("{stderr_final}\nfailed to wait on child: {err}"),
                timed_out: false,
            },
            Err(_) => {
                Self::terminate(&mut child).await;
                CommandOutput {
                    exit_code: None,
                    stdout: stdout_final,
                    stderr: stderr_final,
                    timed_out: true,
                }
            }
        }
    }

    /// Spawns `command args...` without waiting on it, for long-running
    /// children (a background service, a relaunch of the host process)
    /// the caller has no intention of joining. Detached children keep
    /// running if the parent exits.
    pub fn spawn_detached(
        &self,
        command: &str,
        args: &[String],
        env_overrides: &HashMap<String, String>,
    ) -> Result<(), String> {
        let parent_env: HashMap<String, String> = std::env::vars().collect();
        let child_env = (self.env_builder)(&parent_env, env_overrides);

        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(&child_env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);

        cmd.spawn()
            .map(|_| ())
            .map_err(|err| format!("failed to spawn '{command}': {err}"))
    }

    /// Sends a graceful termination signal, waits the grace period, then
    /// sends a hard kill if the child is still alive.
    async fn terminate(child: &mut tokio::process::Child) {
        if let Some(id) = child.id() {
            let pid = Pid::from_raw(id as i32);
            if let Err(err) = signal::kill(pid, Signal::SIGTERM) {
                warn!("failed to send SIGTERM to pid {id}: {err}");
            }
        } else {
            return;
        }

        if timeout(GRACE_PERIOD, child.wait()).await.is_ok() {
            debug!("child exited after graceful termination");
            return;
        }

        if let Err(err) = child.start_kill() {
            warn!("failed to hard-kill child: {err}");
        }
        let _ = child.wait().await;
    }
}

/// Reads `pipe` to EOF line by line, feeding each line through a
/// [`LineBuffer`] and appending raw text to `collected`. Generic over
/// stdout/stderr pipe types so both streams can be drained concurrently by
/// the same code.
async fn drain_pipe<R: tokio::io::AsyncRead + Unpin>(
    pipe: Option<R>,
    collected: Rc<RefCell<String>>,
    on_line: Rc<RefCell<Option<&mut (dyn FnMut(&str) + Send)>>>,
) {
    let mut buf = LineBuffer::new();
    if let Some(pipe) = pipe {
        let mut reader = BufReader::new(pipe);
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    collected.borrow_mut().push_str(&line);
                    for sanitized in buf.feed(line.as_bytes()) {
                        if let Some(cb) = on_line.borrow_mut().as_deref_mut() {
                            cb(&sanitized);
                        }
                    }
                }
            }
        }
    }
    if let Some(tail) = buf.finish() {
        if let Some(cb) = on_line.borrow_mut().as_deref_mut() {
            cb(&tail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_error_resolves_not_errors() {
        let runner = CommandRunner::new();
        let out = runner
            .run(
                "definitely-not-a-real-binary-xyz",
                &[],
                Duration::from_secs(1),
                &HashMap::new(),
                None,
            )
            .await;
        assert_eq!(out.exit_code, None);
        assert!(!out.timed_out);
        assert!(out.stderr.contains("failed to spawn"));
    }

    #[tokio::test]
    async fn test_successful_command_captures_stdout() {
        let runner = CommandRunner::new();
        let out = runner
            .run(
                "echo",
                &["hello".to_string()],
                Duration::from_secs(5),
                &HashMap::new(),
                None,
            )
            .await;
        assert_eq!(out.exit_code, Some(0));
        assert!(out.stdout.contains("hello"));
        assert!(!out.timed_out);
    }

    #[tokio::test]
    async fn test_timeout_is_flagged() {
        let runner = CommandRunner::new();
        let out = runner
            .run(
                "sleep",
                &["5".to_string()],
                Duration::from_millis(100),
                &HashMap::new(),
                None,
            )
            .await;
        assert!(out.timed_out);
        assert_eq!(out.exit_code, None);
    }

    #[tokio::test]
    async fn test_spawn_detached_does_not_block() {
        let runner = CommandRunner::new();
        let result = runner.spawn_detached("sleep", &["0.05".to_string()], &HashMap::new());
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_spawn_detached_reports_spawn_failure() {
        let runner = CommandRunner::new();
        let result = runner.spawn_detached(
            "definitely-not-a-real-binary-xyz",
            &[],
            &HashMap::new(),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_on_line_callback_receives_sanitized_lines() {
        let runner = CommandRunner::new();
        let mut lines = Vec::new();
        let mut cb = |line: &str| lines.push(line.to_string());
        let _ = runner
            .run(
                "printf",
                &["a\\nb\\n".to_string()],
                Duration::from_secs(5),
                &HashMap::new(),
                Some(&mut cb),
            )
            .await;
        assert_eq!(lines, vec!["a".to_string(), "b".to_string()]);
    }
}
