//! Privilege-escalation strategy selection.

use dexter_core::error_code::ErrorCode;
use dexter_process::probe::{EnvironmentProbe, HelperStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    PkexecHelper,
    Pkexec,
    SudoNonInteractive,
}

/// What the caller needs privileged to do, shaping the dependency checks
/// (package operations additionally require `apt-get`).
#[derive(Debug, Clone, Default)]
pub struct StrategyContext {
    pub helper_path: Option<String>,
    pub requires_apt_get: bool,
}

#[derive(Debug, Clone)]
pub struct StrategyFailure {
    pub error_code: ErrorCode,
    pub next_steps: Vec<String>,
}

/// Picks a runner strategy from the host probe, in priority order:
/// helper+pkexec+desktop, then bare pkexec+desktop, then sudo -n, else a
/// `privilege_required` failure with manual-step guidance.
pub async fn select_strategy(
    probe: &EnvironmentProbe,
    ctx: &StrategyContext,
) -> Result<(Strategy, Option<String>), StrategyFailure> {
    let desktop_prompt = probe.has_desktop_privilege_prompt();
    let pkexec = probe.resolve_binary("pkexec");
    let apt_get_ok = !ctx.requires_apt_get || probe.resolve_binary("apt-get").found;

    let helper_probe = probe.probe_helper_status(ctx.helper_path.as_deref()).await;

    if helper_probe.status == HelperStatus::Available && pkexec.found && desktop_prompt {
        return Ok((Strategy::PkexecHelper, ctx.helper_path.clone()));
    }

    if pkexec.found && desktop_prompt && apt_get_ok {
        return Ok((Strategy::Pkexec, None));
    }

    let sudo_probe = probe.probe_sudo_non_interactive().await;
    if sudo_probe.non_interactive_available && apt_get_ok {
        return Ok((Strategy::SudoNonInteractive, None));
    }

    Err(StrategyFailure {
        error_code: ErrorCode::PrivilegeRequired,
        next_steps: vec![
            "No graphical privilege prompt or passwordless sudo is available.".to_string(),
            "Run the installer manually from a terminal, e.g.:".to_string(),
            "curl -fsSL https://ollama.com/install.sh | sudo sh".to_string(),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_desktop_no_sudo_yields_privilege_required() {
        std::env::remove_var("DISPLAY");
        std::env::remove_var("WAYLAND_DISPLAY");
        std::env::remove_var("XDG_SESSION_TYPE");

        let probe = EnvironmentProbe::new();
        let ctx = StrategyContext::default();
        let result = select_strategy(&probe, &ctx).await;
        // sudo -n may or may not be available in the test sandbox; assert
        // the failure branch's shape only when it is in fact unavailable.
        if let Err(failure) = result {
            assert_eq!(failure.error_code, ErrorCode::PrivilegeRequired);
            assert!(!failure.next_steps.is_empty());
        }
    }
}
