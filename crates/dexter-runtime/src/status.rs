//! Composes `RuntimeStatus`: endpoint reachability, installed model count,
//! binary location, and privileged-helper readiness.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ureq::Agent;

use dexter_process::probe::{EnvironmentProbe, HelperStatus};

const REACHABILITY_TIMEOUT: Duration = Duration::from_millis(1600);
const SUGGESTED_INSTALL_COMMAND: &str = "curl -fsSL https://ollama.com/install.sh | sh";

/// Which agent, if any, can carry out a privileged action unattended or
/// with a single graphical prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentMode {
    Pkexec,
    SudoNoninteractive,
    SudoTerminal,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentLevel {
    Automated,
    Assisted,
    Blocked,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelperCapabilitiesView {
    pub systemctl: bool,
    pub service: bool,
    pub curl: bool,
}

/// The full composed privileged-helper readiness picture exposed to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelperProbe {
    pub configured: bool,
    pub available: bool,
    pub path: Option<String>,
    pub status_probe_ok: bool,
    pub pkexec_available: bool,
    pub desktop_prompt_available: bool,
    pub sudo_available: bool,
    pub sudo_non_interactive_available: bool,
    pub sudo_requires_tty: bool,
    pub sudo_policy_denied: bool,
    pub privilege_escalation_ready: bool,
    pub agent_mode: AgentMode,
    pub agent_level: AgentLevel,
    pub agent_ready: bool,
    pub reason: String,
    pub capabilities: Option<HelperCapabilitiesView>,
}

/// Composes a full `HelperProbe` from the lower-level environment probes.
pub async fn probe_helper(probe: &EnvironmentProbe, helper_path: Option<&str>) -> HelperProbe {
    let desktop_prompt = probe.has_desktop_privilege_prompt();
    let pkexec = probe.resolve_binary("pkexec");
    let sudo = probe.resolve_binary("sudo");
    let low_level = probe.probe_helper_status(helper_path).await;
    let sudo_probe = probe.probe_sudo_non_interactive().await;

    let configured = helper_path.is_some();
    let available = low_level.status == HelperStatus::Available;

    let (agent_mode, agent_level, reason) = if available && pkexec.found && desktop_prompt {
        (
            AgentMode::Pkexec,
            AgentLevel::Automated,
            "graphical privilege helper available".to_string(),
        )
    } else if pkexec.found && desktop_prompt {
        (
            AgentMode::Pkexec,
            AgentLevel::Assisted,
            "pkexec available without a dedicated helper".to_string(),
        )
    } else if sudo_probe.non_interactive_available {
        (
            AgentMode::SudoNoninteractive,
            AgentLevel::Automated,
            "passwordless sudo is configured".to_string(),
        )
    } else if sudo.found {
        (
            AgentMode::SudoTerminal,
            AgentLevel::Assisted,
            "sudo is present but requires an interactive terminal".to_string(),
        )
    } else {
        (
            AgentMode::None,
            AgentLevel::Blocked,
            "no privilege escalation path is available".to_string(),
        )
    };

    HelperProbe {
        configured,
        available,
        path: helper_path.map(str::to_string),
        status_probe_ok: low_level.status_probe_ok,
        pkexec_available: pkexec.found,
        desktop_prompt_available: desktop_prompt,
        sudo_available: sudo.found,
        sudo_non_interactive_available: sudo_probe.non_interactive_available,
        sudo_requires_tty: sudo_probe.requires_tty,
        sudo_policy_denied: sudo_probe.policy_denied,
        privilege_escalation_ready: agent_level == AgentLevel::Automated,
        agent_mode,
        agent_level,
        agent_ready: agent_level != AgentLevel::Blocked,
        reason,
        capabilities: low_level.capabilities.map(|c| HelperCapabilitiesView {
            systemctl: c.systemctl,
            service: c.service,
            curl: c.curl,
        }),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeStatus {
    pub endpoint: String,
    pub binary_found: bool,
    pub binary_path: Option<String>,
    pub reachable: bool,
    pub installed_model_count: u32,
    pub suggested_install_command: Option<String>,
    pub notes: Vec<String>,
    pub privileged_helper: Option<HelperProbe>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<serde_json::Value>,
}

/// GETs `{endpoint}/api/version` with a 1,600 ms abort and reports success.
pub fn check_reachable(endpoint: &str) -> bool {
    let agent: Agent = ureq::Agent::config_builder()
        .timeout_global(Some(REACHABILITY_TIMEOUT))
        .build()
        .into();

    agent
        .get(format!("{endpoint}/api/version"))
        .call()
        .map(|resp| resp.status().is_success())
        .unwrap_or(false)
}

/// GETs `{endpoint}/api/tags` and counts the installed models; `0` on any
/// failure (the endpoint being unreachable is reported separately).
pub fn count_installed_models(endpoint: &str) -> u32 {
    let agent: Agent = ureq::Agent::config_builder()
        .timeout_global(Some(REACHABILITY_TIMEOUT))
        .build()
        .into();

    agent
        .get(format!("{endpoint}/api/tags"))
        .call()
        .ok()
        .and_then(|mut resp| resp.body_mut().read_json::<TagsResponse>().ok())
        .map(|tags| tags.models.len() as u32)
        .unwrap_or(0)
}

pub async fn compose_status(
    probe: &EnvironmentProbe,
    endpoint: &str,
    binary_name: &str,
    helper_path: Option<&str>,
) -> RuntimeStatus {
    let binary = probe.resolve_binary(binary_name);
    let reachable = check_reachable(endpoint);
    let installed_model_count = if reachable {
        count_installed_models(endpoint)
    } else {
        0
    };

    let mut notes = Vec::new();
    let suggested_install_command = if !binary.found {
        notes.push("runtime binary was not found on PATH".to_string());
        Some(SUGGESTED_INSTALL_COMMAND.to_string())
    } else {
        None
    };

    if binary.found && !reachable {
        notes.push("binary is installed but the endpoint is not reachable".to_string());
    }

    RuntimeStatus {
        endpoint: endpoint.to_string(),
        binary_found: binary.found,
        binary_path: binary.path.map(|p| p.display().to_string()),
        reachable,
        installed_model_count,
        suggested_install_command,
        notes,
        privileged_helper: Some(probe_helper(probe, helper_path).await),
    }
}
