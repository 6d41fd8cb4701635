//! Resolves binaries on `PATH`, detects desktop privilege-prompt
//! availability, and probes helper/sudo non-interactive readiness.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::debug;

use crate::command::CommandRunner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryLocation {
    pub found: bool,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperStatus {
    NotConfigured,
    ConfiguredMissing,
    Available,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HelperCapabilities {
    #[serde(default)]
    pub systemctl: bool,
    #[serde(default)]
    pub service: bool,
    #[serde(default)]
    pub curl: bool,
}

#[derive(Debug, Clone)]
pub struct HelperProbe {
    pub status: HelperStatus,
    pub status_probe_ok: bool,
    pub capabilities: Option<HelperCapabilities>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SudoProbe {
    pub non_interactive_available: bool,
    pub requires_tty: bool,
    pub policy_denied: bool,
}

const SUDO_PROBE_TIMEOUT: Duration = Duration::from_millis(1200);
const HELPER_PROBE_TIMEOUT: Duration = Duration::from_millis(1200);

const POLICY_DENIED_MARKERS: &[&str] = &[
    "not in the sudoers",
    "is not allowed to run sudo",
    "may not run sudo",
];

const TTY_REQUIRED_MARKERS: &[&str] = &[
    "a terminal is required",
    "no tty present",
    "a password is required",
    "askpass",
];

pub struct EnvironmentProbe {
    runner: CommandRunner,
}

impl Default for EnvironmentProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentProbe {
    pub fn new() -> Self {
        Self {
            runner: CommandRunner::new(),
        }
    }

    /// Resolves `name` on `PATH`, case-insensitively and stripping a `.exe`
    /// extension on Windows-style names (this core only targets Linux, but
    /// the stripping is harmless and keeps the contract symmetrical).
    pub fn resolve_binary(&self, name: &str) -> BinaryLocation {
        let Some(path_var) = std::env::var_os("PATH") else {
            return BinaryLocation {
                found: false,
                path: None,
            };
        };

        let target = name.trim_end_matches(".exe").to_ascii_lowercase();

        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(name);
            if is_executable_file(&candidate) {
                return BinaryLocation {
                    found: true,
                    path: Some(candidate),
                };
            }

            // Case-insensitive / extension-stripped fallback.
            if let Ok(entries) = std::fs::read_dir(&dir) {
                for entry in entries.flatten() {
                    let file_name = entry.file_name();
                    let file_name = file_name.to_string_lossy();
                    let stem = file_name.trim_end_matches(".exe").to_ascii_lowercase();
                    if stem == target && is_executable_file(&entry.path()) {
                        return BinaryLocation {
                            found: true,
                            path: Some(entry.path()),
                        };
                    }
                }
            }
        }

        BinaryLocation {
            found: false,
            path: None,
        }
    }

    /// True iff an X11/Wayland display is set, or the session type names
    /// one of those display protocols.
    pub fn has_desktop_privilege_prompt(&self) -> bool {
        if std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
        {
            return true;
        }

        matches!(
            std::env::var("XDG_SESSION_TYPE").ok().as_deref(),
            Some("x11") | Some("wayland")
        )
    }

    /// Probes a privileged helper script's availability and, when present,
    /// its declared capabilities via its `status` subcommand.
    pub async fn probe_helper_status(&self, helper_path: Option<&str>) -> HelperProbe {
        let Some(path) = helper_path else {
            return HelperProbe {
                status: HelperStatus::NotConfigured,
                status_probe_ok: false,
                capabilities: None,
            };
        };

        if !std::path::Path::new(path).is_file() {
            return HelperProbe {
                status: HelperStatus::ConfiguredMissing,
                status_probe_ok: false,
                capabilities: None,
            };
        }

        let output = self
            .runner
            .run(
                path,
                &["status".to_string()],
                HELPER_PROBE_TIMEOUT,
                &Default::default(),
                None,
            )
            .await;

        match serde_json::from_str::<HelperCapabilities>(output.stdout.trim()) {
            Ok(capabilities) => {
                debug!("helper status probe parsed capabilities: {capabilities:?}");
                HelperProbe {
                    status: HelperStatus::Available,
                    status_probe_ok: true,
                    capabilities: Some(capabilities),
                }
            }
            Err(_) => HelperProbe {
                status: HelperStatus::Available,
                status_probe_ok: false,
                capabilities: None,
            },
        }
    }

    /// Runs `sudo -n true` and classifies the result.
    pub async fn probe_sudo_non_interactive(&self) -> SudoProbe {
        let output = self
            .runner
            .run(
                "sudo",
                &["-n".to_string(), "true".to_string()],
                SUDO_PROBE_TIMEOUT,
                &Default::default(),
                None,
            )
            .await;

        if output.exit_code == Some(0) {
            return SudoProbe {
                non_interactive_available: true,
                requires_tty: false,
                policy_denied: false,
            };
        }

        let combined = format!("{}\n{}", output.stdout, output.stderr).to_ascii_lowercase();

        if POLICY_DENIED_MARKERS.iter().any(|m| combined.contains(m)) {
            return SudoProbe {
                non_interactive_available: false,
                requires_tty: false,
                policy_denied: true,
            };
        }

        if TTY_REQUIRED_MARKERS.iter().any(|m| combined.contains(m)) {
            return SudoProbe {
                non_interactive_available: false,
                requires_tty: true,
                policy_denied: false,
            };
        }

        SudoProbe::default()
    }
}

fn is_executable_file(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
