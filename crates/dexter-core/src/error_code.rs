//! The stable error-code taxonomy surfaced to the UI bridge across the
//! runtime, uninstall, and update flows. Each variant's `Display`
//! implementation is the exact wire string external interfaces depend on —
//! it must never be renamed casually.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorCode {
    // Runtime install / uninstall / privileged-execution taxonomy.
    UnsupportedPlatform,
    NotImplemented,
    MissingDependency,
    PrivilegeRequired,
    SudoTtyRequired,
    SudoPolicyDenied,
    Timeout,
    ShellSpawnError,
    CommandFailed,
    InvalidConfirmation,

    // Update taxonomy.
    CheckFailed,
    IpcIncompatible,
    RemoteSchemaIncompatible,
    SchemaMigrationUnavailable,
    DownloadFailed,
    NoUpdateAvailableForDownload,
    NoStagedUpdate,
    RestartFailed,
    RestartUnavailable,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedPlatform => "unsupported_platform",
            Self::NotImplemented => "not_implemented",
            Self::MissingDependency => "missing_dependency",
            Self::PrivilegeRequired => "privilege_required",
            Self::SudoTtyRequired => "sudo_tty_required",
            Self::SudoPolicyDenied => "sudo_policy_denied",
            Self::Timeout => "timeout",
            Self::ShellSpawnError => "shell_spawn_error",
            Self::CommandFailed => "command_failed",
            Self::InvalidConfirmation => "invalid_confirmation",
            Self::CheckFailed => "check_failed",
            Self::IpcIncompatible => "ipc_incompatible",
            Self::RemoteSchemaIncompatible => "remote_schema_incompatible",
            Self::SchemaMigrationUnavailable => "schema_migration_unavailable",
            Self::DownloadFailed => "download_failed",
            Self::NoUpdateAvailableForDownload => "no_update_available_for_download",
            Self::NoStagedUpdate => "no_staged_update",
            Self::RestartFailed => "restart_failed",
            Self::RestartUnavailable => "restart_unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorCode {
    /// Parses a wire string back into its `ErrorCode`, the inverse of
    /// `as_str`. Used when rehydrating a persisted error code.
    pub fn parse(value: &str) -> Option<Self> {
        const ALL: &[ErrorCode] = &[
            ErrorCode::UnsupportedPlatform,
            ErrorCode::NotImplemented,
            ErrorCode::MissingDependency,
            ErrorCode::PrivilegeRequired,
            ErrorCode::SudoTtyRequired,
            ErrorCode::SudoPolicyDenied,
            ErrorCode::Timeout,
            ErrorCode::ShellSpawnError,
            ErrorCode::CommandFailed,
            ErrorCode::InvalidConfirmation,
            ErrorCode::CheckFailed,
            ErrorCode::IpcIncompatible,
            ErrorCode::RemoteSchemaIncompatible,
            ErrorCode::SchemaMigrationUnavailable,
            ErrorCode::DownloadFailed,
            ErrorCode::NoUpdateAvailableForDownload,
            ErrorCode::NoStagedUpdate,
            ErrorCode::RestartFailed,
            ErrorCode::RestartUnavailable,
        ];
        ALL.iter().copied().find(|code| code.as_str() == value)
    }
}

/// Classifies command output/exit status into an `ErrorCode` per the fixed,
/// order-sensitive signal table: timeout first, then sudo-policy phrases,
/// then tty-required phrases, then generic privilege phrases, then a null
/// exit code, else a generic command failure.
pub fn classify_failure(timed_out: bool, exit_code: Option<i32>, combined_output: &str) -> ErrorCode {
    if timed_out {
        return ErrorCode::Timeout;
    }

    let lower = combined_output.to_ascii_lowercase();

    const SUDO_POLICY_DENIED: &[&str] = &[
        "not in the sudoers",
        "is not allowed to run sudo",
        "may not run sudo",
    ];
    if SUDO_POLICY_DENIED.iter().any(|m| lower.contains(m)) {
        return ErrorCode::SudoPolicyDenied;
    }

    const SUDO_TTY_REQUIRED: &[&str] = &[
        "a terminal is required",
        "no tty present",
        "a password is required",
        "askpass",
    ];
    if SUDO_TTY_REQUIRED.iter().any(|m| lower.contains(m)) {
        return ErrorCode::SudoTtyRequired;
    }

    const PRIVILEGE_REQUIRED: &[&str] = &[
        "permission denied",
        "not authorized",
        "authentication is needed",
        "polkit",
        "sudo:",
    ];
    if PRIVILEGE_REQUIRED.iter().any(|m| lower.contains(m)) {
        return ErrorCode::PrivilegeRequired;
    }

    if exit_code.is_none() {
        return ErrorCode::ShellSpawnError;
    }

    ErrorCode::CommandFailed
}
