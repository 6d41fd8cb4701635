use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum UpdateError {
    #[error("update check failed: {0}")]
    #[diagnostic(code(dexter_update::check_failed))]
    CheckFailed(String),

    #[error("host IPC contract is incompatible with this release")]
    #[diagnostic(code(dexter_update::ipc_incompatible))]
    IpcIncompatible,

    #[error("release requires a remote schema this host cannot satisfy")]
    #[diagnostic(code(dexter_update::remote_schema_incompatible))]
    RemoteSchemaIncompatible,

    #[error("no migration is registered for user-data schema {from} -> {to}")]
    #[diagnostic(code(dexter_update::schema_migration_unavailable))]
    SchemaMigrationUnavailable { from: u32, to: u32 },

    #[error("download failed: {0}")]
    #[diagnostic(code(dexter_update::download_failed))]
    DownloadFailed(String),

    #[error("no update is available to download")]
    #[diagnostic(code(dexter_update::no_update_available_for_download))]
    NoUpdateAvailableForDownload,

    #[error("no staged update is available to apply")]
    #[diagnostic(code(dexter_update::no_staged_update))]
    NoStagedUpdate,

    #[error("restart failed: {0}")]
    #[diagnostic(code(dexter_update::restart_failed))]
    RestartFailed(String),

    #[error("restart is unavailable for this apply mode")]
    #[diagnostic(code(dexter_update::restart_unavailable))]
    RestartUnavailable,

    #[error("IO error: {0}")]
    #[diagnostic(code(dexter_update::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(dexter_update::config))]
    Config(#[from] dexter_config::error::ConfigError),
}

pub type Result<T> = std::result::Result<T, UpdateError>;

impl UpdateError {
    pub fn error_code(&self) -> dexter_core::error_code::ErrorCode {
        use dexter_core::error_code::ErrorCode;
        match self {
            Self::CheckFailed(_) => ErrorCode::CheckFailed,
            Self::IpcIncompatible => ErrorCode::IpcIncompatible,
            Self::RemoteSchemaIncompatible => ErrorCode::RemoteSchemaIncompatible,
            Self::SchemaMigrationUnavailable { .. } => ErrorCode::SchemaMigrationUnavailable,
            Self::DownloadFailed(_) => ErrorCode::DownloadFailed,
            Self::NoUpdateAvailableForDownload => ErrorCode::NoUpdateAvailableForDownload,
            Self::NoStagedUpdate => ErrorCode::NoStagedUpdate,
            Self::RestartFailed(_) => ErrorCode::RestartFailed,
            Self::RestartUnavailable => ErrorCode::RestartUnavailable,
            Self::Io(_) | Self::Config(_) => ErrorCode::CheckFailed,
        }
    }
}
