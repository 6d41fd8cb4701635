//! Error types for dexter-core.

use std::error::Error;

use dexter_config::error::ConfigError;
use dexter_utils::error::{FileSystemError, HashError, PathError};
use miette::Diagnostic;
use thiserror::Error;

/// Core error type shared across dexter's local operations components.
#[derive(Error, Diagnostic, Debug)]
pub enum DexterError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("System error: {0}")]
    #[diagnostic(code(dexter::system), help("Check system permissions and resources"))]
    Errno(#[from] nix::errno::Errno),

    #[error("Environment variable '{0}' not set")]
    #[diagnostic(
        code(dexter::env_var),
        help("Set the required environment variable before running")
    )]
    VarError(#[from] std::env::VarError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystemError(#[from] FileSystemError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    HashError(#[from] HashError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    PathError(#[from] PathError),

    #[error("IO error while {action}")]
    #[diagnostic(code(dexter::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("System time error: {0}")]
    #[diagnostic(code(dexter::time))]
    SystemTimeError(#[from] std::time::SystemTimeError),

    #[error("HTTP request failed")]
    #[diagnostic(
        code(dexter::network),
        help("Check your internet connection and try again")
    )]
    UreqError(#[from] ureq::Error),

    #[error("Failed to fetch from remote source: {0}")]
    #[diagnostic(
        code(dexter::fetch),
        help("Check your internet connection and the configured release provider")
    )]
    FailedToFetchRemote(String),

    #[error("Invalid path specified")]
    #[diagnostic(code(dexter::invalid_path), help("Provide a valid file or directory path"))]
    InvalidPath,

    #[error("Path '{path}' is not safely containable")]
    #[diagnostic(
        code(dexter::unsafe_path),
        help("Refusing to operate outside the expected root directory")
    )]
    UnsafePath { path: String },

    #[error("Thread lock poison error")]
    #[diagnostic(code(dexter::poison), help("This is an internal error, please report it"))]
    PoisonError,

    #[error("Invalid checksum detected")]
    #[diagnostic(
        code(dexter::checksum),
        help("The downloaded artifact may be corrupted. Try downloading again.")
    )]
    InvalidChecksum,

    #[error("Manifest signature verification failed: {0}")]
    #[diagnostic(
        code(dexter::signature),
        help("The manifest may be tampered with, or the configured public key is stale")
    )]
    InvalidSignature(String),

    #[error("Update blocked by compatibility check [{code}]: {reason}")]
    #[diagnostic(
        code(dexter::compatibility_blocked),
        help("A schema or IPC contract migration is required before this update can apply")
    )]
    CompatibilityBlocked { code: String, reason: String },

    #[error("Uninstall confirmation token did not match")]
    #[diagnostic(
        code(dexter::confirmation_token),
        help("Re-read the confirmation prompt and pass the exact token back")
    )]
    ConfirmationTokenInvalid,

    #[error("{0}")]
    #[diagnostic(code(dexter::error))]
    Custom(String),

    #[error("{0}")]
    #[diagnostic(code(dexter::warning), severity(warning))]
    Warning(String),

    #[error("Regex compilation error: {0}")]
    #[diagnostic(code(dexter::regex), help("Check your regex pattern syntax"))]
    RegexError(#[from] regex::Error),
}

impl DexterError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn root_cause(&self) -> String {
        match self {
            Self::UreqError(e) => {
                format!(
                    "Root cause: {}",
                    e.source()
                        .map_or_else(|| e.to_string(), |source| source.to_string())
                )
            }
            Self::Config(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for DexterError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::PoisonError
    }
}

/// Trait for adding context to IO errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, DexterError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, DexterError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| DexterError::IoError {
            action: context(),
            source: err,
        })
    }
}
