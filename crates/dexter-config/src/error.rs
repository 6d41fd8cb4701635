use dexter_utils::error::{PathError, UtilsError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("JSON serialization error: {0}")]
    #[diagnostic(
        code(dexter_config::json_serialize),
        help("Check the structure being persisted for invalid values")
    )]
    JsonSerError(serde_json::Error),

    #[error("JSON deserialization error: {0}")]
    #[diagnostic(
        code(dexter_config::json_deserialize),
        help("Check the on-disk JSON file for syntax errors or a stale schema")
    )]
    JsonDeError(serde_json::Error),

    #[error("Unknown permission scope: {0}")]
    #[diagnostic(
        code(dexter_config::unknown_scope),
        help("Permission scopes are limited to a fixed set")
    )]
    UnknownScope(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(dexter_config::io))]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(dexter_config::utils))]
    Utils(#[from] UtilsError),
}

impl From<PathError> for ConfigError {
    fn from(err: PathError) -> Self {
        Self::Utils(UtilsError::Path(err))
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
