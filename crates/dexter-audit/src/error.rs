use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum AuditError {
    #[error("IO error: {0}")]
    #[diagnostic(code(dexter_audit::io))]
    Io(#[from] std::io::Error),

    #[error("failed to (de)serialize an audit record: {0}")]
    #[diagnostic(code(dexter_audit::serde))]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;
