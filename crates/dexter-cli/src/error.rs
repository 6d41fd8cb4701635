use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] dexter_config::error::ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Update(#[from] dexter_update::UpdateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Download(#[from] dexter_dl::DownloadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Audit(#[from] dexter_audit::AuditError),

    #[error("IO error: {0}")]
    #[diagnostic(code(dexter_cli::io))]
    Io(#[from] std::io::Error),

    #[error("unknown permission scope or mode: {0}")]
    #[diagnostic(code(dexter_cli::bad_argument))]
    BadArgument(String),

    #[error("uninstall confirmation token did not match")]
    #[diagnostic(
        code(dexter_cli::confirmation_token),
        help("Pass --token UNINSTALL-DEXTER exactly as printed by the uninstall prompt")
    )]
    ConfirmationRejected,
}

pub type Result<T> = std::result::Result<T, CliError>;
