use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum DownloadError {
    #[error("Network request failed")]
    #[diagnostic(
        code(dexter_dl::network),
        help("Check your internet connection or try again later")
    )]
    Network(#[from] Box<ureq::Error>),

    #[error("HTTP {status}: {url}")]
    #[diagnostic(code(dexter_dl::http_error))]
    HttpError { status: u16, url: String },

    #[error("I/O error: {0}")]
    #[diagnostic(code(dexter_dl::io))]
    Io(#[from] std::io::Error),

    #[error("Invalid response from release provider")]
    #[diagnostic(code(dexter_dl::invalid_response))]
    InvalidResponse,

    #[error("No releases found for the configured channel")]
    #[diagnostic(code(dexter_dl::no_releases))]
    NoReleases,

    #[error("Manifest is invalid: {0}")]
    #[diagnostic(code(dexter_dl::manifest_invalid))]
    ManifestInvalid(String),

    #[error("Manifest signature verification failed")]
    #[diagnostic(
        code(dexter_dl::signature_missing),
        help("A public key is configured but no signature asset was found for this release")
    )]
    SignatureMissing,

    #[error("Manifest signature did not verify")]
    #[diagnostic(code(dexter_dl::signature_invalid))]
    SignatureInvalid,

    #[error("No artifact matches this platform/arch")]
    #[diagnostic(code(dexter_dl::no_artifact))]
    NoArtifactForPlatform,

    #[error("Downloaded artifact checksum does not match the manifest")]
    #[diagnostic(code(dexter_dl::checksum_mismatch))]
    ChecksumMismatch,
}

pub type Result<T> = std::result::Result<T, DownloadError>;

impl From<ureq::Error> for DownloadError {
    fn from(e: ureq::Error) -> Self {
        Self::Network(Box::new(e))
    }
}
