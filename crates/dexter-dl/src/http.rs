use std::{fs::File, io::Write as _, path::Path};

use tracing::{debug, trace};
use ureq::{http::header::CONTENT_LENGTH, http::Response, Body};

use crate::{error::DownloadError, http_client::SHARED_AGENT, types::Progress};

pub struct Http;

impl Http {
    /// Fetches the body at `url` as UTF-8 text (manifest and detached
    /// signature assets are both plain text/binary-as-base64).
    pub fn text(url: &str) -> Result<String, DownloadError> {
        debug!(url = url, "fetching text");
        let mut resp = SHARED_AGENT.get(url).call()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DownloadError::HttpError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        resp.body_mut()
            .read_to_string()
            .map_err(|_| DownloadError::InvalidResponse)
    }

    /// Fetches and deserializes a JSON body at `url`.
    pub fn json<T: serde::de::DeserializeOwned>(url: &str) -> Result<T, DownloadError> {
        debug!(url = url, "fetching JSON");
        let mut resp = SHARED_AGENT.get(url).call()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DownloadError::HttpError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let result = resp
            .body_mut()
            .read_json()
            .map_err(|_| DownloadError::InvalidResponse);
        if result.is_ok() {
            trace!(url = url, "JSON parsed successfully");
        }
        result
    }

    /// Downloads `url` to `dest`, creating parent directories as needed and
    /// reporting progress via `on_progress`.
    pub fn download_to_file(
        url: &str,
        dest: &Path,
        on_progress: Option<&dyn Fn(Progress)>,
    ) -> Result<(), DownloadError> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        trace!(url = url, dest = %dest.display(), "downloading artifact");
        let resp = SHARED_AGENT.get(url).call()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DownloadError::HttpError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let total = content_length(&resp);
        if let Some(cb) = on_progress {
            cb(Progress::Starting { total });
        }

        let mut file = File::create(dest)?;
        let mut reader = resp.into_body().into_reader();
        let mut buffer = [0u8; 8192];
        let mut downloaded = 0u64;

        loop {
            use std::io::Read as _;
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            file.write_all(&buffer[..n])?;
            downloaded += n as u64;
            if let Some(cb) = on_progress {
                cb(Progress::Chunk {
                    current: downloaded,
                    total,
                });
            }
        }

        if let Some(cb) = on_progress {
            cb(Progress::Complete { total });
        }

        Ok(())
    }
}

fn content_length(resp: &Response<Body>) -> u64 {
    resp.headers()
        .get(CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|len| len.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Downloads `url` to `dest` and verifies the result against
/// `expected_checksum_sha256`, deleting the file and returning
/// [`DownloadError::ChecksumMismatch`] on a mismatch.
pub fn download_and_verify(
    url: &str,
    dest: &Path,
    expected_checksum_sha256: &str,
    on_progress: Option<&dyn Fn(Progress)>,
) -> Result<(), DownloadError> {
    Http::download_to_file(url, dest, on_progress)?;

    let matches = dexter_utils::hash::verify_checksum(dest, expected_checksum_sha256)
        .map_err(|_| DownloadError::InvalidResponse)?;

    if !matches {
        let _ = std::fs::remove_file(dest);
        return Err(DownloadError::ChecksumMismatch);
    }

    Ok(())
}
