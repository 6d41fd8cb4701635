//! Ed25519 detached-signature verification over raw manifest bytes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{Signature, VerifyingKey};

use crate::error::DownloadError;

const SPKI_HEADER_LEN: usize = 12;

/// Extracts the raw 32-byte Ed25519 public key from a PEM-armored block.
/// Accepts either a bare base64-encoded 32-byte key or a DER
/// SubjectPublicKeyInfo wrapping one (the common `openssl genpkey` output),
/// identified by the trailing 32 bytes once the fixed 12-byte Ed25519 SPKI
/// algorithm header is accounted for.
fn parse_public_key_pem(pem: &str) -> Result<VerifyingKey, DownloadError> {
    let body: String = pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect();

    let decoded = STANDARD
        .decode(body.trim())
        .map_err(|_| DownloadError::SignatureInvalid)?;

    let key_bytes: [u8; 32] = match decoded.len() {
        32 => decoded.try_into().unwrap(),
        len if len > 32 => decoded[len - 32..].try_into().unwrap(),
        _ => return Err(DownloadError::SignatureInvalid),
    };

    VerifyingKey::from_bytes(&key_bytes).map_err(|_| DownloadError::SignatureInvalid)
}

/// Verifies `signature_b64` (base64 over the raw Ed25519 signature bytes)
/// against `message` using the PEM-armored public key `public_key_pem`.
pub fn verify(
    message: &[u8],
    signature_b64: &str,
    public_key_pem: &str,
) -> Result<(), DownloadError> {
    let verifying_key = parse_public_key_pem(public_key_pem)?;

    let sig_bytes = STANDARD
        .decode(signature_b64.trim())
        .map_err(|_| DownloadError::SignatureInvalid)?;
    let sig_bytes: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| DownloadError::SignatureInvalid)?;
    let signature = Signature::from_bytes(&sig_bytes);

    verifying_key
        .verify_strict(message, &signature)
        .map_err(|_| DownloadError::SignatureInvalid)
}
