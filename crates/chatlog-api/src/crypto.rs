//! Webhook signature generation and verification.
//!
//! The platform signs every delivery with HMAC-SHA256 over the raw request
//! body, keyed by the channel secret, and sends the base64-encoded digest in
//! the `X-Line-Signature` header.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Signature verification errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Signature header present but empty.
    #[error("signature header is empty")]
    Empty,
    /// Signature is not valid base64.
    #[error("signature is not valid base64")]
    InvalidEncoding,
    /// Signature does not match the body.
    #[error("signature mismatch")]
    Mismatch,
    /// Secret cannot key the MAC.
    #[error("invalid secret key")]
    InvalidSecret,
}

/// Computes the base64-encoded HMAC-SHA256 signature of `body`.
///
/// # Errors
///
/// Returns `SignatureError::InvalidSecret` if the secret cannot key the MAC.
pub fn sign(body: &[u8], secret: &str) -> Result<String, SignatureError> {
    let mut mac = new_mac(secret)?;
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verifies `signature` against the HMAC-SHA256 of `body`.
///
/// The digest comparison runs in constant time.
///
/// # Example
///
/// ```
/// use chatlog_api::crypto::{sign, verify_signature};
///
/// let body = br#"{"events":[]}"#;
/// let signature = sign(body, "channel-secret").unwrap();
///
/// assert!(verify_signature(body, &signature, "channel-secret").is_ok());
/// assert!(verify_signature(body, &signature, "other-secret").is_err());
/// ```
///
/// # Errors
///
/// Returns a [`SignatureError`] describing why the signature was rejected.
pub fn verify_signature(body: &[u8], signature: &str, secret: &str) -> Result<(), SignatureError> {
    let signature = signature.trim();
    if signature.is_empty() {
        return Err(SignatureError::Empty);
    }

    let provided = STANDARD.decode(signature).map_err(|_| SignatureError::InvalidEncoding)?;

    let mut mac = new_mac(secret)?;
    mac.update(body);
    mac.verify_slice(&provided).map_err(|_| SignatureError::Mismatch)
}

fn new_mac(secret: &str) -> Result<HmacSha256, SignatureError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)
}
