//! URL-safe base64 codec and UTF-8/byte coercion helpers.
//!
//! Output is always unpadded; input tolerates both padded and unpadded
//! forms, since different JOSE implementations disagree on whether `=`
//! padding is emitted.

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};

use crate::error::{JwtError, JwtResult};

/// Encode `bytes` as URL-safe base64 without padding.
#[must_use]
pub fn b64url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode URL-safe base64, with or without `=` padding.
///
/// # Errors
/// Returns [`JwtError::InvalidFormat`] if `input` contains characters
/// outside the URL-safe alphabet, or cannot be decoded once re-padded.
pub fn b64url_decode(input: &str) -> JwtResult<Vec<u8>> {
    let padded = repad(input);
    URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| JwtError::format(format!("invalid base64url: {e}")))
}

fn repad(input: &str) -> String {
    let remainder = input.len() % 4;
    if remainder == 0 {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len() + 4);
    out.push_str(input);
    for _ in 0..(4 - remainder) {
        out.push('=');
    }
    out
}

/// Coerce a UTF-8 byte string into `String`, rejecting invalid UTF-8.
pub fn to_string(bytes: &[u8]) -> JwtResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| JwtError::format(format!("invalid utf-8: {e}")))
}
