//! `jti` nonce policy.
//!
//! A nonce is `NNN` + an RFC-3339 UTC timestamp (`YYYY-MM-DDTHH:MM:SSZ`)
//! + 6 arbitrary trailer characters. Only the `"001"` (issuer-minted)
//! prefix is recognized; it is accepted iff the embedded timestamp falls
//! within `[now - NONCE_VALIDITY, now + LEEWAY]`.
//!
//! This validates nonces by embedded timestamp only and does not
//! persist seen nonces for replay protection. A production deployment
//! wanting replay protection would need a bounded cache of accepted
//! nonces in front of this policy; that is out of scope here.

use chrono::NaiveDateTime;

use crate::clock::Clock;
use crate::error::{JwtError, JwtResult};
use crate::{LEEWAY, NONCE_VALIDITY};

const ISSUER_MINTED_PREFIX: &str = "001";
const PREFIX_LEN: usize = 3;
const TIMESTAMP_LEN: usize = 20;
const TRAILER_LEN: usize = 6;
const NONCE_LEN: usize = PREFIX_LEN + TIMESTAMP_LEN + TRAILER_LEN;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Validate a `jti` nonce against the clock.
///
/// # Errors
/// Returns [`JwtError::InvalidClaims`] if the nonce is malformed, carries
/// an unrecognized prefix, or its embedded timestamp falls outside the
/// acceptance window.
pub fn validate_nonce(jti: &str, clock: &dyn Clock) -> JwtResult<()> {
    if !jti.is_ascii() || jti.len() != NONCE_LEN {
        return Err(JwtError::claims(format!(
            "jti must be {NONCE_LEN} ASCII characters, got {}",
            jti.len()
        )));
    }

    let prefix = &jti[..PREFIX_LEN];
    if prefix != ISSUER_MINTED_PREFIX {
        return Err(JwtError::claims(format!(
            "unrecognized jti prefix {prefix:?}"
        )));
    }

    let timestamp_str = &jti[PREFIX_LEN..PREFIX_LEN + TIMESTAMP_LEN];
    let timestamp = NaiveDateTime::parse_from_str(timestamp_str, TIMESTAMP_FORMAT)
        .map_err(|e| JwtError::claims(format!("malformed jti timestamp: {e}")))?
        .and_utc()
        .timestamp();

    let now = clock.now_unix();
    if timestamp < now - NONCE_VALIDITY || timestamp > now + LEEWAY {
        return Err(JwtError::claims("expired or out-of-window jti nonce"));
    }

    Ok(())
}
