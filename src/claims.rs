//! Standard claim validation: `exp`, `nbf`, and `jti`.
//!
//! Non-numeric `exp`/`nbf` values are treated as absent rather than
//! rejected (a lenient claim mapping must never crash verification).

use serde_json::Value;

use crate::clock::Clock;
use crate::error::{JwtError, JwtResult};
use crate::nonce::validate_nonce;
use crate::LEEWAY;

/// Validate the standard time-bound and nonce claims in `claims` against
/// `clock`.
///
/// # Errors
/// Returns [`JwtError::InvalidClaims`] if `exp`/`nbf` are violated or the
/// `jti` nonce is rejected.
pub fn validate_claims(claims: &Value, clock: &dyn Clock) -> JwtResult<()> {
    let Some(obj) = claims.as_object() else {
        return Ok(());
    };
    let now = clock.now_unix();

    if let Some(exp) = obj.get("exp").and_then(Value::as_i64) {
        if now > exp + LEEWAY {
            return Err(JwtError::claims("token has expired"));
        }
    }

    if let Some(nbf) = obj.get("nbf").and_then(Value::as_i64) {
        if now + LEEWAY < nbf {
            return Err(JwtError::claims("token is not yet valid"));
        }
    }

    if let Some(jti) = obj.get("jti").and_then(Value::as_str) {
        validate_nonce(jti, clock)?;
    }

    Ok(())
}
