//! Compact three-segment JWT engine: `header.payload.signature`.

use serde_json::Value;
use tracing::{debug, warn};

use crate::claims::validate_claims;
use crate::clock::{Clock, SystemClock};
use crate::codec::{b64url_decode, b64url_encode};
use crate::error::{JwtError, JwtResult};
use crate::header::{COMPACT_HEADER, validate_compact_header};
use crate::keys::EcdsaKeypair;
use crate::DEFAULT_ISSUER;

/// Build a compact JWT signed by `keypair`.
///
/// `claims` must be a JSON object; `iss` is injected as
/// [`DEFAULT_ISSUER`] if not already present.
///
/// # Errors
/// Returns [`JwtError::InvalidFormat`] if `claims` is not a JSON object,
/// or propagates a signing failure from `keypair`.
pub fn make_jwt(claims: &Value, keypair: &EcdsaKeypair) -> JwtResult<String> {
    debug!("make_jwt");
    let payload = inject_default_issuer(claims)?;
    let payload_json = serde_json::to_vec(&payload)
        .map_err(|e| JwtError::format(format!("failed to serialize claims: {e}")))?;

    let header_b64 = b64url_encode(COMPACT_HEADER.as_bytes());
    let payload_b64 = b64url_encode(&payload_json);
    let signing_input = format!("{header_b64}.{payload_b64}");

    let signature = keypair.sign(signing_input.as_bytes())?;
    let signature_b64 = b64url_encode(&signature);

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Verify and decode a compact JWT.
///
/// If `keypair` is `None`, signature verification is skipped but
/// structure and claims are still validated.
///
/// # Errors
/// Returns [`JwtError::InvalidFormat`] on malformed tokens,
/// [`JwtError::InvalidSignature`] on signature mismatch, and
/// [`JwtError::InvalidClaims`] on claim violations.
pub fn verify_jwt(token: &str, keypair: Option<&EcdsaKeypair>) -> JwtResult<Value> {
    verify_jwt_with_clock(token, keypair, &SystemClock)
}

pub(crate) fn verify_jwt_with_clock(
    token: &str,
    keypair: Option<&EcdsaKeypair>,
    clock: &dyn Clock,
) -> JwtResult<Value> {
    let parts: Vec<&str> = token.split('.').collect();
    let [header_seg, payload_seg, signature_seg] = parts.as_slice() else {
        warn!("verify_jwt: expected 3 dot-separated segments, got {}", parts.len());
        return Err(JwtError::format("token must have exactly 3 segments"));
    };

    let header_bytes = b64url_decode(header_seg)?;
    validate_compact_header(&header_bytes)?;

    let payload_bytes = b64url_decode(payload_seg)?;
    let claims: Value = serde_json::from_slice(&payload_bytes)
        .map_err(|e| JwtError::format(format!("malformed payload JSON: {e}")))?;
    if !claims.is_object() {
        return Err(JwtError::format("payload must be a JSON object"));
    }

    if let Some(keypair) = keypair {
        let signature_bytes = b64url_decode(signature_seg)?;
        let signature: [u8; 64] = signature_bytes
            .try_into()
            .map_err(|_| JwtError::InvalidSignature)?;
        let signing_input = format!("{header_seg}.{payload_seg}");
        if !keypair.verify(signing_input.as_bytes(), &signature) {
            warn!("verify_jwt: signature mismatch");
            return Err(JwtError::InvalidSignature);
        }
    }

    validate_claims(&claims, clock)?;
    Ok(claims)
}

pub(crate) fn inject_default_issuer(claims: &Value) -> JwtResult<Value> {
    let obj = claims
        .as_object()
        .ok_or_else(|| JwtError::format("claims must be a JSON object"))?;
    let mut obj = obj.clone();
    obj.entry("iss")
        .or_insert_with(|| Value::String(DEFAULT_ISSUER.to_string()));
    Ok(Value::Object(obj))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use serde_json::json;

    fn keypair() -> EcdsaKeypair {
        EcdsaKeypair::generate().unwrap()
    }

    #[test]
    fn round_trips_claims_and_injects_issuer() {
        let kp = keypair();
        let token = make_jwt(&json!({"message": "hi"}), &kp).unwrap();
        let claims = verify_jwt(&token, Some(&kp)).unwrap();
        assert_eq!(claims["message"], "hi");
        assert_eq!(claims["iss"], "oneID");
    }

    #[test]
    fn preserves_explicit_issuer() {
        let kp = keypair();
        let token = make_jwt(&json!({"iss": "not-oneid"}), &kp).unwrap();
        let claims = verify_jwt(&token, Some(&kp)).unwrap();
        assert_eq!(claims["iss"], "not-oneid");
    }

    #[test]
    fn verifies_without_keypair_but_checks_claims() {
        let kp = keypair();
        let token = make_jwt(&json!({"a": 1}), &kp).unwrap();
        let claims = verify_jwt(&token, None).unwrap();
        assert_eq!(claims["a"], 1);
    }

    #[test]
    fn rejects_non_object_claims() {
        let kp = keypair();
        assert!(make_jwt(&json!(123), &kp).is_err());
        assert!(make_jwt(&json!(123.456), &kp).is_err());
        assert!(make_jwt(&json!(["a", "b"]), &kp).is_err());
    }

    #[test]
    fn rejects_wrong_signing_key() {
        let kp1 = keypair();
        let kp2 = keypair();
        let token = make_jwt(&json!({"a": 1}), &kp1).unwrap();
        match verify_jwt(&token, Some(&kp2)) {
            Err(JwtError::InvalidSignature) => {}
            other => panic!("expected InvalidSignature, got {other:?}"),
        }
    }

    #[test]
    fn rejects_tampered_header_alg() {
        let kp = keypair();
        let token = make_jwt(&json!({"a": 1}), &kp).unwrap();
        let bad_header = crate::codec::b64url_encode(br#"{"typ":"JWT","alg":"NONE"}"#);
        let rest: Vec<&str> = token.split('.').skip(1).collect();
        let bad_token = format!("{bad_header}.{}", rest.join("."));
        assert!(matches!(
            verify_jwt(&bad_token, Some(&kp)),
            Err(JwtError::InvalidFormat(_))
        ));
    }

    #[test]
    fn rejects_header_with_extra_keys() {
        let kp = keypair();
        let token = make_jwt(&json!({"a": 1}), &kp).unwrap();
        let bad_header =
            crate::codec::b64url_encode(br#"{"typ":"JWT","alg":"ES256","bogosity":true}"#);
        let rest: Vec<&str> = token.split('.').skip(1).collect();
        let bad_token = format!("{bad_header}.{}", rest.join("."));
        assert!(matches!(
            verify_jwt(&bad_token, Some(&kp)),
            Err(JwtError::InvalidFormat(_))
        ));
    }

    #[test]
    fn rejects_non_base64_header() {
        assert!(matches!(
            verify_jwt("not base64!.xx.yy", None),
            Err(JwtError::InvalidFormat(_))
        ));
    }

    #[test]
    fn rejects_missing_signature_segment() {
        let kp = keypair();
        let token = make_jwt(&json!({"a": 1}), &kp).unwrap();
        let truncated: Vec<&str> = token.split('.').take(2).collect();
        assert!(matches!(
            verify_jwt(&truncated.join("."), Some(&kp)),
            Err(JwtError::InvalidFormat(_))
        ));
    }

    #[test]
    fn expiry_uses_clock_seam_deterministically() {
        let kp = keypair();
        let token = make_jwt(&json!({"exp": 1_000 - crate::LEEWAY + 2}), &kp).unwrap();
        verify_jwt_with_clock(&token, Some(&kp), &FixedClock(1_000)).unwrap();
        assert!(verify_jwt_with_clock(
            &token,
            Some(&kp),
            &FixedClock(1_000 + crate::LEEWAY + 4)
        )
        .is_err());
    }
}
