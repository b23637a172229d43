//! Protected header construction and validation.
//!
//! Signature stability across implementations hinges on byte-identical
//! header serialization, so the headers below are built from fixed
//! literals rather than `serde_json::to_vec` (a general JSON encoder may
//! reorder keys or insert whitespace, silently producing a token whose
//! signing input no other implementation reproduces).

use serde_json::Value;

use crate::error::{JwtError, JwtResult};

/// The exact, byte-stable compact-token protected header.
pub const COMPACT_HEADER: &str = r#"{"typ":"JWT","alg":"ES256"}"#;

/// Build the byte-stable per-signer protected header for a multi-signature
/// envelope. `kid` is JSON-string-escaped; callers are expected to supply
/// plain identities (short alphanumeric/UUID-like strings) as documented,
/// so this uses `serde_json::Value::String`'s `Display` rather than a
/// hand-rolled escaper.
#[must_use]
pub fn multi_sig_header(kid: &str) -> String {
    format!(
        r#"{{"typ":"JOSE+JSON","alg":"ES256","kid":{}}}"#,
        Value::String(kid.to_string())
    )
}

/// Parse and validate a compact-token protected header: exactly the keys
/// `typ` and `alg`, with values `"JWT"` and `"ES256"`.
pub fn validate_compact_header(bytes: &[u8]) -> JwtResult<()> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| JwtError::format(format!("malformed header JSON: {e}")))?;
    let obj = value
        .as_object()
        .ok_or_else(|| JwtError::format("header must be a JSON object"))?;

    if obj.len() != 2 {
        return Err(JwtError::format("header must contain exactly typ and alg"));
    }
    if obj.get("typ").and_then(Value::as_str) != Some("JWT") {
        return Err(JwtError::format("header typ must be \"JWT\""));
    }
    if obj.get("alg").and_then(Value::as_str) != Some("ES256") {
        return Err(JwtError::format("header alg must be \"ES256\""));
    }
    Ok(())
}

/// A parsed per-signer protected header from a multi-signature envelope.
pub struct MultiSigHeader {
    pub kid: String,
}

/// Parse and validate a per-signer protected header: exactly the keys
/// `typ`, `alg`, `kid`.
pub fn parse_multi_sig_header(bytes: &[u8]) -> JwtResult<MultiSigHeader> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| JwtError::format(format!("malformed protected header JSON: {e}")))?;
    let obj = value
        .as_object()
        .ok_or_else(|| JwtError::format("protected header must be a JSON object"))?;

    match obj.get("typ").and_then(Value::as_str) {
        Some("JOSE+JSON") => {}
        Some(other) => {
            return Err(JwtError::format(format!(
                "protected header typ must be \"JOSE+JSON\", got {other:?}"
            )));
        }
        None => return Err(JwtError::format("protected header missing typ")),
    }

    match obj.get("alg").and_then(Value::as_str) {
        Some("ES256") => {}
        Some(other) => {
            return Err(JwtError::InvalidAlgorithm(format!(
                "unsupported alg {other:?}"
            )));
        }
        None => return Err(JwtError::InvalidAlgorithm("missing alg".to_string())),
    }

    let kid = obj
        .get("kid")
        .and_then(Value::as_str)
        .ok_or_else(|| JwtError::format("protected header missing kid"))?
        .to_string();

    Ok(MultiSigHeader { kid })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::b64url_decode;

    #[test]
    fn compact_header_is_byte_stable() {
        assert_eq!(COMPACT_HEADER, r#"{"typ":"JWT","alg":"ES256"}"#);
        validate_compact_header(COMPACT_HEADER.as_bytes()).unwrap();
    }

    #[test]
    fn rejects_wrong_alg() {
        let bad = r#"{"typ":"JWT","alg":"NONE"}"#;
        assert!(validate_compact_header(bad.as_bytes()).is_err());
    }

    #[test]
    fn rejects_extra_keys() {
        let bad = r#"{"typ":"JWT","alg":"ES256","bogosity":true}"#;
        assert!(validate_compact_header(bad.as_bytes()).is_err());
    }

    #[test]
    fn multi_sig_header_round_trips() {
        let header = multi_sig_header("key-007");
        let parsed = parse_multi_sig_header(header.as_bytes()).unwrap();
        assert_eq!(parsed.kid, "key-007");
    }

    #[test]
    fn multi_sig_header_escapes_kid() {
        let header = multi_sig_header("weird\"kid");
        let decoded = b64url_decode(&crate::codec::b64url_encode(header.as_bytes())).unwrap();
        let parsed = parse_multi_sig_header(&decoded).unwrap();
        assert_eq!(parsed.kid, "weird\"kid");
    }

    #[test]
    fn missing_kid_is_invalid_format() {
        let bad = r#"{"typ":"JOSE+JSON","alg":"ES256"}"#;
        assert!(parse_multi_sig_header(bad.as_bytes()).is_err());
    }

    #[test]
    fn missing_alg_is_invalid_algorithm() {
        let bad = r#"{"typ":"JOSE+JSON","kid":"x"}"#;
        match parse_multi_sig_header(bad.as_bytes()) {
            Err(JwtError::InvalidAlgorithm(_)) => {}
            other => panic!("expected InvalidAlgorithm, got {other:?}"),
        }
    }
}
