//! Multi-signature envelope engine: creation, extension, and verification
//! of JSON-serialized envelopes carrying one payload and an ordered list
//! of independent signatures.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::claims::validate_claims;
use crate::clock::{Clock, SystemClock};
use crate::codec::{b64url_decode, b64url_encode};
use crate::compact::inject_default_issuer;
use crate::error::{JwtError, JwtResult};
use crate::header::{COMPACT_HEADER, multi_sig_header, parse_multi_sig_header, validate_compact_header};
use crate::keys::EcdsaKeypair;
use crate::sigcodec::RAW_SIGNATURE_LEN;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SignatureEntry {
    protected: String,
    signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    payload: String,
    signatures: Vec<SignatureEntry>,
}

/// Build a multi-signature envelope, signed in order by `keypairs`.
///
/// An empty `keypairs` slice is allowed and produces `signatures: []`.
///
/// # Errors
/// Returns [`JwtError::InvalidKey`] if any signer lacks a non-empty
/// `identity`, or [`JwtError::InvalidFormat`] if `claims` is not a JSON
/// object.
pub fn make_jws(claims: &Value, keypairs: &[EcdsaKeypair]) -> JwtResult<String> {
    debug!(signers = keypairs.len(), "make_jws");
    for keypair in keypairs {
        require_identity(keypair)?;
    }

    let payload = inject_default_issuer(claims)?;
    let payload_json = serde_json::to_vec(&payload)
        .map_err(|e| JwtError::format(format!("failed to serialize claims: {e}")))?;
    let payload_b64 = b64url_encode(&payload_json);

    let mut signatures = Vec::with_capacity(keypairs.len());
    for keypair in keypairs {
        let identity = keypair.identity().unwrap_or_default();
        let header = multi_sig_header(identity);
        let protected_b64 = b64url_encode(header.as_bytes());
        let signing_input = format!("{protected_b64}.{payload_b64}");
        let signature = keypair.sign(signing_input.as_bytes())?;
        signatures.push(SignatureEntry {
            protected: protected_b64,
            signature: b64url_encode(&signature),
        });
    }

    let envelope = Envelope {
        payload: payload_b64,
        signatures,
    };
    serde_json::to_string(&envelope)
        .map_err(|e| JwtError::format(format!("failed to serialize envelope: {e}")))
}

/// Verify a multi-signature envelope, or a compact token promoted to a
/// one-entry envelope.
///
/// An empty `keypairs` slice skips signature verification entirely (as
/// `verify_jwt`'s `None` keypair does), checking only envelope structure
/// and claims. Otherwise, under `verify_all = true`, the caller's keypair
/// identities and the envelope's signer `kid`s must be the same
/// multiset; under `verify_all = false`, at least one caller keypair
/// must verify at least one signature.
///
/// # Errors
/// See the variants of [`JwtError`]; notably [`JwtError::InvalidFormat`]
/// for malformed input, [`JwtError::KeySignatureMismatch`] for a kid-set
/// mismatch under strict verification, and [`JwtError::InvalidSignature`]
/// for a failed or absent signature.
pub fn verify_jws(input: &[u8], keypairs: &[EcdsaKeypair], verify_all: bool) -> JwtResult<Value> {
    verify_jws_with_clock(input, keypairs, verify_all, &SystemClock)
}

fn verify_jws_with_clock(
    input: &[u8],
    keypairs: &[EcdsaKeypair],
    verify_all: bool,
    clock: &dyn Clock,
) -> JwtResult<Value> {
    if let Some(compact) = as_compact_token(input) {
        return verify_promoted_compact(compact, keypairs, clock);
    }

    let envelope = parse_envelope(input)?;
    let payload_b64 = envelope.payload.clone();
    let payload_bytes = b64url_decode(&payload_b64)?;
    let claims: Value = serde_json::from_slice(&payload_bytes)
        .map_err(|e| JwtError::format(format!("malformed payload JSON: {e}")))?;

    let mut entries = Vec::with_capacity(envelope.signatures.len());
    for entry in &envelope.signatures {
        let header_bytes = b64url_decode(&entry.protected)?;
        let header = parse_multi_sig_header(&header_bytes)?;
        entries.push((header.kid, entry));
    }

    if entries.is_empty() {
        warn!("verify_jws: envelope has zero signatures");
        return Err(JwtError::InvalidSignature);
    }

    if keypairs.is_empty() {
        debug!("verify_jws: no keypairs supplied, skipping signature verification");
    } else if verify_all {
        verify_all_signers(&entries, keypairs, &payload_b64)?;
    } else {
        verify_any_signer(&entries, keypairs, &payload_b64)?;
    }

    validate_claims(&claims, clock)?;
    Ok(claims)
}

fn require_identity(keypair: &EcdsaKeypair) -> JwtResult<()> {
    match keypair.identity() {
        Some(id) if !id.is_empty() => Ok(()),
        _ => Err(JwtError::key("signing keypair must carry a non-empty identity")),
    }
}

fn parse_envelope(input: &[u8]) -> JwtResult<Envelope> {
    let envelope: Envelope = serde_json::from_slice(input)
        .map_err(|e| JwtError::format(format!("not a multi-signature envelope: {e}")))?;
    Ok(envelope)
}

/// `Some(token)` if `input` is a well-formed compact JWT (three segments
/// with a valid compact header); `None` otherwise, so the caller falls
/// through to envelope parsing.
fn as_compact_token(input: &[u8]) -> Option<&str> {
    let token = std::str::from_utf8(input).ok()?;
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let header_bytes = b64url_decode(parts[0]).ok()?;
    validate_compact_header(&header_bytes).ok()?;
    Some(token)
}

fn verify_promoted_compact(
    token: &str,
    keypairs: &[EcdsaKeypair],
    clock: &dyn Clock,
) -> JwtResult<Value> {
    match keypairs.len() {
        0 => crate::compact::verify_jwt_with_clock(token, None, clock),
        1 => crate::compact::verify_jwt_with_clock(token, Some(&keypairs[0]), clock),
        _ => Err(JwtError::format(
            "multi-signer verification of a compact token is not defined",
        )),
    }
}

fn decode_signature(entry: &SignatureEntry) -> JwtResult<[u8; RAW_SIGNATURE_LEN]> {
    let bytes = b64url_decode(&entry.signature)?;
    bytes
        .try_into()
        .map_err(|_| JwtError::InvalidSignature)
}

/// An entry's protected header and payload, as actually signed. Entries
/// promoted by [`extend_jws_signatures`] from a compact token keep the
/// *original* two-field compact header as their true signing input even
/// though their `protected` field (for kid bookkeeping) describes the
/// three-field JOSE+JSON form (see the doc comment on
/// `extend_jws_signatures` for why).
fn verify_entry(entry: &SignatureEntry, payload_b64: &str, keypair: &EcdsaKeypair) -> JwtResult<()> {
    let signature = decode_signature(entry)?;
    let primary_input = format!("{}.{payload_b64}", entry.protected);
    if keypair.verify(primary_input.as_bytes(), &signature) {
        return Ok(());
    }

    let compact_header_b64 = b64url_encode(COMPACT_HEADER.as_bytes());
    let promoted_input = format!("{compact_header_b64}.{payload_b64}");
    if keypair.verify(promoted_input.as_bytes(), &signature) {
        return Ok(());
    }

    Err(JwtError::InvalidSignature)
}

fn verify_all_signers(
    entries: &[(String, &SignatureEntry)],
    keypairs: &[EcdsaKeypair],
    payload_b64: &str,
) -> JwtResult<()> {
    let caller_ids = dedup_checked_identities(keypairs)?;

    let mut envelope_kids: Vec<&str> = entries.iter().map(|(kid, _)| kid.as_str()).collect();
    let mut caller_kids: Vec<&str> = caller_ids.iter().map(String::as_str).collect();
    envelope_kids.sort_unstable();
    caller_kids.sort_unstable();
    if envelope_kids != caller_kids {
        return Err(JwtError::KeySignatureMismatch);
    }

    let by_identity: HashMap<&str, &EcdsaKeypair> = keypairs
        .iter()
        .filter_map(|k| k.identity().map(|id| (id, k)))
        .collect();

    for (kid, entry) in entries {
        let keypair = by_identity
            .get(kid.as_str())
            .ok_or(JwtError::KeySignatureMismatch)?;
        verify_entry(entry, payload_b64, keypair)?;
    }
    Ok(())
}

fn verify_any_signer(
    entries: &[(String, &SignatureEntry)],
    keypairs: &[EcdsaKeypair],
    payload_b64: &str,
) -> JwtResult<()> {
    let by_identity: HashMap<&str, &EcdsaKeypair> = keypairs
        .iter()
        .filter_map(|k| k.identity().map(|id| (id, k)))
        .collect();

    let has_overlap = entries.iter().any(|(kid, _)| by_identity.contains_key(kid.as_str()));
    if !has_overlap {
        return Err(JwtError::KeySignatureMismatch);
    }

    for (kid, entry) in entries {
        if let Some(keypair) = by_identity.get(kid.as_str()) {
            if verify_entry(entry, payload_b64, keypair).is_ok() {
                return Ok(());
            }
        }
    }
    Err(JwtError::InvalidSignature)
}

fn dedup_checked_identities(keypairs: &[EcdsaKeypair]) -> JwtResult<Vec<String>> {
    let mut seen = std::collections::HashSet::new();
    let mut ids = Vec::with_capacity(keypairs.len());
    for keypair in keypairs {
        let id = keypair
            .identity()
            .ok_or_else(|| JwtError::key("keypair supplied for verification has no identity"))?
            .to_string();
        if !seen.insert(id.clone()) {
            return Err(JwtError::key(format!("duplicate keypair identity {id:?}")));
        }
        ids.push(id);
    }
    Ok(ids)
}

/// Extend a compact token or existing envelope with additional signers.
///
/// When `input` is a compact token, it is promoted to a one-entry
/// envelope first: the original signature is kept byte-identical (this
/// function never has access to the original signing key, so it cannot
/// re-sign), and the new entry's `protected` header is written in the
/// full three-field JOSE+JSON form carrying `existing_kid` so the
/// resulting envelope's `kid` list is complete and recoverable from the
/// JSON alone. [`verify_jws`] recognizes such an entry, whose stored
/// signature won't validate against the rewritten header bytes, by
/// falling back to the original two-field compact header as the actual
/// signing input when the primary check fails (see [`verify_entry`]).
/// If the original token's header already carried a `kid` (not possible
/// for a header produced by [`crate::compact::make_jwt`], which always
/// emits the bare two-field header, but preserved here for forward
/// compatibility) it is reused in preference to `existing_kid`.
///
/// # Errors
/// Returns [`JwtError::InvalidFormat`] if `input` is a compact token with
/// no `existing_kid` supplied, and [`JwtError::InvalidKey`] if any
/// additional signer lacks a non-empty identity.
pub fn extend_jws_signatures(
    input: &[u8],
    additional_keypairs: &[EcdsaKeypair],
    existing_kid: Option<&str>,
) -> JwtResult<String> {
    debug!(additional = additional_keypairs.len(), "extend_jws_signatures");
    for keypair in additional_keypairs {
        require_identity(keypair)?;
    }

    let mut envelope = if let Some(token) = as_compact_token(input) {
        promote_compact_to_envelope(token, existing_kid)?
    } else {
        parse_envelope(input)?
    };

    let payload_b64 = envelope.payload.clone();
    for keypair in additional_keypairs {
        let identity = keypair.identity().unwrap_or_default();
        let header = multi_sig_header(identity);
        let protected_b64 = b64url_encode(header.as_bytes());
        let signing_input = format!("{protected_b64}.{payload_b64}");
        let signature = keypair.sign(signing_input.as_bytes())?;
        envelope.signatures.push(SignatureEntry {
            protected: protected_b64,
            signature: b64url_encode(&signature),
        });
    }

    serde_json::to_string(&envelope)
        .map_err(|e| JwtError::format(format!("failed to serialize envelope: {e}")))
}

fn promote_compact_to_envelope(token: &str, existing_kid: Option<&str>) -> JwtResult<Envelope> {
    let parts: Vec<&str> = token.split('.').collect();
    let [_header_seg, payload_seg, signature_seg] = parts.as_slice() else {
        return Err(JwtError::format("compact token must have 3 segments"));
    };

    let kid = existing_kid
        .ok_or_else(|| JwtError::format("existing_kid is required to promote a compact token"))?;

    let header = multi_sig_header(kid);
    let protected_b64 = b64url_encode(header.as_bytes());

    Ok(Envelope {
        payload: (*payload_seg).to_string(),
        signatures: vec![SignatureEntry {
            protected: protected_b64,
            signature: (*signature_seg).to_string(),
        }],
    })
}

/// Return the `kid` of each signature in an envelope, in order.
///
/// # Errors
/// Returns [`JwtError::InvalidFormat`] if `input` is not a valid
/// multi-signature envelope.
pub fn get_jws_key_ids(input: &[u8]) -> JwtResult<Vec<String>> {
    let envelope = parse_envelope(input)?;
    envelope
        .signatures
        .iter()
        .map(|entry| {
            let header_bytes = b64url_decode(&entry.protected)?;
            Ok(parse_multi_sig_header(&header_bytes)?.kid)
        })
        .collect()
}
