//! Signed JSON assertions over ECDSA P-256 (ES256): compact JWTs and
//! multi-signature JWS envelopes.
//!
//! Two wire forms share one claim-validation core:
//! - [`make_jwt`]/[`verify_jwt`], the three-segment `header.payload.signature`
//!   compact token, signed by exactly one key.
//! - [`make_jws`]/[`verify_jws`], a JSON envelope carrying one payload and
//!   an ordered list of independent signatures, plus [`extend_jws_signatures`]
//!   and [`get_jws_key_ids`] for working with it.
//!
//! Claims are a freeform `serde_json::Value` object; `exp`/`nbf` are
//! checked against [`LEEWAY`] seconds of clock skew, and a `jti` nonce,
//! if present, is checked against [`NONCE_VALIDITY`] (see the crate's
//! internal nonce policy module for the exact rules).

mod claims;
mod clock;
mod codec;
mod compact;
mod error;
mod header;
mod jws;
mod keys;
mod nonce;
mod sigcodec;

pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{b64url_decode, b64url_encode};
pub use compact::{make_jwt, verify_jwt};
pub use error::{JwtError, JwtResult};
pub use jws::{extend_jws_signatures, get_jws_key_ids, make_jws, verify_jws};
pub use keys::EcdsaKeypair;
pub use sigcodec::{der_to_raw, raw_to_der};

/// Seconds of clock skew tolerated on `exp`, `nbf`, and the `jti` nonce
/// window's future edge.
pub const LEEWAY: i64 = 60;

/// Seconds a `jti` nonce's embedded timestamp is accepted into the past.
pub const NONCE_VALIDITY: i64 = 120;

/// `iss` value injected into claims that don't already carry one.
pub const DEFAULT_ISSUER: &str = "oneID";
